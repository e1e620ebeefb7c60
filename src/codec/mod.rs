//! Type-directed binary codec.
//!
//! Values are decoded and encoded against an explicit [`Shape`] under a
//! runtime-selected [`Endian`].  The same codec reads the container metadata
//! and, through payload interpreters, individual object bodies.
//!
//! # Wire rules
//!
//! | Shape | Encoding |
//! |-------|----------|
//! | `Integer(bits)` | `bits / 8` bytes in the active byte order |
//! | `Record` | fields in declared order, no padding |
//! | `FixedArray(n, _)` | exactly `n` elements, no prefix |
//! | `Sequence(_)` | `u32` count, then elements |
//! | `Map(_, _)` | `u32` count, then `(key, value)` pairs; a repeated key overwrites |
//! | `String(Tag)` | raw bytes then a single `0x00` |
//! | `String(Payload)` | `u32` length, raw bytes, zero padding to a 4-byte boundary |

mod value;

pub use value::{Fields, Shaped, Value};

use byteorder::{BigEndian, LittleEndian, ReadBytesExt, WriteBytesExt};
use std::collections::BTreeMap;
use std::io::{self, Read, Write};
use std::string::FromUtf8Error;
use thiserror::Error;

use crate::header::{align, Endian};

/// Payload strings are padded to this boundary.
pub const STRING_ALIGN: u64 = 4;

/// Upper bound on elements preallocated from an untrusted count prefix.
const MAX_PREALLOC: usize = 4096;

// ── Error type ───────────────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("unsupported shape: {0}")]
    UnsupportedShape(String),
    #[error("value mismatch: expected {expected}, found {found}")]
    Mismatch { expected: String, found: String },
    #[error("value {value} does not fit in {bits} bits")]
    OutOfRange { bits: u8, value: u64 },
    #[error("unexpected data left ({count} bytes):\n{dump}")]
    TrailingBytes { count: u64, dump: String },
    #[error("record has fewer fields than its shape")]
    MissingField,
    #[error("invalid UTF-8 string: {0}")]
    Utf8(#[from] FromUtf8Error),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

// ── Shapes ───────────────────────────────────────────────────────────────────

/// How a string is laid out on the wire.
///
/// The two encodings are never interchangeable: type-tree and metadata
/// fields use `Tag`, object payload records use `Payload`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringEncoding {
    /// Zero-terminated.
    Tag,
    /// `u32` length prefix, padded to [`STRING_ALIGN`].
    Payload,
}

#[derive(Debug, Clone)]
pub struct Field {
    pub name:  &'static str,
    pub shape: Shape,
}

/// Declared layout of a value.
#[derive(Debug, Clone)]
pub enum Shape {
    /// Unsigned integer of 8, 16, 32 or 64 bits.
    Integer(u8),
    Record(Vec<Field>),
    FixedArray(usize, Box<Shape>),
    Sequence(Box<Shape>),
    Map(Box<Shape>, Box<Shape>),
    String(StringEncoding),
    /// Expanded on use; lets a shape refer to itself.
    Deferred(fn() -> Shape),
}

impl Shape {
    pub fn u8()  -> Self { Shape::Integer(8) }
    pub fn u16() -> Self { Shape::Integer(16) }
    pub fn u32() -> Self { Shape::Integer(32) }
    pub fn u64() -> Self { Shape::Integer(64) }

    pub fn tag_string()     -> Self { Shape::String(StringEncoding::Tag) }
    pub fn payload_string() -> Self { Shape::String(StringEncoding::Payload) }

    pub fn record<I: IntoIterator<Item = (&'static str, Shape)>>(fields: I) -> Self {
        Shape::Record(fields.into_iter().map(|(name, shape)| Field { name, shape }).collect())
    }

    pub fn array(count: usize, element: Shape) -> Self {
        Shape::FixedArray(count, Box::new(element))
    }

    pub fn sequence(element: Shape) -> Self {
        Shape::Sequence(Box::new(element))
    }

    pub fn map(key: Shape, value: Shape) -> Self {
        Shape::Map(Box::new(key), Box::new(value))
    }
}

fn check_width(bits: u8) -> Result<(), CodecError> {
    match bits {
        8 | 16 | 32 | 64 => Ok(()),
        _ => Err(CodecError::UnsupportedShape(format!("integer width {bits}"))),
    }
}

fn check_key_shape(shape: &Shape) -> Result<(), CodecError> {
    match shape {
        Shape::Integer(bits)   => check_width(*bits),
        Shape::String(_)       => Ok(()),
        Shape::Deferred(build) => check_key_shape(&build()),
        other => Err(CodecError::UnsupportedShape(format!("map key {other:?}"))),
    }
}

// ── Decoding ─────────────────────────────────────────────────────────────────

/// Non-fatal findings reported while decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// A map key appeared more than once; `new` replaced `old`.
    DuplicateKey { key: Value, old: Value, new: Value },
}

/// Decodes values under a fixed byte order, collecting [`Warning`]s.
#[derive(Debug)]
pub struct Decoder {
    order:    Endian,
    warnings: Vec<Warning>,
}

impl Decoder {
    pub fn new(order: Endian) -> Self {
        Self { order, warnings: Vec::new() }
    }

    pub fn order(&self) -> Endian {
        self.order
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn take_warnings(&mut self) -> Vec<Warning> {
        std::mem::take(&mut self.warnings)
    }

    pub fn decode<R: Read>(&mut self, reader: &mut R, shape: &Shape) -> Result<Value, CodecError> {
        match shape {
            Shape::Integer(bits) => read_uint(reader, *bits, self.order).map(Value::Int),

            Shape::Record(fields) => {
                let mut values = Vec::with_capacity(fields.len());
                for field in fields {
                    values.push(self.decode(reader, &field.shape)?);
                }
                Ok(Value::Record(values))
            }

            Shape::FixedArray(count, element) => self.decode_elements(reader, *count, element),

            Shape::Sequence(element) => {
                let count = read_uint(reader, 32, self.order)? as usize;
                self.decode_elements(reader, count, element)
            }

            Shape::Map(key_shape, value_shape) => {
                check_key_shape(key_shape)?;
                let count = read_uint(reader, 32, self.order)?;
                let mut map = BTreeMap::new();
                for _ in 0..count {
                    let key   = self.decode(reader, key_shape)?;
                    let value = self.decode(reader, value_shape)?;
                    if let Some(old) = map.insert(key.clone(), value.clone()) {
                        log::warn!("duplicate value for key {key}: new: {value}, old: {old}");
                        self.warnings.push(Warning::DuplicateKey { key, old, new: value });
                    }
                }
                Ok(Value::Map(map))
            }

            Shape::String(StringEncoding::Tag)     => read_tag_string(reader).map(Value::Str),
            Shape::String(StringEncoding::Payload) => read_payload_string(reader, self.order).map(Value::Str),

            Shape::Deferred(build) => self.decode(reader, &build()),
        }
    }

    fn decode_elements<R: Read>(&mut self, reader: &mut R, count: usize, element: &Shape) -> Result<Value, CodecError> {
        let mut items = Vec::with_capacity(count.min(MAX_PREALLOC));
        for _ in 0..count {
            items.push(self.decode(reader, element)?);
        }
        Ok(Value::Array(items))
    }
}

fn read_uint<R: Read>(reader: &mut R, bits: u8, order: Endian) -> Result<u64, CodecError> {
    let value = match (bits, order) {
        (8, _)               => reader.read_u8()?.into(),
        (16, Endian::Little) => reader.read_u16::<LittleEndian>()?.into(),
        (16, Endian::Big)    => reader.read_u16::<BigEndian>()?.into(),
        (32, Endian::Little) => reader.read_u32::<LittleEndian>()?.into(),
        (32, Endian::Big)    => reader.read_u32::<BigEndian>()?.into(),
        (64, Endian::Little) => reader.read_u64::<LittleEndian>()?,
        (64, Endian::Big)    => reader.read_u64::<BigEndian>()?,
        _ => return Err(CodecError::UnsupportedShape(format!("integer width {bits}"))),
    };
    Ok(value)
}

fn read_tag_string<R: Read>(reader: &mut R) -> Result<Vec<u8>, CodecError> {
    let mut bytes = Vec::new();
    loop {
        match reader.read_u8()? {
            0 => return Ok(bytes),
            b => bytes.push(b),
        }
    }
}

fn read_payload_string<R: Read>(reader: &mut R, order: Endian) -> Result<Vec<u8>, CodecError> {
    let len = read_uint(reader, 32, order)?;
    let mut bytes = Vec::new();
    reader.by_ref().take(len).read_to_end(&mut bytes)?;
    if (bytes.len() as u64) < len {
        return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
    }

    let pad = align(len, STRING_ALIGN) - len;
    let skipped = io::copy(&mut reader.by_ref().take(pad), &mut io::sink())?;
    if skipped < pad {
        return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
    }
    Ok(bytes)
}

// ── Encoding ─────────────────────────────────────────────────────────────────

/// Encodes values under a fixed byte order.
#[derive(Debug, Clone, Copy)]
pub struct Encoder {
    order: Endian,
}

impl Encoder {
    pub fn new(order: Endian) -> Self {
        Self { order }
    }

    pub fn encode<W: Write>(&self, writer: &mut W, shape: &Shape, value: &Value) -> Result<(), CodecError> {
        match (shape, value) {
            (Shape::Integer(bits), Value::Int(v)) => write_uint(writer, *bits, *v, self.order),

            (Shape::Record(fields), Value::Record(values)) => {
                if fields.len() != values.len() {
                    return Err(CodecError::Mismatch {
                        expected: format!("record of {} fields", fields.len()),
                        found:    format!("record of {} fields", values.len()),
                    });
                }
                for (field, v) in fields.iter().zip(values) {
                    self.encode(writer, &field.shape, v)?;
                }
                Ok(())
            }

            (Shape::FixedArray(count, element), Value::Array(items)) => {
                if *count != items.len() {
                    return Err(CodecError::Mismatch {
                        expected: format!("array of {count}"),
                        found:    format!("array of {}", items.len()),
                    });
                }
                for item in items {
                    self.encode(writer, element, item)?;
                }
                Ok(())
            }

            (Shape::Sequence(element), Value::Array(items)) => {
                write_uint(writer, 32, items.len() as u64, self.order)?;
                for item in items {
                    self.encode(writer, element, item)?;
                }
                Ok(())
            }

            (Shape::Map(key_shape, value_shape), Value::Map(map)) => {
                check_key_shape(key_shape)?;
                write_uint(writer, 32, map.len() as u64, self.order)?;
                for (k, v) in map {
                    self.encode(writer, key_shape, k)?;
                    self.encode(writer, value_shape, v)?;
                }
                Ok(())
            }

            (Shape::String(StringEncoding::Tag), Value::Str(bytes)) => {
                if bytes.contains(&0) {
                    return Err(CodecError::Mismatch {
                        expected: "tag string without NUL bytes".to_owned(),
                        found:    "string containing NUL".to_owned(),
                    });
                }
                writer.write_all(bytes)?;
                writer.write_u8(0)?;
                Ok(())
            }

            (Shape::String(StringEncoding::Payload), Value::Str(bytes)) => {
                let len = bytes.len() as u64;
                write_uint(writer, 32, len, self.order)?;
                writer.write_all(bytes)?;
                write_zeros(writer, align(len, STRING_ALIGN) - len)?;
                Ok(())
            }

            (Shape::Deferred(build), _) => self.encode(writer, &build(), value),

            (shape, value) => Err(CodecError::Mismatch {
                expected: shape_kind(shape).to_owned(),
                found:    value.kind().to_owned(),
            }),
        }
    }
}

fn shape_kind(shape: &Shape) -> &'static str {
    match shape {
        Shape::Integer(_)       => "integer",
        Shape::Record(_)        => "record",
        Shape::FixedArray(_, _) |
        Shape::Sequence(_)      => "array",
        Shape::Map(_, _)        => "map",
        Shape::String(_)        => "string",
        Shape::Deferred(_)      => "deferred",
    }
}

fn write_uint<W: Write>(writer: &mut W, bits: u8, value: u64, order: Endian) -> Result<(), CodecError> {
    check_width(bits)?;
    if bits < 64 && value >> bits != 0 {
        return Err(CodecError::OutOfRange { bits, value });
    }
    match (bits, order) {
        (8, _)               => writer.write_u8(value as u8)?,
        (16, Endian::Little) => writer.write_u16::<LittleEndian>(value as u16)?,
        (16, Endian::Big)    => writer.write_u16::<BigEndian>(value as u16)?,
        (32, Endian::Little) => writer.write_u32::<LittleEndian>(value as u32)?,
        (32, Endian::Big)    => writer.write_u32::<BigEndian>(value as u32)?,
        (_, Endian::Little)  => writer.write_u64::<LittleEndian>(value)?,
        (_, Endian::Big)     => writer.write_u64::<BigEndian>(value)?,
    }
    Ok(())
}

/// Write `count` zero bytes.
pub(crate) fn write_zeros<W: Write>(writer: &mut W, count: u64) -> io::Result<()> {
    io::copy(&mut io::repeat(0).take(count), writer)?;
    Ok(())
}

// ── Convenience entry points ─────────────────────────────────────────────────

/// Decode one value; duplicate map keys are logged and otherwise dropped.
pub fn decode<R: Read>(reader: &mut R, shape: &Shape, order: Endian) -> Result<Value, CodecError> {
    Decoder::new(order).decode(reader, shape)
}

/// Decode one value and require `reader` to be exhausted afterwards.
///
/// Leftover bytes mean the shape does not describe the data; they are
/// reported as [`CodecError::TrailingBytes`].
pub fn decode_exact<R: Read>(reader: &mut R, shape: &Shape, order: Endian) -> Result<Value, CodecError> {
    let value = decode(reader, shape, order)?;
    let mut rest = Vec::new();
    reader.read_to_end(&mut rest)?;
    if !rest.is_empty() {
        return Err(CodecError::TrailingBytes { count: rest.len() as u64, dump: hex_dump(&rest) });
    }
    Ok(value)
}

pub fn encode<W: Write>(writer: &mut W, shape: &Shape, value: &Value, order: Endian) -> Result<(), CodecError> {
    Encoder::new(order).encode(writer, shape, value)
}

pub fn read<T: Shaped, R: Read>(reader: &mut R, order: Endian) -> Result<T, CodecError> {
    T::from_value(decode(reader, &T::shape(), order)?)
}

pub fn read_exact<T: Shaped, R: Read>(reader: &mut R, order: Endian) -> Result<T, CodecError> {
    T::from_value(decode_exact(reader, &T::shape(), order)?)
}

pub fn write<T: Shaped, W: Write>(writer: &mut W, value: &T, order: Endian) -> Result<(), CodecError> {
    encode(writer, &T::shape(), &value.to_value(), order)
}

/// Canonical offset / hex / ASCII dump, 16 bytes per line.
pub fn hex_dump(bytes: &[u8]) -> String {
    let mut out = String::new();
    for (line, chunk) in bytes.chunks(16).enumerate() {
        let hex: Vec<String> = chunk.iter().map(|b| hex::encode([*b])).collect();
        let ascii: String = chunk
            .iter()
            .map(|&b| if b.is_ascii_graphic() || b == b' ' { b as char } else { '.' })
            .collect();
        out.push_str(&format!("{:08x}  {:<47}  |{}|\n", line * 16, hex.join(" "), ascii));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::collection::{btree_map, vec};
    use proptest::prelude::*;
    use std::io::Cursor;

    fn roundtrip(shape: &Shape, value: &Value, order: Endian) -> Value {
        let mut buf = Vec::new();
        encode(&mut buf, shape, value, order).unwrap();
        decode_exact(&mut Cursor::new(buf), shape, order).unwrap()
    }

    #[test]
    fn integers_follow_byte_order() {
        let shape = Shape::record([("a", Shape::u16()), ("b", Shape::u32())]);
        let value = Value::Record(vec![Value::Int(0x0102), Value::Int(0x0304_0506)]);

        let mut le = Vec::new();
        encode(&mut le, &shape, &value, Endian::Little).unwrap();
        assert_eq!(le, [0x02, 0x01, 0x06, 0x05, 0x04, 0x03]);

        let mut be = Vec::new();
        encode(&mut be, &shape, &value, Endian::Big).unwrap();
        assert_eq!(be, [0x01, 0x02, 0x03, 0x04, 0x05, 0x06]);
    }

    #[test]
    fn tag_string_stops_after_terminator() {
        let mut cur = Cursor::new(b"abc\0def".to_vec());
        let value = decode(&mut cur, &Shape::tag_string(), Endian::Little).unwrap();
        assert_eq!(value, Value::from("abc"));
        assert_eq!(cur.position(), 4);

        let mut out = Vec::new();
        encode(&mut out, &Shape::tag_string(), &value, Endian::Big).unwrap();
        assert_eq!(out, b"abc\0");
    }

    #[test]
    fn tag_string_without_terminator_fails() {
        let err = decode(&mut Cursor::new(b"abc".to_vec()), &Shape::tag_string(), Endian::Little).unwrap_err();
        assert!(matches!(err, CodecError::Io(e) if e.kind() == io::ErrorKind::UnexpectedEof));
    }

    #[test]
    fn payload_string_skips_padding() {
        let mut bytes = 3u32.to_le_bytes().to_vec();
        bytes.extend_from_slice(b"abc\0");
        bytes.extend_from_slice(&[0xEE; 4]);
        let mut cur = Cursor::new(bytes);
        let value = decode(&mut cur, &Shape::payload_string(), Endian::Little).unwrap();
        assert_eq!(value, Value::from("abc"));
        assert_eq!(cur.position(), 8);
    }

    #[test]
    fn payload_string_writes_zero_padding_outside_length() {
        let mut out = Vec::new();
        encode(&mut out, &Shape::payload_string(), &Value::from("hello"), Endian::Big).unwrap();
        assert_eq!(out, [0, 0, 0, 5, b'h', b'e', b'l', b'l', b'o', 0, 0, 0]);

        let mut aligned = Vec::new();
        encode(&mut aligned, &Shape::payload_string(), &Value::from("abcd"), Endian::Little).unwrap();
        assert_eq!(aligned.len(), 8);
    }

    #[test]
    fn payload_string_truncated_padding_fails() {
        let mut bytes = 3u32.to_le_bytes().to_vec();
        bytes.extend_from_slice(b"abc");
        assert!(decode(&mut Cursor::new(bytes), &Shape::payload_string(), Endian::Little).is_err());
    }

    #[test]
    fn fixed_array_has_no_prefix_and_sequence_does() {
        let items = Value::Array(vec![Value::Int(1), Value::Int(2)]);

        let mut fixed = Vec::new();
        encode(&mut fixed, &Shape::array(2, Shape::u8()), &items, Endian::Little).unwrap();
        assert_eq!(fixed, [1, 2]);

        let mut seq = Vec::new();
        encode(&mut seq, &Shape::sequence(Shape::u8()), &items, Endian::Little).unwrap();
        assert_eq!(seq, [2, 0, 0, 0, 1, 2]);
    }

    #[test]
    fn map_duplicate_key_keeps_last_and_warns() {
        let shape = Shape::map(Shape::u32(), Shape::payload_string());
        let mut bytes = 2u32.to_le_bytes().to_vec();
        for s in [b"x", b"y"] {
            bytes.extend_from_slice(&1u32.to_le_bytes());
            bytes.extend_from_slice(&1u32.to_le_bytes());
            bytes.extend_from_slice(s);
            bytes.extend_from_slice(&[0, 0, 0]);
        }

        let mut decoder = Decoder::new(Endian::Little);
        let value = decoder.decode(&mut Cursor::new(bytes), &shape).unwrap();

        let map = value.into_map().unwrap();
        assert_eq!(map.len(), 1);
        assert_eq!(map[&Value::Int(1)], Value::from("y"));
        assert_eq!(decoder.warnings(), &[Warning::DuplicateKey {
            key: Value::Int(1),
            old: Value::from("x"),
            new: Value::from("y"),
        }]);
    }

    #[test]
    fn unsupported_shapes_are_rejected() {
        let err = decode(&mut Cursor::new(vec![0; 8]), &Shape::Integer(24), Endian::Little).unwrap_err();
        assert!(matches!(err, CodecError::UnsupportedShape(_)));

        let shape = Shape::map(Shape::sequence(Shape::u8()), Shape::u8());
        let err = decode(&mut Cursor::new(vec![0; 8]), &shape, Endian::Little).unwrap_err();
        assert!(matches!(err, CodecError::UnsupportedShape(_)));

        let mut out = Vec::new();
        let err = encode(&mut out, &Shape::Integer(12), &Value::Int(1), Endian::Big).unwrap_err();
        assert!(matches!(err, CodecError::UnsupportedShape(_)));
    }

    #[test]
    fn encode_rejects_values_that_do_not_fit() {
        let mut out = Vec::new();
        assert!(matches!(
            encode(&mut out, &Shape::u16(), &Value::Int(70_000), Endian::Little),
            Err(CodecError::OutOfRange { bits: 16, value: 70_000 })
        ));
        assert!(matches!(
            encode(&mut out, &Shape::u16(), &Value::from("no"), Endian::Little),
            Err(CodecError::Mismatch { .. })
        ));
        assert!(matches!(
            encode(&mut out, &Shape::tag_string(), &Value::Str(b"a\0b".to_vec()), Endian::Little),
            Err(CodecError::Mismatch { .. })
        ));
        assert!(matches!(
            encode(&mut out, &Shape::array(3, Shape::u8()), &Value::Array(vec![Value::Int(1)]), Endian::Little),
            Err(CodecError::Mismatch { .. })
        ));
    }

    #[test]
    fn decode_exact_reports_leftover_count() {
        let err = decode_exact(&mut Cursor::new(vec![1, 0, 0, 0, 9, 9]), &Shape::u32(), Endian::Little).unwrap_err();
        match err {
            CodecError::TrailingBytes { count, dump } => {
                assert_eq!(count, 2);
                assert!(dump.starts_with("00000000  09 09"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn deferred_shape_recurses() {
        fn node() -> Shape {
            Shape::record([("v", Shape::u8()), ("kids", Shape::sequence(Shape::Deferred(node)))])
        }
        let leaf  = Value::Record(vec![Value::Int(2), Value::Array(vec![])]);
        let value = Value::Record(vec![Value::Int(1), Value::Array(vec![leaf.clone(), leaf])]);
        assert_eq!(roundtrip(&node(), &value, Endian::Big), value);
    }

    #[test]
    fn hex_dump_layout() {
        let dump = hex_dump(b"ABCDEFGHIJKLMNOPQ");
        let lines: Vec<&str> = dump.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("00000000  41 42 43"));
        assert!(lines[0].ends_with("|ABCDEFGHIJKLMNOP|"));
        assert!(lines[1].starts_with("00000010  51"));
    }

    fn value_for(shape: &Shape) -> BoxedStrategy<Value> {
        match shape {
            Shape::Integer(bits) => {
                let max = if *bits == 64 { u64::MAX } else { (1u64 << bits) - 1 };
                (0..=max).prop_map(Value::Int).boxed()
            }
            Shape::String(StringEncoding::Tag) => vec(1u8..=255, 0..12).prop_map(Value::Str).boxed(),
            Shape::String(StringEncoding::Payload) => vec(any::<u8>(), 0..12).prop_map(Value::Str).boxed(),
            Shape::Record(fields) => fields
                .iter()
                .map(|f| value_for(&f.shape))
                .collect::<Vec<_>>()
                .prop_map(Value::Record)
                .boxed(),
            Shape::FixedArray(n, element) => vec(value_for(element), *n).prop_map(Value::Array).boxed(),
            Shape::Sequence(element) => vec(value_for(element), 0..5).prop_map(Value::Array).boxed(),
            Shape::Map(k, v) => btree_map(value_for(k), value_for(v), 0..5).prop_map(Value::Map).boxed(),
            Shape::Deferred(build) => value_for(&build()),
        }
    }

    fn mixed_shape() -> Shape {
        Shape::record([
            ("byte",   Shape::u8()),
            ("short",  Shape::u16()),
            ("word",   Shape::u32()),
            ("long",   Shape::u64()),
            ("tag",    Shape::tag_string()),
            ("name",   Shape::payload_string()),
            ("triple", Shape::array(3, Shape::u16())),
            ("pairs",  Shape::sequence(Shape::record([("k", Shape::u8()), ("s", Shape::payload_string())]))),
            ("index",  Shape::map(Shape::payload_string(), Shape::array(2, Shape::u32()))),
            ("ids",    Shape::map(Shape::u64(), Shape::tag_string())),
        ])
    }

    proptest! {
        #[test]
        fn every_shape_kind_roundtrips(
            value in value_for(&mixed_shape()),
            big in any::<bool>(),
        ) {
            let order = if big { Endian::Big } else { Endian::Little };
            prop_assert_eq!(roundtrip(&mixed_shape(), &value, order), value);
        }
    }
}
