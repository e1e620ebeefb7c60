//! Decoded values and the [`Shaped`] bridge to typed Rust records.

use std::collections::BTreeMap;
use std::fmt;

use super::{CodecError, Shape};
use crate::header::Endian;

/// A value decoded against a [`Shape`].
///
/// Fixed arrays and sequences both decode to [`Value::Array`]; the shape
/// decides whether a count prefix is present on the wire.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Value {
    Int(u64),
    /// Raw string bytes, without terminator, length prefix or padding.
    Str(Vec<u8>),
    /// Field values in declared order.
    Record(Vec<Value>),
    Array(Vec<Value>),
    Map(BTreeMap<Value, Value>),
}

impl Value {
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Int(_)    => "integer",
            Value::Str(_)    => "string",
            Value::Record(_) => "record",
            Value::Array(_)  => "array",
            Value::Map(_)    => "map",
        }
    }

    pub fn as_u64(&self) -> Result<u64, CodecError> {
        match self {
            Value::Int(v) => Ok(*v),
            other         => Err(mismatch("integer", other)),
        }
    }

    pub fn into_u8(self) -> Result<u8, CodecError> {
        narrow(self.as_u64()?, 8)
    }

    pub fn into_u16(self) -> Result<u16, CodecError> {
        narrow(self.as_u64()?, 16)
    }

    pub fn into_u32(self) -> Result<u32, CodecError> {
        narrow(self.as_u64()?, 32)
    }

    pub fn into_bytes(self) -> Result<Vec<u8>, CodecError> {
        match self {
            Value::Str(bytes) => Ok(bytes),
            other             => Err(mismatch("string", &other)),
        }
    }

    pub fn into_string(self) -> Result<String, CodecError> {
        Ok(String::from_utf8(self.into_bytes()?)?)
    }

    pub fn into_record(self) -> Result<Fields, CodecError> {
        match self {
            Value::Record(fields) => Ok(Fields(fields.into_iter())),
            other                 => Err(mismatch("record", &other)),
        }
    }

    pub fn into_array(self) -> Result<Vec<Value>, CodecError> {
        match self {
            Value::Array(items) => Ok(items),
            other               => Err(mismatch("array", &other)),
        }
    }

    pub fn into_map(self) -> Result<BTreeMap<Value, Value>, CodecError> {
        match self {
            Value::Map(map) => Ok(map),
            other           => Err(mismatch("map", &other)),
        }
    }
}

fn mismatch(expected: &str, found: &Value) -> CodecError {
    CodecError::Mismatch { expected: expected.to_owned(), found: found.kind().to_owned() }
}

fn narrow<T: TryFrom<u64>>(value: u64, bits: u8) -> Result<T, CodecError> {
    T::try_from(value).map_err(|_| CodecError::OutOfRange { bits, value })
}

impl From<u8>  for Value { fn from(v: u8)  -> Self { Value::Int(v.into()) } }
impl From<u16> for Value { fn from(v: u16) -> Self { Value::Int(v.into()) } }
impl From<u32> for Value { fn from(v: u32) -> Self { Value::Int(v.into()) } }
impl From<u64> for Value { fn from(v: u64) -> Self { Value::Int(v) } }
impl From<&str>   for Value { fn from(v: &str)   -> Self { Value::Str(v.as_bytes().to_vec()) } }
impl From<String> for Value { fn from(v: String) -> Self { Value::Str(v.into_bytes()) } }

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v)   => write!(f, "{v}"),
            Value::Str(b)   => write!(f, "{:?}", String::from_utf8_lossy(b)),
            Value::Record(fields) => {
                f.write_str("{")?;
                for (i, v) in fields.iter().enumerate() {
                    if i > 0 { f.write_str(", ")?; }
                    write!(f, "{v}")?;
                }
                f.write_str("}")
            }
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, v) in items.iter().enumerate() {
                    if i > 0 { f.write_str(", ")?; }
                    write!(f, "{v}")?;
                }
                f.write_str("]")
            }
            Value::Map(map) => {
                f.write_str("{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 { f.write_str(", ")?; }
                    write!(f, "{k}: {v}")?;
                }
                f.write_str("}")
            }
        }
    }
}

/// Positional cursor over the fields of a decoded record.
pub struct Fields(std::vec::IntoIter<Value>);

impl Fields {
    /// Next field in declared order.
    pub fn take(&mut self) -> Result<Value, CodecError> {
        self.0.next().ok_or(CodecError::MissingField)
    }
}

/// A Rust type with a fixed wire shape.
///
/// Payload interpreters implement this for their records and use
/// [`super::read`] / [`super::write`] against an object's bytes.
pub trait Shaped: Sized {
    fn shape() -> Shape;
    fn from_value(value: Value) -> Result<Self, CodecError>;
    fn to_value(&self) -> Value;

    fn to_bytes(&self, order: Endian) -> Result<Vec<u8>, CodecError> {
        let mut buf = Vec::new();
        super::write(&mut buf, self, order)?;
        Ok(buf)
    }
}

macro_rules! shaped_uint {
    ($ty:ty, $bits:expr) => {
        impl Shaped for $ty {
            fn shape() -> Shape { Shape::Integer($bits) }
            fn from_value(value: Value) -> Result<Self, CodecError> {
                narrow(value.as_u64()?, $bits)
            }
            fn to_value(&self) -> Value { Value::Int(u64::from(*self)) }
        }
    };
}

shaped_uint!(u8, 8);
shaped_uint!(u16, 16);
shaped_uint!(u32, 32);
shaped_uint!(u64, 64);

impl<T: Shaped> Shaped for Vec<T> {
    fn shape() -> Shape {
        Shape::Sequence(Box::new(T::shape()))
    }

    fn from_value(value: Value) -> Result<Self, CodecError> {
        value.into_array()?.into_iter().map(T::from_value).collect()
    }

    fn to_value(&self) -> Value {
        Value::Array(self.iter().map(Shaped::to_value).collect())
    }
}

impl<T: Shaped, const N: usize> Shaped for [T; N] {
    fn shape() -> Shape {
        Shape::FixedArray(N, Box::new(T::shape()))
    }

    fn from_value(value: Value) -> Result<Self, CodecError> {
        let items: Vec<T> = value.into_array()?.into_iter().map(T::from_value).collect::<Result<_, _>>()?;
        let found = items.len();
        items.try_into().map_err(|_| CodecError::Mismatch {
            expected: format!("array of {N}"),
            found:    format!("array of {found}"),
        })
    }

    fn to_value(&self) -> Value {
        Value::Array(self.iter().map(Shaped::to_value).collect())
    }
}
