//! Fixed-layout file header.
//!
//! The header is always big-endian.  Its `byte_order` field selects the
//! byte order for everything that follows it (metadata and object payloads).
//!
//! ```text
//! offset  size  field
//!      0     4  meta_size
//!      4     4  file_size
//!      8     4  version
//!     12     4  data_offset
//!     16     1  byte_order   (0 = little-endian, otherwise big-endian)
//!     17     3  reserved
//! ```

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use serde::Serialize;
use std::io::{self, Read, Write};
use std::ops::RangeInclusive;
use thiserror::Error;

/// Encoded size of [`Header`] in bytes.
pub const HEADER_SIZE: u64 = 20;

/// Container versions accepted by default.
pub const SUPPORTED_VERSIONS: RangeInclusive<u32> = 9..=13;

#[derive(Error, Debug)]
pub enum HeaderError {
    #[error("unsupported assets file version {observed}:\n{dump}")]
    UnsupportedVersion { observed: u32, dump: String },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Byte order of everything after the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Endian {
    Little,
    Big,
}

impl Endian {
    /// Value stored in [`Header::byte_order`] for this order.
    pub fn flag(self) -> u8 {
        match self {
            Endian::Little => 0,
            Endian::Big    => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Header {
    pub meta_size:   u32,
    pub file_size:   u32,
    pub version:     u32,
    pub data_offset: u32,
    pub byte_order:  u8,
    pub reserved:    [u8; 3],
}

impl Header {
    /// Order used for metadata and payloads.
    pub fn endian(&self) -> Endian {
        if self.byte_order == 0 { Endian::Little } else { Endian::Big }
    }

    pub fn write<W: Write>(&self, mut writer: W) -> io::Result<()> {
        writer.write_u32::<BigEndian>(self.meta_size)?;
        writer.write_u32::<BigEndian>(self.file_size)?;
        writer.write_u32::<BigEndian>(self.version)?;
        writer.write_u32::<BigEndian>(self.data_offset)?;
        writer.write_u8(self.byte_order)?;
        writer.write_all(&self.reserved)?;
        Ok(())
    }

    /// Decode a header and check its version against `versions`.
    pub fn read<R: Read>(mut reader: R, versions: &RangeInclusive<u32>) -> Result<Self, HeaderError> {
        let meta_size   = reader.read_u32::<BigEndian>()?;
        let file_size   = reader.read_u32::<BigEndian>()?;
        let version     = reader.read_u32::<BigEndian>()?;
        let data_offset = reader.read_u32::<BigEndian>()?;
        let byte_order  = reader.read_u8()?;
        let mut reserved = [0u8; 3];
        reader.read_exact(&mut reserved)?;

        let header = Self { meta_size, file_size, version, data_offset, byte_order, reserved };
        if !versions.contains(&version) {
            return Err(HeaderError::UnsupportedVersion { observed: version, dump: header.dump() });
        }
        Ok(header)
    }

    /// Pretty JSON rendering for diagnostics.
    pub fn dump(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_else(|_| format!("{self:?}"))
    }
}

/// Round `raw` up to the next multiple of `line`.
pub fn align(raw: u64, line: u64) -> u64 {
    raw.div_ceil(line) * line
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample_bytes(version: u32, byte_order: u8) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&0x10u32.to_be_bytes());
        buf.extend_from_slice(&0x100u32.to_be_bytes());
        buf.extend_from_slice(&version.to_be_bytes());
        buf.extend_from_slice(&0x50u32.to_be_bytes());
        buf.push(byte_order);
        buf.extend_from_slice(&[0, 0, 0]);
        buf
    }

    #[test]
    fn decodes_big_endian_fields() {
        let header = Header::read(Cursor::new(sample_bytes(9, 0)), &SUPPORTED_VERSIONS).unwrap();
        assert_eq!(header, Header {
            meta_size:   0x10,
            file_size:   0x100,
            version:     9,
            data_offset: 0x50,
            byte_order:  0,
            reserved:    [0; 3],
        });
        assert_eq!(header.endian(), Endian::Little);
    }

    #[test]
    fn nonzero_byte_order_is_big_endian() {
        let header = Header::read(Cursor::new(sample_bytes(13, 7)), &SUPPORTED_VERSIONS).unwrap();
        assert_eq!(header.endian(), Endian::Big);
    }

    #[test]
    fn write_is_inverse_of_read() {
        let bytes = sample_bytes(11, 1);
        let header = Header::read(Cursor::new(&bytes), &SUPPORTED_VERSIONS).unwrap();
        let mut out = Vec::new();
        header.write(&mut out).unwrap();
        assert_eq!(out, bytes);
        assert_eq!(out.len() as u64, HEADER_SIZE);
    }

    #[test]
    fn rejects_version_outside_range() {
        let err = Header::read(Cursor::new(sample_bytes(14, 0)), &SUPPORTED_VERSIONS).unwrap_err();
        match err {
            HeaderError::UnsupportedVersion { observed, dump } => {
                assert_eq!(observed, 14);
                assert!(dump.contains("\"version\": 14"));
            }
            other => panic!("unexpected error: {other}"),
        }

        let strict = 9..=9;
        assert!(Header::read(Cursor::new(sample_bytes(10, 0)), &strict).is_err());
    }

    #[test]
    fn truncated_header_is_io_error() {
        let bytes = sample_bytes(9, 0);
        let err = Header::read(Cursor::new(&bytes[..10]), &SUPPORTED_VERSIONS).unwrap_err();
        assert!(matches!(err, HeaderError::Io(_)));
    }

    #[test]
    fn align_rounds_up() {
        assert_eq!(align(0, 8), 0);
        assert_eq!(align(10, 8), 16);
        assert_eq!(align(16, 8), 16);
        assert_eq!(align(3, 4), 4);
    }
}
