//! Read-only view of an assets container.
//!
//! ```no_run
//! use shadowed::assets::AssetsReader;
//!
//! let mut assets = AssetsReader::open("resources.assets")?;
//! println!("signature {}", assets.signature());
//! assets.for_each_object(|obj, body| {
//!     println!("{} type={} size={}", obj.id, obj.type_id, body.len());
//!     Ok::<_, std::io::Error>(())
//! })?;
//! assets.close()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! The header and metadata are decoded once in [`AssetsReader::new`];
//! object bodies are read lazily through bounded [`Section`]s.  A reader owns
//! one stream and one cursor, so iteration is strictly sequential.

use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::codec::{CodecError, Decoder, Shaped, Warning};
use crate::header::{align, Endian, Header, HeaderError, HEADER_SIZE, SUPPORTED_VERSIONS};
use crate::meta::{MetaData, ObjectRecord};
use crate::section::Section;

/// Objects start on this boundary within the payload region.
pub const OBJECT_ALIGN: u64 = 8;

// ── Options ──────────────────────────────────────────────────────────────────

/// Configuration for [`AssetsReader::open_with`].
#[derive(Debug, Clone)]
pub struct AssetsOptions {
    /// Inclusive range of accepted container versions.
    pub versions: RangeInclusive<u32>,
}

impl Default for AssetsOptions {
    fn default() -> Self {
        Self { versions: SUPPORTED_VERSIONS }
    }
}

impl AssetsOptions {
    /// Accept only version 9, the layout every shipped build has used.
    pub fn strict() -> Self {
        Self { versions: 9..=9 }
    }
}

// ── Error type ───────────────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum AssetsError {
    #[error(transparent)]
    Header(#[from] HeaderError),
    #[error("failed to parse metadata: {source}\nheader:\n{dump}")]
    Format { source: CodecError, dump: String },
    #[error("inconsistent container layout: {0}")]
    Layout(String),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("targetID {id} is present in both replace and remove lists")]
    Conflict { id: u32 },
    #[error("not supported: {0}")]
    NotSupported(String),
    #[error("object {0} not found")]
    ObjectNotFound(u32),
    #[error("{0} does not fit in a 32-bit container field")]
    TooLarge(u64),
    #[error("{0}")]
    Missing(String),
    #[error("output directory {0} is the data directory")]
    SameDirectory(PathBuf),
    #[error("failed to parse music library: {0}")]
    MusicLib(#[from] prost::DecodeError),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

// ── Reader ───────────────────────────────────────────────────────────────────

pub struct AssetsReader<R: Read + Seek = File> {
    reader:   BufReader<R>,
    header:   Header,
    meta:     MetaData,
    warnings: Vec<Warning>,
}

impl AssetsReader<File> {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, AssetsError> {
        Self::open_with(path, &AssetsOptions::default())
    }

    pub fn open_with<P: AsRef<Path>>(path: P, opts: &AssetsOptions) -> Result<Self, AssetsError> {
        Self::new(File::open(path)?, opts)
    }
}

impl<R: Read + Seek> AssetsReader<R> {
    /// Decode the header and metadata from `inner`.  On failure `inner` is
    /// dropped before returning.
    pub fn new(inner: R, opts: &AssetsOptions) -> Result<Self, AssetsError> {
        let mut reader = BufReader::new(inner);
        reader.seek(SeekFrom::Start(0))?;

        let header = Header::read(&mut reader, &opts.versions)?;

        let mut decoder = Decoder::new(header.endian());
        let meta = decoder
            .decode(&mut reader, &MetaData::shape())
            .and_then(MetaData::from_value)
            .map_err(|source| AssetsError::Format { source, dump: header.dump() })?;

        Ok(Self { reader, header, meta, warnings: decoder.take_warnings() })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn meta(&self) -> &MetaData {
        &self.meta
    }

    pub fn objects(&self) -> &[ObjectRecord] {
        &self.meta.objects
    }

    /// Byte order of metadata and payloads.
    pub fn endian(&self) -> Endian {
        self.header.endian()
    }

    /// Non-fatal findings from decoding the metadata.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn max_id(&self) -> u32 {
        self.meta.max_id()
    }

    /// The type tree signature as text, trailing NULs removed.
    pub fn signature(&self) -> String {
        let bytes = match self.endian() {
            Endian::Little => self.meta.types.signature.to_le_bytes(),
            Endian::Big    => self.meta.types.signature.to_be_bytes(),
        };
        let end = bytes.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
        String::from_utf8_lossy(&bytes[..end]).into_owned()
    }

    /// Bounded view over one object's payload bytes.
    pub fn section(&mut self, record: &ObjectRecord) -> io::Result<Section<'_, BufReader<R>>> {
        let start = u64::from(self.header.data_offset) + u64::from(record.shift);
        Section::new(&mut self.reader, start, record.size.into())
    }

    /// Visit every object in file order.  The first error returned by `f`
    /// stops the iteration and is passed through unchanged.
    pub fn for_each_object<F, E>(&mut self, mut f: F) -> Result<(), E>
    where
        F: FnMut(&ObjectRecord, &mut Section<'_, BufReader<R>>) -> Result<(), E>,
        E: From<io::Error>,
    {
        let data_offset = u64::from(self.header.data_offset);
        for obj in &self.meta.objects {
            let start = data_offset + u64::from(obj.shift);
            let mut section = Section::new(&mut self.reader, start, obj.size.into())?;
            f(obj, &mut section)?;
        }
        Ok(())
    }

    /// Copy one object's payload into memory.
    pub fn read_object(&mut self, id: u32) -> Result<Vec<u8>, AssetsError> {
        let record = *self.meta.find(id).ok_or(AssetsError::ObjectNotFound(id))?;
        let mut section = self.section(&record)?;
        let data = section.read_remaining()?;
        if data.len() as u64 != section.len() {
            return Err(io::Error::from(io::ErrorKind::UnexpectedEof).into());
        }
        Ok(data)
    }

    /// Decode one object's payload with a caller-supplied shape, requiring
    /// the shape to consume the payload exactly.
    pub fn decode_object<T: Shaped>(&mut self, id: u32) -> Result<T, AssetsError> {
        let order = self.endian();
        let record = *self.meta.find(id).ok_or(AssetsError::ObjectNotFound(id))?;
        let mut section = self.section(&record)?;
        Ok(crate::codec::read_exact(&mut section, order)?)
    }

    /// Check the header / object table invariants of a packed container.
    ///
    /// Files produced by [`crate::rebuild`] always pass.  Original game files
    /// may carry extra padding before the payload region and fail the
    /// `data_offset` check while still being readable.
    pub fn validate(&self) -> Result<(), AssetsError> {
        let h = &self.header;
        let expected_offset = align(HEADER_SIZE + u64::from(h.meta_size), OBJECT_ALIGN);
        if u64::from(h.data_offset) != expected_offset {
            return Err(AssetsError::Layout(format!(
                "data_offset {} != align(header + meta_size, 8) = {expected_offset}",
                h.data_offset
            )));
        }

        let region = u64::from(h.file_size).checked_sub(u64::from(h.data_offset)).ok_or_else(|| {
            AssetsError::Layout(format!("file_size {} is before data_offset {}", h.file_size, h.data_offset))
        })?;

        let mut payload = 0u64;
        let mut prev_end = 0u64;
        for (i, obj) in self.meta.objects.iter().enumerate() {
            let shift = u64::from(obj.shift);
            let end = shift + u64::from(obj.size);
            if i > 0 && shift < prev_end {
                return Err(AssetsError::Layout(format!("object {} overlaps its predecessor", obj.id)));
            }
            if end > region {
                return Err(AssetsError::Layout(format!("object {} ends past file_size", obj.id)));
            }
            prev_end = end;
            payload += align(obj.size.into(), OBJECT_ALIGN);
        }
        if u64::from(h.file_size) != u64::from(h.data_offset) + payload {
            return Err(AssetsError::Layout(format!(
                "file_size {} != data_offset + aligned payload {}",
                h.file_size,
                u64::from(h.data_offset) + payload
            )));
        }

        let mut ids: Vec<u32> = self.meta.objects.iter().map(|o| o.id).collect();
        ids.sort_unstable();
        if let Some(w) = ids.windows(2).find(|w| w[0] == w[1]) {
            return Err(AssetsError::Layout(format!("duplicate object id {}", w[0])));
        }
        Ok(())
    }

    /// Release the underlying stream.
    pub fn close(self) -> Result<(), AssetsError> {
        drop(self.reader.into_inner());
        Ok(())
    }
}
