use std::io::{self, Read, Seek, SeekFrom};

/// Upper bound on bytes preallocated from an untrusted section length.
const MAX_PREALLOC: u64 = 64 * 1024;

/// A window of exactly `len` bytes starting at `start` in an underlying stream.
///
/// Reads stop at the end of the window, so a consumer can never observe the
/// bytes of a neighbouring object; `read_exact` past the end fails with
/// `UnexpectedEof`.  Seek offsets are relative to the window.
pub struct Section<'a, R> {
    inner: &'a mut R,
    start: u64,
    len:   u64,
    pos:   u64,
}

impl<'a, R: Read + Seek> Section<'a, R> {
    pub fn new(inner: &'a mut R, start: u64, len: u64) -> io::Result<Self> {
        inner.seek(SeekFrom::Start(start))?;
        Ok(Self { inner, start, len, pos: 0 })
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Absolute offset of the window in the underlying stream.
    pub fn start(&self) -> u64 {
        self.start
    }

    /// Read the rest of the window into a new buffer.
    pub fn read_remaining(&mut self) -> io::Result<Vec<u8>> {
        let remaining = self.len.saturating_sub(self.pos);
        let mut buf = Vec::with_capacity(remaining.min(MAX_PREALLOC) as usize);
        self.read_to_end(&mut buf)?;
        Ok(buf)
    }
}

impl<R: Read + Seek> Read for Section<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pos >= self.len || buf.is_empty() {
            return Ok(0);
        }
        let max = (self.len - self.pos).min(buf.len() as u64) as usize;
        let n = self.inner.read(&mut buf[..max])?;
        self.pos += n as u64;
        Ok(n)
    }
}

impl<R: Read + Seek> Seek for Section<'_, R> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let target = match pos {
            SeekFrom::Start(n)   => Some(n),
            SeekFrom::End(d)     => self.len.checked_add_signed(d),
            SeekFrom::Current(d) => self.pos.checked_add_signed(d),
        };
        let target = target.ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "seek before start of section")
        })?;
        let absolute = self.start.checked_add(target).ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "seek past end of addressable range")
        })?;
        self.inner.seek(SeekFrom::Start(absolute))?;
        self.pos = target;
        Ok(target)
    }
}
