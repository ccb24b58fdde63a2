//! Byte-range sources for the compression path
//!
//! Compression reads each chunk independently by offset, so the input side is
//! modelled as a random-access source rather than a plain stream.

use std::io::{self, Read, Seek, SeekFrom};

/// Readable byte range with a known total size
pub trait ByteSource {
    /// Total number of bytes available
    fn total_len(&mut self) -> io::Result<u64>;

    /// Read up to `len` bytes starting at `offset`.
    ///
    /// Returns fewer bytes only when the source ends early.
    fn read_at(&mut self, offset: u64, len: usize) -> io::Result<Vec<u8>>;
}

/// Adapter exposing any `Read + Seek` value (files, cursors) as a `ByteSource`
#[derive(Debug)]
pub struct ReaderSource<R> {
    inner: R,
}

impl<R: Read + Seek> ReaderSource<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }
}

impl<R: Read + Seek> ByteSource for ReaderSource<R> {
    fn total_len(&mut self) -> io::Result<u64> {
        self.inner.seek(SeekFrom::End(0))
    }

    fn read_at(&mut self, offset: u64, len: usize) -> io::Result<Vec<u8>> {
        self.inner.seek(SeekFrom::Start(offset))?;
        let mut buffer = Vec::with_capacity(len);
        (&mut self.inner).take(len as u64).read_to_end(&mut buffer)?;
        Ok(buffer)
    }
}
