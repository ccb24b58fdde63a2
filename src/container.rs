//! Container format for MTC files
//!
//! Layout (all integers little-endian):
//!
//! ```text
//! "MTC1"           4 bytes
//! chunk_count      u32
//! chunk_count x {
//!     original_size    u64
//!     compressed_size  u64
//!     payload          compressed_size bytes (token stream)
//! }
//! ```
//!
//! Record order is chunk index order.

use crate::chunk::ChunkInfo;
use crate::error::{MtcError, Result};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Write};

/// Magic number for MTC files
pub const MAGIC: &[u8; 4] = b"MTC1";

/// Size of the file header in bytes
pub const HEADER_SIZE: u64 = 4 + 4;

/// Size of a record header in bytes
pub const RECORD_HEADER_SIZE: u64 = 8 + 8;

/// Global file header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerHeader {
    pub chunk_count: u32,
}

impl ContainerHeader {
    pub fn new(chunk_count: u32) -> Self {
        Self { chunk_count }
    }

    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(MAGIC)?;
        writer.write_u32::<LittleEndian>(self.chunk_count)?;
        Ok(())
    }

    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let mut magic = [0u8; 4];
        reader
            .read_exact(&mut magic)
            .map_err(|e| header_error(e, "missing magic number"))?;
        if magic != *MAGIC {
            return Err(MtcError::MalformedContainer("invalid magic number".to_string()));
        }

        let chunk_count = reader
            .read_u32::<LittleEndian>()
            .map_err(|e| header_error(e, "truncated header"))?;

        Ok(Self { chunk_count })
    }
}

/// Per-chunk header immediately before its payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordHeader {
    pub original_size: u64,
    pub compressed_size: u64,
}

impl RecordHeader {
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_u64::<LittleEndian>(self.original_size)?;
        writer.write_u64::<LittleEndian>(self.compressed_size)?;
        Ok(())
    }

    pub fn read<R: Read>(reader: &mut R, index: usize) -> Result<Self> {
        let context = format!("truncated record header for chunk {}", index);
        let original_size = reader
            .read_u64::<LittleEndian>()
            .map_err(|e| header_error(e, &context))?;
        let compressed_size = reader
            .read_u64::<LittleEndian>()
            .map_err(|e| header_error(e, &context))?;
        Ok(Self { original_size, compressed_size })
    }
}

/// A record read back from a container
#[derive(Debug, Clone)]
pub struct ChunkRecord {
    pub index: usize,
    pub original_size: u64,
    pub payload: Vec<u8>,
}

fn header_error(e: io::Error, context: &str) -> MtcError {
    if e.kind() == io::ErrorKind::UnexpectedEof {
        MtcError::MalformedContainer(context.to_string())
    } else {
        MtcError::Io(e)
    }
}

/// Serialize a whole container from index-ordered parallel arrays.
///
/// Returns the number of bytes written.
pub fn write_container<W: Write>(
    writer: &mut W,
    original_sizes: &[u64],
    payloads: &[Vec<u8>],
) -> Result<u64> {
    if original_sizes.len() != payloads.len() {
        return Err(MtcError::MalformedContainer(format!(
            "{} original sizes for {} payloads",
            original_sizes.len(),
            payloads.len()
        )));
    }
    let chunk_count = u32::try_from(payloads.len())
        .map_err(|_| MtcError::Config(format!("too many chunks: {}", payloads.len())))?;

    ContainerHeader::new(chunk_count).write(writer)?;
    let mut total_bytes_written = HEADER_SIZE;

    for (original_size, payload) in original_sizes.iter().zip(payloads) {
        let record = RecordHeader {
            original_size: *original_size,
            compressed_size: payload.len() as u64,
        };
        record.write(writer)?;
        writer.write_all(payload)?;
        total_bytes_written += RECORD_HEADER_SIZE + payload.len() as u64;
    }

    Ok(total_bytes_written)
}

/// Streaming reader that yields one record at a time
pub struct ContainerReader<R> {
    reader: R,
    header: ContainerHeader,
    next_index: usize,
}

impl<R: Read> ContainerReader<R> {
    /// Read and validate the file header
    pub fn open(mut reader: R) -> Result<Self> {
        let header = ContainerHeader::read(&mut reader)?;
        Ok(Self {
            reader,
            header,
            next_index: 0,
        })
    }

    pub fn chunk_count(&self) -> usize {
        self.header.chunk_count as usize
    }

    fn next_header(&mut self) -> Result<Option<(usize, RecordHeader)>> {
        if self.next_index >= self.chunk_count() {
            return Ok(None);
        }
        let index = self.next_index;
        let header = RecordHeader::read(&mut self.reader, index)?;
        self.next_index += 1;
        Ok(Some((index, header)))
    }

    /// Read the next record with its payload
    pub fn next_record(&mut self) -> Result<Option<ChunkRecord>> {
        let Some((index, header)) = self.next_header()? else {
            return Ok(None);
        };

        let mut payload = Vec::new();
        (&mut self.reader)
            .take(header.compressed_size)
            .read_to_end(&mut payload)?;
        if (payload.len() as u64) < header.compressed_size {
            return Err(MtcError::TruncatedStream {
                position: payload.len(),
                needed: (header.compressed_size - payload.len() as u64) as usize,
            });
        }

        Ok(Some(ChunkRecord {
            index,
            original_size: header.original_size,
            payload,
        }))
    }

    /// Read the next record header, discarding its payload
    pub fn skip_record(&mut self) -> Result<Option<ChunkInfo>> {
        let Some((index, header)) = self.next_header()? else {
            return Ok(None);
        };

        let skipped = io::copy(&mut (&mut self.reader).take(header.compressed_size), &mut io::sink())?;
        if skipped < header.compressed_size {
            return Err(MtcError::TruncatedStream {
                position: skipped as usize,
                needed: (header.compressed_size - skipped) as usize,
            });
        }

        Ok(Some(ChunkInfo {
            index,
            original_size: header.original_size,
            compressed_size: header.compressed_size,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_header_layout() {
        let mut buffer = Vec::new();
        ContainerHeader::new(3).write(&mut buffer).unwrap();
        assert_eq!(buffer, vec![b'M', b'T', b'C', b'1', 3, 0, 0, 0]);

        let header = ContainerHeader::read(&mut Cursor::new(&buffer)).unwrap();
        assert_eq!(header.chunk_count, 3);
    }

    #[test]
    fn test_bad_magic() {
        let data = b"HLC1\x01\x00\x00\x00".to_vec();
        let err = ContainerHeader::read(&mut Cursor::new(data)).unwrap_err();
        assert!(matches!(err, MtcError::MalformedContainer(_)));
    }

    #[test]
    fn test_truncated_header() {
        let err = ContainerHeader::read(&mut Cursor::new(b"MTC1\x01\x00".to_vec())).unwrap_err();
        assert!(matches!(err, MtcError::MalformedContainer(_)));

        let err = ContainerHeader::read(&mut Cursor::new(b"MT".to_vec())).unwrap_err();
        assert!(matches!(err, MtcError::MalformedContainer(_)));
    }

    #[test]
    fn test_write_and_stream_records() {
        let payloads = vec![b"first".to_vec(), Vec::new(), b"third!".to_vec()];
        let mut buffer = Vec::new();
        let written = write_container(&mut buffer, &[10, 0, 20], &payloads).unwrap();
        assert_eq!(written, buffer.len() as u64);
        assert_eq!(written, HEADER_SIZE + 3 * RECORD_HEADER_SIZE + 11);

        let mut reader = ContainerReader::open(Cursor::new(&buffer)).unwrap();
        assert_eq!(reader.chunk_count(), 3);

        let first = reader.next_record().unwrap().unwrap();
        assert_eq!((first.index, first.original_size), (0, 10));
        assert_eq!(first.payload, b"first");

        let second = reader.next_record().unwrap().unwrap();
        assert_eq!((second.index, second.original_size), (1, 0));
        assert!(second.payload.is_empty());

        let third = reader.next_record().unwrap().unwrap();
        assert_eq!(third.payload, b"third!");

        assert!(reader.next_record().unwrap().is_none());
    }

    #[test]
    fn test_skip_records() {
        let payloads = vec![vec![1u8; 7], vec![2u8; 3]];
        let mut buffer = Vec::new();
        write_container(&mut buffer, &[100, 30], &payloads).unwrap();

        let mut reader = ContainerReader::open(Cursor::new(buffer)).unwrap();
        let info = reader.skip_record().unwrap().unwrap();
        assert_eq!(info, ChunkInfo { index: 0, original_size: 100, compressed_size: 7 });
        let info = reader.skip_record().unwrap().unwrap();
        assert_eq!(info, ChunkInfo { index: 1, original_size: 30, compressed_size: 3 });
        assert!(reader.skip_record().unwrap().is_none());
    }

    #[test]
    fn test_truncated_payload() {
        let mut buffer = Vec::new();
        write_container(&mut buffer, &[5], &[b"abcdef".to_vec()]).unwrap();
        buffer.truncate(buffer.len() - 2);

        let mut reader = ContainerReader::open(Cursor::new(buffer)).unwrap();
        let err = reader.next_record().unwrap_err();
        assert!(matches!(err, MtcError::TruncatedStream { position: 4, needed: 2 }));
    }

    #[test]
    fn test_missing_record_header() {
        let mut buffer = Vec::new();
        ContainerHeader::new(2).write(&mut buffer).unwrap();
        RecordHeader { original_size: 0, compressed_size: 0 }.write(&mut buffer).unwrap();

        let mut reader = ContainerReader::open(Cursor::new(buffer)).unwrap();
        assert!(reader.next_record().unwrap().is_some());
        assert!(matches!(reader.next_record(), Err(MtcError::MalformedContainer(_))));
    }

    #[test]
    fn test_mismatched_arrays() {
        let mut buffer = Vec::new();
        assert!(write_container(&mut buffer, &[1, 2], &[Vec::new()]).is_err());
    }
}
