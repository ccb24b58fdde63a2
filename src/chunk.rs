use crate::codec::Codec;
use crate::error::{MtcError, Result};
use crate::io::ByteSource;
use serde::Serialize;

/// Position and size of one chunk inside the source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkDescriptor {
    pub index: usize,
    pub byte_offset: u64,
    pub original_length: usize,
}

/// Raw bytes of one chunk, owned by whoever is processing it
#[derive(Debug, Clone)]
pub struct RawChunk {
    pub index: usize,
    pub data: Vec<u8>,
}

impl RawChunk {
    pub fn new(index: usize, data: Vec<u8>) -> Self {
        Self { index, data }
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }
}

/// Output of compressing one chunk
#[derive(Debug)]
pub struct ChunkResult {
    pub index: usize,
    pub compressed: Vec<u8>,
}

/// Per-chunk sizes as recorded in a container
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChunkInfo {
    pub index: usize,
    pub original_size: u64,
    pub compressed_size: u64,
}

/// Partition `total_len` bytes into fixed-size chunk descriptors.
///
/// Every chunk is `chunk_size` long except the last, which takes the rest.
pub fn plan_chunks(total_len: u64, chunk_size: usize) -> Result<Vec<ChunkDescriptor>> {
    if chunk_size == 0 {
        return Err(MtcError::Config("chunk size must be greater than zero".to_string()));
    }

    let chunk_size_u64 = chunk_size as u64;
    let chunk_count = total_len.div_ceil(chunk_size_u64);
    if chunk_count > u32::MAX as u64 {
        return Err(MtcError::Config(format!(
            "{} chunks of {} bytes exceed the container limit",
            chunk_count, chunk_size
        )));
    }

    let descriptors = (0..chunk_count)
        .map(|i| {
            let byte_offset = i * chunk_size_u64;
            let original_length = (total_len - byte_offset).min(chunk_size_u64) as usize;
            ChunkDescriptor {
                index: i as usize,
                byte_offset,
                original_length,
            }
        })
        .collect();

    Ok(descriptors)
}

/// Read the bytes a descriptor points at, failing on a short read
pub fn read_chunk<S: ByteSource + ?Sized>(source: &mut S, descriptor: &ChunkDescriptor) -> Result<RawChunk> {
    let data = source.read_at(descriptor.byte_offset, descriptor.original_length)?;
    if data.len() != descriptor.original_length {
        return Err(MtcError::ShortRead {
            index: descriptor.index,
            expected: descriptor.original_length,
            actual: data.len(),
        });
    }
    Ok(RawChunk::new(descriptor.index, data))
}

/// Compress a single chunk, consuming its raw bytes
pub fn compress_chunk<C: Codec + ?Sized>(chunk: RawChunk, codec: &C) -> ChunkResult {
    let compressed = codec.compress(&chunk.data);
    log::debug!(
        "Chunk {} compressed: {} -> {} bytes",
        chunk.index,
        chunk.size(),
        compressed.len()
    );
    ChunkResult {
        index: chunk.index,
        compressed,
    }
}

/// Decompress one record and check it against its declared size
pub fn decompress_chunk<C: Codec + ?Sized>(
    index: usize,
    payload: &[u8],
    original_size: u64,
    codec: &C,
) -> Result<Vec<u8>> {
    let data = codec.decompress(payload)?;
    if data.len() as u64 != original_size {
        return Err(MtcError::SizeMismatch {
            index,
            expected: original_size,
            actual: data.len() as u64,
        });
    }
    Ok(data)
}
