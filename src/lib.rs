//! # MTC (Multithreaded Chunked Compressor)
//!
//! Splits input into fixed-size chunks, compresses every chunk independently
//! on a pool of worker threads with a windowed LZ77 codec, and stores the
//! results in a self-describing "MTC1" container that decompresses back into
//! the exact original bytes.
//!
//! ## Quick Start
//!
//! ```rust
//! use mtc::{compress_data, decompress_data, MtcConfig};
//!
//! let original = b"Hello, world! Hello, world! Hello, world!";
//! let config = MtcConfig::default().with_chunk_size(16);
//! let compressed = compress_data(original, &config).unwrap();
//!
//! let decompressed = decompress_data(&compressed).unwrap();
//! assert_eq!(original.to_vec(), decompressed);
//! ```
//!
//! ### Working with Files
//!
//! ```rust,no_run
//! use mtc::{pipeline, MtcConfig, ReaderSource};
//! use std::fs::File;
//! use std::io::BufWriter;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = MtcConfig::default();
//! let mut source = ReaderSource::new(File::open("input.bin")?);
//! let mut sink = BufWriter::new(File::create("output.mtc")?);
//!
//! let stats = pipeline::compress(&mut source, &mut sink, &config)?;
//! println!("Compression ratio: {:.2}x", stats.ratio);
//! # Ok(())
//! # }
//! ```

pub mod chunk;
pub mod cli;
pub mod codec;
pub mod config;
pub mod container;
pub mod error;
pub mod io;
pub mod pipeline;
pub mod threadpool;

// Re-export commonly used types for convenience
pub use chunk::{ChunkDescriptor, ChunkInfo, ChunkResult, RawChunk};
pub use codec::{Codec, Lz77, Token};
pub use config::MtcConfig;
pub use error::{MtcError, Result};
pub use io::{ByteSource, ReaderSource};
pub use pipeline::{compress, decompress, CompressionStats, DecompressionStats, FileInfo};
pub use threadpool::{TaskHandle, WorkerPool};

use std::io::Cursor;

/// Compress an in-memory buffer into an MTC container
pub fn compress_data(data: &[u8], config: &MtcConfig) -> Result<Vec<u8>> {
    let mut source = ReaderSource::new(Cursor::new(data));
    let mut output = Vec::new();

    pipeline::compress(&mut source, &mut output, config)?;
    Ok(output)
}

/// Decompress an in-memory MTC container
pub fn decompress_data(compressed_data: &[u8]) -> Result<Vec<u8>> {
    let mut input = Cursor::new(compressed_data);
    let mut output = Vec::new();

    pipeline::decompress(&mut input, &mut output, false)?;
    Ok(output)
}

/// Get information about an in-memory MTC container
///
/// ```rust
/// use mtc::{compress_data, get_compression_info, MtcConfig};
///
/// let data = vec![0u8; 1000];
/// let compressed = compress_data(&data, &MtcConfig::default()).unwrap();
/// let info = get_compression_info(&compressed).unwrap();
/// assert_eq!(info.original_size, 1000);
/// assert_eq!(info.chunk_count, 1);
/// ```
pub fn get_compression_info(compressed_data: &[u8]) -> Result<FileInfo> {
    let mut input = Cursor::new(compressed_data);
    pipeline::info(&mut input)
}

/// Check that every chunk of an in-memory container decodes to its declared size
pub fn validate_data(compressed_data: &[u8]) -> Result<bool> {
    let mut input = Cursor::new(compressed_data);
    pipeline::validate(&mut input)?;
    Ok(true)
}

/// MTC library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
