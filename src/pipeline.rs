//! Chunk orchestration
//!
//! Compression fans chunks out to a worker pool and joins on every handle
//! before anything is written. Decompression walks the container record by
//! record and streams each decoded chunk straight to the sink.

use crate::chunk::{compress_chunk, decompress_chunk, plan_chunks, read_chunk, ChunkInfo, ChunkResult};
use crate::codec::{Codec, Lz77};
use crate::config::MtcConfig;
use crate::container::{write_container, ChunkRecord, ContainerReader, HEADER_SIZE, RECORD_HEADER_SIZE};
use crate::error::{MtcError, Result};
use crate::io::ByteSource;
use crate::threadpool::{TaskHandle, WorkerPool};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::Serialize;
use std::io::{Read, Write};
use std::sync::Arc;
use std::time::Instant;

const BYTES_TEMPLATE: &str =
	"{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})";
const CHUNKS_TEMPLATE: &str =
	"{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] Chunks {pos}/{len} ({eta})";

#[derive(Debug, Clone, Serialize)]
pub struct CompressionStats {
	pub original_size: u64,
	pub compressed_size: u64,
	pub ratio: f64,
	pub chunks_processed: usize,
	pub threads: usize,
	pub elapsed_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct DecompressionStats {
	pub compressed_size: u64,
	pub decompressed_size: u64,
	pub chunks_processed: usize,
	pub elapsed_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FileInfo {
	pub chunk_count: usize,
	pub original_size: u64,
	pub compressed_size: u64,
	pub compression_ratio: f64,
	pub chunks: Vec<ChunkInfo>,
}

fn progress_bar(show: bool, len: u64, template: &str) -> ProgressBar {
	if !show {
		return ProgressBar::hidden();
	}
	let pb = ProgressBar::new(len);
	let style = ProgressStyle::with_template(template)
		.map(|style| style.progress_chars("#>-"))
		.unwrap_or_else(|_| ProgressStyle::default_bar());
	pb.set_style(style);
	pb
}

fn ratio(original: u64, compressed: u64) -> f64 {
	if compressed > 0 { original as f64 / compressed as f64 } else { 0.0 }
}

/// Compress `source` into an MTC container written to `sink`
pub fn compress<S: ByteSource + ?Sized, W: Write>(
	source: &mut S,
	sink: &mut W,
	config: &MtcConfig,
) -> Result<CompressionStats> {
	config.validate()?;
	let codec = Lz77::from_config(config)?;
	compress_with(source, sink, config, Arc::new(codec))
}

/// Compress with an explicit codec
pub fn compress_with<S, W, C>(
	source: &mut S,
	sink: &mut W,
	config: &MtcConfig,
	codec: Arc<C>,
) -> Result<CompressionStats>
where
	S: ByteSource + ?Sized,
	W: Write,
	C: Codec + 'static,
{
	config.validate()?;
	let start = Instant::now();

	let total_len = source.total_len()?;
	if total_len == 0 {
		return Err(MtcError::EmptyInput);
	}

	let descriptors = plan_chunks(total_len, config.chunk_size)?;
	let chunk_count = descriptors.len();
	log::info!(
		"Input size: {} bytes; chunks: {} ({} bytes each); codec: {}",
		total_len, chunk_count, config.chunk_size, codec.name()
	);

	let pb = progress_bar(config.show_progress, total_len, BYTES_TEMPLATE);
	let pool = WorkerPool::new(config.threads);
	let threads = pool.num_workers();
	log::info!("Using {} worker threads", threads);

	let mut handles: Vec<TaskHandle<ChunkResult>> = Vec::with_capacity(chunk_count);
	let mut read_error = None;
	for descriptor in &descriptors {
		let chunk = match read_chunk(source, descriptor) {
			Ok(chunk) => chunk,
			Err(e) => {
				log::error!("Failed to read chunk {}: {}", descriptor.index, e);
				read_error = Some(e);
				break;
			}
		};
		let codec = Arc::clone(&codec);
		handles.push(pool.submit(move || compress_chunk(chunk, codec.as_ref())));
	}

	// Barrier: every submitted handle is awaited before the pool goes away.
	let mut payloads: Vec<Vec<u8>> = vec![Vec::new(); chunk_count];
	let mut worker_error = None;
	for handle in handles {
		match handle.wait() {
			Ok(result) => {
				pb.inc(descriptors[result.index].original_length as u64);
				payloads[result.index] = result.compressed;
			}
			Err(e) => {
				worker_error.get_or_insert(e);
			}
		}
	}
	pool.shutdown();

	if let Some(e) = read_error.or(worker_error) {
		pb.abandon();
		return Err(e);
	}
	pb.finish_with_message("Compression finished");

	let original_sizes: Vec<u64> = descriptors.iter().map(|d| d.original_length as u64).collect();
	let compressed_size = write_container(sink, &original_sizes, &payloads)?;
	sink.flush()?;

	let stats = CompressionStats {
		original_size: total_len,
		compressed_size,
		ratio: ratio(total_len, compressed_size),
		chunks_processed: chunk_count,
		threads,
		elapsed_ms: start.elapsed().as_millis() as u64,
	};
	log::info!(
		"Compressed {} -> {} bytes ({:.2}x) in {} ms",
		stats.original_size, stats.compressed_size, stats.ratio, stats.elapsed_ms
	);
	Ok(stats)
}

/// Decompress an MTC container from `reader` into `writer`
pub fn decompress<R: Read, W: Write>(reader: &mut R, writer: &mut W, show_progress: bool) -> Result<DecompressionStats> {
	decompress_with(reader, writer, show_progress, &Lz77::default())
}

/// Decompress with an explicit codec.
///
/// Records are decoded in file order and each one is written as soon as it
/// has been decoded and checked, so a failure leaves nothing of the failing
/// chunk in the sink.
pub fn decompress_with<R, W, C>(
	reader: &mut R,
	writer: &mut W,
	show_progress: bool,
	codec: &C,
) -> Result<DecompressionStats>
where
	R: Read,
	W: Write,
	C: Codec + ?Sized,
{
	let start = Instant::now();
	let mut container = ContainerReader::open(reader)?;
	log::info!("Container holds {} chunks", container.chunk_count());

	let pb = progress_bar(show_progress, container.chunk_count() as u64, CHUNKS_TEMPLATE);
	let mut compressed_size = HEADER_SIZE;
	let mut decompressed_size = 0u64;
	let mut chunks_processed = 0usize;

	while let Some(record) = container.next_record().inspect_err(|_| pb.abandon())? {
		let data = decompress_chunk(record.index, &record.payload, record.original_size, codec)
			.inspect_err(|e| {
				log::error!("Chunk {} failed to decompress: {}", record.index, e);
				pb.abandon();
			})?;
		writer.write_all(&data)?;

		log::debug!("Chunk {} decompressed: {} -> {} bytes", record.index, record.payload.len(), data.len());
		compressed_size += RECORD_HEADER_SIZE + record.payload.len() as u64;
		decompressed_size += data.len() as u64;
		chunks_processed += 1;
		pb.inc(1);
	}

	writer.flush()?;
	pb.finish_with_message("Decompression finished");

	Ok(DecompressionStats {
		compressed_size,
		decompressed_size,
		chunks_processed,
		elapsed_ms: start.elapsed().as_millis() as u64,
	})
}

/// Summarize a container from its record headers without decoding payloads
pub fn info<R: Read>(reader: &mut R) -> Result<FileInfo> {
	let mut container = ContainerReader::open(reader)?;
	// The record count comes from the header and is not trusted for allocation.
	let mut chunks = Vec::new();
	while let Some(chunk) = container.skip_record()? {
		chunks.push(chunk);
	}
	Ok(file_info(chunks))
}

/// Decode every record in parallel and check the declared sizes.
///
/// Nothing is written; the failing chunk with the lowest index is reported.
pub fn validate<R: Read>(reader: &mut R) -> Result<FileInfo> {
	let mut container = ContainerReader::open(reader)?;
	let mut records: Vec<ChunkRecord> = Vec::new();
	while let Some(record) = container.next_record()? {
		records.push(record);
	}

	let codec = Lz77::default();
	let outcomes: Vec<Result<()>> = records
		.par_iter()
		.map(|record| decompress_chunk(record.index, &record.payload, record.original_size, &codec).map(|_| ()))
		.collect();
	if let Some(e) = outcomes.into_iter().find_map(|outcome| outcome.err()) {
		return Err(e);
	}

	let chunks = records
		.iter()
		.map(|record| ChunkInfo {
			index: record.index,
			original_size: record.original_size,
			compressed_size: record.payload.len() as u64,
		})
		.collect();
	log::info!("Validated {} chunks", records.len());
	Ok(file_info(chunks))
}

fn file_info(chunks: Vec<ChunkInfo>) -> FileInfo {
	let original_size = chunks.iter().map(|c| c.original_size).sum();
	let compressed_size = HEADER_SIZE + chunks.iter().map(|c| RECORD_HEADER_SIZE + c.compressed_size).sum::<u64>();
	FileInfo {
		chunk_count: chunks.len(),
		original_size,
		compressed_size,
		compression_ratio: ratio(original_size, compressed_size),
		chunks,
	}
}
