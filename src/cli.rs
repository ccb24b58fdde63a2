use crate::config::{MtcConfig, DEFAULT_CHUNK_SIZE, DEFAULT_MAX_MATCH_LENGTH, DEFAULT_WINDOW_SIZE};
use crate::io::ReaderSource;
use crate::pipeline;
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(author, version, about, long_about = "Multithreaded chunked LZ77 compressor")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compresses a file
    Compress {
        /// Input file to compress
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Output file name
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Chunk size in bytes
        #[arg(short, long, default_value_t = DEFAULT_CHUNK_SIZE)]
        chunk_size: usize,

        /// Number of threads to use (default: all available cores, at least 2)
        #[arg(short, long)]
        threads: Option<usize>,

        /// Maximum back-reference distance
        #[arg(long, default_value_t = DEFAULT_WINDOW_SIZE)]
        window_size: usize,

        /// Maximum match length
        #[arg(long, default_value_t = DEFAULT_MAX_MATCH_LENGTH)]
        max_match: usize,

        /// Show progress
        #[arg(short, long)]
        progress: bool,

        /// Output statistics in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Decompresses a file
    Decompress {
        /// Input file to decompress
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Output file name
        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// Show progress
        #[arg(short, long)]
        progress: bool,
    },
    /// Prints the chunk table of a compressed file
    Info {
        /// Compressed file to inspect
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
    /// Decodes every chunk of a compressed file without writing output
    Validate {
        /// Compressed file to check
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,
    },
}

pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Compress { input, output, chunk_size, threads, window_size, max_match, progress, json } => {
            let mut config = MtcConfig::default()
                .with_chunk_size(chunk_size)
                .with_window_size(window_size)
                .with_max_match_length(max_match)
                .with_progress(progress);
            if let Some(threads) = threads {
                config = config.with_threads(threads);
            }
            config.validate()?;

            if !json {
                println!("Compressing {} to {}...", input.display(), output.display());
            }
            let stats = compress_file(&input, &output, &config)?;

            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("Compression successful!");
                println!("  Original Size:    {} bytes", stats.original_size);
                println!("  Compressed Size:  {} bytes", stats.compressed_size);
                println!("  Ratio:            {:.2}x", stats.ratio);
                println!("  Chunks:           {}", stats.chunks_processed);
                println!("  Threads:          {}", stats.threads);
                println!("  Elapsed Time:     {} ms", stats.elapsed_ms);
            }
        }
        Commands::Decompress { input, output, progress } => {
            println!("Decompressing {} to {}...", input.display(), output.display());

            let stats = decompress_file(&input, &output, progress)?;

            println!("Decompression successful!");
            println!("  Decompressed Size: {} bytes", stats.decompressed_size);
            println!("  Chunks:            {}", stats.chunks_processed);
            println!("  Elapsed Time:      {} ms", stats.elapsed_ms);
        }
        Commands::Info { input, json } => {
            let in_file = File::open(&input).with_context(|| format!("cannot open {}", input.display()))?;
            let info = pipeline::info(&mut BufReader::new(in_file))?;

            if json {
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                println!("{}: {} chunks", input.display(), info.chunk_count);
                println!("  Original Size:    {} bytes", info.original_size);
                println!("  Compressed Size:  {} bytes", info.compressed_size);
                println!("  Ratio:            {:.2}x", info.compression_ratio);
                for chunk in &info.chunks {
                    println!(
                        "  chunk {:>6}: {:>10} -> {:>10} bytes",
                        chunk.index, chunk.original_size, chunk.compressed_size
                    );
                }
            }
        }
        Commands::Validate { input } => {
            let in_file = File::open(&input).with_context(|| format!("cannot open {}", input.display()))?;
            let info = pipeline::validate(&mut BufReader::new(in_file))
                .with_context(|| format!("{} is not a valid MTC file", input.display()))?;
            println!("{}: OK ({} chunks, {} bytes)", input.display(), info.chunk_count, info.original_size);
        }
    }

    Ok(())
}

/// Compress `input` into `output`, removing the output file if compression fails
fn compress_file(input: &Path, output: &Path, config: &MtcConfig) -> anyhow::Result<pipeline::CompressionStats> {
    let in_file = File::open(input).with_context(|| format!("cannot open {}", input.display()))?;
    let mut source = ReaderSource::new(BufReader::new(in_file));

    let out_file = File::create(output).with_context(|| format!("cannot create {}", output.display()))?;
    let mut sink = BufWriter::new(out_file);

    match pipeline::compress(&mut source, &mut sink, config) {
        Ok(stats) => Ok(stats),
        Err(e) => {
            drop(sink);
            if let Err(remove_err) = fs::remove_file(output) {
                log::warn!("Could not remove {}: {}", output.display(), remove_err);
            }
            Err(e).with_context(|| format!("failed to compress {}", input.display()))
        }
    }
}

/// Decompress `input` into `output`, removing the output file if decompression fails
fn decompress_file(input: &Path, output: &Path, progress: bool) -> anyhow::Result<pipeline::DecompressionStats> {
    let in_file = File::open(input).with_context(|| format!("cannot open {}", input.display()))?;
    let mut reader = BufReader::new(in_file);

    let out_file = File::create(output).with_context(|| format!("cannot create {}", output.display()))?;
    let mut writer = BufWriter::new(out_file);

    match pipeline::decompress(&mut reader, &mut writer, progress) {
        Ok(stats) => Ok(stats),
        Err(e) => {
            drop(writer);
            if let Err(remove_err) = fs::remove_file(output) {
                log::warn!("Could not remove {}: {}", output.display(), remove_err);
            }
            Err(e).with_context(|| format!("failed to decompress {}", input.display()))
        }
    }
}
