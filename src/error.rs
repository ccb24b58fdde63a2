use thiserror::Error;

#[derive(Error, Debug)]
pub enum MtcError {
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	#[error("Input is empty, nothing to compress")]
	EmptyInput,

	#[error("Short read on chunk {index}: expected {expected} bytes, got {actual}")]
	ShortRead { index: usize, expected: usize, actual: usize },

	#[error("Malformed MTC container: {0}")]
	MalformedContainer(String),

	#[error("Truncated token stream at position {position}: {needed} more byte(s) expected")]
	TruncatedStream { position: usize, needed: usize },

	#[error("Invalid back-reference: offset {offset} with only {produced} byte(s) produced")]
	InvalidBackReference { offset: usize, produced: usize },

	#[error("Unknown token flag {flag:#04x} at position {position}")]
	UnknownToken { flag: u8, position: usize },

	#[error("Chunk {index} decompressed to {actual} bytes, container declares {expected}")]
	SizeMismatch { index: usize, expected: u64, actual: u64 },

	#[error("Configuration error: {0}")]
	Config(String),

	#[error("Worker finished without producing a result")]
	WorkerLost,
}

pub type Result<T> = std::result::Result<T, MtcError>;
