use crate::error::{MtcError, Result};

pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024; // 1 MiB
pub const DEFAULT_WINDOW_SIZE: usize = 4096;
pub const DEFAULT_MAX_MATCH_LENGTH: usize = 255;

/// Largest back-reference distance a match token can carry.
pub const MAX_WINDOW_SIZE: usize = u16::MAX as usize;
/// Largest run a match token can carry.
pub const MAX_MATCH_LENGTH: usize = u8::MAX as usize;

#[derive(Debug, Clone)]
pub struct MtcConfig {
    pub chunk_size: usize,
    pub threads: usize,
    pub window_size: usize,
    pub max_match_length: usize,
    pub show_progress: bool,
}

impl Default for MtcConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            threads: default_threads(),
            window_size: DEFAULT_WINDOW_SIZE,
            max_match_length: DEFAULT_MAX_MATCH_LENGTH,
            show_progress: false,
        }
    }
}

/// Detected hardware parallelism, never fewer than two workers.
pub fn default_threads() -> usize {
    num_cpus::get().max(2)
}

impl MtcConfig {
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_window_size(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }

    pub fn with_max_match_length(mut self, max_match_length: usize) -> Self {
        self.max_match_length = max_match_length;
        self
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(MtcError::Config("chunk size must be greater than zero".to_string()));
        }
        if self.threads == 0 {
            return Err(MtcError::Config("thread count must be greater than zero".to_string()));
        }
        validate_codec_params(self.window_size, self.max_match_length)
    }
}

/// Window and match limits are bounded by the token wire format
/// (16-bit offsets, 8-bit lengths).
pub fn validate_codec_params(window_size: usize, max_match_length: usize) -> Result<()> {
    if window_size == 0 || window_size > MAX_WINDOW_SIZE {
        return Err(MtcError::Config(format!(
            "window size {} out of range 1..={}",
            window_size, MAX_WINDOW_SIZE
        )));
    }
    if max_match_length == 0 || max_match_length > MAX_MATCH_LENGTH {
        return Err(MtcError::Config(format!(
            "max match length {} out of range 1..={}",
            max_match_length, MAX_MATCH_LENGTH
        )));
    }
    Ok(())
}
