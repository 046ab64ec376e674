//! Error types for the I/O-facing surfaces.
//!
//! The converters themselves never fail: unsupported input degrades and is recorded
//! as a loss. Errors only come from reading snapshots, decoding image payloads and
//! file access in the CLI.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The snapshot was written by a newer converter.
    #[error("Unsupported document format version {found} (newest supported is {supported})")]
    UnsupportedFormatVersion { found: u32, supported: u32 },

    #[error("Invalid image '{name}': {message}")]
    InvalidImage { name: String, message: String },
}

/// Result type for conversion operations
pub type ConversionResult<T> = Result<T, ConversionError>;
