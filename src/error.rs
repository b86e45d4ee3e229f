//! Error types for ECM encoding

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::SectorType;

/// Errors that can occur while encoding an image
#[derive(Debug, Error)]
pub enum EcmError {
    /// Failed to open the source image
    #[error("Failed to open file for reading: {file}: {source}")]
    FileOpenError {
        file: PathBuf,
        source: std::io::Error,
    },

    /// Failed to create the output file
    #[error("Failed to create output file: {file}: {source}")]
    FileCreateError {
        file: PathBuf,
        source: std::io::Error,
    },

    /// Failed to seek in the source
    #[error("Failed to seek to offset {offset}: {source}")]
    SeekError { offset: u64, source: std::io::Error },

    /// Failed to read from the source
    #[error("Failed to read {length} bytes at offset {offset}: {source}")]
    ReadError {
        offset: u64,
        length: usize,
        source: std::io::Error,
    },

    /// Failed to write encoded output
    #[error("Failed to write output: {0}")]
    WriteError(#[source] std::io::Error),

    /// Payload handed to sector reconstruction has the wrong size
    #[error("Payload length mismatch for {sector_type} sector: expected {expected}, got {actual}")]
    PayloadLength {
        sector_type: SectorType,
        expected: usize,
        actual: usize,
    },
}

/// Type alias for Result with EcmError
pub type Result<T> = std::result::Result<T, EcmError>;
