//! Error types for the ingestion pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading, refining, chunking, or writing
/// documents.
///
/// Reader-internal per-page failures are not errors; they are recorded as
/// warnings on [`crate::RawContent`] and processing continues.
#[derive(Error, Debug)]
pub enum FileFluxError {
    /// No registered reader handles the file extension.
    #[error("unsupported format: .{extension}")]
    UnsupportedFormat {
        /// Lowercased extension without the leading dot.
        extension: String,
    },

    /// The input file does not exist.
    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    /// File I/O failure while reading input or writing artifacts.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization or deserialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A reader failed in a way that prevents producing any output.
    ///
    /// Wraps the file path and the reader identifier so the caller can tell
    /// which stage and which input failed.
    #[error("{reader} failed on {path}: {message}")]
    DocumentProcessing {
        /// Path of the input file.
        path: PathBuf,
        /// Identifier of the reader that failed, e.g. `"pdf"`.
        reader: &'static str,
        /// Human-readable failure description.
        message: String,
    },

    /// Stage options failed validation, e.g. overlap not smaller than the
    /// maximum chunk size.
    #[error("invalid options: {0}")]
    InvalidOptions(String),

    /// Enrichment-stage failure that is not recoverable by adaptive
    /// splitting. Enrichment is best-effort; this variant is only surfaced
    /// when the enricher itself is misconfigured.
    #[error("enrichment error: {0}")]
    Enrichment(String),

    /// The operation was cancelled through a [`crate::CancellationToken`].
    #[error("operation cancelled")]
    Cancelled,
}

impl FileFluxError {
    /// Shorthand for a [`FileFluxError::DocumentProcessing`] error.
    pub fn processing(
        path: impl Into<PathBuf>,
        reader: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self::DocumentProcessing {
            path: path.into(),
            reader,
            message: message.into(),
        }
    }
}

/// Type alias for `Result<T, FileFluxError>`.
pub type Result<T> = std::result::Result<T, FileFluxError>;
