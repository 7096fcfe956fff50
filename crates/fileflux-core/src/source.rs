//! Source file metadata.

use crate::error::{FileFluxError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Metadata of an input file, captured once before reading. Immutable after
/// construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFile {
    /// File name without directories.
    pub name: String,
    /// Lowercased extension without the dot; empty when absent.
    pub extension: String,
    /// Size in bytes.
    pub size: u64,
    /// Creation timestamp, when the filesystem provides one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<DateTime<Utc>>,
    /// Last-modification timestamp, when the filesystem provides one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modified: Option<DateTime<Utc>>,
}

impl SourceFile {
    /// Capture metadata from a path on disk.
    ///
    /// # Errors
    /// Returns [`FileFluxError::FileNotFound`] when the path does not exist
    /// and [`FileFluxError::Io`] for other filesystem failures.
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(FileFluxError::FileNotFound(path.to_path_buf()));
        }
        let meta = std::fs::metadata(path)?;
        Ok(Self {
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            extension: extension_of(path),
            size: meta.len(),
            created: meta.created().ok().map(DateTime::<Utc>::from),
            modified: meta.modified().ok().map(DateTime::<Utc>::from),
        })
    }

    /// Build metadata for an in-memory buffer that has no backing file.
    pub fn from_bytes(name: &str, len: usize) -> Self {
        Self {
            name: name.to_string(),
            extension: extension_of(Path::new(name)),
            size: len as u64,
            created: None,
            modified: None,
        }
    }
}

/// Lowercased extension of a path, without the dot.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_lowercased() {
        assert_eq!(extension_of(Path::new("Report.PDF")), "pdf");
        assert_eq!(extension_of(Path::new("notes.md")), "md");
        assert_eq!(extension_of(Path::new("no_extension")), "");
    }

    #[test]
    fn test_from_bytes() {
        let src = SourceFile::from_bytes("doc.hwpx", 42);
        assert_eq!(src.extension, "hwpx");
        assert_eq!(src.size, 42);
        assert!(src.modified.is_none());
    }

    #[test]
    fn test_missing_file_is_file_not_found() {
        let err = SourceFile::from_path(Path::new("/definitely/not/here.pdf")).unwrap_err();
        assert!(matches!(err, FileFluxError::FileNotFound(_)));
    }
}
