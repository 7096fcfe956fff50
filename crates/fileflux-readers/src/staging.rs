//! Temp-file staging for decoders that only accept a path.
//!
//! Some native decoders cannot read from memory. [`StagedInput`] writes an
//! in-memory buffer to a named temp file and guarantees removal on every
//! exit path through `Drop`.

use crate::traits::ReaderInput;
use fileflux_core::Result;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// A path usable for the lifetime of one decoder call.
#[derive(Debug)]
pub enum StagedInput {
    /// The input already lives on disk; no staging needed.
    Original(PathBuf),
    /// Bytes staged into a temp file; removed on drop.
    Staged(NamedTempFile),
}

impl StagedInput {
    /// Stage the input so it is reachable through a filesystem path.
    ///
    /// # Errors
    /// Returns I/O errors from temp-file creation or writing.
    pub fn stage(input: &ReaderInput) -> Result<Self> {
        match input {
            ReaderInput::Path(path) => Ok(Self::Original(path.clone())),
            ReaderInput::Bytes { data, .. } => {
                let mut file = NamedTempFile::new()?;
                file.write_all(data)?;
                file.flush()?;
                Ok(Self::Staged(file))
            }
        }
    }

    /// The staged path.
    pub fn path(&self) -> &Path {
        match self {
            Self::Original(path) => path,
            Self::Staged(file) => file.path(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_input_not_staged() {
        let staged = StagedInput::stage(&ReaderInput::path("/tmp/whatever.pdf")).unwrap();
        assert_eq!(staged.path(), Path::new("/tmp/whatever.pdf"));
    }

    #[test]
    fn test_bytes_staged_and_removed() {
        let input = ReaderInput::bytes("x.bin", vec![1, 2, 3]);
        let temp_path;
        {
            let staged = StagedInput::stage(&input).unwrap();
            temp_path = staged.path().to_path_buf();
            assert_eq!(std::fs::read(&temp_path).unwrap(), vec![1, 2, 3]);
        }
        // Dropping the guard removes the staged file.
        assert!(!temp_path.exists());
    }
}
