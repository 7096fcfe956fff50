//! Reader trait and input types.

use fileflux_core::{
    CancellationToken, ExtractOptions, FileFluxError, InputFormat, RawContent, Result,
};
use std::borrow::Cow;
use std::path::{Path, PathBuf};

/// Input handed to a reader: a path on disk or an in-memory buffer with a
/// file name for extension dispatch.
#[derive(Debug, Clone)]
pub enum ReaderInput {
    /// File on disk.
    Path(PathBuf),
    /// In-memory bytes with an associated file name.
    Bytes {
        /// File name the buffer was received under.
        name: String,
        /// Raw document bytes.
        data: Vec<u8>,
    },
}

impl ReaderInput {
    /// Build an input from a path.
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::Path(path.into())
    }

    /// Build an input from bytes and a file name.
    pub fn bytes(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self::Bytes {
            name: name.into(),
            data,
        }
    }

    /// File name of the input.
    pub fn file_name(&self) -> String {
        match self {
            Self::Path(path) => path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            Self::Bytes { name, .. } => name.clone(),
        }
    }

    /// Lowercased extension without the dot.
    pub fn extension(&self) -> String {
        match self {
            Self::Path(path) => fileflux_core::source::extension_of(path),
            Self::Bytes { name, .. } => fileflux_core::source::extension_of(Path::new(name)),
        }
    }

    /// Path used in error messages.
    pub fn display_path(&self) -> PathBuf {
        match self {
            Self::Path(path) => path.clone(),
            Self::Bytes { name, .. } => PathBuf::from(name),
        }
    }

    /// The document bytes, reading the file for path inputs.
    ///
    /// # Errors
    /// Returns [`FileFluxError::FileNotFound`] for missing paths and
    /// [`FileFluxError::Io`] for read failures.
    pub fn read_bytes(&self) -> Result<Cow<'_, [u8]>> {
        match self {
            Self::Path(path) => {
                if !path.exists() {
                    return Err(FileFluxError::FileNotFound(path.clone()));
                }
                Ok(Cow::Owned(std::fs::read(path)?))
            }
            Self::Bytes { data, .. } => Ok(Cow::Borrowed(data)),
        }
    }
}

/// One page, sheet, slide or section of a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructureUnit {
    /// Zero-based unit index.
    pub index: usize,
    /// Human-readable label, e.g. `"page 3"` or a worksheet name.
    pub label: String,
}

/// Cheap structural metadata: what is in the document, without its body.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReadStructure {
    /// Document title, when the format records one.
    pub title: Option<String>,
    /// Document author, when the format records one.
    pub author: Option<String>,
    /// Pages, sheets, slides or sections in order.
    pub units: Vec<StructureUnit>,
}

/// A format-specific reader.
///
/// Readers are stateless and safe to share; the registry dispatches on the
/// lowercased file extension. Every reader sanitizes its text output (NUL
/// stripping, UTF-8 replacement, `\n` line endings) before returning and
/// records per-page failures as warnings instead of failing the document.
pub trait DocumentReader: Send + Sync {
    /// Short identifier used in provenance and error messages.
    fn id(&self) -> &'static str;

    /// Formats this reader handles.
    fn formats(&self) -> &'static [InputFormat];

    /// Whether this reader handles the given lowercased extension.
    fn can_read(&self, extension: &str) -> bool {
        InputFormat::from_extension(extension)
            .is_some_and(|format| self.formats().contains(&format))
    }

    /// Read structural metadata without extracting the body.
    ///
    /// # Errors
    /// Returns an error when the container cannot be opened at all.
    fn read_structure(&self, input: &ReaderInput) -> Result<ReadStructure>;

    /// Extract the document into [`RawContent`].
    ///
    /// # Errors
    /// Returns an error when nothing at all can be extracted; partial
    /// failures become warnings on the returned content.
    fn extract(
        &self,
        input: &ReaderInput,
        options: &ExtractOptions,
        cancel: &CancellationToken,
    ) -> Result<RawContent>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_extension() {
        assert_eq!(ReaderInput::path("/tmp/Doc.PDF").extension(), "pdf");
        assert_eq!(ReaderInput::bytes("slides.pptx", vec![]).extension(), "pptx");
    }

    #[test]
    fn test_bytes_input_read_back() {
        let input = ReaderInput::bytes("a.md", b"# hi".to_vec());
        assert_eq!(input.read_bytes().unwrap().as_ref(), b"# hi");
        assert_eq!(input.file_name(), "a.md");
    }

    #[test]
    fn test_missing_path_errors() {
        let input = ReaderInput::path("/no/such/file.docx");
        assert!(matches!(
            input.read_bytes(),
            Err(FileFluxError::FileNotFound(_))
        ));
    }
}
