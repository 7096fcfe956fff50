//! Extension-based reader dispatch.

use crate::traits::{DocumentReader, ReaderInput, ReadStructure};
use fileflux_core::{
    CancellationToken, ExtractOptions, FileFluxError, RawContent, Result,
};

/// Registry of format readers, dispatching on lowercased extensions.
///
/// New readers are added through [`ReaderRegistry::register`]; no dispatch
/// site changes when a format is added.
pub struct ReaderRegistry {
    readers: Vec<Box<dyn DocumentReader>>,
}

impl std::fmt::Debug for ReaderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ids: Vec<&str> = self.readers.iter().map(|r| r.id()).collect();
        f.debug_struct("ReaderRegistry").field("readers", &ids).finish()
    }
}

impl ReaderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            readers: Vec::new(),
        }
    }

    /// Create a registry with every bundled reader registered.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(crate::markdown::MarkdownReader::new()));
        registry.register(Box::new(crate::html::HtmlReader::new()));
        registry.register(Box::new(crate::docx::DocxReader::new()));
        registry.register(Box::new(crate::xlsx::XlsxReader::new()));
        registry.register(Box::new(crate::pptx::PptxReader::new()));
        registry.register(Box::new(crate::hwp::HwpReader::new()));
        #[cfg(feature = "pdfium")]
        registry.register(Box::new(crate::pdf::PdfReader::with_pdfium()));
        registry
    }

    /// Add a reader. Later registrations win on extension conflicts.
    pub fn register(&mut self, reader: Box<dyn DocumentReader>) {
        self.readers.push(reader);
    }

    /// Find the reader for a lowercased extension.
    ///
    /// # Errors
    /// Returns [`FileFluxError::UnsupportedFormat`] when no reader claims
    /// the extension.
    pub fn reader_for(&self, extension: &str) -> Result<&dyn DocumentReader> {
        self.readers
            .iter()
            .rev()
            .find(|r| r.can_read(extension))
            .map(|reader| &**reader)
            .ok_or_else(|| FileFluxError::UnsupportedFormat {
                extension: extension.to_string(),
            })
    }

    /// Whether any registered reader handles the extension.
    pub fn supports(&self, extension: &str) -> bool {
        self.readers.iter().any(|r| r.can_read(extension))
    }

    /// Dispatch a structure read.
    ///
    /// # Errors
    /// Propagates [`FileFluxError::UnsupportedFormat`] and reader errors.
    pub fn read_structure(&self, input: &ReaderInput) -> Result<ReadStructure> {
        self.reader_for(&input.extension())?.read_structure(input)
    }

    /// Dispatch an extraction.
    ///
    /// # Errors
    /// Propagates [`FileFluxError::UnsupportedFormat`] and reader errors.
    pub fn extract(
        &self,
        input: &ReaderInput,
        options: &ExtractOptions,
        cancel: &CancellationToken,
    ) -> Result<RawContent> {
        cancel.check()?;
        self.reader_for(&input.extension())?
            .extract(input, options, cancel)
    }
}

impl Default for ReaderRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fileflux_core::InputFormat;

    #[test]
    fn test_defaults_cover_core_formats() {
        let registry = ReaderRegistry::with_defaults();
        for ext in ["md", "markdown", "html", "htm", "docx", "xlsx", "pptx", "hwpx"] {
            assert!(registry.supports(ext), "missing reader for {ext}");
        }
    }

    #[test]
    fn test_unknown_extension_is_unsupported() {
        let registry = ReaderRegistry::with_defaults();
        let err = registry.reader_for("xyz").map(|_| ()).unwrap_err();
        match err {
            FileFluxError::UnsupportedFormat { extension } => assert_eq!(extension, "xyz"),
            other => panic!("expected UnsupportedFormat, got {other:?}"),
        }
    }

    #[test]
    fn test_later_registration_wins() {
        struct Probe;
        impl DocumentReader for Probe {
            fn id(&self) -> &'static str {
                "probe"
            }
            fn formats(&self) -> &'static [InputFormat] {
                &[InputFormat::Md]
            }
            fn read_structure(&self, _: &ReaderInput) -> Result<ReadStructure> {
                Ok(ReadStructure::default())
            }
            fn extract(
                &self,
                _: &ReaderInput,
                _: &ExtractOptions,
                _: &CancellationToken,
            ) -> Result<RawContent> {
                Ok(RawContent::new("probe"))
            }
        }

        let mut registry = ReaderRegistry::with_defaults();
        registry.register(Box::new(Probe));
        assert_eq!(registry.reader_for("md").unwrap().id(), "probe");
    }

    #[test]
    fn test_cancelled_extract_short_circuits() {
        let registry = ReaderRegistry::with_defaults();
        let cancel = CancellationToken::new();
        cancel.cancel();
        let input = ReaderInput::bytes("a.md", b"# t".to_vec());
        let err = registry
            .extract(&input, &ExtractOptions::default(), &cancel)
            .unwrap_err();
        assert!(matches!(err, FileFluxError::Cancelled));
    }
}
