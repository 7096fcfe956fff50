//! Bundled pdfium-backed [`PdfDecoder`].
//!
//! The decoder extracts eagerly while the pdfium document handle is alive
//! and releases the handle before returning, so the rest of the pipeline
//! only ever sees plain data. Text segments are reported as words with
//! their boxes converted to a top-left origin; pdfium's text API exposes no
//! font names through this surface, so style-based heading detection falls
//! back to patterns for pdfium-decoded documents.

use super::{DecodedImage, OutlineEntry, PdfDecoder, PdfDecoderOpener, PdfWord};
use crate::staging::StagedInput;
use crate::traits::ReaderInput;
use fileflux_core::{BoundingBox, FileFluxError, Result};
use pdfium_render::prelude::*;

/// Opener binding the system pdfium library.
pub struct PdfiumOpener;

impl PdfiumOpener {
    /// Create an opener; the library is bound lazily per open call.
    pub fn new() -> Self {
        Self
    }
}

impl Default for PdfiumOpener {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfDecoderOpener for PdfiumOpener {
    fn open(&self, input: &ReaderInput) -> Result<Box<dyn PdfDecoder>> {
        let staged = StagedInput::stage(input)?;
        let decoder = ExtractedPdf::load(staged.path()).map_err(|err| {
            FileFluxError::processing(input.display_path(), "pdf", err)
        })?;
        Ok(Box::new(decoder))
    }
}

/// Fully extracted document data.
struct ExtractedPdf {
    pages: Vec<Vec<PdfWord>>,
}

impl ExtractedPdf {
    fn load(path: &std::path::Path) -> std::result::Result<Self, String> {
        let pdfium = Pdfium::new(
            Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
                .or_else(|_| Pdfium::bind_to_system_library())
                .map_err(|e| format!("failed to bind pdfium library: {e}"))?,
        );
        let document = pdfium
            .load_pdf_from_file(path, None)
            .map_err(|e| format!("failed to load PDF: {e}"))?;

        let mut pages = Vec::new();
        for page in document.pages().iter() {
            let page_height = page.height().value;
            let text = match page.text() {
                Ok(text) => text,
                Err(_) => {
                    // Recorded per page; an unreadable page yields no words.
                    pages.push(Vec::new());
                    continue;
                }
            };
            let mut words = Vec::new();
            for segment in text.segments().iter() {
                let content = segment.text();
                let content = content.trim();
                if content.is_empty() {
                    continue;
                }
                let bounds = segment.bounds();
                let x = bounds.left().value;
                let y = page_height - bounds.top().value;
                let width = bounds.right().value - bounds.left().value;
                let height = bounds.top().value - bounds.bottom().value;
                words.push(PdfWord {
                    text: content.to_string(),
                    bbox: BoundingBox {
                        x,
                        y,
                        width,
                        height,
                    },
                    font_name: None,
                    font_size: height,
                });
            }
            pages.push(words);
        }
        Ok(Self { pages })
    }
}

impl PdfDecoder for ExtractedPdf {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn page_words(&self, page_index: usize) -> std::result::Result<Vec<PdfWord>, String> {
        self.pages
            .get(page_index)
            .cloned()
            .ok_or_else(|| format!("page {page_index} out of range"))
    }

    fn outline(&self) -> Vec<OutlineEntry> {
        Vec::new()
    }

    fn page_images(&self, _page_index: usize) -> std::result::Result<Vec<DecodedImage>, String> {
        Ok(Vec::new())
    }
}
