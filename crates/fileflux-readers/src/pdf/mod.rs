//! PDF reader: layout-aware extraction over a [`PdfDecoder`].
//!
//! Concrete PDF byte parsing is delegated to a decoder implementing
//! [`PdfDecoder`]; everything FileFlux does with the decoder's output
//! (row grouping, table detection, heading inference, page merging) lives
//! here and is pure Rust.

pub mod blocks;
pub mod bookmarks;
pub mod images;
pub mod layout;
pub mod pages;
pub mod table;

#[cfg(feature = "pdfium")]
pub mod pdfium;

pub use bookmarks::OutlineEntry;
pub use images::DecodedImage;
pub use layout::PdfWord;

use crate::traits::{DocumentReader, ReaderInput, ReadStructure, StructureUnit};
use fileflux_core::{
    CancellationToken, DetectionMethod, ExtractOptions, FileFluxError, InputFormat, RawContent,
    Result, Table, TextBlock,
};

/// Decoder surface the PDF reader consumes.
///
/// Implementations own the open document handle; it is released when the
/// decoder is dropped, on every exit path.
pub trait PdfDecoder {
    /// Number of pages in the document.
    fn page_count(&self) -> usize;

    /// Document title from the metadata dictionary.
    fn title(&self) -> Option<String> {
        None
    }

    /// Document author from the metadata dictionary.
    fn author(&self) -> Option<String> {
        None
    }

    /// Words of one page (0-based), with boxes and font metrics.
    ///
    /// # Errors
    /// A failed page returns a message; the reader records it as a warning
    /// and skips the page.
    fn page_words(&self, page_index: usize) -> std::result::Result<Vec<PdfWord>, String>;

    /// Flattened outline entries, empty when the document has none.
    fn outline(&self) -> Vec<OutlineEntry> {
        Vec::new()
    }

    /// Embedded images of one page (0-based).
    ///
    /// # Errors
    /// A failed page returns a message; the reader records it as a warning.
    fn page_images(&self, page_index: usize) -> std::result::Result<Vec<DecodedImage>, String> {
        let _ = page_index;
        Ok(Vec::new())
    }
}

/// Opens a [`PdfDecoder`] for an input.
pub trait PdfDecoderOpener: Send + Sync {
    /// Open the document.
    ///
    /// # Errors
    /// Returns [`FileFluxError::DocumentProcessing`] when the document
    /// cannot be opened.
    fn open(&self, input: &ReaderInput) -> Result<Box<dyn PdfDecoder>>;
}

/// The PDF reader.
pub struct PdfReader {
    opener: Box<dyn PdfDecoderOpener>,
}

impl std::fmt::Debug for PdfReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PdfReader").finish_non_exhaustive()
    }
}

enum PageItem {
    Text { top: f32, text: String },
    ImageMarker(String),
}

impl PdfReader {
    /// Create a reader over the given decoder opener.
    pub fn new(opener: Box<dyn PdfDecoderOpener>) -> Self {
        Self { opener }
    }

    /// Create a reader backed by the bundled pdfium decoder.
    #[cfg(feature = "pdfium")]
    pub fn with_pdfium() -> Self {
        Self::new(Box::new(pdfium::PdfiumOpener::new()))
    }

    fn page_indices(&self, decoder: &dyn PdfDecoder, options: &ExtractOptions) -> Vec<usize> {
        let count = decoder.page_count();
        match options.page_range {
            Some((start, end)) => {
                let start = start.max(1) - 1;
                let end = end.min(count);
                (start..end).collect()
            }
            None => (0..count).collect(),
        }
    }
}

impl DocumentReader for PdfReader {
    fn id(&self) -> &'static str {
        "pdf"
    }

    fn formats(&self) -> &'static [InputFormat] {
        &[InputFormat::Pdf]
    }

    fn read_structure(&self, input: &ReaderInput) -> Result<ReadStructure> {
        let decoder = self.opener.open(input)?;
        Ok(ReadStructure {
            title: decoder.title(),
            author: decoder.author(),
            units: (0..decoder.page_count())
                .map(|i| StructureUnit {
                    index: i,
                    label: format!("page {}", i + 1),
                })
                .collect(),
        })
    }

    fn extract(
        &self,
        input: &ReaderInput,
        options: &ExtractOptions,
        cancel: &CancellationToken,
    ) -> Result<RawContent> {
        cancel.check()?;
        let decoder = self.opener.open(input)?;
        let mut raw = RawContent::new(self.id());

        let page_count = decoder.page_count();
        let indices = self.page_indices(decoder.as_ref(), options);

        let mut all_blocks: Vec<TextBlock> = Vec::new();
        let mut page_texts: Vec<(usize, String)> = Vec::new();
        let mut block_order = 0usize;
        let mut image_index = 0usize;
        let mut images_skipped = 0usize;
        let mut processed = 0usize;

        for &page_idx in &indices {
            cancel.check()?;
            let page_no = page_idx + 1;
            let words = match decoder.page_words(page_idx) {
                Ok(words) => words,
                Err(err) => {
                    raw.push_warning(format!("page {page_no} failed: {err}"));
                    continue;
                }
            };
            processed += 1;
            if words.is_empty() {
                page_texts.push((page_no, String::new()));
                continue;
            }

            let line_height = layout::line_height_estimate(&words);
            let rows = layout::group_rows(words, line_height);

            let mut items: Vec<PageItem> = Vec::new();
            let mut table_rows: Vec<bool> = vec![false; rows.len()];

            if options.extract_tables {
                for candidate in table::detect_tables(&rows) {
                    let (start, end) = candidate.row_range;
                    for flag in &mut table_rows[start..end] {
                        *flag = true;
                    }
                    let top = rows[start]
                        .first()
                        .map(|w| w.bbox.y)
                        .unwrap_or_default();
                    let needs_llm_assist = candidate.confidence < table::CONFIDENCE_THRESHOLD;
                    if needs_llm_assist {
                        raw.push_warning(format!(
                            "page {page_no}: low-confidence table ({:.2})",
                            candidate.confidence
                        ));
                    }
                    let mut table = Table {
                        cells: candidate.cells,
                        has_header: true,
                        confidence: candidate.confidence,
                        method: DetectionMethod::AlignmentPattern,
                        page: page_no,
                        fallback_text: candidate.fallback_text.clone(),
                        needs_llm_assist,
                        bbox: None,
                    };
                    table.normalize();
                    raw.tables.push(table);
                    items.push(PageItem::Text {
                        top,
                        text: candidate.fallback_text,
                    });
                }
            }

            let free_rows: Vec<layout::Row> = rows
                .into_iter()
                .zip(table_rows.iter())
                .filter(|(_, in_table)| !**in_table)
                .map(|(row, _)| row)
                .collect();

            for raw_block in layout::group_blocks(free_rows, line_height) {
                let text = raw_block.text();
                if text.trim().is_empty() {
                    continue;
                }
                let mut block = TextBlock::paragraph(text.clone(), page_no, block_order);
                block.style = Some(raw_block.style());
                if options.preserve_coordinates {
                    block.bbox = raw_block.bbox();
                }
                block_order += 1;
                items.push(PageItem::Text {
                    top: raw_block.top(),
                    text,
                });
                all_blocks.push(block);
            }

            if options.extract_images {
                cancel.check()?;
                match decoder.page_images(page_idx) {
                    Ok(decoded) => {
                        let (mut page_images, skipped) = images::collect_page_images(
                            decoded,
                            page_no,
                            options.max_image_size,
                            &mut image_index,
                        );
                        images_skipped += skipped;
                        for image in &page_images {
                            items.push(PageItem::ImageMarker(image.position_marker.clone()));
                        }
                        raw.images.append(&mut page_images);
                    }
                    Err(err) => {
                        raw.push_warning(format!("page {page_no} images failed: {err}"));
                    }
                }
            }

            items.sort_by(|a, b| {
                let top = |item: &PageItem| match item {
                    PageItem::Text { top, .. } => *top,
                    PageItem::ImageMarker(_) => f32::INFINITY,
                };
                top(a)
                    .partial_cmp(&top(b))
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            let page_text = items
                .into_iter()
                .map(|item| match item {
                    PageItem::Text { text, .. } => text,
                    PageItem::ImageMarker(marker) => marker,
                })
                .collect::<Vec<_>>()
                .join("\n\n");
            page_texts.push((page_no, pages::filter_page_numbers(&page_text)));
        }

        if options.detect_block_types {
            blocks::detect_block_kinds(&mut all_blocks);
        }
        let outline = decoder.outline();
        if !outline.is_empty() {
            bookmarks::promote_bookmark_headings(&mut all_blocks, &outline);
        }

        let (merged, spans) = pages::merge_pages(&page_texts);
        raw.text = fileflux_core::text::normalize_extracted(&merged);
        raw.blocks = all_blocks;

        raw.set_hint("page_count", page_count);
        raw.set_hint("processed_pages", processed);
        raw.set_hint("table_count", raw.tables.len());
        raw.set_hint(
            "low_confidence_table_count",
            raw.tables.iter().filter(|t| t.needs_llm_assist).count(),
        );
        raw.set_hint("images_skipped", images_skipped);
        if let Some(title) = decoder.title() {
            raw.set_hint("title", title);
        }
        if !spans.is_empty() {
            let encoded: Vec<String> = spans
                .iter()
                .map(|s| format!("{}:{}-{}", s.page, s.start, s.end))
                .collect();
            raw.set_hint("page_spans", encoded.join(","));
        }
        if processed < indices.len() {
            raw.push_warning(format!(
                "processed {processed} of {} pages",
                indices.len()
            ));
        }

        if processed == 0 && !indices.is_empty() {
            return Err(FileFluxError::processing(
                input.display_path(),
                self.id(),
                "no page could be decoded",
            ));
        }
        Ok(raw)
    }
}
