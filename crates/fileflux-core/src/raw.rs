//! Reader output: normalized text plus structural blocks, tables, images
//! and format-specific hints.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Axis-aligned bounding box in page coordinates (points, top-left origin).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Left edge.
    pub x: f32,
    /// Top edge.
    pub y: f32,
    /// Width.
    pub width: f32,
    /// Height.
    pub height: f32,
}

impl BoundingBox {
    /// Right edge.
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge.
    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }
}

/// Semantic role of a text block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum BlockKind {
    /// Running prose.
    #[default]
    Paragraph,
    /// Section heading; `TextBlock::heading_level` carries the level.
    Heading,
    /// Bulleted or numbered list entry.
    ListItem,
    /// Fenced or indented code.
    CodeBlock,
    /// Quoted text.
    Quote,
}

/// Font-derived style of a block, when the source format exposes it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TextStyle {
    /// Font family name, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_name: Option<String>,
    /// Point size.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<f32>,
    /// Bold face.
    #[serde(default)]
    pub bold: bool,
    /// Italic face.
    #[serde(default)]
    pub italic: bool,
}

/// A contiguous run of text with a single semantic role.
///
/// Block order reflects logical reading order after layout analysis; blocks
/// never overlap in text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextBlock {
    /// Block text.
    pub content: String,
    /// 1-based page number the block came from.
    pub page: usize,
    /// Monotonic order index within the document.
    pub order: usize,
    /// Semantic role.
    pub kind: BlockKind,
    /// Heading level 1 to 6, for [`BlockKind::Heading`] blocks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading_level: Option<u8>,
    /// Whether a list item belongs to an ordered list.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ordered: Option<bool>,
    /// Style of the block's first letter, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<TextStyle>,
    /// Layout position, when coordinates are preserved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BoundingBox>,
}

impl TextBlock {
    /// Create a paragraph block with just content, page and order.
    pub fn paragraph(content: impl Into<String>, page: usize, order: usize) -> Self {
        Self {
            content: content.into(),
            page,
            order,
            kind: BlockKind::Paragraph,
            heading_level: None,
            ordered: None,
            style: None,
            bbox: None,
        }
    }

    /// Create a heading block at the given level (clamped to 1..=6).
    pub fn heading(content: impl Into<String>, level: u8, page: usize, order: usize) -> Self {
        Self {
            kind: BlockKind::Heading,
            heading_level: Some(level.clamp(1, 6)),
            ..Self::paragraph(content, page, order)
        }
    }
}

/// How a table was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetectionMethod {
    /// Column positions inferred from word-alignment patterns.
    AlignmentPattern,
    /// Generic layout heuristics.
    Heuristic,
    /// The source format carries native table structure.
    Native,
}

/// A detected table as a rectangular cell matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Rows of cell strings. All rows have the same column count; short
    /// rows are padded with empty strings by [`Table::normalize`].
    pub cells: Vec<Vec<String>>,
    /// Whether the first row is a header row.
    pub has_header: bool,
    /// Detection confidence in `[0, 1]`.
    pub confidence: f32,
    /// How the table was found.
    pub method: DetectionMethod,
    /// 1-based page number.
    pub page: usize,
    /// Plain-text rendering used when confidence is too low for a cell
    /// matrix to be trusted.
    pub fallback_text: String,
    /// Confidence below threshold; downstream consumers should prefer
    /// `fallback_text`.
    #[serde(default)]
    pub needs_llm_assist: bool,
    /// Layout position, when coordinates are preserved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BoundingBox>,
}

impl Table {
    /// Number of columns, taken from the widest row.
    pub fn column_count(&self) -> usize {
        self.cells.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Pad short rows with empty strings so every row has the same column
    /// count.
    pub fn normalize(&mut self) {
        let cols = self.column_count();
        for row in &mut self.cells {
            while row.len() < cols {
                row.push(String::new());
            }
        }
    }
}

/// Payload of an extracted image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ImageData {
    /// Raw bytes owned by the extraction stage.
    Embedded(Vec<u8>),
    /// External location; the bytes were never loaded or were replaced by a
    /// file reference.
    External(String),
}

impl ImageData {
    /// Byte length for embedded payloads, 0 for external references.
    pub fn len(&self) -> usize {
        match self {
            Self::Embedded(bytes) => bytes.len(),
            Self::External(_) => 0,
        }
    }

    /// True when there is no embedded payload.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An image referenced by the document text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    /// Stable identifier, e.g. `img_003`.
    pub id: String,
    /// Caption or alt text, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    /// Bytes or external URL.
    pub data: ImageData,
    /// MIME type, e.g. `image/png`.
    pub mime_type: String,
    /// Placeholder string marking the insertion point in the body text.
    pub position_marker: String,
    /// Original pixel dimensions, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<(u32, u32)>,
    /// Free-form per-image properties (vision captions land here).
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub properties: HashMap<String, String>,
}

/// Reader output: the normalized intermediate representation every
/// downstream stage consumes.
///
/// Read-only after emission; refinement and chunking produce new values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RawContent {
    /// Plain-text rendition of the document.
    pub text: String,
    /// Structural blocks in reading order.
    pub blocks: Vec<TextBlock>,
    /// Detected tables in document order.
    pub tables: Vec<Table>,
    /// Extracted images.
    pub images: Vec<Image>,
    /// Format-specific signals (page count, table count, worksheet count,
    /// has_headers and similar), string-keyed.
    pub hints: HashMap<String, String>,
    /// Non-fatal problems encountered while reading.
    pub warnings: Vec<String>,
    /// Identifier of the reader that produced this content.
    pub reader: String,
}

impl RawContent {
    /// Create empty content tagged with the producing reader.
    pub fn new(reader: impl Into<String>) -> Self {
        Self {
            reader: reader.into(),
            ..Self::default()
        }
    }

    /// Record a non-fatal problem.
    pub fn push_warning(&mut self, warning: impl Into<String>) {
        let warning = warning.into();
        tracing::warn!(reader = %self.reader, "{warning}");
        self.warnings.push(warning);
    }

    /// Set a string hint.
    pub fn set_hint(&mut self, key: &str, value: impl ToString) {
        self.hints.insert(key.to_string(), value.to_string());
    }

    /// Read a hint parsed as `usize`, if present and well formed.
    pub fn hint_usize(&self, key: &str) -> Option<usize> {
        self.hints.get(key).and_then(|v| v.parse().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_normalize_pads_short_rows() {
        let mut table = Table {
            cells: vec![
                vec!["a".into(), "b".into(), "c".into()],
                vec!["d".into()],
            ],
            has_header: true,
            confidence: 0.9,
            method: DetectionMethod::AlignmentPattern,
            page: 1,
            fallback_text: String::new(),
            needs_llm_assist: false,
            bbox: None,
        };
        table.normalize();
        assert_eq!(table.cells[1], vec!["d".to_string(), String::new(), String::new()]);
        assert_eq!(table.column_count(), 3);
    }

    #[test]
    fn test_heading_level_clamped() {
        let block = TextBlock::heading("Title", 9, 1, 0);
        assert_eq!(block.heading_level, Some(6));
        assert_eq!(block.kind, BlockKind::Heading);
    }

    #[test]
    fn test_hints_round_trip() {
        let mut raw = RawContent::new("pdf");
        raw.set_hint("page_count", 12usize);
        assert_eq!(raw.hint_usize("page_count"), Some(12));
        assert_eq!(raw.hint_usize("missing"), None);
    }

    #[test]
    fn test_warnings_accumulate() {
        let mut raw = RawContent::new("xlsx");
        raw.push_warning("sheet 2 failed");
        raw.push_warning("sheet 5 failed");
        assert_eq!(raw.warnings.len(), 2);
    }
}
