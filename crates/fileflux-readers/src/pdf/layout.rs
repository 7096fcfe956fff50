//! Geometric layout analysis: words into rows, rows into blocks.
//!
//! Coordinates are in points with a top-left origin; `y` grows downward.

use fileflux_core::{BoundingBox, TextStyle};

/// One word extracted from a PDF page, with its box and font metrics.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfWord {
    /// Word text.
    pub text: String,
    /// Bounding box on the page.
    pub bbox: BoundingBox,
    /// Font name, when the decoder exposes it.
    pub font_name: Option<String>,
    /// Point size. Decoders that cannot report it use the glyph height.
    pub font_size: f32,
}

impl PdfWord {
    /// Bottom edge of the word box.
    pub fn bottom(&self) -> f32 {
        self.bbox.bottom()
    }

    /// Right edge of the word box.
    pub fn right(&self) -> f32 {
        self.bbox.right()
    }

    /// Whether the font name marks a bold face.
    pub fn is_bold(&self) -> bool {
        self.font_name
            .as_deref()
            .is_some_and(|name| name.to_ascii_lowercase().contains("bold"))
    }

    /// Whether the font name marks an italic face.
    pub fn is_italic(&self) -> bool {
        self.font_name.as_deref().is_some_and(|name| {
            let lower = name.to_ascii_lowercase();
            lower.contains("italic") || lower.contains("oblique")
        })
    }

    /// Style record derived from this word's font.
    pub fn style(&self) -> TextStyle {
        TextStyle {
            font_name: self.font_name.clone(),
            font_size: Some(self.font_size),
            bold: self.is_bold(),
            italic: self.is_italic(),
        }
    }
}

/// A horizontal row of words, left to right.
pub type Row = Vec<PdfWord>;

/// Estimate the dominant line height of a page: the median of positive word
/// heights times 1.3, falling back to 12.0 when no word has a height.
pub fn line_height_estimate(words: &[PdfWord]) -> f32 {
    let mut heights: Vec<f32> = words
        .iter()
        .map(|w| w.bbox.height)
        .filter(|h| *h > 0.0)
        .collect();
    if heights.is_empty() {
        return 12.0;
    }
    heights.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    heights[heights.len() / 2] * 1.3
}

/// Group words into rows.
///
/// Words are sorted by bottom edge then left edge; a new row starts when
/// the vertical distance to the previous row exceeds half the line height.
/// Within each row words are sorted left to right.
pub fn group_rows(mut words: Vec<PdfWord>, line_height: f32) -> Vec<Row> {
    if words.is_empty() {
        return Vec::new();
    }
    words.sort_by(|a, b| {
        a.bottom()
            .partial_cmp(&b.bottom())
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(
                a.bbox
                    .x
                    .partial_cmp(&b.bbox.x)
                    .unwrap_or(std::cmp::Ordering::Equal),
            )
    });

    let threshold = 0.5 * line_height;
    let mut rows: Vec<Row> = Vec::new();
    let mut current: Row = Vec::new();
    let mut current_bottom = f32::NEG_INFINITY;

    for word in words {
        if current.is_empty() || (word.bottom() - current_bottom).abs() <= threshold {
            if current.is_empty() {
                current_bottom = word.bottom();
            }
            current.push(word);
        } else {
            rows.push(std::mem::take(&mut current));
            current_bottom = word.bottom();
            current.push(word);
        }
    }
    if !current.is_empty() {
        rows.push(current);
    }

    for row in &mut rows {
        row.sort_by(|a, b| {
            a.bbox
                .x
                .partial_cmp(&b.bbox.x)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    }
    rows
}

/// A group of consecutive rows forming one logical block.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawBlock {
    /// Member rows in reading order.
    pub rows: Vec<Row>,
}

impl RawBlock {
    /// Block text: words joined by spaces, rows joined by newlines.
    pub fn text(&self) -> String {
        self.rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|w| w.text.as_str())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// The first word, whose font sets the block style.
    pub fn first_word(&self) -> Option<&PdfWord> {
        self.rows.first().and_then(|row| row.first())
    }

    /// Style of the block's first letter.
    pub fn style(&self) -> TextStyle {
        self.first_word().map(PdfWord::style).unwrap_or_default()
    }

    /// Union bounding box of all member words.
    pub fn bbox(&self) -> Option<BoundingBox> {
        let mut iter = self.rows.iter().flatten();
        let first = iter.next()?;
        let (mut left, mut top) = (first.bbox.x, first.bbox.y);
        let (mut right, mut bottom) = (first.right(), first.bottom());
        for word in iter {
            left = left.min(word.bbox.x);
            top = top.min(word.bbox.y);
            right = right.max(word.right());
            bottom = bottom.max(word.bottom());
        }
        Some(BoundingBox {
            x: left,
            y: top,
            width: right - left,
            height: bottom - top,
        })
    }

    /// Top edge of the block, used to order page items.
    pub fn top(&self) -> f32 {
        self.first_word().map(|w| w.bbox.y).unwrap_or(0.0)
    }
}

/// Group rows into blocks: a vertical gap larger than 1.5 times the line
/// height is a paragraph break. Reading order (top then left) is preserved.
pub fn group_blocks(rows: Vec<Row>, line_height: f32) -> Vec<RawBlock> {
    let threshold = 1.5 * line_height;
    let mut blocks: Vec<RawBlock> = Vec::new();
    let mut current = RawBlock::default();
    let mut prev_bottom: Option<f32> = None;

    for row in rows {
        let row_bottom = row
            .iter()
            .map(PdfWord::bottom)
            .fold(f32::NEG_INFINITY, f32::max);
        if let Some(prev) = prev_bottom {
            if row_bottom - prev > threshold && !current.rows.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
        }
        prev_bottom = Some(row_bottom);
        current.rows.push(row);
    }
    if !current.rows.is_empty() {
        blocks.push(current);
    }
    blocks
}

/// Build a word for tests and decoder shims.
pub fn word(text: &str, x: f32, y: f32, width: f32, height: f32) -> PdfWord {
    PdfWord {
        text: text.to_string(),
        bbox: BoundingBox {
            x,
            y,
            width,
            height,
        },
        font_name: None,
        font_size: height,
    }
}
