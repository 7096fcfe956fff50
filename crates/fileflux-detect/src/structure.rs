//! Document-structure analysis backing the Auto chunking strategy.

use crate::cjk::sample_prefix;
use once_cell::sync::Lazy;
use regex::Regex;

/// Sample size for structure analysis, in bytes of the leading text.
pub const STRUCTURE_SAMPLE_BYTES: usize = 10 * 1024;

static HEADING: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^#{1,6} ").expect("heading"));
static NUMBERED_SECTION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^(?:\d+(?:[.-]\d+)*\.|\(\d+\)|[①-⑩])\s+").expect("numbered section")
});

/// Structural profile of a document's leading sample.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StructureProfile {
    /// Count of markdown heading lines.
    pub heading_count: usize,
    /// Count of numbered section markers.
    pub numbered_section_count: usize,
    /// Mean length in characters of blank-line-separated paragraphs.
    pub mean_paragraph_len: f64,
}

impl StructureProfile {
    /// Whether headings are considered present (two or more).
    pub fn has_headings(&self) -> bool {
        self.heading_count >= 2
    }

    /// Whether numbered sections are considered present (three or more).
    pub fn has_numbered_sections(&self) -> bool {
        self.numbered_section_count >= 3
    }
}

/// Analyze the first [`STRUCTURE_SAMPLE_BYTES`] of `text`.
pub fn analyze_structure(text: &str) -> StructureProfile {
    let sample = sample_prefix(text, STRUCTURE_SAMPLE_BYTES);

    let heading_count = HEADING.find_iter(sample).count();
    let numbered_section_count = NUMBERED_SECTION.find_iter(sample).count();

    let paragraphs: Vec<&str> = sample
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();
    let mean_paragraph_len = if paragraphs.is_empty() {
        0.0
    } else {
        paragraphs.iter().map(|p| p.chars().count()).sum::<usize>() as f64
            / paragraphs.len() as f64
    };

    StructureProfile {
        heading_count,
        numbered_section_count,
        mean_paragraph_len,
    }
}
