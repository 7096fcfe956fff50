//! Option structs for each pipeline stage.

// Option structs use multiple bool flags for feature toggles.
#![allow(clippy::struct_excessive_bools)]

use serde::{Deserialize, Serialize};

/// Default minimum decoded byte size for an image to be kept.
pub const DEFAULT_MIN_IMAGE_SIZE: usize = 5000;

/// Default minimum pixel dimension (each side) for an image to be kept.
pub const DEFAULT_MIN_IMAGE_DIMENSION: u32 = 100;

/// Options for the extract stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractOptions {
    /// Inclusive 1-based page range to extract; `None` means all pages.
    pub page_range: Option<(usize, usize)>,
    /// Run table detection.
    pub extract_tables: bool,
    /// Collect embedded images.
    pub extract_images: bool,
    /// Run block-type detection (headings, lists, code, quotes).
    pub detect_block_types: bool,
    /// Keep bounding boxes on blocks and tables.
    pub preserve_coordinates: bool,
    /// Skip embedded images larger than this many bytes.
    pub max_image_size: usize,
    /// Skip images smaller than this many decoded bytes.
    pub min_image_size: usize,
    /// Skip images smaller than this on either side.
    pub min_image_dimension: u32,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            page_range: None,
            extract_tables: true,
            extract_images: true,
            detect_block_types: true,
            preserve_coordinates: false,
            max_image_size: 10 * 1024 * 1024,
            min_image_size: DEFAULT_MIN_IMAGE_SIZE,
            min_image_dimension: DEFAULT_MIN_IMAGE_DIMENSION,
        }
    }
}

impl ExtractOptions {
    /// Toggle table detection.
    #[must_use]
    pub const fn with_tables(mut self, enable: bool) -> Self {
        self.extract_tables = enable;
        self
    }

    /// Toggle image collection.
    #[must_use]
    pub const fn with_images(mut self, enable: bool) -> Self {
        self.extract_images = enable;
        self
    }

    /// Toggle block-type detection.
    #[must_use]
    pub const fn with_block_types(mut self, enable: bool) -> Self {
        self.detect_block_types = enable;
        self
    }

    /// Toggle coordinate preservation.
    #[must_use]
    pub const fn with_coordinates(mut self, enable: bool) -> Self {
        self.preserve_coordinates = enable;
        self
    }

    /// Restrict extraction to an inclusive 1-based page range.
    #[must_use]
    pub const fn with_page_range(mut self, range: Option<(usize, usize)>) -> Self {
        self.page_range = range;
        self
    }
}

/// Options for the refine stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefineOptions {
    /// Collapse whitespace and blank-line runs.
    pub clean_whitespace: bool,
    /// Drop lines repeated at page tops/bottoms.
    pub remove_headers_footers: bool,
    /// Drop standalone page-number lines.
    pub remove_page_numbers: bool,
    /// Rewrite detected headings as `#`-prefixed markdown.
    pub restructure_headings: bool,
    /// Reinject detected tables as markdown.
    pub convert_tables_to_markdown: bool,
}

impl Default for RefineOptions {
    fn default() -> Self {
        Self {
            clean_whitespace: true,
            remove_headers_footers: true,
            remove_page_numbers: true,
            restructure_headings: true,
            convert_tables_to_markdown: true,
        }
    }
}

/// Chunking strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ChunkStrategy {
    /// Pick a strategy from document structure.
    #[default]
    Auto,
    /// Pack sentences greedily.
    Sentence,
    /// Split on blank lines, falling back to sentences inside oversized
    /// paragraphs.
    Paragraph,
    /// Fixed-size whitespace-token windows.
    Token,
    /// Merge blank-line units by bag-of-tokens similarity.
    Semantic,
    /// Headings as hard boundaries with paragraph packing inside sections.
    Hierarchical,
}

impl std::fmt::Display for ChunkStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Auto => "Auto",
            Self::Sentence => "Sentence",
            Self::Paragraph => "Paragraph",
            Self::Token => "Token",
            Self::Semantic => "Semantic",
            Self::Hierarchical => "Hierarchical",
        };
        write!(f, "{name}")
    }
}

impl std::str::FromStr for ChunkStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "sentence" => Ok(Self::Sentence),
            "paragraph" => Ok(Self::Paragraph),
            "token" => Ok(Self::Token),
            "semantic" => Ok(Self::Semantic),
            "hierarchical" => Ok(Self::Hierarchical),
            _ => Err(format!(
                "unknown strategy '{s}'; expected Auto, Sentence, Paragraph, Token, Semantic or Hierarchical"
            )),
        }
    }
}

/// Options for the chunk stage. Sizes are in token-equivalent units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkingOptions {
    /// Strategy to apply.
    pub strategy: ChunkStrategy,
    /// Upper bound on chunk size before adjustment.
    pub max_chunk_size: usize,
    /// Overlap carried between adjacent chunks. Must be strictly smaller
    /// than `max_chunk_size`.
    pub overlap_size: usize,
}

impl Default for ChunkingOptions {
    fn default() -> Self {
        Self {
            strategy: ChunkStrategy::Auto,
            max_chunk_size: 512,
            overlap_size: 64,
        }
    }
}

impl ChunkingOptions {
    /// Set the strategy.
    #[must_use]
    pub const fn with_strategy(mut self, strategy: ChunkStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set the size bounds.
    #[must_use]
    pub const fn with_sizes(mut self, max_chunk_size: usize, overlap_size: usize) -> Self {
        self.max_chunk_size = max_chunk_size;
        self.overlap_size = overlap_size;
        self
    }

    /// Check `0 <= overlap < max`.
    ///
    /// # Errors
    /// Returns a description of the violated bound.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_chunk_size == 0 {
            return Err("max_chunk_size must be positive".to_string());
        }
        if self.overlap_size >= self.max_chunk_size {
            return Err(format!(
                "overlap ({}) must be smaller than max chunk size ({})",
                self.overlap_size, self.max_chunk_size
            ));
        }
        Ok(())
    }
}

/// Options for the enrich stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichOptions {
    /// Generate summaries.
    pub summaries: bool,
    /// Generate keywords.
    pub keywords: bool,
    /// Write the per-chunk sidecar directory.
    pub write_sidecar: bool,
}

impl Default for EnrichOptions {
    fn default() -> Self {
        Self {
            summaries: true,
            keywords: true,
            write_sidecar: true,
        }
    }
}
