//! # fileflux-chunker
//!
//! Strategy-driven segmentation of refined text into size-bounded chunks.
//!
//! Six strategies are available: Sentence, Paragraph, Token, Semantic,
//! Hierarchical, and Auto (which picks one from the document's structure
//! profile). All strategies enforce the effective size bounds computed by
//! [`sizing::effective_sizing`]: the requested max/overlap after local
//! model clamping and CJK-density adjustment.
//!
//! ```
//! use fileflux_chunker::Chunker;
//! use fileflux_core::{CancellationToken, ChunkingOptions, RefinedContent};
//!
//! let refined = RefinedContent {
//!     text: "First sentence. Second sentence. Third one.".to_string(),
//!     ..Default::default()
//! };
//! let outcome = Chunker::new()
//!     .chunk(&refined, &ChunkingOptions::default(), None, &CancellationToken::new())
//!     .unwrap();
//! assert!(!outcome.chunks.is_empty());
//! ```

pub mod auto;
pub mod hierarchical;
pub mod paragraph;
pub mod piece;
pub mod semantic;
pub mod sentence;
pub mod sizing;
pub mod token;
pub mod token_counter;

pub use piece::Piece;
pub use sizing::{EffectiveSizing, ModelHint, SizeAdjustment};
pub use token_counter::estimate_tokens;

use fileflux_core::chunk::props;
use fileflux_core::{
    CancellationToken, Chunk, ChunkStrategy, ChunkingOptions, FileFluxError, RefinedContent,
    Result, SourceSpan,
};
use sha2::{Digest, Sha256};

/// Result of a chunking pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkOutcome {
    /// The emitted chunks, indices contiguous from zero.
    pub chunks: Vec<Chunk>,
    /// The concrete strategy that ran (Auto resolved).
    pub strategy: ChunkStrategy,
    /// The enforced size bounds and the adjustments that produced them.
    pub sizing: EffectiveSizing,
}

/// The chunking stage.
#[derive(Debug, Clone, Copy)]
pub struct Chunker {
    semantic_threshold: f64,
}

impl Default for Chunker {
    fn default() -> Self {
        Self::new()
    }
}

impl Chunker {
    /// Create a chunker with the default semantic-merge threshold.
    pub fn new() -> Self {
        Self {
            semantic_threshold: semantic::DEFAULT_SIMILARITY_THRESHOLD,
        }
    }

    /// Override the semantic-merge similarity threshold.
    #[must_use]
    pub fn with_semantic_threshold(mut self, threshold: f64) -> Self {
        self.semantic_threshold = threshold;
        self
    }

    /// Chunk refined content.
    ///
    /// # Errors
    /// Returns [`FileFluxError::InvalidOptions`] for invalid bounds and
    /// [`FileFluxError::Cancelled`] when cancelled mid-pass.
    pub fn chunk(
        &self,
        refined: &RefinedContent,
        options: &ChunkingOptions,
        model: Option<&ModelHint>,
        cancel: &CancellationToken,
    ) -> Result<ChunkOutcome> {
        options.validate().map_err(FileFluxError::InvalidOptions)?;
        cancel.check()?;

        let text = refined.text.as_str();
        let strategy = match options.strategy {
            ChunkStrategy::Auto => auto::select_strategy(text),
            concrete => concrete,
        };
        let sizing = sizing::effective_sizing(options, model, text);
        tracing::debug!(
            %strategy,
            max = sizing.max,
            overlap = sizing.overlap,
            "chunking"
        );

        let pieces = match strategy {
            ChunkStrategy::Sentence => sentence::chunk_sentences(text, &sizing),
            ChunkStrategy::Paragraph => paragraph::chunk_paragraphs(text, &sizing),
            ChunkStrategy::Token => token::chunk_tokens(text, &sizing),
            ChunkStrategy::Semantic => {
                semantic::chunk_semantic(text, &sizing, self.semantic_threshold)
            }
            ChunkStrategy::Hierarchical => hierarchical::chunk_hierarchical(text, &sizing),
            ChunkStrategy::Auto => unreachable!("Auto resolves to a concrete strategy"),
        };

        let mut chunks = Vec::with_capacity(pieces.len());
        let mut cursor = 0usize;
        for piece in pieces {
            cancel.check()?;
            let content = piece.text.trim_end().to_string();
            if content.trim().is_empty() {
                continue;
            }
            let index = chunks.len();
            let mut chunk = Chunk::new(chunk_id(index, &content), index, content);
            if piece.size_exceeded {
                chunk.set_prop(props::SIZE_EXCEEDED, true);
            }
            if let Some(path) = piece.hierarchy_path {
                chunk.set_prop(
                    props::HIERARCHY_PATH,
                    serde_json::Value::from(path),
                );
            }
            if let Some(found) = text[cursor.min(text.len())..].find(&chunk.content) {
                let start = cursor + found;
                chunk.source_span = Some(SourceSpan {
                    start,
                    end: start + chunk.content.len(),
                });
                cursor = start + 1;
            }
            chunks.push(chunk);
        }

        Ok(ChunkOutcome {
            chunks,
            strategy,
            sizing,
        })
    }
}

/// Stable chunk identifier: truncated SHA-256 of the index and content.
fn chunk_id(index: usize, content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(index.to_le_bytes());
    hasher.update(content.as_bytes());
    let digest = hasher.finalize();
    digest
        .iter()
        .take(6)
        .map(|b| format!("{b:02x}"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn refined(text: &str) -> RefinedContent {
        RefinedContent {
            text: text.to_string(),
            ..Default::default()
        }
    }

    fn run(text: &str, options: ChunkingOptions) -> ChunkOutcome {
        Chunker::new()
            .chunk(&refined(text), &options, None, &CancellationToken::new())
            .unwrap()
    }

    #[test]
    fn test_indices_contiguous_and_ids_unique() {
        let text = "One sentence here. Another sentence here. And one more follows. Then a fourth.";
        let outcome = run(text, ChunkingOptions::default().with_sizes(10, 2));
        assert!(!outcome.chunks.is_empty());
        for (i, chunk) in outcome.chunks.iter().enumerate() {
            assert_eq!(chunk.index, i);
            assert!(!chunk.content.is_empty());
        }
        let mut ids: Vec<&str> = outcome.chunks.iter().map(|c| c.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), outcome.chunks.len());
    }

    #[test]
    fn test_zero_length_document() {
        let outcome = run("", ChunkingOptions::default());
        assert!(outcome.chunks.is_empty());
    }

    #[test]
    fn test_single_oversized_word() {
        let word = "x".repeat(400);
        let outcome = run(
            &word,
            ChunkingOptions::default()
                .with_strategy(ChunkStrategy::Sentence)
                .with_sizes(10, 2),
        );
        assert_eq!(outcome.chunks.len(), 1);
        assert!(outcome.chunks[0].prop_bool(props::SIZE_EXCEEDED));
    }

    #[test]
    fn test_auto_resolves_to_hierarchical_on_heading_rich_text() {
        let mut text = String::new();
        for i in 0..5 {
            text.push_str(&format!("## Section {i}\n\nBody for section {i}.\n\n"));
            for j in 0..2 {
                text.push_str(&format!("### Sub {i}.{j}\n\nDetail text {i}.{j}.\n\n"));
            }
        }
        let outcome = run(&text, ChunkingOptions::default());
        assert_eq!(outcome.strategy, ChunkStrategy::Hierarchical);
        let with_paths = outcome
            .chunks
            .iter()
            .filter(|c| c.props.contains_key(props::HIERARCHY_PATH))
            .count();
        assert_eq!(with_paths, outcome.chunks.len());
    }

    #[test]
    fn test_invalid_options_rejected() {
        let err = Chunker::new()
            .chunk(
                &refined("text"),
                &ChunkingOptions::default().with_sizes(10, 10),
                None,
                &CancellationToken::new(),
            )
            .unwrap_err();
        assert!(matches!(err, FileFluxError::InvalidOptions(_)));
    }

    #[test]
    fn test_model_clamp_and_cjk_adjustment_together() {
        let hint = ModelHint {
            is_local: true,
            max_enrichment_tokens: Some(256),
        };
        let korean = "한국어문장입니다 ".repeat(250);
        let outcome = Chunker::new()
            .chunk(
                &refined(&korean),
                &ChunkingOptions::default()
                    .with_strategy(ChunkStrategy::Sentence)
                    .with_sizes(512, 64),
                Some(&hint),
                &CancellationToken::new(),
            )
            .unwrap();
        assert_eq!(outcome.sizing.max, 51);
        assert_eq!(outcome.sizing.overlap, 12);
        assert!(!outcome.chunks.is_empty());
        for chunk in &outcome.chunks {
            if !chunk.prop_bool(props::SIZE_EXCEEDED) {
                assert!(estimate_tokens(&chunk.content) <= 51);
            }
        }
    }

    #[test]
    fn test_source_spans_point_into_text() {
        let text = "Alpha sentence one. Beta sentence two. Gamma sentence three.";
        let outcome = run(
            text,
            ChunkingOptions::default()
                .with_strategy(ChunkStrategy::Sentence)
                .with_sizes(8, 0),
        );
        for chunk in &outcome.chunks {
            if let Some(span) = chunk.source_span {
                assert_eq!(&text[span.start..span.end], chunk.content);
            }
        }
    }

    #[test]
    fn test_repeat_chunking_is_deterministic() {
        let text = "Stable text. With several sentences. For determinism checks.";
        let a = run(text, ChunkingOptions::default().with_sizes(12, 4));
        let b = run(text, ChunkingOptions::default().with_sizes(12, 4));
        assert_eq!(a.chunks, b.chunks);
    }

    #[test]
    fn test_cancellation() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = Chunker::new()
            .chunk(
                &refined("text"),
                &ChunkingOptions::default(),
                None,
                &cancel,
            )
            .unwrap_err();
        assert!(matches!(err, FileFluxError::Cancelled));
    }
}
