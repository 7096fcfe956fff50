//! # fileflux-enrich
//!
//! Per-chunk enrichment through a narrow language-model interface.
//!
//! The model is an external collaborator behind [`EnrichmentEngine`]; this
//! crate owns everything FileFlux does around it: detecting context
//! overflows by message, adaptively splitting over-long chunks, merging
//! segment results, and writing outcomes back into chunk properties.
//! Enrichment is best-effort and never fatal: a chunk that cannot be
//! enriched records `enrichment_error` and the document completes.

pub mod adaptive;
pub mod merge;
pub mod sidecar;

use fileflux_core::chunk::props;
use fileflux_core::{CancellationToken, Chunk, EnrichOptions, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Message substrings marking a context-length rejection, matched
/// case-insensitively.
const TOKEN_LENGTH_MARKERS: [&str; 5] = [
    "exceeds max length",
    "input_ids",
    "token",
    "context length",
    "maximum context",
];

/// Whether an engine error message reports a context-length overflow.
pub fn is_token_length_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    TOKEN_LENGTH_MARKERS
        .iter()
        .any(|marker| lower.contains(marker))
}

/// Errors from an enrichment engine call.
#[derive(Error, Debug)]
pub enum EnrichError {
    /// The input exceeded the model context; triggers adaptive splitting.
    #[error("input exceeds model context: {0}")]
    TokenLengthExceeded(String),
    /// Any other engine failure.
    #[error("{0}")]
    Engine(String),
}

impl EnrichError {
    /// Classify a raw engine message into the right variant.
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        if is_token_length_message(&message) {
            Self::TokenLengthExceeded(message)
        } else {
            Self::Engine(message)
        }
    }
}

/// Result of one enrichment call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct EnrichmentResult {
    /// Chunk summary, when the model produced one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Extracted keywords.
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Extracted topics.
    #[serde(default)]
    pub topics: Vec<String>,
}

/// Document-level context passed along with each chunk.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DocumentContext {
    /// Source file name.
    pub file_name: String,
    /// Detected language, when known.
    pub language: Option<String>,
}

/// Narrow interface to the enrichment model.
pub trait EnrichmentEngine: Send + Sync {
    /// Enrich one piece of content.
    ///
    /// # Errors
    /// [`EnrichError::TokenLengthExceeded`] when the input does not fit
    /// the model context; [`EnrichError::Engine`] otherwise.
    fn enrich(
        &self,
        content: &str,
        ctx: Option<&DocumentContext>,
    ) -> std::result::Result<EnrichmentResult, EnrichError>;

    /// Whether the model runs locally. Local models clamp chunk sizes and
    /// get a warm-up call.
    fn is_local(&self) -> bool {
        false
    }

    /// Declared maximum enrichment input in tokens, when the engine knows
    /// it.
    fn max_enrichment_tokens(&self) -> Option<usize> {
        None
    }

    /// One-shot dummy call issued at pipeline start for local models.
    /// Errors are swallowed.
    fn warm_up(&self) {
        if self.is_local() {
            if let Err(err) = self.enrich("Hello.", None) {
                tracing::debug!("enrichment warm-up failed: {err}");
            }
        }
    }
}

/// Counters for the processing summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EnrichmentStats {
    /// Chunks with at least a summary or keywords.
    pub succeeded: usize,
    /// Chunks that recorded `enrichment_error`.
    pub failed: usize,
}

impl EnrichmentStats {
    /// Success rate in `[0, 1]`; 1.0 when nothing was attempted.
    pub fn success_rate(&self) -> f64 {
        let total = self.succeeded + self.failed;
        if total == 0 {
            1.0
        } else {
            self.succeeded as f64 / total as f64
        }
    }
}

/// The enrichment stage.
pub struct Enricher<'a> {
    engine: &'a dyn EnrichmentEngine,
    options: EnrichOptions,
}

impl std::fmt::Debug for Enricher<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Enricher")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<'a> Enricher<'a> {
    /// Create an enricher over an engine.
    pub fn new(engine: &'a dyn EnrichmentEngine, options: EnrichOptions) -> Self {
        Self { engine, options }
    }

    /// Enrich every chunk in place, writing results into chunk props.
    ///
    /// # Errors
    /// Only [`fileflux_core::FileFluxError::Cancelled`]; enrichment
    /// failures are recorded on the chunk and never abort the run.
    pub fn enrich_chunks(
        &self,
        chunks: &mut [Chunk],
        ctx: Option<&DocumentContext>,
        cancel: &CancellationToken,
    ) -> Result<EnrichmentStats> {
        let mut stats = EnrichmentStats::default();
        for chunk in chunks.iter_mut() {
            cancel.check()?;
            let outcome = adaptive::enrich_adaptive(self.engine, &chunk.content, ctx);
            if !outcome.success {
                stats.failed += 1;
                chunk.set_prop(
                    props::ENRICHMENT_ERROR,
                    outcome
                        .error
                        .unwrap_or_else(|| "enrichment produced no output".to_string()),
                );
                continue;
            }
            stats.succeeded += 1;
            if self.options.summaries {
                if let Some(summary) = outcome.summary {
                    chunk.set_prop(props::ENRICHED_SUMMARY, summary);
                }
            }
            if self.options.keywords && !outcome.keywords.is_empty() {
                chunk.set_prop(
                    props::ENRICHED_KEYWORDS,
                    serde_json::Value::from(outcome.keywords),
                );
            }
            if !outcome.topics.is_empty() {
                chunk.set_prop(
                    props::ENRICHED_TOPICS,
                    serde_json::Value::from(outcome.topics),
                );
            }
        }
        Ok(stats)
    }
}
