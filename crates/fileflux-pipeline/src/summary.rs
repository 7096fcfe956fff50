//! Per-document processing summary for the user-facing panel.

use fileflux_core::{ChunkStrategy, QualityReport};
use fileflux_enrich::EnrichmentStats;
use std::time::Duration;

/// Statistics of one pipeline run.
#[derive(Debug, Clone, Default)]
pub struct ProcessingSummary {
    /// Extract-stage wall clock.
    pub extract_duration: Duration,
    /// Refine-stage wall clock.
    pub refine_duration: Duration,
    /// Chunk-stage wall clock.
    pub chunk_duration: Duration,
    /// Enrich-stage wall clock.
    pub enrich_duration: Duration,
    /// Input size in bytes.
    pub raw_size: u64,
    /// Extracted text size in bytes.
    pub extracted_size: usize,
    /// Refined text size in bytes.
    pub refined_size: usize,
    /// Emitted chunk count.
    pub chunk_count: usize,
    /// Images considered, extracted and skipped.
    pub images_found: usize,
    /// Images written to disk.
    pub images_extracted: usize,
    /// Images dropped by filters.
    pub images_skipped: usize,
    /// Quality record of the refine stage.
    pub quality: Option<QualityReport>,
    /// Concrete strategy that ran.
    pub strategy: Option<ChunkStrategy>,
    /// Size adjustments applied, human-readable (e.g. "CJK 87%").
    pub adjustments: Vec<String>,
    /// Enrichment counters, when enrichment ran.
    pub enrichment: Option<EnrichmentStats>,
    /// Reader warnings carried through.
    pub warnings: Vec<String>,
}

impl ProcessingSummary {
    /// Size reduction from raw input to refined text, in percent.
    pub fn reduction_percent(&self) -> f64 {
        if self.raw_size == 0 {
            return 0.0;
        }
        (1.0 - self.refined_size as f64 / self.raw_size as f64) * 100.0
    }

    /// Enrichment success rate, 1.0 when enrichment did not run.
    pub fn enrichment_success_rate(&self) -> f64 {
        self.enrichment.map_or(1.0, |stats| stats.success_rate())
    }

    /// Total wall clock across stages.
    pub fn total_duration(&self) -> Duration {
        self.extract_duration + self.refine_duration + self.chunk_duration + self.enrich_duration
    }
}
