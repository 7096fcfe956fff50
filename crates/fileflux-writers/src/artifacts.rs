//! Stage artifact pairs: a human-readable markdown body plus a JSON record
//! of statistics for the extract and refine stages.

use chrono::Utc;
use fileflux_core::{RawContent, RefinedContent, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Statistics recorded next to the extracted text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
pub struct ExtractStats {
    /// Input file size in bytes.
    pub raw_size: u64,
    /// Extracted text size in bytes.
    pub extracted_size: usize,
    /// Images discovered in the source.
    pub images_found: usize,
    /// Images written to disk.
    pub images_extracted: usize,
    /// Images dropped by the size or dimension filters.
    pub images_skipped: usize,
}

impl ExtractStats {
    /// Size reduction from raw input to extracted text, in percent.
    pub fn reduction_percent(&self) -> f64 {
        if self.raw_size == 0 {
            return 0.0;
        }
        (1.0 - self.extracted_size as f64 / self.raw_size as f64) * 100.0
    }
}

#[derive(Serialize)]
struct ExtractRecord<'a> {
    stage: &'static str,
    timestamp: String,
    reader: &'a str,
    raw_size: u64,
    extracted_size: usize,
    reduction_percent: f64,
    images_found: usize,
    images_extracted: usize,
    images_skipped: usize,
    warnings: &'a [String],
}

/// Writes `extract/extracted.md` and `extract/extracted.json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExtractionArtifacts;

impl ExtractionArtifacts {
    /// Write both extract artifacts under `<base>/extract/`.
    ///
    /// # Errors
    /// Returns I/O or serialization errors.
    pub fn write(&self, base: &Path, raw: &RawContent, stats: &ExtractStats) -> Result<()> {
        let dir = base.join("extract");
        fs::create_dir_all(&dir)?;
        fs::write(dir.join("extracted.md"), &raw.text)?;

        let record = ExtractRecord {
            stage: "extract",
            timestamp: Utc::now().to_rfc3339(),
            reader: &raw.reader,
            raw_size: stats.raw_size,
            extracted_size: stats.extracted_size,
            reduction_percent: round3(stats.reduction_percent()),
            images_found: stats.images_found,
            images_extracted: stats.images_extracted,
            images_skipped: stats.images_skipped,
            warnings: &raw.warnings,
        };
        fs::write(
            dir.join("extracted.json"),
            serde_json::to_string_pretty(&record)?,
        )?;
        Ok(())
    }
}

#[derive(Serialize)]
struct RefineRecord {
    stage: &'static str,
    timestamp: String,
    reduction_percent: f64,
    section_count: usize,
    structure_score: f64,
    consistency_score: f64,
    retention_score: f64,
    overall_score: f64,
}

/// Writes `refine/refined.md` and `refine/refined.json`.
#[derive(Debug, Clone, Copy, Default)]
pub struct RefinementArtifacts;

impl RefinementArtifacts {
    /// Write both refine artifacts under `<base>/refine/`.
    ///
    /// Quality scores are recorded to three decimals.
    ///
    /// # Errors
    /// Returns I/O or serialization errors.
    pub fn write(&self, base: &Path, refined: &RefinedContent, parsed_len: usize) -> Result<()> {
        let dir = base.join("refine");
        fs::create_dir_all(&dir)?;
        fs::write(dir.join("refined.md"), &refined.text)?;

        let reduction = if parsed_len == 0 {
            0.0
        } else {
            (1.0 - refined.text.len() as f64 / parsed_len as f64) * 100.0
        };
        let record = RefineRecord {
            stage: "refine",
            timestamp: Utc::now().to_rfc3339(),
            reduction_percent: round3(reduction),
            section_count: refined.structure.len(),
            structure_score: round3(refined.quality.structure_score),
            consistency_score: round3(refined.quality.consistency_score),
            retention_score: round3(refined.quality.retention_score),
            overall_score: round3(refined.quality.overall_score),
        };
        fs::write(
            dir.join("refined.json"),
            serde_json::to_string_pretty(&record)?,
        )?;
        Ok(())
    }
}

fn round3(v: f64) -> f64 {
    (v * 1000.0).round() / 1000.0
}
