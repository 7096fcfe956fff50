//! Parsed and refined document representations.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Document-level metadata carried through the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct DocumentMetadata {
    /// Source file name.
    pub file_name: String,
    /// Whitespace-separated word count of the text body.
    pub word_count: usize,
    /// Page count, when the source format has pages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_count: Option<usize>,
    /// Detected language code (`en`, `ko`, `ja`, `zh`), when detected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// One section of the document structure with its ancestor heading path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Heading text of this section.
    pub heading: String,
    /// Heading level 1 to 6.
    pub level: u8,
    /// Ancestor headings from the document root down to this section,
    /// inclusive.
    pub path: Vec<String>,
}

/// Which reader produced the content and how long the stages took.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ParsingInfo {
    /// Reader identifier, e.g. `"pdf"`.
    pub reader: String,
    /// Wall-clock time of the extract stage.
    #[serde(with = "duration_millis")]
    pub extract_duration: Duration,
    /// Wall-clock time of the refine stage, zero before refinement.
    #[serde(with = "duration_millis")]
    pub refine_duration: Duration,
}

/// Normalized document after extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ParsedContent {
    /// Post-normalization text body.
    pub text: String,
    /// Document metadata.
    pub metadata: DocumentMetadata,
    /// Ordered sections with heading paths.
    pub structure: Vec<Section>,
    /// Provenance and timing.
    pub parsing: ParsingInfo,
}

/// Quality record of a refinement pass. All scores are in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct QualityReport {
    /// Fraction of detected headings that form a monotone-increasing prefix
    /// ladder.
    pub structure_score: f64,
    /// Fraction of consecutive-line pairs not crossing a mid-sentence
    /// break.
    pub consistency_score: f64,
    /// Refined length over parsed length, clamped to `[0, 1]`.
    pub retention_score: f64,
    /// Arithmetic mean of the other three.
    pub overall_score: f64,
}

impl QualityReport {
    /// Build a report from the three component scores, computing the
    /// overall mean.
    pub fn new(structure: f64, consistency: f64, retention: f64) -> Self {
        let clamp = |v: f64| v.clamp(0.0, 1.0);
        let (structure, consistency, retention) =
            (clamp(structure), clamp(consistency), clamp(retention));
        Self {
            structure_score: structure,
            consistency_score: consistency,
            retention_score: retention,
            overall_score: (structure + consistency + retention) / 3.0,
        }
    }
}

/// Refined document: same shape as [`ParsedContent`] plus a quality record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct RefinedContent {
    /// Cleaned text body.
    pub text: String,
    /// Document metadata.
    pub metadata: DocumentMetadata,
    /// Ordered sections with heading paths.
    pub structure: Vec<Section>,
    /// Provenance and timing.
    pub parsing: ParsingInfo,
    /// Quality scores of the refinement pass.
    pub quality: QualityReport,
}

impl RefinedContent {
    /// Wrap parsed content unchanged, with a perfect-retention quality
    /// record. Used when refinement is skipped.
    pub fn passthrough(parsed: ParsedContent) -> Self {
        Self {
            text: parsed.text,
            metadata: parsed.metadata,
            structure: parsed.structure,
            parsing: parsed.parsing,
            quality: QualityReport::new(1.0, 1.0, 1.0),
        }
    }
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        (d.as_millis() as u64).serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(d)?))
    }
}
