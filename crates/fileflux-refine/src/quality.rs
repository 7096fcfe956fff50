//! Quality scoring of a refinement pass.

use fileflux_core::text::{ends_incomplete, starts_incomplete};
use fileflux_core::QualityReport;

/// Compute the quality record for a refinement pass.
///
/// - structure: fraction of headings inside the leading well-formed ladder
///   (each level at most one deeper than its predecessor);
/// - consistency: fraction of consecutive non-empty line pairs that do not
///   cross a mid-sentence break;
/// - retention: refined length over parsed length, clamped to `[0, 1]`.
pub fn compute_quality(parsed_text: &str, refined_text: &str, heading_levels: &[u8]) -> QualityReport {
    QualityReport::new(
        structure_score(heading_levels),
        consistency_score(refined_text),
        retention_score(parsed_text, refined_text),
    )
}

/// Fraction of headings inside the leading monotone ladder. A document
/// with no headings scores 1.0.
pub fn structure_score(levels: &[u8]) -> f64 {
    if levels.is_empty() {
        return 1.0;
    }
    let mut ladder = 1usize;
    for pair in levels.windows(2) {
        if pair[1] <= pair[0] + 1 {
            ladder += 1;
        } else {
            break;
        }
    }
    ladder as f64 / levels.len() as f64
}

/// Fraction of consecutive non-empty line pairs that read as complete
/// units. Text with at most one line scores 1.0.
pub fn consistency_score(text: &str) -> f64 {
    let lines: Vec<&str> = text.lines().filter(|l| !l.trim().is_empty()).collect();
    if lines.len() < 2 {
        return 1.0;
    }
    let pairs = lines.len() - 1;
    let broken = lines
        .windows(2)
        .filter(|pair| ends_incomplete(pair[0]) && starts_incomplete(pair[1]))
        .count();
    (pairs - broken) as f64 / pairs as f64
}

/// Refined length over parsed length, clamped to `[0, 1]`.
pub fn retention_score(parsed_text: &str, refined_text: &str) -> f64 {
    if parsed_text.is_empty() {
        return 1.0;
    }
    (refined_text.len() as f64 / parsed_text.len() as f64).clamp(0.0, 1.0)
}
