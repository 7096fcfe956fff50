//! Effective size computation: model-context clamping and CJK adjustment.

use fileflux_core::ChunkingOptions;
use fileflux_detect::cjk_ratio;

/// CJK ratio above which the size adjustment kicks in.
const CJK_RATIO_THRESHOLD: f64 = 0.1;

/// Multiplier floor for the CJK adjustment.
const MIN_MULTIPLIER: f64 = 0.15;

/// Smallest effective max after adjustment.
const MIN_EFFECTIVE_MAX: usize = 50;

/// What the enrichment model can accept, used for clamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ModelHint {
    /// Whether the model runs locally; only local models clamp.
    pub is_local: bool,
    /// Declared maximum enrichment input in tokens.
    pub max_enrichment_tokens: Option<usize>,
}

/// One applied size adjustment, kept for the processing summary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SizeAdjustment {
    /// Clamped to a local model's declared context.
    ModelClamp {
        /// The model's token limit.
        limit: usize,
    },
    /// Scaled down for CJK-dense text.
    Cjk {
        /// Measured CJK ratio.
        ratio: f64,
        /// Applied multiplier.
        multiplier: f64,
    },
}

impl std::fmt::Display for SizeAdjustment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ModelClamp { limit } => write!(f, "local model limit ({limit} tokens)"),
            Self::Cjk { ratio, .. } => write!(f, "CJK {:.0}%", ratio * 100.0),
        }
    }
}

/// The size bounds actually enforced, after adjustment.
#[derive(Debug, Clone, PartialEq)]
pub struct EffectiveSizing {
    /// Upper bound on chunk size in tokens.
    pub max: usize,
    /// Overlap carried between chunks in tokens.
    pub overlap: usize,
    /// Adjustments applied, in order.
    pub adjustments: Vec<SizeAdjustment>,
}

/// Size multiplier for a CJK ratio: `max(0.15, 1 / (1 + 4r))`.
///
/// Monotonically non-increasing in the ratio and never below 0.15.
pub fn cjk_multiplier(ratio: f64) -> f64 {
    (1.0 / (1.0 + 4.0 * ratio)).max(MIN_MULTIPLIER)
}

/// Compute the effective bounds for chunking `text` under `options`.
///
/// The model clamp applies first (local models only), then the CJK
/// adjustment over a leading sample of the text. The overlap is rescaled
/// to at most a quarter of the effective max after each step.
pub fn effective_sizing(
    options: &ChunkingOptions,
    model: Option<&ModelHint>,
    text: &str,
) -> EffectiveSizing {
    let mut max = options.max_chunk_size;
    let mut overlap = options.overlap_size;
    let mut adjustments = Vec::new();

    if let Some(hint) = model {
        if hint.is_local {
            if let Some(limit) = hint.max_enrichment_tokens {
                let clamped = max.min(limit);
                if clamped < max {
                    adjustments.push(SizeAdjustment::ModelClamp { limit });
                }
                max = clamped;
                overlap = overlap.min(max / 4);
            }
        }
    }

    let ratio = cjk_ratio(text);
    if ratio > CJK_RATIO_THRESHOLD {
        let multiplier = cjk_multiplier(ratio);
        max = ((max as f64 * multiplier).round() as usize).max(MIN_EFFECTIVE_MAX);
        overlap = overlap.min(max / 4);
        adjustments.push(SizeAdjustment::Cjk { ratio, multiplier });
    }

    EffectiveSizing {
        max,
        overlap,
        adjustments,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(max: usize, overlap: usize) -> ChunkingOptions {
        ChunkingOptions::default().with_sizes(max, overlap)
    }

    #[test]
    fn test_no_adjustment_for_latin_remote() {
        let sizing = effective_sizing(&options(512, 64), None, "plain english text");
        assert_eq!(sizing.max, 512);
        assert_eq!(sizing.overlap, 64);
        assert!(sizing.adjustments.is_empty());
    }

    #[test]
    fn test_model_clamp() {
        let hint = ModelHint {
            is_local: true,
            max_enrichment_tokens: Some(256),
        };
        let sizing = effective_sizing(&options(512, 64), Some(&hint), "english text");
        assert_eq!(sizing.max, 256);
        assert_eq!(sizing.overlap, 64);
        assert!(matches!(
            sizing.adjustments[0],
            SizeAdjustment::ModelClamp { limit: 256 }
        ));
    }

    #[test]
    fn test_remote_model_never_clamps() {
        let hint = ModelHint {
            is_local: false,
            max_enrichment_tokens: Some(128),
        };
        let sizing = effective_sizing(&options(512, 64), Some(&hint), "english text");
        assert_eq!(sizing.max, 512);
    }

    #[test]
    fn test_korean_with_local_model() {
        // maxSize 512, overlap 64, local model max 256 tokens, all-Hangul:
        // clamp to 256, multiplier 0.2, effective max 51, overlap 12.
        let hint = ModelHint {
            is_local: true,
            max_enrichment_tokens: Some(256),
        };
        let korean = "한국어문서".repeat(1000);
        let sizing = effective_sizing(&options(512, 64), Some(&hint), &korean);
        assert_eq!(sizing.max, 51);
        assert_eq!(sizing.overlap, 12);
        assert_eq!(sizing.adjustments.len(), 2);
    }

    #[test]
    fn test_cjk_boundary_ratio_08() {
        // r = 0.8: 512 / (1 + 3.2) rounds to 122.
        let mult = cjk_multiplier(0.8);
        let max = ((512.0 * mult).round() as usize).max(50);
        assert_eq!(max, 122);
    }

    #[test]
    fn test_multiplier_monotone_and_floored() {
        let mut prev = cjk_multiplier(0.0);
        for step in 1..=20 {
            let r = step as f64 / 20.0;
            let m = cjk_multiplier(r);
            assert!(m <= prev + 1e-12, "not monotone at r={r}");
            assert!(m >= MIN_MULTIPLIER);
            prev = m;
        }
    }

    #[test]
    fn test_effective_max_floor() {
        let korean = "가나다라".repeat(100);
        let sizing = effective_sizing(&options(60, 10), None, &korean);
        assert_eq!(sizing.max, MIN_EFFECTIVE_MAX);
    }

    #[test]
    fn test_low_ratio_untouched() {
        // One CJK word in a long English text keeps the ratio under 0.1.
        let text = format!("{} 단어", "english words repeated ".repeat(50));
        let sizing = effective_sizing(&options(512, 64), None, &text);
        assert_eq!(sizing.max, 512);
    }

    #[test]
    fn test_adjustment_display() {
        let clamp = SizeAdjustment::ModelClamp { limit: 256 };
        assert_eq!(clamp.to_string(), "local model limit (256 tokens)");
        let cjk = SizeAdjustment::Cjk {
            ratio: 0.87,
            multiplier: 0.22,
        };
        assert_eq!(cjk.to_string(), "CJK 87%");
    }
}
