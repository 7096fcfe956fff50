//! Token estimation in token-equivalent units.
//!
//! Latin text runs about four characters per token; CJK scripts tokenize
//! far denser. The estimate blends the two by the text's CJK ratio:
//! `density = r * 2.5 + (1 - r) * 0.25` tokens per character.

use fileflux_detect::is_cjk_char;

/// Tokens per character for CJK text.
const CJK_DENSITY: f64 = 2.5;

/// Tokens per character for everything else.
const LATIN_DENSITY: f64 = 0.25;

/// Estimate the token count of `text`.
///
/// Pure ASCII takes the fast path (length over four); mixed text blends
/// densities by the measured CJK ratio. Non-empty text never estimates to
/// zero.
pub fn estimate_tokens(text: &str) -> usize {
    if text.is_empty() {
        return 0;
    }
    if text.is_ascii() {
        return (text.len() / 4).max(1);
    }

    let mut chars = 0usize;
    let mut cjk = 0usize;
    for c in text.chars() {
        if c.is_whitespace() {
            continue;
        }
        chars += 1;
        if is_cjk_char(c) {
            cjk += 1;
        }
    }
    if chars == 0 {
        return 0;
    }
    let ratio = cjk as f64 / chars as f64;
    let density = blended_density(ratio);
    ((chars as f64 * density).ceil() as usize).max(1)
}

/// Tokens per character at the given CJK ratio.
pub fn blended_density(ratio: f64) -> f64 {
    let r = ratio.clamp(0.0, 1.0);
    r * CJK_DENSITY + (1.0 - r) * LATIN_DENSITY
}
