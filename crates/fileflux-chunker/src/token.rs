//! Token strategy: fixed-size windows over whitespace tokens.

use crate::piece::Piece;
use crate::sizing::EffectiveSizing;

/// Token strategy: windows of `sizing.max` whitespace tokens advancing by
/// `max - overlap` each step.
pub fn chunk_tokens(text: &str, sizing: &EffectiveSizing) -> Vec<Piece> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.is_empty() {
        return Vec::new();
    }
    let window = sizing.max.max(1);
    let step = window.saturating_sub(sizing.overlap).max(1);

    let mut pieces = Vec::new();
    let mut start = 0usize;
    loop {
        let end = (start + window).min(words.len());
        pieces.push(Piece::new(words[start..end].join(" "), false));
        if end == words.len() {
            break;
        }
        start += step;
    }
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sizing(max: usize, overlap: usize) -> EffectiveSizing {
        EffectiveSizing {
            max,
            overlap,
            adjustments: Vec::new(),
        }
    }

    #[test]
    fn test_fixed_windows_with_overlap() {
        let text = (1..=10)
            .map(|n| format!("w{n}"))
            .collect::<Vec<_>>()
            .join(" ");
        let pieces = chunk_tokens(&text, &sizing(4, 1));
        assert_eq!(pieces[0].text, "w1 w2 w3 w4");
        // Step of 3: the next window starts at w4.
        assert_eq!(pieces[1].text, "w4 w5 w6 w7");
        assert_eq!(pieces.last().unwrap().text, "w7 w8 w9 w10");
        assert_eq!(pieces.len(), 3);
    }

    #[test]
    fn test_short_text_single_window() {
        let pieces = chunk_tokens("just three words", &sizing(100, 10));
        assert_eq!(pieces.len(), 1);
        assert_eq!(pieces[0].text, "just three words");
    }

    #[test]
    fn test_empty() {
        assert!(chunk_tokens("   ", &sizing(10, 2)).is_empty());
    }
}
