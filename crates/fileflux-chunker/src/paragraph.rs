//! Paragraph strategy: blank-line units with sentence fallback inside
//! oversized paragraphs.

use crate::piece::Piece;
use crate::sentence;
use crate::sizing::EffectiveSizing;
use crate::token_counter::estimate_tokens;

/// Split text into paragraphs on blank lines.
pub fn split_paragraphs(text: &str) -> Vec<String> {
    text.replace("\r\n", "\n")
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// Paragraph strategy: pack paragraphs greedily; a paragraph over the
/// limit is re-split by sentences first.
pub fn chunk_paragraphs(text: &str, sizing: &EffectiveSizing) -> Vec<Piece> {
    let mut units: Vec<String> = Vec::new();
    for paragraph in split_paragraphs(text) {
        if estimate_tokens(&paragraph) > sizing.max {
            units.extend(sentence::split_sentences(&paragraph));
        } else {
            units.push(paragraph);
        }
    }
    sentence::pack_units(&units, sizing, "\n\n")
}
