//! Semantic strategy: merge adjacent blank-line units by bag-of-tokens
//! similarity.

use crate::paragraph::split_paragraphs;
use crate::piece::Piece;
use crate::sizing::EffectiveSizing;
use crate::token_counter::estimate_tokens;
use std::collections::HashMap;
use unicode_segmentation::UnicodeSegmentation;

/// Default cosine-similarity floor for merging adjacent units.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.3;

/// Lowercased word-frequency vector of a unit.
fn bag_of_tokens(text: &str) -> HashMap<String, usize> {
    let mut bag = HashMap::new();
    for word in text.unicode_words() {
        *bag.entry(word.to_lowercase()).or_insert(0) += 1;
    }
    bag
}

/// Cosine similarity of two frequency vectors, 0.0 when either is empty.
pub fn cosine_similarity(a: &HashMap<String, usize>, b: &HashMap<String, usize>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let dot: f64 = a
        .iter()
        .filter_map(|(token, count)| b.get(token).map(|other| (*count * *other) as f64))
        .sum();
    let norm = |bag: &HashMap<String, usize>| -> f64 {
        bag.values().map(|c| (*c * *c) as f64).sum::<f64>().sqrt()
    };
    let denom = norm(a) * norm(b);
    if denom == 0.0 {
        0.0
    } else {
        dot / denom
    }
}

/// Semantic strategy: greedily merge adjacent units while they stay
/// similar and the merged size fits.
pub fn chunk_semantic(text: &str, sizing: &EffectiveSizing, threshold: f64) -> Vec<Piece> {
    let units = split_paragraphs(text);
    if units.is_empty() {
        return Vec::new();
    }

    let mut pieces: Vec<Piece> = Vec::new();
    let mut current = units[0].clone();
    let mut current_bag = bag_of_tokens(&current);
    let mut current_tokens = estimate_tokens(&current);

    for unit in &units[1..] {
        let unit_bag = bag_of_tokens(unit);
        let unit_tokens = estimate_tokens(unit);
        let similar = cosine_similarity(&current_bag, &unit_bag) > threshold;
        if similar && current_tokens + unit_tokens <= sizing.max {
            current.push_str("\n\n");
            current.push_str(unit);
            for (token, count) in unit_bag {
                *current_bag.entry(token).or_insert(0) += count;
            }
            current_tokens += unit_tokens;
        } else {
            pieces.push(Piece::new(
                std::mem::replace(&mut current, unit.clone()),
                current_tokens > sizing.max,
            ));
            current_bag = bag_of_tokens(&current);
            current_tokens = unit_tokens;
        }
    }
    pieces.push(Piece::new(current, current_tokens > sizing.max));
    pieces
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sizing(max: usize) -> EffectiveSizing {
        EffectiveSizing {
            max,
            overlap: 0,
            adjustments: Vec::new(),
        }
    }

    #[test]
    fn test_cosine_similarity_bounds() {
        let a = bag_of_tokens("the cat sat on the mat");
        let b = bag_of_tokens("the cat sat on the mat");
        assert!((cosine_similarity(&a, &b) - 1.0).abs() < 1e-9);
        let c = bag_of_tokens("совершенно другое");
        assert_eq!(cosine_similarity(&a, &c), 0.0);
        assert_eq!(cosine_similarity(&a, &HashMap::new()), 0.0);
    }

    #[test]
    fn test_similar_units_merge() {
        let text = "the database stores records\n\nthe database indexes records quickly";
        let pieces = chunk_semantic(text, &sizing(200), DEFAULT_SIMILARITY_THRESHOLD);
        assert_eq!(pieces.len(), 1);
        assert!(pieces[0].text.contains("indexes"));
    }

    #[test]
    fn test_dissimilar_units_stay_apart() {
        let text = "the database stores records\n\nviolins and cellos perform nightly";
        let pieces = chunk_semantic(text, &sizing(200), DEFAULT_SIMILARITY_THRESHOLD);
        assert_eq!(pieces.len(), 2);
    }

    #[test]
    fn test_size_bound_stops_merging() {
        let unit = "the database stores records and rows.";
        let text = format!("{unit}\n\n{unit}\n\n{unit}");
        // Max fits roughly one unit, so merging is rejected on size.
        let pieces = chunk_semantic(&text, &sizing(10), DEFAULT_SIMILARITY_THRESHOLD);
        assert_eq!(pieces.len(), 3);
    }

    #[test]
    fn test_empty() {
        assert!(chunk_semantic("", &sizing(100), 0.3).is_empty());
    }
}
