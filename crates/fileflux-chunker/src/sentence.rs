//! Sentence splitting and greedy sentence packing.

use crate::piece::Piece;
use crate::sizing::EffectiveSizing;
use crate::token_counter::estimate_tokens;
use fileflux_core::text::is_sentence_terminator;

/// Split text into sentences on `. ! ? 。 ！ ？`.
///
/// A terminator followed immediately by a digit or a lowercase letter does
/// not split (decimal numbers, version strings, abbreviations mid-word).
/// Consecutive terminators stay attached to one sentence.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        current.push(c);
        if !is_sentence_terminator(c) {
            continue;
        }
        // Swallow a run of terminators ("?!", "...").
        while chars.peek().copied().is_some_and(is_sentence_terminator) {
            current.push(chars.next().expect("peeked"));
        }
        match chars.peek() {
            Some(next) if next.is_ascii_digit() || next.is_lowercase() => {}
            _ => {
                let sentence = current.trim();
                if !sentence.is_empty() {
                    sentences.push(sentence.to_string());
                }
                current.clear();
            }
        }
    }
    let tail = current.trim();
    if !tail.is_empty() {
        sentences.push(tail.to_string());
    }
    sentences
}

/// Pack units greedily into chunks bounded by `sizing.max`, carrying the
/// tail units whose combined size fits `sizing.overlap` into the next
/// chunk. Units are joined with `joiner`.
///
/// A single unit over the limit is emitted whole and flagged.
pub fn pack_units(units: &[String], sizing: &EffectiveSizing, joiner: &str) -> Vec<Piece> {
    let mut pieces: Vec<Piece> = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut current_tokens = 0usize;

    for unit in units {
        let unit_tokens = estimate_tokens(unit);

        if unit_tokens > sizing.max {
            // An indivisible unit over the limit is emitted whole and
            // flagged; pending content flushes first.
            if !current.is_empty() {
                pieces.push(Piece::new(current.join(joiner), false));
            }
            pieces.push(Piece::new(unit.clone(), true));
            current = overlap_tail(std::slice::from_ref(unit), sizing.overlap);
            current_tokens = current.iter().map(|u| estimate_tokens(u)).sum();
            continue;
        }

        if !current.is_empty() && current_tokens + unit_tokens > sizing.max {
            pieces.push(Piece::new(current.join(joiner), false));
            current = overlap_tail(&current, sizing.overlap);
            current_tokens = current.iter().map(|u| estimate_tokens(u)).sum();
            // Carried overlap plus the new unit may still overflow; drop
            // the overlap rather than exceed the bound.
            if current_tokens + unit_tokens > sizing.max {
                current.clear();
                current_tokens = 0;
            }
        }
        current.push(unit.clone());
        current_tokens += unit_tokens;
    }

    if !current.is_empty() {
        let text = current.join(joiner);
        // A trailing buffer that is pure carried overlap duplicates the
        // previous chunk's tail; only emit when it adds new content.
        let is_pure_overlap = pieces
            .last()
            .is_some_and(|prev| prev.text.ends_with(text.as_str()));
        if !is_pure_overlap {
            pieces.push(Piece::new(text, false));
        }
    }
    pieces
}

/// The longest suffix of `units` whose combined token estimate stays
/// within `overlap`. Empty when overlap is zero.
pub fn overlap_tail(units: &[String], overlap: usize) -> Vec<String> {
    if overlap == 0 {
        return Vec::new();
    }
    let mut tail: Vec<String> = Vec::new();
    let mut tokens = 0usize;
    for unit in units.iter().rev() {
        let unit_tokens = estimate_tokens(unit);
        if tokens + unit_tokens > overlap {
            break;
        }
        tokens += unit_tokens;
        tail.push(unit.clone());
    }
    tail.reverse();
    tail
}

/// Sentence strategy: split into sentences, pack greedily.
pub fn chunk_sentences(text: &str, sizing: &EffectiveSizing) -> Vec<Piece> {
    pack_units(&split_sentences(text), sizing, " ")
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
    fn test_split_basic() {
        let sentences = split_sentences("One sentence. Two now! And three?");
        assert_eq!(sentences, vec!["One sentence.", "Two now!", "And three?"]);
    }

    #[test]
    fn test_no_split_before_digit_or_lowercase() {
        let sentences = split_sentences("Pi is 3.14 always. Version 2.x too.");
        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[0], "Pi is 3.14 always.");
        assert_eq!(sentences[1], "Version 2.x too.");
    }

    #[test]
    fn test_cjk_terminators() {
        let sentences = split_sentences("これは文です。二つ目です！");
        assert_eq!(sentences.len(), 2);
    }

    #[test]
    fn test_consecutive_terminators_stay_together() {
        let sentences = split_sentences("Really?! Yes.");
        assert_eq!(sentences, vec!["Really?!", "Yes."]);
    }

    #[test]
    fn test_trailing_fragment_kept() {
        let sentences = split_sentences("Complete. trailing fragment without end");
        assert_eq!(sentences.len(), 2);
        assert_eq!(sentences[1], "trailing fragment without end");
    }

    #[test]
    fn test_packing_respects_max() {
        // Each sentence is ~6 tokens; max 14 fits two.
        let text = "Aaaa bbbb cccc dddd one. Aaaa bbbb cccc dddd two. Aaaa bbbb cccc dddd tri.";
        let pieces = chunk_sentences(text, &sizing(14, 0));
        assert!(pieces.len() >= 2);
        for piece in &pieces {
            assert!(crate::token_counter::estimate_tokens(&piece.text) <= 14);
            assert!(!piece.size_exceeded);
        }
    }

    #[test]
    fn test_overlap_carried_as_tail_sentences() {
        let text = "First sentence here okay. Second sentence here okay. Third sentence here okay.";
        let pieces = chunk_sentences(text, &sizing(12, 6));
        assert!(pieces.len() >= 2);
        // The second chunk starts with the tail of the first.
        let first = &pieces[0].text;
        let second = &pieces[1].text;
        let last_sentence = first.rsplit(". ").next().unwrap_or(first);
        assert!(
            second.starts_with(last_sentence) || second.starts_with(first.rsplit(". ").next().unwrap()),
            "second chunk {second:?} does not start with overlap from {first:?}"
        );
    }

    #[test]
    fn test_single_oversized_sentence_flagged() {
        let long = format!("{} end.", "word ".repeat(200));
        let pieces = chunk_sentences(&long, &sizing(10, 0));
        assert_eq!(pieces.len(), 1);
        assert!(pieces[0].size_exceeded);
    }

    #[test]
    fn test_empty_text_yields_nothing() {
        assert!(chunk_sentences("", &sizing(100, 10)).is_empty());
        assert!(chunk_sentences("   \n  ", &sizing(100, 10)).is_empty());
    }

    #[test]
    fn test_overlap_tail_budget() {
        let units: Vec<String> = vec![
            "aaaa bbbb cccc dddd".to_string(), // 4 tokens
            "eeee ffff".to_string(),           // 2 tokens
            "gggg hhhh".to_string(),           // 2 tokens
        ];
        let tail = overlap_tail(&units, 4);
        assert_eq!(tail, vec!["eeee ffff".to_string(), "gggg hhhh".to_string()]);
        assert!(overlap_tail(&units, 0).is_empty());
    }
}
