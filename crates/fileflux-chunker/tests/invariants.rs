//! Property-based invariants for the chunking stage.

use fileflux_chunker::{estimate_tokens, sizing::cjk_multiplier, Chunker};
use fileflux_core::chunk::props;
use fileflux_core::{CancellationToken, ChunkStrategy, ChunkingOptions, RefinedContent};
use proptest::prelude::*;

fn run_chunker(text: &str, max: usize, overlap: usize, strategy: ChunkStrategy) -> Vec<fileflux_core::Chunk> {
    let refined = RefinedContent {
        text: text.to_string(),
        ..Default::default()
    };
    let options = ChunkingOptions::default()
        .with_strategy(strategy)
        .with_sizes(max, overlap);
    Chunker::new()
        .chunk(&refined, &options, None, &CancellationToken::new())
        .expect("chunking succeeds")
        .chunks
}

/// Normalize whitespace for content comparisons.
fn squash(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

proptest! {
    #[test]
    fn indices_contiguous_and_ids_unique(
        text in "[a-zA-Z ,.]{0,800}",
        max in 8usize..64,
    ) {
        let overlap = max / 4;
        let chunks = run_chunker(&text, max, overlap, ChunkStrategy::Sentence);
        for (i, chunk) in chunks.iter().enumerate() {
            prop_assert_eq!(chunk.index, i);
            prop_assert!(!chunk.content.trim().is_empty());
        }
        let mut ids: Vec<&str> = chunks.iter().map(|c| c.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        prop_assert_eq!(ids.len(), chunks.len());
    }

    #[test]
    fn bounded_unless_flagged(
        text in "[a-z ,.]{0,800}",
        max in 8usize..64,
    ) {
        let chunks = run_chunker(&text, max, 0, ChunkStrategy::Sentence);
        for chunk in &chunks {
            if !chunk.prop_bool(props::SIZE_EXCEEDED) {
                prop_assert!(estimate_tokens(&chunk.content) <= max);
            }
        }
    }

    #[test]
    fn zero_overlap_concatenation_reproduces_text(
        words in proptest::collection::vec("[a-z]{1,8}", 0..120),
    ) {
        let mut text = String::new();
        for (i, word) in words.iter().enumerate() {
            text.push_str(word);
            if i % 7 == 6 {
                text.push_str(". ");
            } else {
                text.push(' ');
            }
        }
        let chunks = run_chunker(&text, 24, 0, ChunkStrategy::Sentence);
        let concat = chunks
            .iter()
            .map(|c| c.content.as_str())
            .collect::<Vec<_>>()
            .join(" ");
        prop_assert_eq!(squash(&concat), squash(&text));
    }

    #[test]
    fn cjk_multiplier_monotone_non_increasing(
        a in 0.0f64..1.0,
        b in 0.0f64..1.0,
    ) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(cjk_multiplier(high) <= cjk_multiplier(low) + 1e-12);
        prop_assert!(cjk_multiplier(high) >= 0.15);
    }

    #[test]
    fn page_number_filter_idempotent(
        lines in proptest::collection::vec("[a-zA-Z0-9 /\\-]{0,24}", 0..40),
    ) {
        let text = lines.join("\n");
        let filter = |input: &str| -> String {
            input
                .lines()
                .filter(|l| !fileflux_core::text::is_page_number_line(l))
                .collect::<Vec<_>>()
                .join("\n")
        };
        let once = filter(&text);
        prop_assert_eq!(filter(&once), once.clone());
    }

    #[test]
    fn sentence_splitter_respects_lookahead(
        before in "[A-Za-z ]{1,40}",
        digit in 0u32..10,
    ) {
        // A terminator directly followed by a digit never splits.
        let text = format!("{before}.{digit} tail words here");
        let sentences = fileflux_chunker::sentence::split_sentences(&text);
        prop_assert_eq!(sentences.len(), 1);
    }
}

#[test]
fn overlap_prefix_matches_previous_suffix() {
    let text = "First sentence with words. Second sentence with words. \
                Third sentence with words. Fourth sentence with words.";
    let chunks = run_chunker(text, 14, 7, ChunkStrategy::Sentence);
    assert!(chunks.len() >= 2);
    for pair in chunks.windows(2) {
        let prev = &pair[0].content;
        let next = &pair[1].content;
        // The next chunk opens with the sentence the previous one ends
        // with: overlap is content-level, not byte-level.
        let tail = prev.rsplit(". ").next().expect("non-empty chunk");
        assert!(
            next.starts_with(tail),
            "chunk {next:?} does not open with overlap {tail:?}"
        );
    }
}
