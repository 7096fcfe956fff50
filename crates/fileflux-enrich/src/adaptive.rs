//! Adaptive enrichment: split over-long content when the model rejects it.

use crate::merge;
use crate::{DocumentContext, EnrichError, EnrichmentEngine};
use fileflux_chunker::sentence::split_sentences;

/// Split threshold in characters.
pub const SPLIT_THRESHOLD: usize = 1600;

/// Segments shorter than this are discarded.
const MIN_SEGMENT_CHARS: usize = 50;

/// Outcome of an adaptive enrichment attempt.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AdaptiveOutcome {
    /// Whether any call produced output.
    pub success: bool,
    /// Merged summary.
    pub summary: Option<String>,
    /// Keyword union, capped.
    pub keywords: Vec<String>,
    /// Topic union.
    pub topics: Vec<String>,
    /// Last error message, for `enrichment_error` on failure.
    pub error: Option<String>,
}

/// Split content for segment-wise enrichment.
///
/// Paragraphs first; a paragraph over the threshold splits by sentences;
/// a single sentence over the threshold is truncated with an ellipsis.
/// Segments under 50 characters are discarded.
pub fn split_for_enrichment(content: &str, threshold: usize) -> Vec<String> {
    let mut segments = Vec::new();
    for paragraph in content.split("\n\n") {
        let paragraph = paragraph.trim();
        if paragraph.is_empty() {
            continue;
        }
        if paragraph.chars().count() <= threshold {
            segments.push(paragraph.to_string());
            continue;
        }
        for sentence in split_sentences(paragraph) {
            if sentence.chars().count() <= threshold {
                segments.push(sentence);
            } else {
                segments.push(merge::truncate_chars(
                    &sentence,
                    threshold.saturating_sub(50),
                ));
            }
        }
    }
    segments.retain(|s| s.chars().count() >= MIN_SEGMENT_CHARS);
    segments
}

/// Enrich content, falling back to segment-wise calls when the model
/// rejects the input for length. Never panics and never raises; persistent
/// failure is reported through the outcome.
pub fn enrich_adaptive(
    engine: &dyn EnrichmentEngine,
    content: &str,
    ctx: Option<&DocumentContext>,
) -> AdaptiveOutcome {
    match engine.enrich(content, ctx) {
        Ok(result) => AdaptiveOutcome {
            success: result.summary.is_some() || !result.keywords.is_empty(),
            summary: result.summary,
            keywords: merge::union_keywords(&[result.keywords]),
            topics: result.topics,
            error: None,
        },
        Err(EnrichError::TokenLengthExceeded(message)) => {
            tracing::debug!("adaptive split after overflow: {message}");
            enrich_segments(engine, content, ctx)
        }
        Err(EnrichError::Engine(message)) => AdaptiveOutcome {
            error: Some(message),
            ..Default::default()
        },
    }
}

fn enrich_segments(
    engine: &dyn EnrichmentEngine,
    content: &str,
    ctx: Option<&DocumentContext>,
) -> AdaptiveOutcome {
    let segments = split_for_enrichment(content, SPLIT_THRESHOLD);
    let mut summaries: Vec<String> = Vec::new();
    let mut keyword_lists: Vec<Vec<String>> = Vec::new();
    let mut topics: Vec<Vec<String>> = Vec::new();
    let mut last_error = None;

    for segment in &segments {
        match engine.enrich(segment, ctx) {
            Ok(result) => {
                if let Some(summary) = result.summary {
                    if !summary.trim().is_empty() {
                        summaries.push(summary);
                    }
                }
                if !result.keywords.is_empty() {
                    keyword_lists.push(result.keywords);
                }
                if !result.topics.is_empty() {
                    topics.push(result.topics);
                }
            }
            Err(err) => last_error = Some(err.to_string()),
        }
    }

    let summary = merge::merge_summaries(&summaries);
    let keywords = merge::union_keywords(&keyword_lists);
    let merged_topics = merge::union_keywords(&topics);
    let success = summary.is_some() || !keywords.is_empty();
    AdaptiveOutcome {
        success,
        summary,
        keywords,
        topics: merged_topics,
        error: if success { None } else { last_error },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EnrichmentResult;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_split_paragraphs_kept_whole() {
        let content = format!("{}\n\n{}", "a".repeat(100), "b".repeat(100));
        let segments = split_for_enrichment(&content, 1600);
        assert_eq!(segments.len(), 2);
    }

    #[test]
    fn test_split_oversized_paragraph_by_sentences() {
        let sentence = format!("{} end.", "word ".repeat(80)); // ~400 chars
        let paragraph = sentence.repeat(5); // ~2000 chars
        let segments = split_for_enrichment(&paragraph, 1600);
        assert!(segments.len() >= 4);
        for segment in &segments {
            assert!(segment.chars().count() <= 1600);
        }
    }

    #[test]
    fn test_single_long_sentence_truncated() {
        let long = "x".repeat(3000);
        let segments = split_for_enrichment(&long, 1600);
        assert_eq!(segments.len(), 1);
        assert!(segments[0].chars().count() <= 1550);
        assert!(segments[0].ends_with("..."));
    }

    #[test]
    fn test_tiny_segments_discarded() {
        let content = "short\n\nthis segment is long enough to be kept for enrichment calls";
        let segments = split_for_enrichment(content, 1600);
        assert_eq!(segments.len(), 1);
        assert!(segments[0].starts_with("this segment"));
    }

    /// Rejects the full text once, then summarizes segments.
    struct OverflowingEngine {
        calls: AtomicUsize,
    }

    impl EnrichmentEngine for OverflowingEngine {
        fn enrich(
            &self,
            content: &str,
            _ctx: Option<&DocumentContext>,
        ) -> std::result::Result<EnrichmentResult, EnrichError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call == 0 {
                return Err(EnrichError::TokenLengthExceeded(
                    "context length exceeded".to_string(),
                ));
            }
            Ok(EnrichmentResult {
                summary: Some(format!("This text covers part {call}.")),
                keywords: vec![format!("kw{call}"), "shared".to_string()],
                topics: vec!["doc".to_string()],
            })
        }
    }

    #[test]
    fn test_overflow_splits_and_merges() {
        // Three paragraphs of ~1300 characters each.
        let paragraph = format!("{} tail.", "content words here ".repeat(68));
        let content = format!("{paragraph}\n\n{paragraph}\n\n{paragraph}");
        let engine = OverflowingEngine {
            calls: AtomicUsize::new(0),
        };
        let outcome = enrich_adaptive(&engine, &content, None);
        assert!(outcome.success);
        let summary = outcome.summary.unwrap();
        assert!(summary.chars().count() <= 1000);
        // First summary keeps its opener; later ones are stripped.
        assert_eq!(summary.matches("This text").count(), 1);
        assert!(summary.contains("covers part 1."));
        // Keywords are the case-insensitive union, "shared" only once.
        assert_eq!(
            outcome
                .keywords
                .iter()
                .filter(|k| k.as_str() == "shared")
                .count(),
            1
        );
        assert!(outcome.keywords.len() <= merge::MAX_KEYWORDS);
    }

    /// Always rejects for length.
    struct AlwaysOverflowing;
    impl EnrichmentEngine for AlwaysOverflowing {
        fn enrich(
            &self,
            _content: &str,
            _ctx: Option<&DocumentContext>,
        ) -> std::result::Result<EnrichmentResult, EnrichError> {
            Err(EnrichError::TokenLengthExceeded("token limit".to_string()))
        }
    }

    #[test]
    fn test_persistent_failure_reported_not_raised() {
        let content = format!("{}\n\n{}", "a".repeat(200), "b".repeat(200));
        let outcome = enrich_adaptive(&AlwaysOverflowing, &content, None);
        assert!(!outcome.success);
        assert!(outcome.summary.is_none());
        assert!(outcome.error.is_some());
    }
}
