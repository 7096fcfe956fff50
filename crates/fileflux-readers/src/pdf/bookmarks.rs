//! Heading promotion from the PDF outline.
//!
//! Outline entries are ground truth for headings. Blocks whose text
//! matches an outline title on the same or an adjacent page are promoted
//! to headings at the outline level.

use fileflux_core::text::{char_overlap_similarity, normalize_for_match};
use fileflux_core::{BlockKind, TextBlock};

/// One flattened outline entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutlineEntry {
    /// Entry title.
    pub title: String,
    /// 1-based target page.
    pub page: usize,
    /// Nesting depth, 1-based.
    pub level: u8,
}

/// Similarity floor for a fuzzy title match.
const SIMILARITY_THRESHOLD: f64 = 0.85;

/// Containment matches shorter than this are ignored as noise.
const MIN_CONTAINMENT_LEN: usize = 4;

/// Promote non-heading blocks matching outline titles on the same or an
/// adjacent page. Returns the number of promoted blocks.
pub fn promote_bookmark_headings(blocks: &mut [TextBlock], outline: &[OutlineEntry]) -> usize {
    if outline.is_empty() {
        return 0;
    }
    let mut promoted = 0;
    for block in blocks.iter_mut() {
        if block.kind == BlockKind::Heading {
            continue;
        }
        let matched = outline.iter().find(|entry| {
            entry.page.abs_diff(block.page) <= 1 && titles_match(&block.content, &entry.title)
        });
        if let Some(entry) = matched {
            block.kind = BlockKind::Heading;
            block.heading_level = Some(entry.level.clamp(1, 6));
            promoted += 1;
        }
    }
    promoted
}

/// Match block text against a bookmark title: normalized equality,
/// prefix/suffix containment, or character-overlap similarity.
fn titles_match(content: &str, title: &str) -> bool {
    let a = normalize_for_match(content);
    let b = normalize_for_match(title);
    if a.is_empty() || b.is_empty() {
        return false;
    }
    if a == b {
        return true;
    }
    if b.chars().count() >= MIN_CONTAINMENT_LEN && (a.starts_with(&b) || a.ends_with(&b)) {
        return true;
    }
    if a.chars().count() >= MIN_CONTAINMENT_LEN && (b.starts_with(&a) || b.ends_with(&a)) {
        return true;
    }
    char_overlap_similarity(&a, &b) >= SIMILARITY_THRESHOLD
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(title: &str, page: usize, level: u8) -> OutlineEntry {
        OutlineEntry {
            title: title.to_string(),
            page,
            level,
        }
    }

    #[test]
    fn test_exact_match_promotes() {
        let mut blocks = vec![TextBlock::paragraph("Introduction", 1, 0)];
        let n = promote_bookmark_headings(&mut blocks, &[entry("Introduction", 1, 1)]);
        assert_eq!(n, 1);
        assert_eq!(blocks[0].kind, BlockKind::Heading);
        assert_eq!(blocks[0].heading_level, Some(1));
    }

    #[test]
    fn test_case_and_space_insensitive() {
        let mut blocks = vec![TextBlock::paragraph("RESULTS   AND DISCUSSION", 2, 0)];
        promote_bookmark_headings(&mut blocks, &[entry("Results and Discussion", 2, 2)]);
        assert_eq!(blocks[0].heading_level, Some(2));
    }

    #[test]
    fn test_adjacent_page_matches_far_page_does_not() {
        let mut blocks = vec![
            TextBlock::paragraph("Methods", 3, 0),
            TextBlock::paragraph("Methods", 7, 1),
        ];
        promote_bookmark_headings(&mut blocks, &[entry("Methods", 2, 1)]);
        assert_eq!(blocks[0].kind, BlockKind::Heading);
        assert_eq!(blocks[1].kind, BlockKind::Paragraph);
    }

    #[test]
    fn test_prefix_containment() {
        let mut blocks = vec![TextBlock::paragraph("Appendix A Additional proofs", 9, 0)];
        promote_bookmark_headings(&mut blocks, &[entry("Appendix A", 9, 1)]);
        assert_eq!(blocks[0].kind, BlockKind::Heading);
    }

    #[test]
    fn test_fuzzy_similarity() {
        // One character differs; overlap stays above the threshold.
        let mut blocks = vec![TextBlock::paragraph("Related Workz", 4, 0)];
        promote_bookmark_headings(&mut blocks, &[entry("Related Works", 4, 2)]);
        assert_eq!(blocks[0].kind, BlockKind::Heading);
    }

    #[test]
    fn test_existing_headings_untouched() {
        let mut blocks = vec![TextBlock::heading("Overview", 3, 1, 0)];
        promote_bookmark_headings(&mut blocks, &[entry("Overview", 1, 1)]);
        // Level from earlier detection is kept.
        assert_eq!(blocks[0].heading_level, Some(3));
    }

    #[test]
    fn test_unrelated_text_not_promoted() {
        let mut blocks = vec![TextBlock::paragraph(
            "The experiment ran for three weeks in total.",
            1,
            0,
        )];
        let n = promote_bookmark_headings(&mut blocks, &[entry("Introduction", 1, 1)]);
        assert_eq!(n, 0);
        assert_eq!(blocks[0].kind, BlockKind::Paragraph);
    }
}
