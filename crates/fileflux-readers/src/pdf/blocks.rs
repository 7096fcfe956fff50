//! Block-type detection: headings, list items, code and quotes.
//!
//! Font metrics are the primary signal; text patterns are the fallback for
//! decoders that report no style.

use fileflux_core::{BlockKind, TextBlock};
use once_cell::sync::Lazy;
use regex::Regex;

static NUMBERED_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d+(?:\.\d+)*)\.?\s+\S").expect("numbered heading"));
static CHAPTER_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^chapter\s+\d+|^제\s*\d+\s*장").expect("chapter heading"));
static LIST_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([-*+•·]|\d+[.)])\s+").expect("list prefix"));
static ORDERED_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d+[.)]\s+").expect("ordered"));

/// Maximum length for a line to count as "short" in heading heuristics.
const SHORT_TEXT_LEN: usize = 80;

/// Classify every block in place, given the style information the decoder
/// attached. Blocks already classified (for example by bookmark promotion)
/// are left alone.
pub fn detect_block_kinds(blocks: &mut [TextBlock]) {
    let median_size = median_font_size(blocks);

    for block in blocks.iter_mut() {
        if block.kind != BlockKind::Paragraph {
            continue;
        }
        if let Some(level) = font_heading_level(block, median_size) {
            block.kind = BlockKind::Heading;
            block.heading_level = Some(level);
            continue;
        }
        classify_by_pattern(block);
    }
}

/// Median of the font sizes reported on the blocks, 0.0 when none.
fn median_font_size(blocks: &[TextBlock]) -> f32 {
    let mut sizes: Vec<f32> = blocks
        .iter()
        .filter_map(|b| b.style.as_ref().and_then(|s| s.font_size))
        .filter(|s| *s > 0.0)
        .collect();
    if sizes.is_empty() {
        return 0.0;
    }
    sizes.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    sizes[sizes.len() / 2]
}

/// Heading level from font size ratio and boldness, when styles are
/// available.
fn font_heading_level(block: &TextBlock, median_size: f32) -> Option<u8> {
    let style = block.style.as_ref()?;
    let size = style.font_size?;
    if median_size <= 0.0 || size <= 0.0 {
        return None;
    }
    let ratio = size / median_size;
    let short = is_short_non_terminal(&block.content);

    if style.bold {
        if ratio >= 1.5 {
            return Some(1);
        }
        if ratio >= 1.3 {
            return Some(2);
        }
        if ratio >= 1.2 {
            return Some(3);
        }
        if ratio >= 1.1 {
            return Some(4);
        }
        if short {
            return Some(5);
        }
    } else if ratio >= 1.4 && short {
        return Some(2);
    }
    None
}

/// Pattern fallback used when fonts do not resolve the block.
fn classify_by_pattern(block: &mut TextBlock) {
    let text = block.content.trim();
    let first_line = text.lines().next().unwrap_or("");

    if let Some(caps) = NUMBERED_HEADING.captures(first_line) {
        let numbering = &caps[1];
        // Multi-component numbering is a section heading; a single number
        // is an ordered list item.
        if numbering.contains('.') && is_short_non_terminal(first_line) {
            let level = (numbering.matches('.').count() + 1).min(6) as u8;
            block.kind = BlockKind::Heading;
            block.heading_level = Some(level);
            return;
        }
    }
    if CHAPTER_HEADING.is_match(first_line) && is_short_non_terminal(first_line) {
        block.kind = BlockKind::Heading;
        block.heading_level = Some(1);
        return;
    }
    if is_all_caps_short(first_line) {
        block.kind = BlockKind::Heading;
        block.heading_level = Some(2);
        return;
    }
    if LIST_PREFIX.is_match(first_line) {
        block.kind = BlockKind::ListItem;
        block.ordered = Some(ORDERED_PREFIX.is_match(first_line));
        return;
    }
    if looks_like_code(text) {
        block.kind = BlockKind::CodeBlock;
        return;
    }
    if is_quoted(text) {
        block.kind = BlockKind::Quote;
    }
}

/// Short text that does not end a sentence.
fn is_short_non_terminal(text: &str) -> bool {
    let trimmed = text.trim();
    trimmed.chars().count() <= SHORT_TEXT_LEN
        && !trimmed
            .chars()
            .last()
            .is_some_and(fileflux_core::text::is_sentence_terminator)
}

/// A short line consisting entirely of uppercase letters (plus digits,
/// spaces and punctuation).
fn is_all_caps_short(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.chars().count() > 60 || trimmed.is_empty() {
        return false;
    }
    let mut has_letter = false;
    for c in trimmed.chars() {
        if c.is_alphabetic() {
            if c.is_lowercase() {
                return false;
            }
            has_letter = true;
        }
    }
    has_letter
}

/// Fenced code, or indented lines carrying parens and semicolons.
fn looks_like_code(text: &str) -> bool {
    if text.starts_with("```") {
        return true;
    }
    let lines: Vec<&str> = text.lines().collect();
    if lines.is_empty() {
        return false;
    }
    let codey = lines
        .iter()
        .filter(|l| l.starts_with("    ") && l.contains('(') && l.contains(';'))
        .count();
    codey * 2 > lines.len()
}

/// Text wrapped in matching quote marks.
fn is_quoted(text: &str) -> bool {
    let trimmed = text.trim();
    let mut chars = trimmed.chars();
    let (Some(first), Some(last)) = (chars.next(), chars.next_back()) else {
        return false;
    };
    matches!(
        (first, last),
        ('"', '"') | ('\'', '\'') | ('“', '”') | ('「', '」') | ('『', '』')
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use fileflux_core::TextStyle;

    fn styled_block(content: &str, size: f32, bold: bool, order: usize) -> TextBlock {
        let mut block = TextBlock::paragraph(content, 1, order);
        block.style = Some(TextStyle {
            font_name: None,
            font_size: Some(size),
            bold,
            italic: false,
        });
        block
    }

    #[test]
    fn test_font_based_heading_ladder() {
        let mut blocks = vec![
            styled_block("Document Title", 18.0, true, 0),
            styled_block("Subsection", 12.0, true, 1),
            styled_block("body text one.", 10.0, false, 2),
            styled_block("body text two.", 10.0, false, 3),
            styled_block("body text three.", 10.0, false, 4),
        ];
        detect_block_kinds(&mut blocks);
        // 18/10 = 1.8 bold -> H1; 12/10 = 1.2 bold -> H3.
        assert_eq!(blocks[0].heading_level, Some(1));
        assert_eq!(blocks[1].heading_level, Some(3));
        assert_eq!(blocks[2].kind, BlockKind::Paragraph);
    }

    #[test]
    fn test_bold_only_short_is_h5() {
        let mut blocks = vec![
            styled_block("Bold label", 10.0, true, 0),
            styled_block("regular text.", 10.0, false, 1),
            styled_block("more regular text.", 10.0, false, 2),
        ];
        detect_block_kinds(&mut blocks);
        assert_eq!(blocks[0].heading_level, Some(5));
    }

    #[test]
    fn test_large_regular_short_is_h2() {
        let mut blocks = vec![
            styled_block("Display Heading", 15.0, false, 0),
            styled_block("body.", 10.0, false, 1),
            styled_block("body.", 10.0, false, 2),
        ];
        detect_block_kinds(&mut blocks);
        assert_eq!(blocks[0].heading_level, Some(2));
    }

    #[test]
    fn test_numbered_pattern_heading_levels() {
        let mut blocks = vec![
            TextBlock::paragraph("1.2 Architecture Overview", 1, 0),
            TextBlock::paragraph("1.2.3 Renderer Details", 1, 1),
        ];
        detect_block_kinds(&mut blocks);
        assert_eq!(blocks[0].heading_level, Some(2));
        assert_eq!(blocks[1].heading_level, Some(3));
    }

    #[test]
    fn test_chapter_patterns() {
        let mut blocks = vec![
            TextBlock::paragraph("Chapter 4", 1, 0),
            TextBlock::paragraph("제3장 결과", 1, 1),
        ];
        detect_block_kinds(&mut blocks);
        assert_eq!(blocks[0].heading_level, Some(1));
        assert_eq!(blocks[1].heading_level, Some(1));
    }

    #[test]
    fn test_all_caps_short_is_h2() {
        let mut blocks = vec![TextBlock::paragraph("EXECUTIVE SUMMARY", 1, 0)];
        detect_block_kinds(&mut blocks);
        assert_eq!(blocks[0].heading_level, Some(2));
    }

    #[test]
    fn test_list_items() {
        let mut blocks = vec![
            TextBlock::paragraph("- first point", 1, 0),
            TextBlock::paragraph("2) second point", 1, 1),
        ];
        detect_block_kinds(&mut blocks);
        assert_eq!(blocks[0].kind, BlockKind::ListItem);
        assert_eq!(blocks[0].ordered, Some(false));
        assert_eq!(blocks[1].kind, BlockKind::ListItem);
        assert_eq!(blocks[1].ordered, Some(true));
    }

    #[test]
    fn test_code_and_quote() {
        let mut blocks = vec![
            TextBlock::paragraph("```rust\nfn main() {}\n```", 1, 0),
            TextBlock::paragraph("    printf(x);\n    exit(0);", 1, 1),
            TextBlock::paragraph("\u{201C}To be or not to be\u{201D}", 1, 2),
        ];
        detect_block_kinds(&mut blocks);
        assert_eq!(blocks[0].kind, BlockKind::CodeBlock);
        assert_eq!(blocks[1].kind, BlockKind::CodeBlock);
        assert_eq!(blocks[2].kind, BlockKind::Quote);
    }

    #[test]
    fn test_sentence_is_left_as_paragraph() {
        let mut blocks = vec![TextBlock::paragraph(
            "The quick brown fox jumps over the lazy dog.",
            1,
            0,
        )];
        detect_block_kinds(&mut blocks);
        assert_eq!(blocks[0].kind, BlockKind::Paragraph);
        assert_eq!(blocks[0].heading_level, None);
    }
}
