//! Shared text normalization helpers used by readers and the refiner.
//!
//! All regexes are compiled once at first use.

use once_cell::sync::Lazy;
use regex::Regex;

/// Sentence terminators, Latin and CJK.
pub const SENTENCE_TERMINATORS: [char; 6] = ['.', '!', '?', '。', '！', '？'];

/// Whether `c` ends a sentence.
pub fn is_sentence_terminator(c: char) -> bool {
    SENTENCE_TERMINATORS.contains(&c)
}

static PAGE_NUMBER_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        // Standalone integer, optionally dash-wrapped: "7", "- 7 -".
        r"^[-\s]*\d+[-\s]*$",
        // "page 7", "Page 7 of 12".
        r"(?i)^page\s+\d+(\s+of\s+\d+)?$",
        // "p. 7".
        r"(?i)^p\.\s*\d+$",
        // Korean page markers.
        r"^페이지\s*\d+$",
        r"^쪽\s*\d+$",
        // "7/12".
        r"^\d+\s*/\s*\d+$",
        // Lowercase Roman numerals.
        r"^[ivxlcdm]+$",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("page number pattern"))
    .collect()
});

/// Whether a line is a standalone page-number artifact.
///
/// Only lines shorter than 20 characters qualify. The check is idempotent
/// by construction; dropping matching lines twice equals dropping once.
pub fn is_page_number_line(line: &str) -> bool {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.chars().count() >= 20 {
        return false;
    }
    PAGE_NUMBER_PATTERNS.iter().any(|re| re.is_match(trimmed))
}

/// Decode bytes as UTF-8, replacing invalid sequences with U+FFFD, and
/// strip NUL bytes and normalize line endings to `\n`.
pub fn sanitize_bytes(bytes: &[u8]) -> String {
    sanitize_text(&String::from_utf8_lossy(bytes))
}

/// Strip NUL characters and normalize `\r\n` and `\r` to `\n`.
pub fn sanitize_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\0' => {}
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push('\n');
            }
            _ => out.push(c),
        }
    }
    out
}

static SPACE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]+").expect("space runs"));
static BLANK_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n{3,}").expect("blank runs"));
static EOL_HYPHEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Za-z])-\n([a-z])").expect("eol hyphen"));

/// Collapse runs of spaces and tabs to a single space.
pub fn collapse_spaces(text: &str) -> String {
    SPACE_RUNS.replace_all(text, " ").into_owned()
}

/// Cap runs of three or more newlines at two.
pub fn cap_blank_lines(text: &str) -> String {
    BLANK_RUNS.replace_all(text, "\n\n").into_owned()
}

/// Trim trailing spaces from every line.
pub fn trim_line_ends(text: &str) -> String {
    let mut out: String = text
        .split('\n')
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n");
    if text.ends_with('\n') && !out.ends_with('\n') {
        out.push('\n');
    }
    out
}

/// Join words broken across a line end with a hyphen: `word-\nword`
/// becomes `wordword`.
pub fn repair_hyphenation(text: &str) -> String {
    EOL_HYPHEN.replace_all(text, "$1$2").into_owned()
}

/// Full normalization pass applied by every reader before emitting text:
/// collapse space runs, cap blank-line runs at two, trim line ends, repair
/// end-of-line hyphenation and trim the document.
pub fn normalize_extracted(text: &str) -> String {
    let text = collapse_spaces(text);
    let text = trim_line_ends(&text);
    let text = cap_blank_lines(&text);
    let text = repair_hyphenation(&text);
    text.trim().to_string()
}

/// Gentle cleanup for markup-preserving readers: trim line ends, cap blank
/// runs and trim the document, leaving indentation and inline spacing
/// alone.
pub fn tidy_markup(text: &str) -> String {
    let text = trim_line_ends(text);
    let text = cap_blank_lines(&text);
    text.trim().to_string()
}

static TRAILING_CONTINUATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[A-Za-z0-9가-힣,:\-]$").expect("trailing continuation"));
static LEADING_CONTINUATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-z,;)\]]").expect("leading continuation"));

/// Whether a page's text ends mid-sentence.
pub fn ends_incomplete(page_text: &str) -> bool {
    match page_text.trim_end().chars().last() {
        None => false,
        Some(c) if is_sentence_terminator(c) => false,
        Some(c) => {
            let mut buf = [0u8; 4];
            TRAILING_CONTINUATION.is_match(c.encode_utf8(&mut buf)) || c.is_alphanumeric()
        }
    }
}

/// Whether a page's text starts mid-sentence.
pub fn starts_incomplete(page_text: &str) -> bool {
    match page_text.trim_start().chars().next() {
        None => false,
        Some(c) => {
            c.is_lowercase() || {
                let mut buf = [0u8; 4];
                LEADING_CONTINUATION.is_match(c.encode_utf8(&mut buf))
            }
        }
    }
}

/// Lowercase and collapse whitespace for fuzzy matching.
pub fn normalize_for_match(text: &str) -> String {
    collapse_spaces(&text.to_lowercase())
        .trim()
        .to_string()
}

/// Character-overlap similarity of two strings in `[0, 1]`.
///
/// Counts characters common to both (with multiplicity) against the length
/// of the longer string. 1.0 for identical multisets, 0.0 for disjoint.
pub fn char_overlap_similarity(a: &str, b: &str) -> f64 {
    use std::collections::HashMap;
    let (a_len, b_len) = (a.chars().count(), b.chars().count());
    if a_len == 0 || b_len == 0 {
        return if a_len == b_len { 1.0 } else { 0.0 };
    }
    let mut counts: HashMap<char, isize> = HashMap::new();
    for c in a.chars() {
        *counts.entry(c).or_insert(0) += 1;
    }
    let mut common = 0usize;
    for c in b.chars() {
        if let Some(n) = counts.get_mut(&c) {
            if *n > 0 {
                *n -= 1;
                common += 1;
            }
        }
    }
    common as f64 / a_len.max(b_len) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_number_lines() {
        assert!(is_page_number_line("7"));
        assert!(is_page_number_line("- 7 -"));
        assert!(is_page_number_line("Page 3 of 10"));
        assert!(is_page_number_line("p. 12"));
        assert!(is_page_number_line("페이지 3"));
        assert!(is_page_number_line("쪽 5"));
        assert!(is_page_number_line("3/10"));
        assert!(is_page_number_line("xiv"));
        assert!(!is_page_number_line("Chapter 7 covers parsing"));
        assert!(!is_page_number_line("XIV")); // uppercase Roman is prose
        assert!(!is_page_number_line(""));
    }

    #[test]
    fn test_page_number_filter_is_idempotent() {
        let filter = |text: &str| -> String {
            text.lines()
                .filter(|l| !is_page_number_line(l))
                .collect::<Vec<_>>()
                .join("\n")
        };
        let input = "intro\n- 2 -\nbody\n3/9\nend";
        let once = filter(input);
        assert_eq!(filter(&once), once);
        assert_eq!(once, "intro\nbody\nend");
    }

    #[test]
    fn test_sanitize_bytes_replaces_invalid_utf8() {
        let out = sanitize_bytes(b"ab\x00c\xffd\r\ne");
        assert_eq!(out, "abc\u{FFFD}d\ne");
    }

    #[test]
    fn test_normalize_extracted() {
        let input = "a  b\t c   \n\n\n\nnext li-\nne";
        assert_eq!(normalize_extracted(input), "a b c\n\nnext line");
    }

    #[test]
    fn test_tidy_markup_keeps_indentation() {
        let input = "- one\n   - nested   \n\n\n\n- two";
        assert_eq!(tidy_markup(input), "- one\n   - nested\n\n- two");
    }

    #[test]
    fn test_incomplete_page_edges() {
        assert!(ends_incomplete("jumps over the"));
        assert!(!ends_incomplete("jumps over."));
        assert!(!ends_incomplete("完了。"));
        assert!(starts_incomplete("lazy dog."));
        assert!(!starts_incomplete("The lazy dog."));
        assert!(!ends_incomplete(""));
        assert!(!starts_incomplete(""));
    }

    #[test]
    fn test_char_overlap_similarity() {
        assert_eq!(char_overlap_similarity("abc", "abc"), 1.0);
        assert_eq!(char_overlap_similarity("abc", "xyz"), 0.0);
        let sim = char_overlap_similarity("introduction", "introductions");
        assert!(sim > 0.85, "got {sim}");
    }

    #[test]
    fn test_hyphenation_repair_leaves_dashes_alone() {
        assert_eq!(repair_hyphenation("well-known"), "well-known");
        assert_eq!(repair_hyphenation("con-\ntinued"), "continued");
        // A capitalized continuation is likely a compound name, not a break.
        assert_eq!(repair_hyphenation("UTF-\n8"), "UTF-\n8");
    }
}
