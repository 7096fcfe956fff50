//! Page text assembly: page-number filtering and cross-page sentence
//! merging.

use fileflux_core::text::{ends_incomplete, is_page_number_line, starts_incomplete};

/// Drop standalone page-number lines from a page's text.
pub fn filter_page_numbers(page_text: &str) -> String {
    page_text
        .lines()
        .filter(|line| !is_page_number_line(line))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Character span of one page inside the merged document text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageSpan {
    /// 1-based page number.
    pub page: usize,
    /// Start offset, inclusive.
    pub start: usize,
    /// End offset, exclusive.
    pub end: usize,
}

/// Merge per-page texts into one document.
///
/// When a page ends mid-sentence and the next begins mid-sentence, the two
/// fragments are joined with a single space; otherwise pages are separated
/// by a blank line. Empty pages are skipped. Returns the merged text and
/// the span each page occupies in it.
pub fn merge_pages(pages: &[(usize, String)]) -> (String, Vec<PageSpan>) {
    let mut text = String::new();
    let mut spans = Vec::new();

    for (page_no, page_text) in pages {
        let trimmed = page_text.trim();
        if trimmed.is_empty() {
            continue;
        }
        if !text.is_empty() {
            if ends_incomplete(&text) && starts_incomplete(trimmed) {
                text.push(' ');
            } else {
                text.push_str("\n\n");
            }
        }
        let start = text.len();
        text.push_str(trimmed);
        spans.push(PageSpan {
            page: *page_no,
            start,
            end: text.len(),
        });
    }
    (text, spans)
}
