//! Merging of segment-level enrichment results.

/// Leading phrases stripped from every summary but the first.
const REDUNDANT_OPENERS: [&str; 4] = ["This text", "This section", "The text", "The document"];

/// Maximum merged summary length in characters.
const MAX_SUMMARY_CHARS: usize = 1000;

/// Maximum keywords kept after the union.
pub const MAX_KEYWORDS: usize = 10;

/// Merge segment summaries: concatenate with spaces, strip redundant
/// leading phrases from all but the first, and truncate to 1000
/// characters with an ellipsis.
pub fn merge_summaries(summaries: &[String]) -> Option<String> {
    let non_empty: Vec<&str> = summaries
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();
    if non_empty.is_empty() {
        return None;
    }

    let mut merged = String::new();
    for (idx, summary) in non_empty.iter().enumerate() {
        let piece = if idx == 0 {
            (*summary).to_string()
        } else {
            strip_redundant_opener(summary)
        };
        if piece.is_empty() {
            continue;
        }
        if !merged.is_empty() {
            merged.push(' ');
        }
        merged.push_str(&piece);
    }
    Some(truncate_chars(&merged, MAX_SUMMARY_CHARS))
}

/// Remove a redundant opener phrase, lowercasing the first remaining
/// letter is deliberately not attempted; the phrase boundary is enough.
fn strip_redundant_opener(summary: &str) -> String {
    for opener in REDUNDANT_OPENERS {
        if let Some(rest) = summary.strip_prefix(opener) {
            return rest.trim_start().to_string();
        }
    }
    summary.to_string()
}

/// Truncate to at most `limit` characters, appending an ellipsis when
/// anything was cut.
pub fn truncate_chars(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let cut: String = text.chars().take(limit.saturating_sub(3)).collect();
    format!("{}...", cut.trim_end())
}

/// Case-insensitive union of keyword lists, order-preserving, capped at
/// [`MAX_KEYWORDS`].
pub fn union_keywords(lists: &[Vec<String>]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    let mut out = Vec::new();
    for list in lists {
        for keyword in list {
            let keyword = keyword.trim();
            if keyword.is_empty() {
                continue;
            }
            let key = keyword.to_lowercase();
            if seen.contains(&key) {
                continue;
            }
            seen.push(key);
            out.push(keyword.to_string());
            if out.len() >= MAX_KEYWORDS {
                return out;
            }
        }
    }
    out
}
