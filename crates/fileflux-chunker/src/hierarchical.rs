//! Hierarchical strategy: headings are hard boundaries; sections chunk by
//! paragraphs and carry their ancestor heading path.

use crate::paragraph;
use crate::piece::Piece;
use crate::sizing::EffectiveSizing;
use once_cell::sync::Lazy;
use regex::Regex;

static HEADING_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(#{1,6})\s+(.*)$").expect("heading line"));

/// One section: its heading path and body text.
#[derive(Debug, Clone, PartialEq, Eq)]
struct SectionText {
    path: Vec<String>,
    body: String,
}

/// Split text at heading lines, tracking the ancestor stack.
fn split_sections(text: &str) -> Vec<SectionText> {
    let mut sections: Vec<SectionText> = Vec::new();
    let mut stack: Vec<(usize, String)> = Vec::new();
    let mut body = String::new();

    let flush = |stack: &[(usize, String)], body: &mut String, sections: &mut Vec<SectionText>| {
        if !body.trim().is_empty() {
            sections.push(SectionText {
                path: stack.iter().map(|(_, title)| title.clone()).collect(),
                body: std::mem::take(body).trim().to_string(),
            });
        } else {
            body.clear();
        }
    };

    for line in text.lines() {
        if let Some(caps) = HEADING_LINE.captures(line.trim_start()) {
            flush(&stack, &mut body, &mut sections);
            let level = caps[1].len();
            let title = caps[2].trim().to_string();
            stack.retain(|(l, _)| *l < level);
            stack.push((level, title));
        } else {
            body.push_str(line);
            body.push('\n');
        }
    }
    flush(&stack, &mut body, &mut sections);
    sections
}

/// Hierarchical strategy.
pub fn chunk_hierarchical(text: &str, sizing: &EffectiveSizing) -> Vec<Piece> {
    let sections = split_sections(text);
    let mut pieces = Vec::new();
    for section in sections {
        for piece in paragraph::chunk_paragraphs(&section.body, sizing) {
            pieces.push(piece.with_path(section.path.clone()));
        }
    }
    pieces
}
