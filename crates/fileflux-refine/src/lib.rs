//! # fileflux-refine
//!
//! The refinement stage: cleans the extracted text body in a fixed
//! operation order, restructures detected headings into markdown, reinjects
//! high-confidence tables, and scores the result.
//!
//! Operation order (each step optional through [`RefineOptions`]):
//! whitespace cleanup, header/footer removal, page-number removal,
//! hyphenation repair, mid-sentence line-break removal, heading
//! restructuring, table reinjection.

pub mod quality;
pub mod tables;

pub use tables::render_markdown_table;

use fileflux_core::text as coretext;
use fileflux_core::{
    BlockKind, CancellationToken, ParsedContent, RawContent, RefineOptions, RefinedContent,
    Result, Section,
};
use std::collections::HashMap;
use std::time::Instant;

/// Minimum pages a line must repeat across to count as a header or footer.
const MIN_HEADER_REPEATS: usize = 3;

/// The refinement stage.
#[derive(Debug, Clone, Copy, Default)]
pub struct Refiner {
    options: RefineOptions,
}

impl Refiner {
    /// Create a refiner with the given options.
    pub fn new(options: RefineOptions) -> Self {
        Self { options }
    }

    /// Refine parsed content. `raw` supplies page spans, blocks and tables;
    /// without it the text-only operations still run.
    ///
    /// # Errors
    /// Returns [`fileflux_core::FileFluxError::Cancelled`] when cancelled
    /// between operations.
    pub fn refine(
        &self,
        parsed: ParsedContent,
        raw: Option<&RawContent>,
        cancel: &CancellationToken,
    ) -> Result<RefinedContent> {
        let started = Instant::now();
        let parsed_text = parsed.text.clone();
        let mut text = parsed.text;

        if self.options.clean_whitespace {
            text = coretext::collapse_spaces(&text);
            text = coretext::trim_line_ends(&text);
            text = coretext::cap_blank_lines(&text);
        }
        cancel.check()?;

        if self.options.remove_headers_footers {
            if let Some(raw) = raw {
                text = remove_headers_footers(&text, &parsed_text, raw);
            }
        }
        cancel.check()?;

        if self.options.remove_page_numbers {
            text = text
                .lines()
                .filter(|line| !coretext::is_page_number_line(line))
                .collect::<Vec<_>>()
                .join("\n");
        }
        cancel.check()?;

        text = coretext::repair_hyphenation(&text);
        text = remove_mid_sentence_breaks(&text);
        cancel.check()?;

        let heading_blocks: Vec<(String, u8)> = raw
            .map(|raw| {
                raw.blocks
                    .iter()
                    .filter(|b| b.kind == BlockKind::Heading)
                    .map(|b| {
                        (
                            b.content.lines().next().unwrap_or("").trim().to_string(),
                            b.heading_level.unwrap_or(1),
                        )
                    })
                    .filter(|(content, _)| !content.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        if self.options.restructure_headings && !heading_blocks.is_empty() {
            text = restructure_headings(&text, &heading_blocks);
        }
        cancel.check()?;

        let mut _reinjected = 0usize;
        if self.options.convert_tables_to_markdown {
            if let Some(raw) = raw {
                let (rewritten, n) = tables::reinject_tables(&text, &raw.tables);
                text = rewritten;
                _reinjected = n;
                tracing::debug!(reinjected = n, tables = raw.tables.len(), "table reinjection");
            }
        }

        let text = text.trim().to_string();
        let levels: Vec<u8> = heading_blocks.iter().map(|(_, l)| *l).collect();
        let quality = quality::compute_quality(&parsed_text, &text, &levels);

        let mut metadata = parsed.metadata;
        metadata.word_count = text.split_whitespace().count();
        if metadata.language.is_none() {
            metadata.language = fileflux_detect::detect_language(&text).map(str::to_string);
        }
        if metadata.page_count.is_none() {
            metadata.page_count = raw.and_then(|r| r.hint_usize("page_count"));
        }

        let structure = build_structure(&heading_blocks);
        let mut parsing = parsed.parsing;
        parsing.refine_duration = started.elapsed();

        Ok(RefinedContent {
            text,
            metadata,
            structure,
            parsing,
            quality,
        })
    }
}

/// Drop lines repeated at page tops and bottoms across enough pages.
///
/// Page spans come from the reader (`page_spans` hint over the parsed
/// text); without them the text is returned unchanged.
fn remove_headers_footers(text: &str, parsed_text: &str, raw: &RawContent) -> String {
    let Some(spans) = raw.hints.get("page_spans") else {
        return text.to_string();
    };
    let mut edge_counts: HashMap<String, usize> = HashMap::new();
    let mut pages = 0usize;
    for span in spans.split(',') {
        let Some((_, range)) = span.split_once(':') else {
            continue;
        };
        let Some((start, end)) = range.split_once('-') else {
            continue;
        };
        let (Ok(start), Ok(end)) = (start.parse::<usize>(), end.parse::<usize>()) else {
            continue;
        };
        if start >= end || end > parsed_text.len() {
            continue;
        }
        let Some(segment) = parsed_text.get(start..end) else {
            continue;
        };
        pages += 1;
        let mut lines = segment.lines().filter(|l| !l.trim().is_empty());
        let first = lines.next().map(|l| l.trim().to_string());
        let last = lines.last().map(|l| l.trim().to_string());
        for edge in [first, last].into_iter().flatten() {
            *edge_counts.entry(edge).or_insert(0) += 1;
        }
    }
    if pages < MIN_HEADER_REPEATS {
        return text.to_string();
    }
    let repeated: Vec<&String> = edge_counts
        .iter()
        .filter(|(_, count)| **count >= MIN_HEADER_REPEATS)
        .map(|(line, _)| line)
        .collect();
    if repeated.is_empty() {
        return text.to_string();
    }
    text.lines()
        .filter(|line| !repeated.iter().any(|r| r.as_str() == line.trim()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Replace single line breaks inside sentences with spaces.
///
/// A break survives when the previous line ends a sentence or the next
/// line opens with an uppercase letter, a digit, or a structural marker.
fn remove_mid_sentence_breaks(text: &str) -> String {
    let lines: Vec<&str> = text.split('\n').collect();
    let mut out = String::with_capacity(text.len());
    for (i, line) in lines.iter().enumerate() {
        out.push_str(line);
        if i + 1 >= lines.len() {
            break;
        }
        let next = lines[i + 1];
        let keep_break = line.trim().is_empty()
            || next.trim().is_empty()
            || line
                .trim_end()
                .chars()
                .last()
                .is_some_and(coretext::is_sentence_terminator)
            || next
                .trim_start()
                .chars()
                .next()
                .is_some_and(|c| c.is_uppercase() || c.is_ascii_digit() || is_structural(c));
        if keep_break {
            out.push('\n');
        } else {
            out.push(' ');
        }
    }
    out
}

fn is_structural(c: char) -> bool {
    matches!(c, '-' | '*' | '•' | '#' | '|' | '>' | '`' | '!' | '[' | '<')
}

/// Rewrite detected heading lines as `#`-prefixed markdown.
fn restructure_headings(text: &str, headings: &[(String, u8)]) -> String {
    let mut by_content: HashMap<&str, u8> = HashMap::new();
    for (content, level) in headings {
        by_content.entry(content.as_str()).or_insert(*level);
    }
    text.lines()
        .map(|line| {
            let trimmed = line.trim();
            if trimmed.starts_with('#') {
                return line.to_string();
            }
            match by_content.get(trimmed) {
                Some(level) => format!("{} {}", "#".repeat(*level as usize), trimmed),
                None => line.to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the section list with ancestor heading paths.
fn build_structure(headings: &[(String, u8)]) -> Vec<Section> {
    let mut stack: Vec<(u8, String)> = Vec::new();
    let mut sections = Vec::new();
    for (content, level) in headings {
        stack.retain(|(l, _)| *l < *level);
        stack.push((*level, content.clone()));
        sections.push(Section {
            heading: content.clone(),
            level: *level,
            path: stack.iter().map(|(_, title)| title.clone()).collect(),
        });
    }
    sections
}

#[cfg(test)]
mod tests {
    use super::*;
    use fileflux_core::{DetectionMethod, Table, TextBlock};

    fn refine_text(text: &str, raw: Option<&RawContent>) -> RefinedContent {
        let parsed = ParsedContent {
            text: text.to_string(),
            ..Default::default()
        };
        Refiner::new(RefineOptions::default())
            .refine(parsed, raw, &CancellationToken::new())
            .unwrap()
    }

    #[test]
    fn test_whitespace_cleanup() {
        let refined = refine_text("a   b\t\tc   \n\n\n\n\nNext.", None);
        assert_eq!(refined.text, "a b c\n\nNext.");
    }

    #[test]
    fn test_page_number_lines_removed() {
        let refined = refine_text("Body text here.\n- 4 -\nMore body.", None);
        assert!(!refined.text.contains("- 4 -"));
    }

    #[test]
    fn test_mid_sentence_break_removed() {
        let refined = refine_text("the sentence continues\non the next line.", None);
        assert_eq!(refined.text, "the sentence continues on the next line.");
    }

    #[test]
    fn test_breaks_before_structure_kept() {
        let refined = refine_text("intro line\n- bullet item\nAnd a sentence.", None);
        assert!(refined.text.contains("intro line\n- bullet item"));
    }

    #[test]
    fn test_hyphenation_repaired() {
        let refined = refine_text("this is hyphen-\nated text.", None);
        assert!(refined.text.contains("hyphenated"));
    }

    #[test]
    fn test_heading_restructured_and_sections_built() {
        let mut raw = RawContent::new("pdf");
        raw.blocks.push(TextBlock::heading("Overview", 1, 1, 0));
        raw.blocks.push(TextBlock::heading("Details", 2, 1, 1));
        let refined = refine_text("Overview\n\nSome body.\n\nDetails\n\nMore body.", Some(&raw));
        assert!(refined.text.contains("# Overview"));
        assert!(refined.text.contains("## Details"));
        assert_eq!(refined.structure.len(), 2);
        assert_eq!(
            refined.structure[1].path,
            vec!["Overview".to_string(), "Details".to_string()]
        );
    }

    #[test]
    fn test_table_reinjection() {
        let fallback = "Name Age City\nAlice 30 NYC\nBob 25 LA";
        let mut raw = RawContent::new("pdf");
        raw.tables.push(Table {
            cells: vec![
                vec!["Name".into(), "Age".into(), "City".into()],
                vec!["Alice".into(), "30".into(), "NYC".into()],
                vec!["Bob".into(), "25".into(), "LA".into()],
            ],
            has_header: true,
            confidence: 0.95,
            method: DetectionMethod::AlignmentPattern,
            page: 1,
            fallback_text: fallback.to_string(),
            needs_llm_assist: false,
            bbox: None,
        });
        let refined = refine_text(&format!("Before.\n\n{fallback}\n\nAfter."), Some(&raw));
        assert!(refined.text.contains("| Name | Age | City |"));
        assert!(refined.text.contains("| --- | --- | --- |"));
        assert!(refined.text.contains("| Bob | 25 | LA |"));
    }

    #[test]
    fn test_low_confidence_table_keeps_fallback() {
        let fallback = "x y\nu v";
        let mut raw = RawContent::new("pdf");
        raw.tables.push(Table {
            cells: vec![vec!["x".into(), "y".into()], vec!["u".into(), "v".into()]],
            has_header: true,
            confidence: 0.3,
            method: DetectionMethod::AlignmentPattern,
            page: 1,
            fallback_text: fallback.to_string(),
            needs_llm_assist: true,
            bbox: None,
        });
        let refined = refine_text(&format!("A.\n\n{fallback}\n\nB."), Some(&raw));
        assert!(!refined.text.contains("| x | y |"));
    }

    #[test]
    fn test_headers_footers_removed() {
        // Three pages, same first line each.
        let p1 = "ACME Corp Annual\nPage one body text.";
        let p2 = "ACME Corp Annual\nPage two body text.";
        let p3 = "ACME Corp Annual\nPage three body text.";
        let text = format!("{p1}\n\n{p2}\n\n{p3}");
        let mut raw = RawContent::new("pdf");
        let mut offset = 0;
        let mut spans = Vec::new();
        for (i, p) in [p1, p2, p3].iter().enumerate() {
            let start = text[offset..].find(p).unwrap() + offset;
            spans.push(format!("{}:{}-{}", i + 1, start, start + p.len()));
            offset = start + p.len();
        }
        raw.set_hint("page_spans", spans.join(","));
        let refined = refine_text(&text, Some(&raw));
        assert!(!refined.text.contains("ACME Corp Annual"));
        assert!(refined.text.contains("Page two body text."));
    }

    #[test]
    fn test_quality_scores_populated() {
        let refined = refine_text("Clean text. All good here.", None);
        assert!(refined.quality.retention_score > 0.9);
        assert_eq!(refined.quality.structure_score, 1.0);
        assert!(refined.quality.overall_score > 0.9);
    }

    #[test]
    fn test_single_page_no_incomplete_endings_is_stable() {
        let text = "A complete sentence.\n\nAnother complete one.";
        let refined = refine_text(text, None);
        assert_eq!(refined.text, text);
    }

    #[test]
    fn test_language_detected() {
        let refined = refine_text("This is clearly English prose with words.", None);
        assert_eq!(refined.metadata.language.as_deref(), Some("en"));
    }

    #[test]
    fn test_cancellation() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let parsed = ParsedContent {
            text: "body".to_string(),
            ..Default::default()
        };
        let err = Refiner::new(RefineOptions::default())
            .refine(parsed, None, &cancel)
            .unwrap_err();
        assert!(matches!(err, fileflux_core::FileFluxError::Cancelled));
    }
}
