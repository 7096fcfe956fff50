//! HTML reader: DOM traversal with markdown emission.

use crate::traits::{DocumentReader, ReaderInput, ReadStructure, StructureUnit};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use fileflux_core::{
    CancellationToken, DetectionMethod, ExtractOptions, FileFluxError, Image, ImageData,
    InputFormat, RawContent, Result, Table,
};
use scraper::{ElementRef, Html, Node, Selector};

/// Elements whose subtrees are never rendered.
const SKIP_TAGS: [&str; 6] = ["script", "style", "head", "meta", "link", "title"];

/// Semantic elements recorded as hints.
const SEMANTIC_TAGS: [&str; 7] = ["article", "section", "nav", "aside", "header", "footer", "main"];

/// Table block delimiters in the emitted text.
const TABLE_START: &str = "--- TABLE ---";
const TABLE_END: &str = "--- END TABLE ---";

/// Reader for `.html` and `.htm` documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlReader;

impl HtmlReader {
    /// Create the reader.
    pub fn new() -> Self {
        Self
    }
}

#[derive(Default)]
struct Emitter {
    out: String,
    images: Vec<Image>,
    tables: Vec<Table>,
    list_depth: usize,
    ordered_counters: Vec<usize>,
    image_index: usize,
    semantic_seen: Vec<&'static str>,
    extract_images: bool,
}

impl Emitter {
    fn block_break(&mut self) {
        if !self.out.is_empty() && !self.out.ends_with("\n\n") {
            while self.out.ends_with(' ') {
                self.out.pop();
            }
            if self.out.ends_with('\n') {
                self.out.push('\n');
            } else {
                self.out.push_str("\n\n");
            }
        }
    }

    fn walk(&mut self, element: ElementRef<'_>) {
        let tag = element.value().name();
        if SKIP_TAGS.contains(&tag) {
            return;
        }
        if let Some(known) = SEMANTIC_TAGS.iter().find(|t| **t == tag) {
            if !self.semantic_seen.contains(known) {
                self.semantic_seen.push(known);
            }
        }

        match tag {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = tag[1..].parse::<usize>().unwrap_or(1);
                self.block_break();
                self.out.push_str(&"#".repeat(level));
                self.out.push(' ');
                self.walk_children(element);
                self.block_break();
            }
            "p" | "div" | "blockquote" | "figure" => {
                self.block_break();
                self.walk_children(element);
                self.block_break();
            }
            "br" => self.out.push('\n'),
            "ul" | "ol" => {
                self.block_break();
                self.list_depth += 1;
                self.ordered_counters
                    .push(if tag == "ol" { 1 } else { 0 });
                self.walk_children(element);
                self.ordered_counters.pop();
                self.list_depth -= 1;
                self.block_break();
            }
            "li" => {
                if !self.out.ends_with('\n') && !self.out.is_empty() {
                    self.out.push('\n');
                }
                let indent = " ".repeat(self.list_depth.saturating_sub(1) * 3);
                self.out.push_str(&indent);
                match self.ordered_counters.last_mut() {
                    Some(counter) if *counter > 0 => {
                        self.out.push_str(&format!("{counter}. "));
                        *counter += 1;
                    }
                    _ => self.out.push_str("- "),
                }
                self.walk_children(element);
            }
            "table" => self.emit_table(element),
            "pre" => self.emit_code(element),
            "a" => {
                let href = element.value().attr("href").unwrap_or("");
                let text = collect_text(element);
                if href.is_empty() {
                    self.out.push_str(&text);
                } else {
                    self.out.push_str(&format!("[{text}]({href})"));
                }
            }
            "img" => self.emit_image(element),
            _ => self.walk_children(element),
        }
    }

    fn walk_children(&mut self, element: ElementRef<'_>) {
        for child in element.children() {
            if let Some(child_el) = ElementRef::wrap(child) {
                self.walk(child_el);
            } else if let Node::Text(text) = child.value() {
                push_collapsed(&mut self.out, text);
            }
        }
    }

    fn emit_table(&mut self, element: ElementRef<'_>) {
        let row_sel = Selector::parse("tr").expect("tr selector");
        let cell_sel = Selector::parse("th, td").expect("cell selector");
        let mut cells: Vec<Vec<String>> = Vec::new();
        let mut has_header = false;
        for row in element.select(&row_sel) {
            let mut row_cells = Vec::new();
            for cell in row.select(&cell_sel) {
                if cell.value().name() == "th" {
                    has_header = true;
                }
                row_cells.push(collect_text(cell));
            }
            if !row_cells.is_empty() {
                cells.push(row_cells);
            }
        }
        if cells.is_empty() {
            return;
        }

        let rendered = cells
            .iter()
            .map(|row| row.join(" | "))
            .collect::<Vec<_>>()
            .join("\n");
        let delimited = format!("{TABLE_START}\n{rendered}\n{TABLE_END}");
        self.block_break();
        self.out.push_str(&delimited);
        self.block_break();

        let mut table = Table {
            cells,
            has_header,
            confidence: 1.0,
            method: DetectionMethod::Native,
            page: 1,
            fallback_text: delimited,
            needs_llm_assist: false,
            bbox: None,
        };
        table.normalize();
        self.tables.push(table);
    }

    fn emit_code(&mut self, element: ElementRef<'_>) {
        let code_sel = Selector::parse("code").expect("code selector");
        let (language, text) = match element.select(&code_sel).next() {
            Some(code) => {
                let language = code
                    .value()
                    .classes()
                    .find_map(|c| c.strip_prefix("language-"))
                    .unwrap_or("")
                    .to_string();
                (language, code.text().collect::<String>())
            }
            None => (String::new(), element.text().collect::<String>()),
        };
        self.block_break();
        self.out.push_str(&format!("```{language}\n{}\n```", text.trim_end()));
        self.block_break();
    }

    fn emit_image(&mut self, element: ElementRef<'_>) {
        let src = element.value().attr("src").unwrap_or("");
        let alt = element.value().attr("alt").unwrap_or("");
        if src.is_empty() {
            return;
        }
        if let Some(encoded) = src
            .strip_prefix("data:")
            .and_then(|rest| rest.split_once(";base64,"))
        {
            // With image extraction disabled, inline payloads are stripped
            // from the text entirely.
            if !self.extract_images {
                return;
            }
            let (mime, payload) = encoded;
            let Ok(bytes) = BASE64.decode(payload.as_bytes()) else {
                return;
            };
            let id = format!("img_{:03}", self.image_index);
            self.image_index += 1;
            let marker = format!("![{alt}](embedded:{id})");
            self.out.push_str(&marker);
            self.images.push(Image {
                id,
                caption: (!alt.is_empty()).then(|| alt.to_string()),
                data: ImageData::Embedded(bytes),
                mime_type: mime.to_string(),
                position_marker: marker,
                dimensions: None,
                properties: Default::default(),
            });
        } else {
            // External URLs are preserved as-is, never fetched.
            self.out.push_str(&format!("![{alt}]({src})"));
        }
    }
}

/// Append text with whitespace runs collapsed, preserving whether the
/// original had leading or trailing whitespace so inline elements keep
/// their word separation.
fn push_collapsed(out: &mut String, text: &str) {
    let has_leading = text.chars().next().is_some_and(char::is_whitespace);
    let has_trailing = text.chars().last().is_some_and(char::is_whitespace);
    let flattened = text.replace(['\n', '\t'], " ");
    let collapsed = fileflux_core::text::collapse_spaces(&flattened);
    let trimmed = collapsed.trim();
    if trimmed.is_empty() {
        if !out.is_empty() && !out.ends_with(char::is_whitespace) {
            out.push(' ');
        }
        return;
    }
    if has_leading && !out.is_empty() && !out.ends_with(char::is_whitespace) {
        out.push(' ');
    }
    out.push_str(trimmed);
    if has_trailing {
        out.push(' ');
    }
}

/// Plain text of a subtree with whitespace collapsed.
fn collect_text(element: ElementRef<'_>) -> String {
    let mut out = String::new();
    for piece in element.text() {
        push_collapsed(&mut out, piece);
    }
    out.trim().to_string()
}

impl DocumentReader for HtmlReader {
    fn id(&self) -> &'static str {
        "html"
    }

    fn formats(&self) -> &'static [InputFormat] {
        &[InputFormat::Html]
    }

    fn read_structure(&self, input: &ReaderInput) -> Result<ReadStructure> {
        let bytes = input.read_bytes()?;
        let html = Html::parse_document(&String::from_utf8_lossy(&bytes));
        let title_sel = Selector::parse("title").map_err(|e| {
            FileFluxError::processing(input.display_path(), self.id(), e.to_string())
        })?;
        let title = html
            .select(&title_sel)
            .next()
            .map(|t| t.text().collect::<String>().trim().to_string())
            .filter(|t| !t.is_empty());
        Ok(ReadStructure {
            title,
            author: None,
            units: vec![StructureUnit {
                index: 0,
                label: "document".to_string(),
            }],
        })
    }

    fn extract(
        &self,
        input: &ReaderInput,
        options: &ExtractOptions,
        cancel: &CancellationToken,
    ) -> Result<RawContent> {
        cancel.check()?;
        let bytes = input.read_bytes()?;
        let source = fileflux_core::text::sanitize_bytes(&bytes);
        let html = Html::parse_document(&source);

        let mut emitter = Emitter {
            extract_images: options.extract_images,
            ..Emitter::default()
        };
        emitter.walk(html.root_element());
        cancel.check()?;

        let mut raw = RawContent::new(self.id());
        raw.text = fileflux_core::text::tidy_markup(&emitter.out);
        raw.images = emitter.images;
        raw.tables = emitter.tables;

        raw.set_hint("table_count", raw.tables.len());
        raw.set_hint("image_count", raw.images.len());
        for tag in &emitter.semantic_seen {
            raw.set_hint(&format!("has_{tag}"), true);
        }
        Ok(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(html: &str) -> RawContent {
        HtmlReader::new()
            .extract(
                &ReaderInput::bytes("page.html", html.as_bytes().to_vec()),
                &ExtractOptions::default(),
                &CancellationToken::new(),
            )
            .unwrap()
    }

    #[test]
    fn test_headings_and_paragraphs() {
        let raw = extract("<html><body><h1>Top</h1><p>Body text.</p><h2>Sub</h2></body></html>");
        assert!(raw.text.contains("# Top"));
        assert!(raw.text.contains("Body text."));
        assert!(raw.text.contains("## Sub"));
    }

    #[test]
    fn test_script_and_style_skipped() {
        let raw = extract(
            "<html><head><title>T</title><style>p{color:red}</style></head>\
             <body><script>alert(1)</script><p>Visible.</p></body></html>",
        );
        assert!(!raw.text.contains("alert"));
        assert!(!raw.text.contains("color"));
        assert!(raw.text.contains("Visible."));
    }

    #[test]
    fn test_nested_lists_with_indent() {
        let raw = extract(
            "<body><ul><li>one<ul><li>nested</li></ul></li><li>two</li></ul></body>",
        );
        assert!(raw.text.contains("- one"));
        assert!(raw.text.contains("   - nested"));
        assert!(raw.text.contains("- two"));
    }

    #[test]
    fn test_ordered_list_numbering() {
        let raw = extract("<body><ol><li>first</li><li>second</li></ol></body>");
        assert!(raw.text.contains("1. first"));
        assert!(raw.text.contains("2. second"));
    }

    #[test]
    fn test_table_delimiters_and_cells() {
        let raw = extract(
            "<body><table><tr><th>Name</th><th>Age</th></tr>\
             <tr><td>Alice</td><td>30</td></tr></table></body>",
        );
        assert!(raw.text.contains("--- TABLE ---"));
        assert!(raw.text.contains("Name | Age"));
        assert!(raw.text.contains("Alice | 30"));
        assert!(raw.text.contains("--- END TABLE ---"));
        assert_eq!(raw.tables.len(), 1);
        assert!(raw.tables[0].has_header);
        assert_eq!(raw.tables[0].cells[1], vec!["Alice", "30"]);
    }

    #[test]
    fn test_code_block_language() {
        let raw = extract(
            "<body><pre><code class=\"language-rust\">fn main() {}</code></pre></body>",
        );
        assert!(raw.text.contains("```rust\nfn main() {}\n```"));
    }

    #[test]
    fn test_links_rendered() {
        let raw = extract("<body><p>See <a href=\"https://example.com\">the docs</a>.</p></body>");
        assert!(raw.text.contains("[the docs](https://example.com)"));
    }

    #[test]
    fn test_base64_image_extracted_external_preserved() {
        let payload = BASE64.encode([0x89, 0x50, 0x4E, 0x47, 1, 2, 3]);
        let html = format!(
            "<body><img src=\"data:image/png;base64,{payload}\" alt=\"logo\">\
             <img src=\"https://example.com/x.png\" alt=\"ext\"></body>"
        );
        let raw = extract(&html);
        assert_eq!(raw.images.len(), 1);
        assert_eq!(raw.images[0].mime_type, "image/png");
        assert!(raw.text.contains("![logo](embedded:img_000)"));
        assert!(raw.text.contains("![ext](https://example.com/x.png)"));
    }

    #[test]
    fn test_images_disabled_strips_data_uris() {
        let payload = BASE64.encode([0x89, 0x50, 0x4E, 0x47, 1, 2, 3]);
        let html = format!("<body><img src=\"data:image/png;base64,{payload}\" alt=\"x\"></body>");
        let raw = HtmlReader::new()
            .extract(
                &ReaderInput::bytes("p.html", html.into_bytes()),
                &ExtractOptions::default().with_images(false),
                &CancellationToken::new(),
            )
            .unwrap();
        assert!(raw.images.is_empty());
        assert!(!raw.text.contains("base64"));
    }

    #[test]
    fn test_semantic_hints() {
        let raw = extract("<body><article><p>a</p></article><nav>menu</nav></body>");
        assert_eq!(raw.hints.get("has_article").unwrap(), "true");
        assert_eq!(raw.hints.get("has_nav").unwrap(), "true");
        assert!(!raw.hints.contains_key("has_aside"));
    }

    #[test]
    fn test_title_in_structure() {
        let structure = HtmlReader::new()
            .read_structure(&ReaderInput::bytes(
                "p.html",
                b"<html><head><title>My Page</title></head><body></body></html>".to_vec(),
            ))
            .unwrap();
        assert_eq!(structure.title.as_deref(), Some("My Page"));
    }
}
