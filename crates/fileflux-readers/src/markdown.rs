//! Markdown reader: pulldown-cmark event walk that re-emits the source
//! syntax plus explicit sentinels guiding downstream chunking.

use crate::traits::{DocumentReader, ReaderInput, ReadStructure, StructureUnit};
use fileflux_core::{
    BlockKind, CancellationToken, DetectionMethod, ExtractOptions, InputFormat, RawContent,
    Result, Table, TextBlock,
};
use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};

/// Sentinels bracketing structures in the emitted text.
pub const TABLE_START: &str = "<!-- TABLE_START -->";
/// Closing table sentinel.
pub const TABLE_END: &str = "<!-- TABLE_END -->";
/// Opening code sentinel.
pub const CODE_START: &str = "<!-- CODE_START -->";
/// Closing code sentinel.
pub const CODE_END: &str = "<!-- CODE_END -->";
/// Opening list sentinel.
pub const LIST_START: &str = "<!-- LIST_START -->";
/// Closing list sentinel.
pub const LIST_END: &str = "<!-- LIST_END -->";

/// Reader for `.md` and `.markdown` documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownReader;

impl MarkdownReader {
    /// Create the reader.
    pub fn new() -> Self {
        Self
    }
}

fn parser_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_FOOTNOTES
}

#[derive(Default)]
struct MdEmitter {
    out: String,
    blocks: Vec<TextBlock>,
    tables: Vec<Table>,
    order: usize,

    current: String,
    link_dests: Vec<String>,
    quote_depth: usize,
    list_stack: Vec<Option<u64>>,

    in_code: bool,
    code_lang: String,
    code_buf: String,

    in_table: bool,
    table_rows: Vec<Vec<String>>,
    table_cells: Vec<String>,
}

impl MdEmitter {
    fn push_block(&mut self, content: &str, kind: BlockKind, level: Option<u8>, ordered: Option<bool>) {
        let mut block = TextBlock::paragraph(content, 1, self.order);
        block.kind = kind;
        block.heading_level = level;
        block.ordered = ordered;
        self.order += 1;
        self.blocks.push(block);
    }

    fn quote_prefix(&self) -> String {
        "> ".repeat(self.quote_depth)
    }

    /// Emit the pending inline buffer as one line of output.
    fn flush_line(&mut self) {
        let line = std::mem::take(&mut self.current);
        let trimmed = line.trim_end();
        if trimmed.trim().is_empty() {
            return;
        }
        let prefix = self.quote_prefix();
        self.out.push_str(&prefix);
        self.out.push_str(trimmed);
        self.out.push('\n');

        let inner = trimmed.trim_start();
        if !self.list_stack.is_empty() {
            let ordered = inner
                .split_whitespace()
                .next()
                .is_some_and(|tok| tok.ends_with('.') && tok[..tok.len() - 1].parse::<u64>().is_ok());
            self.push_block(inner, BlockKind::ListItem, None, Some(ordered));
        } else if self.quote_depth > 0 {
            self.push_block(inner, BlockKind::Quote, None, None);
        } else {
            self.push_block(inner, BlockKind::Paragraph, None, None);
        }
    }

    fn blank_line(&mut self) {
        if !self.out.is_empty() && !self.out.ends_with("\n\n") {
            if !self.out.ends_with('\n') {
                self.out.push('\n');
            }
            self.out.push('\n');
        }
    }

    fn handle(&mut self, event: Event<'_>) {
        match event {
            Event::Start(Tag::Heading { .. }) => {
                self.current.clear();
            }
            Event::End(TagEnd::Heading(level)) => {
                let text = std::mem::take(&mut self.current);
                let level = heading_level(level);
                self.blank_line();
                self.out
                    .push_str(&format!("{} {}\n", "#".repeat(level as usize), text.trim()));
                self.blank_line();
                self.push_block(text.trim(), BlockKind::Heading, Some(level), None);
            }
            Event::Start(Tag::Paragraph) => {
                if self.list_stack.is_empty() {
                    self.blank_line();
                }
            }
            Event::End(TagEnd::Paragraph) => {
                self.flush_line();
                if self.list_stack.is_empty() {
                    self.blank_line();
                }
            }
            Event::Start(Tag::BlockQuote(_)) => {
                self.blank_line();
                self.quote_depth += 1;
            }
            Event::End(TagEnd::BlockQuote(_)) => {
                self.quote_depth = self.quote_depth.saturating_sub(1);
                self.blank_line();
            }
            Event::Start(Tag::List(first)) => {
                self.flush_line();
                if self.list_stack.is_empty() {
                    self.blank_line();
                    self.out.push_str(LIST_START);
                    self.out.push('\n');
                }
                self.list_stack.push(first);
            }
            Event::End(TagEnd::List(_)) => {
                self.flush_line();
                self.list_stack.pop();
                if self.list_stack.is_empty() {
                    self.out.push_str(LIST_END);
                    self.out.push('\n');
                    self.blank_line();
                }
            }
            Event::Start(Tag::Item) => {
                self.flush_line();
                let depth = self.list_stack.len().saturating_sub(1);
                self.current.push_str(&"  ".repeat(depth));
                match self.list_stack.last_mut() {
                    Some(Some(counter)) => {
                        self.current.push_str(&format!("{counter}. "));
                        *counter += 1;
                    }
                    _ => self.current.push_str("- "),
                }
            }
            Event::End(TagEnd::Item) => self.flush_line(),
            Event::TaskListMarker(checked) => {
                self.current
                    .push_str(if checked { "[x] " } else { "[ ] " });
            }
            Event::Start(Tag::CodeBlock(kind)) => {
                self.in_code = true;
                self.code_lang = match kind {
                    CodeBlockKind::Fenced(lang) => lang.to_string(),
                    CodeBlockKind::Indented => String::new(),
                };
                self.code_buf.clear();
            }
            Event::End(TagEnd::CodeBlock) => {
                self.in_code = false;
                self.blank_line();
                self.out.push_str(CODE_START);
                self.out.push('\n');
                self.out.push_str(&format!(
                    "```{}\n{}\n```\n",
                    self.code_lang,
                    self.code_buf.trim_end()
                ));
                self.out.push_str(CODE_END);
                self.out.push('\n');
                self.blank_line();
                let body = std::mem::take(&mut self.code_buf);
                self.push_block(body.trim_end(), BlockKind::CodeBlock, None, None);
            }
            Event::Start(Tag::Table(_)) => {
                self.in_table = true;
                self.table_rows.clear();
            }
            Event::End(TagEnd::Table) => {
                self.in_table = false;
                self.emit_table();
            }
            Event::Start(Tag::TableHead | Tag::TableRow) => self.table_cells.clear(),
            Event::End(TagEnd::TableHead | TagEnd::TableRow) => {
                self.table_rows.push(std::mem::take(&mut self.table_cells));
            }
            Event::Start(Tag::TableCell) => self.current.clear(),
            Event::End(TagEnd::TableCell) => {
                self.table_cells
                    .push(std::mem::take(&mut self.current).trim().to_string());
            }
            Event::Start(Tag::Emphasis) | Event::End(TagEnd::Emphasis) => {
                self.current.push('*');
            }
            Event::Start(Tag::Strong) | Event::End(TagEnd::Strong) => {
                self.current.push_str("**");
            }
            Event::Start(Tag::Strikethrough) | Event::End(TagEnd::Strikethrough) => {
                self.current.push_str("~~");
            }
            Event::Start(Tag::Link { dest_url, .. }) => {
                self.current.push('[');
                self.link_dests.push(dest_url.to_string());
            }
            Event::End(TagEnd::Link) => {
                let dest = self.link_dests.pop().unwrap_or_default();
                self.current.push_str(&format!("]({dest})"));
            }
            Event::Start(Tag::Image { dest_url, .. }) => {
                self.current.push_str("![");
                self.link_dests.push(dest_url.to_string());
            }
            Event::End(TagEnd::Image) => {
                let dest = self.link_dests.pop().unwrap_or_default();
                self.current.push_str(&format!("]({dest})"));
            }
            Event::Text(text) => {
                if self.in_code {
                    self.code_buf.push_str(&text);
                } else {
                    self.current.push_str(&text);
                }
            }
            Event::Code(code) => {
                self.current.push('`');
                self.current.push_str(&code);
                self.current.push('`');
            }
            Event::SoftBreak => self.current.push(' '),
            Event::HardBreak => {
                self.flush_line();
            }
            Event::Rule => {
                self.flush_line();
                self.blank_line();
                self.out.push_str("---\n");
                self.blank_line();
            }
            _ => {}
        }
    }

    fn emit_table(&mut self) {
        if self.table_rows.is_empty() {
            return;
        }
        let rows = std::mem::take(&mut self.table_rows);
        let mut rendered = String::new();
        for (idx, row) in rows.iter().enumerate() {
            rendered.push_str(&format!("| {} |\n", row.join(" | ")));
            if idx == 0 {
                rendered.push_str(&format!("|{}\n", " --- |".repeat(row.len())));
            }
        }
        let block = format!("{TABLE_START}\n{}{TABLE_END}", rendered);
        self.blank_line();
        self.out.push_str(&block);
        self.out.push('\n');
        self.blank_line();

        let mut table = Table {
            cells: rows,
            has_header: true,
            confidence: 1.0,
            method: DetectionMethod::Native,
            page: 1,
            fallback_text: block,
            needs_llm_assist: false,
            bbox: None,
        };
        table.normalize();
        self.tables.push(table);
    }
}

fn heading_level(level: pulldown_cmark::HeadingLevel) -> u8 {
    use pulldown_cmark::HeadingLevel as H;
    match level {
        H::H1 => 1,
        H::H2 => 2,
        H::H3 => 3,
        H::H4 => 4,
        H::H5 => 5,
        H::H6 => 6,
    }
}

impl DocumentReader for MarkdownReader {
    fn id(&self) -> &'static str {
        "markdown"
    }

    fn formats(&self) -> &'static [InputFormat] {
        &[InputFormat::Md]
    }

    fn read_structure(&self, input: &ReaderInput) -> Result<ReadStructure> {
        let bytes = input.read_bytes()?;
        let source = fileflux_core::text::sanitize_bytes(&bytes);
        let mut units = Vec::new();
        let mut in_heading = false;
        let mut buffer = String::new();
        for event in Parser::new_ext(&source, parser_options()) {
            match event {
                Event::Start(Tag::Heading { .. }) => {
                    in_heading = true;
                    buffer.clear();
                }
                Event::Text(text) if in_heading => buffer.push_str(&text),
                Event::End(TagEnd::Heading(_)) => {
                    in_heading = false;
                    units.push(StructureUnit {
                        index: units.len(),
                        label: buffer.trim().to_string(),
                    });
                }
                _ => {}
            }
        }
        Ok(ReadStructure {
            title: units.first().map(|u| u.label.clone()),
            author: None,
            units,
        })
    }

    fn extract(
        &self,
        input: &ReaderInput,
        _options: &ExtractOptions,
        cancel: &CancellationToken,
    ) -> Result<RawContent> {
        cancel.check()?;
        let bytes = input.read_bytes()?;
        let source = fileflux_core::text::sanitize_bytes(&bytes);

        let mut emitter = MdEmitter::default();
        for event in Parser::new_ext(&source, parser_options()) {
            emitter.handle(event);
        }
        emitter.flush_line();
        cancel.check()?;

        let mut raw = RawContent::new(self.id());
        raw.text = fileflux_core::text::tidy_markup(&emitter.out);
        raw.blocks = emitter.blocks;
        raw.tables = emitter.tables;
        raw.set_hint(
            "heading_count",
            raw.blocks
                .iter()
                .filter(|b| b.kind == BlockKind::Heading)
                .count(),
        );
        raw.set_hint("table_count", raw.tables.len());
        raw.set_hint(
            "code_block_count",
            raw.blocks
                .iter()
                .filter(|b| b.kind == BlockKind::CodeBlock)
                .count(),
        );
        Ok(raw)
    }
}
