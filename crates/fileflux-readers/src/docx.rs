//! DOCX reader: OOXML package walking with zip and quick-xml.

use crate::office::{finish_office_extract, rows_to_fallback, OfficeDocument, OfficeResource};
use crate::traits::{DocumentReader, ReaderInput, ReadStructure, StructureUnit};
use fileflux_core::{
    CancellationToken, DetectionMethod, ExtractOptions, FileFluxError, InputFormat, RawContent,
    Result, Table,
};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Cursor, Read};
use zip::ZipArchive;

/// Reader for `.docx` word-processing documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct DocxReader;

impl DocxReader {
    /// Create the reader.
    pub fn new() -> Self {
        Self
    }
}

impl DocumentReader for DocxReader {
    fn id(&self) -> &'static str {
        "docx"
    }

    fn formats(&self) -> &'static [InputFormat] {
        &[InputFormat::Docx]
    }

    fn read_structure(&self, input: &ReaderInput) -> Result<ReadStructure> {
        let bytes = input.read_bytes()?;
        let package = parse_package(&bytes, false).map_err(|err| {
            FileFluxError::processing(input.display_path(), self.id(), err)
        })?;
        Ok(ReadStructure {
            title: package.title,
            author: package.author,
            units: (0..package.section_count.max(1))
                .map(|i| StructureUnit {
                    index: i,
                    label: format!("section {}", i + 1),
                })
                .collect(),
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
        let package = parse_package(&bytes, options.extract_images).map_err(|err| {
            FileFluxError::processing(input.display_path(), self.id(), err)
        })?;
        cancel.check()?;
        Ok(finish_office_extract(self.id(), package, options))
    }
}

/// Read one zip member into a lossy UTF-8 string.
fn read_member(
    archive: &mut ZipArchive<Cursor<&[u8]>>,
    name: &str,
) -> std::result::Result<String, String> {
    let mut member = archive
        .by_name(name)
        .map_err(|e| format!("missing {name}: {e}"))?;
    let mut data = Vec::new();
    member
        .read_to_end(&mut data)
        .map_err(|e| format!("unreadable {name}: {e}"))?;
    Ok(String::from_utf8_lossy(&data).into_owned())
}

fn parse_package(
    bytes: &[u8],
    collect_resources: bool,
) -> std::result::Result<OfficeDocument, String> {
    let mut archive =
        ZipArchive::new(Cursor::new(bytes)).map_err(|e| format!("not a DOCX package: {e}"))?;
    let document_xml = read_member(&mut archive, "word/document.xml")?;

    let mut doc = parse_body(&document_xml);
    if let Ok(core_xml) = read_member(&mut archive, "docProps/core.xml") {
        let (title, author) = parse_core_properties(&core_xml);
        doc.title = title;
        doc.author = author;
    }

    if collect_resources {
        let names: Vec<String> = (0..archive.len())
            .filter_map(|i| archive.by_index(i).ok().map(|f| f.name().to_string()))
            .filter(|n| n.starts_with("word/media/"))
            .collect();
        for name in names {
            if let Ok(mut member) = archive.by_name(&name) {
                let mut data = Vec::new();
                if member.read_to_end(&mut data).is_ok() {
                    doc.resources.push(OfficeResource {
                        id: name.clone(),
                        name,
                        data,
                    });
                }
            }
        }
    }
    Ok(doc)
}

/// Walk `word/document.xml` into markdown plus native tables.
fn parse_body(xml: &str) -> OfficeDocument {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);

    let mut markdown = String::new();
    let mut tables: Vec<Table> = Vec::new();
    let mut section_count = 0usize;

    let mut paragraph = String::new();
    let mut style: Option<String> = None;
    let mut is_list_item = false;
    let mut in_text = false;

    // Table state: rows of cells; a cell accumulates paragraph text.
    let mut in_table = false;
    let mut rows: Vec<Vec<String>> = Vec::new();
    let mut cells: Vec<String> = Vec::new();
    let mut cell: String = String::new();

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"w:t" => in_text = true,
                b"w:tbl" => {
                    in_table = true;
                    rows.clear();
                }
                b"w:tr" => cells.clear(),
                b"w:tc" => cell.clear(),
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"w:pStyle" => {
                    if let Ok(Some(attr)) = e.try_get_attribute("w:val") {
                        style = attr
                            .unescape_value()
                            .ok()
                            .map(|v| v.into_owned());
                    }
                }
                b"w:numPr" => is_list_item = true,
                b"w:br" => {
                    if in_table {
                        cell.push(' ');
                    } else {
                        paragraph.push('\n');
                    }
                }
                b"w:sectPr" => section_count += 1,
                _ => {}
            },
            Ok(Event::Text(e)) => {
                if in_text {
                    let text = e.unescape().unwrap_or_default();
                    if in_table {
                        cell.push_str(&text);
                    } else {
                        paragraph.push_str(&text);
                    }
                }
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:t" => in_text = false,
                b"w:p" => {
                    if !in_table {
                        flush_paragraph(&mut markdown, &mut paragraph, style.take(), is_list_item);
                        is_list_item = false;
                    } else if !cell.is_empty() {
                        cell.push(' ');
                    }
                }
                b"w:tc" => cells.push(cell.trim().to_string()),
                b"w:tr" => rows.push(std::mem::take(&mut cells)),
                b"w:tbl" => {
                    in_table = false;
                    if !rows.is_empty() {
                        let fallback = rows_to_fallback(&rows);
                        markdown.push_str(&fallback);
                        markdown.push_str("\n\n");
                        tables.push(Table {
                            cells: std::mem::take(&mut rows),
                            has_header: true,
                            confidence: 1.0,
                            method: DetectionMethod::Native,
                            page: 1,
                            fallback_text: fallback,
                            needs_llm_assist: false,
                            bbox: None,
                        });
                    }
                }
                b"w:sectPr" => section_count += 1,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
        buf.clear();
    }
    // An unterminated paragraph still contributes its text.
    flush_paragraph(&mut markdown, &mut paragraph, style.take(), is_list_item);

    OfficeDocument {
        section_count: section_count.max(1),
        markdown,
        tables,
        ..Default::default()
    }
}

fn flush_paragraph(
    markdown: &mut String,
    paragraph: &mut String,
    style: Option<String>,
    is_list_item: bool,
) {
    let text = paragraph.trim().to_string();
    paragraph.clear();
    if text.is_empty() {
        return;
    }
    match style.as_deref() {
        Some("Title") => {
            markdown.push_str("# ");
        }
        Some(s) if s.starts_with("Heading") => {
            let level: usize = s
                .trim_start_matches("Heading")
                .parse()
                .map(|l: usize| l.clamp(1, 6))
                .unwrap_or(1);
            markdown.push_str(&"#".repeat(level));
            markdown.push(' ');
        }
        _ if is_list_item => markdown.push_str("- "),
        _ => {}
    }
    markdown.push_str(&text);
    markdown.push_str("\n\n");
}

fn parse_core_properties(xml: &str) -> (Option<String>, Option<String>) {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut title = None;
    let mut author = None;
    let mut current: Option<&str> = None;
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                current = match e.name().as_ref() {
                    b"dc:title" => Some("title"),
                    b"dc:creator" => Some("creator"),
                    _ => None,
                };
            }
            Ok(Event::Text(e)) => {
                let text = e.unescape().unwrap_or_default().into_owned();
                match current {
                    Some("title") if !text.is_empty() => title = Some(text),
                    Some("creator") if !text.is_empty() => author = Some(text),
                    _ => {}
                }
            }
            Ok(Event::End(_)) => current = None,
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
        buf.clear();
    }
    (title, author)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn docx_bytes(document_xml: &str, core_xml: Option<&str>) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut zip = zip::ZipWriter::new(&mut buf);
            let opts = SimpleFileOptions::default();
            zip.start_file("word/document.xml", opts).unwrap();
            zip.write_all(document_xml.as_bytes()).unwrap();
            if let Some(core) = core_xml {
                zip.start_file("docProps/core.xml", opts).unwrap();
                zip.write_all(core.as_bytes()).unwrap();
            }
            zip.finish().unwrap();
        }
        buf.into_inner()
    }

    const SIMPLE_DOC: &str = r#"<w:document>
      <w:body>
        <w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr><w:r><w:t>Report Title</w:t></w:r></w:p>
        <w:p><w:r><w:t>First paragraph </w:t></w:r><w:r><w:t>continues.</w:t></w:r></w:p>
        <w:p><w:pPr><w:numPr/></w:pPr><w:r><w:t>bullet one</w:t></w:r></w:p>
        <w:tbl>
          <w:tr><w:tc><w:p><w:r><w:t>H1</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>H2</w:t></w:r></w:p></w:tc></w:tr>
          <w:tr><w:tc><w:p><w:r><w:t>a</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t>b</w:t></w:r></w:p></w:tc></w:tr>
        </w:tbl>
      </w:body>
    </w:document>"#;

    fn extract_simple() -> RawContent {
        DocxReader::new()
            .extract(
                &ReaderInput::bytes("test.docx", docx_bytes(SIMPLE_DOC, None)),
                &ExtractOptions::default(),
                &CancellationToken::new(),
            )
            .unwrap()
    }

    #[test]
    fn test_headings_and_paragraphs() {
        let raw = extract_simple();
        assert!(raw.text.contains("# Report Title"));
        assert!(raw.text.contains("First paragraph continues."));
        assert!(raw.text.contains("- bullet one"));
    }

    #[test]
    fn test_native_table_collected() {
        let raw = extract_simple();
        assert_eq!(raw.tables.len(), 1);
        let table = &raw.tables[0];
        assert_eq!(table.method, DetectionMethod::Native);
        assert_eq!(table.cells[0], vec!["H1", "H2"]);
        assert_eq!(table.cells[1], vec!["a", "b"]);
        assert!(raw.text.contains("H1 H2"));
    }

    #[test]
    fn test_core_properties() {
        let core = r#"<cp:coreProperties>
          <dc:title>Quarterly Report</dc:title>
          <dc:creator>J. Smith</dc:creator>
        </cp:coreProperties>"#;
        let structure = DocxReader::new()
            .read_structure(&ReaderInput::bytes(
                "t.docx",
                docx_bytes(SIMPLE_DOC, Some(core)),
            ))
            .unwrap();
        assert_eq!(structure.title.as_deref(), Some("Quarterly Report"));
        assert_eq!(structure.author.as_deref(), Some("J. Smith"));
    }

    #[test]
    fn test_not_a_zip_errors() {
        let err = DocxReader::new()
            .extract(
                &ReaderInput::bytes("bad.docx", b"plainly not a zip".to_vec()),
                &ExtractOptions::default(),
                &CancellationToken::new(),
            )
            .unwrap_err();
        assert!(matches!(err, FileFluxError::DocumentProcessing { .. }));
    }

    #[test]
    fn test_hints_present() {
        let raw = extract_simple();
        assert_eq!(raw.hint_usize("table_count"), Some(1));
        assert_eq!(raw.hints.get("has_headers").unwrap(), "true");
    }
}
