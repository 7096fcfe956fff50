//! PPTX reader: slide XML walking with zip and quick-xml.

use crate::office::{finish_office_extract, OfficeDocument, OfficeResource};
use crate::traits::{DocumentReader, ReaderInput, ReadStructure, StructureUnit};
use fileflux_core::{
    CancellationToken, ExtractOptions, FileFluxError, InputFormat, RawContent, Result,
};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Cursor, Read};
use zip::ZipArchive;

/// Reader for `.pptx` presentations.
#[derive(Debug, Clone, Copy, Default)]
pub struct PptxReader;

impl PptxReader {
    /// Create the reader.
    pub fn new() -> Self {
        Self
    }
}

/// Slide member names in deck order.
fn slide_names(archive: &mut ZipArchive<Cursor<&[u8]>>) -> Vec<(usize, String)> {
    let mut slides: Vec<(usize, String)> = (0..archive.len())
        .filter_map(|i| archive.by_index(i).ok().map(|f| f.name().to_string()))
        .filter_map(|name| {
            let number = name
                .strip_prefix("ppt/slides/slide")?
                .strip_suffix(".xml")?
                .parse::<usize>()
                .ok()?;
            Some((number, name))
        })
        .collect();
    slides.sort_unstable();
    slides
}

/// Collect the visible text of one slide: `a:t` runs, one line per `a:p`.
fn slide_text(xml: &str) -> String {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);
    let mut out = String::new();
    let mut line = String::new();
    let mut in_text = false;
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.name().as_ref() == b"a:t" => in_text = true,
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"a:t" => in_text = false,
                b"a:p" => {
                    let text = line.trim();
                    if !text.is_empty() {
                        out.push_str(text);
                        out.push('\n');
                    }
                    line.clear();
                }
                _ => {}
            },
            Ok(Event::Text(e)) => {
                if in_text {
                    line.push_str(&e.unescape().unwrap_or_default());
                }
            }
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
        buf.clear();
    }
    if !line.trim().is_empty() {
        out.push_str(line.trim());
        out.push('\n');
    }
    out
}

impl DocumentReader for PptxReader {
    fn id(&self) -> &'static str {
        "pptx"
    }

    fn formats(&self) -> &'static [InputFormat] {
        &[InputFormat::Pptx]
    }

    fn read_structure(&self, input: &ReaderInput) -> Result<ReadStructure> {
        let bytes = input.read_bytes()?;
        let mut archive = ZipArchive::new(Cursor::new(bytes.as_ref())).map_err(|e| {
            FileFluxError::processing(input.display_path(), self.id(), e.to_string())
        })?;
        Ok(ReadStructure {
            title: None,
            author: None,
            units: slide_names(&mut archive)
                .into_iter()
                .enumerate()
                .map(|(index, (number, _))| StructureUnit {
                    index,
                    label: format!("slide {number}"),
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
        let mut archive = ZipArchive::new(Cursor::new(bytes.as_ref())).map_err(|e| {
            FileFluxError::processing(input.display_path(), self.id(), e.to_string())
        })?;

        let slides = slide_names(&mut archive);
        let mut markdown = String::new();
        let mut warnings = Vec::new();
        for (number, member_name) in &slides {
            cancel.check()?;
            let mut xml = String::new();
            match archive.by_name(member_name) {
                Ok(mut member) => {
                    let mut data = Vec::new();
                    if member.read_to_end(&mut data).is_err() {
                        warnings.push(format!("slide {number} unreadable"));
                        continue;
                    }
                    xml = String::from_utf8_lossy(&data).into_owned();
                }
                Err(err) => warnings.push(format!("slide {number} failed: {err}")),
            }
            if xml.is_empty() {
                continue;
            }
            let text = slide_text(&xml);
            if !text.trim().is_empty() {
                markdown.push_str(&format!("## Slide {number}\n\n{text}\n"));
            }
        }

        let mut resources = Vec::new();
        if options.extract_images {
            let names: Vec<String> = (0..archive.len())
                .filter_map(|i| archive.by_index(i).ok().map(|f| f.name().to_string()))
                .filter(|n| n.starts_with("ppt/media/"))
                .collect();
            for name in names {
                if let Ok(mut member) = archive.by_name(&name) {
                    let mut data = Vec::new();
                    if member.read_to_end(&mut data).is_ok() {
                        resources.push(OfficeResource {
                            id: name.clone(),
                            name,
                            data,
                        });
                    }
                }
            }
        }

        let doc = OfficeDocument {
            section_count: slides.len(),
            markdown,
            resources,
            ..Default::default()
        };
        let mut raw = finish_office_extract(self.id(), doc, options);
        raw.set_hint("slide_count", slides.len());
        for warning in warnings {
            raw.push_warning(warning);
        }
        Ok(raw)
    }
}
