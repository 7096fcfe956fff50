//! HWP/HWPX reader.
//!
//! HWPX is an OOXML-style zip of section XML files and is parsed natively.
//! Binary `.hwp` (the OLE compound format) is delegated to an injected
//! [`HwpDecoder`]; without one the reader fails with a processing error
//! naming the missing decoder.

use crate::office::{finish_office_extract, OfficeDocument, OfficeResource};
use crate::traits::{DocumentReader, ReaderInput, ReadStructure, StructureUnit};
use fileflux_core::{
    CancellationToken, ExtractOptions, FileFluxError, InputFormat, RawContent, Result,
};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Cursor, Read};
use zip::ZipArchive;

/// External decoder for binary `.hwp` documents.
pub trait HwpDecoder: Send + Sync {
    /// Parse the document into the shared office surface.
    ///
    /// # Errors
    /// Returns a processing error when the document cannot be decoded.
    fn parse(&self, input: &ReaderInput) -> Result<OfficeDocument>;
}

/// Reader for `.hwpx` (native) and `.hwp` (delegated) documents.
pub struct HwpReader {
    binary_decoder: Option<Box<dyn HwpDecoder>>,
}

impl std::fmt::Debug for HwpReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HwpReader")
            .field("binary_decoder", &self.binary_decoder.is_some())
            .finish()
    }
}

impl Default for HwpReader {
    fn default() -> Self {
        Self::new()
    }
}

impl HwpReader {
    /// Create a reader with no binary `.hwp` decoder attached.
    pub fn new() -> Self {
        Self {
            binary_decoder: None,
        }
    }

    /// Attach a decoder for binary `.hwp` documents.
    #[must_use]
    pub fn with_binary_decoder(mut self, decoder: Box<dyn HwpDecoder>) -> Self {
        self.binary_decoder = Some(decoder);
        self
    }

    fn parse_hwpx(&self, input: &ReaderInput) -> Result<OfficeDocument> {
        let bytes = input.read_bytes()?;
        let mut archive = ZipArchive::new(Cursor::new(bytes.as_ref())).map_err(|e| {
            FileFluxError::processing(input.display_path(), self.id(), e.to_string())
        })?;

        let mut sections: Vec<(usize, String)> = (0..archive.len())
            .filter_map(|i| archive.by_index(i).ok().map(|f| f.name().to_string()))
            .filter_map(|name| {
                let number = name
                    .strip_prefix("Contents/section")?
                    .strip_suffix(".xml")?
                    .parse::<usize>()
                    .ok()?;
                Some((number, name))
            })
            .collect();
        sections.sort_unstable();
        if sections.is_empty() {
            return Err(FileFluxError::processing(
                input.display_path(),
                self.id(),
                "no Contents/section*.xml members; not an HWPX package",
            ));
        }

        let mut markdown = String::new();
        for (_, member_name) in &sections {
            let mut data = Vec::new();
            if let Ok(mut member) = archive.by_name(member_name) {
                if member.read_to_end(&mut data).is_err() {
                    continue;
                }
            }
            let xml = String::from_utf8_lossy(&data);
            markdown.push_str(&section_text(&xml));
            markdown.push('\n');
        }

        let resources: Vec<OfficeResource> = {
            let names: Vec<String> = (0..archive.len())
                .filter_map(|i| archive.by_index(i).ok().map(|f| f.name().to_string()))
                .filter(|n| n.starts_with("BinData/") || n.starts_with("Contents/BinData/"))
                .collect();
            names
                .into_iter()
                .filter_map(|name| {
                    let mut data = Vec::new();
                    archive
                        .by_name(&name)
                        .ok()
                        .and_then(|mut m| m.read_to_end(&mut data).ok())?;
                    Some(OfficeResource {
                        id: name.clone(),
                        name,
                        data,
                    })
                })
                .collect()
        };

        Ok(OfficeDocument {
            section_count: sections.len(),
            markdown,
            resources,
            ..Default::default()
        })
    }
}

/// Text of one HWPX section: `hp:t` runs, one line per `hp:p`.
fn section_text(xml: &str) -> String {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(false);
    let mut out = String::new();
    let mut line = String::new();
    let mut in_text = false;
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.name().as_ref() == b"hp:t" => in_text = true,
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"hp:t" => in_text = false,
                b"hp:p" => {
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

impl DocumentReader for HwpReader {
    fn id(&self) -> &'static str {
        "hwp"
    }

    fn formats(&self) -> &'static [InputFormat] {
        &[InputFormat::Hwp]
    }

    fn read_structure(&self, input: &ReaderInput) -> Result<ReadStructure> {
        let doc = match input.extension().as_str() {
            "hwpx" => self.parse_hwpx(input)?,
            _ => match &self.binary_decoder {
                Some(decoder) => decoder.parse(input)?,
                None => {
                    return Err(FileFluxError::processing(
                        input.display_path(),
                        self.id(),
                        "binary .hwp requires an external decoder; none is registered",
                    ))
                }
            },
        };
        Ok(ReadStructure {
            title: doc.title,
            author: doc.author,
            units: (0..doc.section_count)
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
        let doc = match input.extension().as_str() {
            "hwpx" => self.parse_hwpx(input)?,
            _ => match &self.binary_decoder {
                Some(decoder) => decoder.parse(input)?,
                None => {
                    return Err(FileFluxError::processing(
                        input.display_path(),
                        self.id(),
                        "binary .hwp requires an external decoder; none is registered",
                    ))
                }
            },
        };
        cancel.check()?;
        Ok(finish_office_extract(self.id(), doc, options))
    }
}
