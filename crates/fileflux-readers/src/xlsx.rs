//! XLSX reader: worksheet ranges through calamine, one table per sheet.

use crate::office::rows_to_fallback;
use crate::traits::{DocumentReader, ReaderInput, ReadStructure, StructureUnit};
use calamine::{Data, Reader as _, Xlsx};
use fileflux_core::{
    CancellationToken, DetectionMethod, ExtractOptions, FileFluxError, InputFormat, RawContent,
    Result, Table,
};
use std::io::Cursor;

/// Reader for `.xlsx` workbooks.
#[derive(Debug, Clone, Copy, Default)]
pub struct XlsxReader;

impl XlsxReader {
    /// Create the reader.
    pub fn new() -> Self {
        Self
    }

    fn open_workbook(&self, input: &ReaderInput) -> Result<Xlsx<Cursor<Vec<u8>>>> {
        let bytes = input.read_bytes()?.into_owned();
        Xlsx::new(Cursor::new(bytes)).map_err(|err| {
            FileFluxError::processing(input.display_path(), self.id(), err.to_string())
        })
    }
}

/// Render one cell as text; empty cells become empty strings.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// First-row header heuristic: every cell non-empty and none numeric.
fn looks_like_header(row: &[Data]) -> bool {
    !row.is_empty()
        && row.iter().all(|cell| {
            !matches!(cell, Data::Empty)
                && !matches!(cell, Data::Float(_) | Data::Int(_))
        })
}

impl DocumentReader for XlsxReader {
    fn id(&self) -> &'static str {
        "xlsx"
    }

    fn formats(&self) -> &'static [InputFormat] {
        &[InputFormat::Xlsx]
    }

    fn read_structure(&self, input: &ReaderInput) -> Result<ReadStructure> {
        let workbook = self.open_workbook(input)?;
        Ok(ReadStructure {
            title: None,
            author: None,
            units: workbook
                .sheet_names()
                .iter()
                .enumerate()
                .map(|(index, name)| StructureUnit {
                    index,
                    label: name.clone(),
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
        let mut workbook = self.open_workbook(input)?;
        let mut raw = RawContent::new(self.id());
        let sheet_names = workbook.sheet_names().to_owned();
        let mut any_headers = false;

        let mut body = String::new();
        for (sheet_idx, name) in sheet_names.iter().enumerate() {
            cancel.check()?;
            let range = match workbook.worksheet_range(name) {
                Ok(range) => range,
                Err(err) => {
                    raw.push_warning(format!("worksheet '{name}' failed: {err}"));
                    continue;
                }
            };

            let rows: Vec<Vec<String>> = range
                .rows()
                .map(|row| row.iter().map(cell_text).collect())
                .filter(|row: &Vec<String>| row.iter().any(|c| !c.is_empty()))
                .collect();
            if rows.is_empty() {
                continue;
            }

            let has_header = range.rows().next().is_some_and(looks_like_header);
            any_headers |= has_header;

            body.push_str(&format!("## {name}\n\n"));
            let fallback = rows_to_fallback(&rows);
            body.push_str(&fallback);
            body.push_str("\n\n");

            if options.extract_tables {
                let mut table = Table {
                    cells: rows,
                    has_header,
                    confidence: 1.0,
                    method: DetectionMethod::Native,
                    page: sheet_idx + 1,
                    fallback_text: fallback,
                    needs_llm_assist: false,
                    bbox: None,
                };
                table.normalize();
                raw.tables.push(table);
            }
        }

        raw.text = fileflux_core::text::tidy_markup(&fileflux_core::text::sanitize_text(&body));
        raw.set_hint("worksheet_count", sheet_names.len());
        raw.set_hint("has_headers", any_headers);
        raw.set_hint("table_count", raw.tables.len());
        Ok(raw)
    }
}
