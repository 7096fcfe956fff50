//! Shared surface for office-format decoders (DOCX, PPTX, HWP/HWPX).
//!
//! Decoders produce an [`OfficeDocument`]: a markdown rendition, native
//! tables, and a resource catalog. The reader-side post-processing here is
//! identical across formats: text sanitization, resource enumeration into
//! image records, and structural-hint inference over the markdown.

use fileflux_core::{ExtractOptions, Image, ImageData, RawContent, Table, TextBlock};
use fileflux_images::mime_from_filename;
use once_cell::sync::Lazy;
use regex::Regex;

/// One embedded resource by identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfficeResource {
    /// Resource identifier within the package.
    pub id: String,
    /// File name, used for MIME guessing.
    pub name: String,
    /// Raw bytes.
    pub data: Vec<u8>,
}

/// Decoder output consumed by the office readers.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OfficeDocument {
    /// Document title, when recorded.
    pub title: Option<String>,
    /// Document author, when recorded.
    pub author: Option<String>,
    /// Section, slide or sheet count.
    pub section_count: usize,
    /// Markdown rendition of the body.
    pub markdown: String,
    /// Native tables with their cell matrices.
    pub tables: Vec<Table>,
    /// Embedded resources.
    pub resources: Vec<OfficeResource>,
}

static MD_HEADER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^(#{1,6}) (.+)$").expect("header"));
static MD_LIST: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^(?:[*\-+] |\d+\. )").expect("list"));
static MD_TABLE_ROW: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\|.*\|\s*$").expect("table row"));

/// Turn an [`OfficeDocument`] into [`RawContent`], applying the shared
/// post-processing every office reader performs.
pub fn finish_office_extract(
    reader_id: &'static str,
    doc: OfficeDocument,
    options: &ExtractOptions,
) -> RawContent {
    let mut raw = RawContent::new(reader_id);

    let sanitized = fileflux_core::text::sanitize_text(&doc.markdown);
    raw.text = fileflux_core::text::tidy_markup(&sanitized);

    // Heading blocks give the refiner something to restructure.
    for (order, caps) in MD_HEADER.captures_iter(&raw.text).enumerate() {
        let level = caps[1].len() as u8;
        raw.blocks
            .push(TextBlock::heading(caps[2].trim(), level, 1, order));
    }

    for mut table in doc.tables {
        table.normalize();
        raw.tables.push(table);
    }

    if options.extract_images {
        for (idx, resource) in doc.resources.into_iter().enumerate() {
            let Some(mime) = mime_from_filename(&resource.name)
                .or_else(|| fileflux_images::sniff_mime(&resource.data))
            else {
                continue;
            };
            if resource.data.len() > options.max_image_size {
                raw.push_warning(format!(
                    "resource {} over size limit, skipped",
                    resource.name
                ));
                continue;
            }
            let id = format!("img_{idx:03}");
            let marker = format!("![resource](embedded:{id})");
            raw.text.push_str("\n\n");
            raw.text.push_str(&marker);
            raw.images.push(Image {
                id,
                caption: None,
                data: ImageData::Embedded(resource.data),
                mime_type: mime.to_string(),
                position_marker: marker,
                dimensions: None,
                properties: [("resource".to_string(), resource.id)].into(),
            });
        }
    }

    raw.set_hint("section_count", doc.section_count);
    raw.set_hint("has_headers", MD_HEADER.is_match(&raw.text));
    raw.set_hint("list_count", MD_LIST.find_iter(&raw.text).count());
    raw.set_hint("table_count", raw.tables.len());
    raw.set_hint(
        "table_like_lines",
        MD_TABLE_ROW.find_iter(&raw.text).count(),
    );
    if let Some(title) = doc.title {
        raw.set_hint("title", title);
    }
    if let Some(author) = doc.author {
        raw.set_hint("author", author);
    }
    raw
}

/// Render rows as a plain-text fallback, one row per line.
pub fn rows_to_fallback(rows: &[Vec<String>]) -> String {
    rows.iter()
        .map(|row| row.join(" "))
        .collect::<Vec<_>>()
        .join("\n")
}
