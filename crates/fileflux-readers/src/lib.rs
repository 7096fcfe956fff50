//! # fileflux-readers
//!
//! Format-specific readers turning document bytes into the normalized
//! [`fileflux_core::RawContent`] intermediate representation.
//!
//! The [`ReaderRegistry`] dispatches on the lowercased file extension:
//!
//! | Format | Reader | Backed by |
//! |---|---|---|
//! | PDF | [`pdf::PdfReader`] | [`pdf::PdfDecoder`] implementations (pdfium behind the `pdfium` feature) |
//! | DOCX | [`docx::DocxReader`] | zip + quick-xml |
//! | XLSX | [`xlsx::XlsxReader`] | calamine |
//! | PPTX | [`pptx::PptxReader`] | zip + quick-xml |
//! | HWP/HWPX | [`hwp::HwpReader`] | zip + quick-xml, external decoder for binary `.hwp` |
//! | HTML | [`html::HtmlReader`] | scraper |
//! | Markdown | [`markdown::MarkdownReader`] | pulldown-cmark |
//!
//! Every reader sanitizes its output (NUL stripping, UTF-8 replacement,
//! `\n` line endings) and records per-page/sheet failures as warnings so a
//! damaged unit never loses the rest of the document.

pub mod docx;
pub mod html;
pub mod hwp;
pub mod markdown;
pub mod office;
pub mod pdf;
pub mod pptx;
pub mod registry;
pub mod staging;
pub mod traits;
pub mod xlsx;

pub use registry::ReaderRegistry;
pub use traits::{DocumentReader, ReaderInput, ReadStructure, StructureUnit};
