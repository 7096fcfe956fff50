//! # fileflux-core
//!
//! Data model and shared utilities for the FileFlux document-ingestion
//! pipeline. Every pipeline stage consumes and produces the types defined
//! here:
//!
//! ```text
//! bytes → RawContent → ParsedContent → RefinedContent → Chunk[]
//! ```
//!
//! Readers live in `fileflux-readers`, refinement in `fileflux-refine`,
//! chunking in `fileflux-chunker` and enrichment in `fileflux-enrich`; this
//! crate has no opinion about any of them beyond the shapes they exchange.

pub mod cancel;
pub mod chunk;
pub mod error;
pub mod format;
pub mod options;
pub mod parsed;
pub mod raw;
pub mod source;
pub mod text;

pub use cancel::CancellationToken;
pub use chunk::{Chunk, PageRange, SourceSpan};
pub use error::{FileFluxError, Result};
pub use format::InputFormat;
pub use options::{
    ChunkStrategy, ChunkingOptions, EnrichOptions, ExtractOptions, RefineOptions,
};
pub use parsed::{
    DocumentMetadata, ParsedContent, ParsingInfo, QualityReport, RefinedContent, Section,
};
pub use raw::{
    BlockKind, BoundingBox, DetectionMethod, Image, ImageData, RawContent, Table, TextBlock,
    TextStyle,
};
pub use source::SourceFile;
