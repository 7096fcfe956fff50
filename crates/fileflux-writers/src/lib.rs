//! # fileflux-writers
//!
//! Serialization of pipeline artifacts to disk. Per input file the layout
//! under the output base is:
//!
//! ```text
//! <base>/
//!   extract/extracted.md      extract/extracted.json
//!   refine/refined.md         refine/refined.json
//!   chunks/...                (format-dependent file names)
//!   enrich/NNN.json           enrich/index.json
//!   images/img_NNN.<ext>      (written by the image processor)
//! ```

pub mod artifacts;
pub mod chunks;

pub use artifacts::{ExtractStats, ExtractionArtifacts, RefinementArtifacts};
pub use chunks::{ChunkWriter, OutputFormat};
