//! Enrichment sidecar: per-chunk JSON files plus a document-level index.

use crate::merge;
use fileflux_core::chunk::props;
use fileflux_core::{Chunk, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// How many chunk summaries seed the document summary.
const DOCUMENT_SUMMARY_CHUNKS: usize = 3;

#[derive(Serialize)]
struct IndexRecord {
    chunk_count: usize,
    enriched_count: usize,
    document_summary: Option<String>,
    document_keywords: Vec<String>,
    document_topics: Vec<String>,
}

/// Write `enrich/NNN.json` per chunk and `enrich/index.json` with the
/// document-level aggregate.
///
/// # Errors
/// Returns I/O or serialization errors.
pub fn write_sidecar(base: &Path, chunks: &[Chunk]) -> Result<()> {
    let dir = base.join("enrich");
    fs::create_dir_all(&dir)?;

    for chunk in chunks {
        let path = dir.join(format!("{:03}.json", chunk.index));
        fs::write(&path, serde_json::to_string_pretty(chunk)?)?;
    }

    let collect_list = |key: &str| -> Vec<Vec<String>> {
        chunks
            .iter()
            .filter_map(|c| c.props.get(key))
            .filter_map(|v| v.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .collect()
    };

    let summaries: Vec<String> = chunks
        .iter()
        .filter_map(|c| c.prop_str(props::ENRICHED_SUMMARY))
        .take(DOCUMENT_SUMMARY_CHUNKS)
        .map(str::to_string)
        .collect();

    let record = IndexRecord {
        chunk_count: chunks.len(),
        enriched_count: chunks
            .iter()
            .filter(|c| c.prop_str(props::ENRICHED_SUMMARY).is_some())
            .count(),
        document_summary: merge::merge_summaries(&summaries),
        document_keywords: merge::union_keywords(&collect_list(props::ENRICHED_KEYWORDS)),
        document_topics: merge::union_keywords(&collect_list(props::ENRICHED_TOPICS)),
    };
    fs::write(
        dir.join("index.json"),
        serde_json::to_string_pretty(&record)?,
    )?;
    Ok(())
}
