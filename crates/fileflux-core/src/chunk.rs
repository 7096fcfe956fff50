//! Chunk model and the stable property keys enrichment writes into it.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Stable property keys of the chunk JSON schema.
pub mod props {
    /// Summary produced by the enrichment engine.
    pub const ENRICHED_SUMMARY: &str = "enrichedSummary";
    /// Keywords produced by the enrichment engine.
    pub const ENRICHED_KEYWORDS: &str = "enrichedKeywords";
    /// Topics produced by the enrichment engine.
    pub const ENRICHED_TOPICS: &str = "enrichedTopics";
    /// Document-level keyword union.
    pub const DOCUMENT_KEYWORDS: &str = "documentKeywords";
    /// Ancestor heading path for hierarchical chunks.
    pub const HIERARCHY_PATH: &str = "hierarchyPath";
    /// Set when an indivisible unit exceeded the effective size limit.
    pub const SIZE_EXCEEDED: &str = "sizeExceeded";
    /// Set when enrichment failed even after adaptive splitting.
    pub const ENRICHMENT_ERROR: &str = "enrichment_error";
}

/// Character-offset span into the refined text a chunk was cut from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpan {
    /// Start offset, inclusive.
    pub start: usize,
    /// End offset, exclusive.
    pub end: usize,
}

/// Inclusive page range a chunk spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRange {
    /// First page, 1-based.
    pub start: usize,
    /// Last page, 1-based.
    pub end: usize,
}

/// A size-bounded piece of refined text with accumulated metadata.
///
/// `props` is always present and accumulates enrichment results and
/// provenance under the keys in [`props`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    /// Stable identifier, unique within a document.
    pub id: String,
    /// Zero-based position within the document. Chunk indices form
    /// `[0, N)` without gaps.
    pub index: usize,
    /// Chunk text, never empty, trailing whitespace trimmed.
    pub content: String,
    /// Accumulated properties; see [`props`] for the stable keys.
    #[serde(default)]
    pub props: BTreeMap<String, Value>,
    /// Offsets into the refined text, when tracked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_span: Option<SourceSpan>,
    /// Pages the chunk spans, when page boundaries are known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_range: Option<PageRange>,
}

impl Chunk {
    /// Create a chunk with empty properties.
    pub fn new(id: impl Into<String>, index: usize, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            index,
            content: content.into(),
            props: BTreeMap::new(),
            source_span: None,
            page_range: None,
        }
    }

    /// Set a property value.
    pub fn set_prop(&mut self, key: &str, value: impl Into<Value>) {
        self.props.insert(key.to_string(), value.into());
    }

    /// Read a string property.
    pub fn prop_str(&self, key: &str) -> Option<&str> {
        self.props.get(key).and_then(Value::as_str)
    }

    /// Read a boolean property, defaulting to false.
    pub fn prop_bool(&self, key: &str) -> bool {
        self.props
            .get(key)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}
