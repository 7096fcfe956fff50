//! Auto strategy selection from the document-structure profile.

use fileflux_core::ChunkStrategy;
use fileflux_detect::analyze_structure;

/// Pick a concrete strategy for `Auto`.
///
/// Three or more headings select Hierarchical; five or more numbered
/// section markers, or long paragraphs (mean over 300 characters), select
/// Paragraph; everything else falls back to Sentence. Analysis looks at
/// the leading sample only.
pub fn select_strategy(text: &str) -> ChunkStrategy {
    let profile = analyze_structure(text);
    if profile.heading_count >= 3 {
        return ChunkStrategy::Hierarchical;
    }
    if profile.numbered_section_count >= 5 {
        return ChunkStrategy::Paragraph;
    }
    if profile.mean_paragraph_len > 300.0 {
        return ChunkStrategy::Paragraph;
    }
    ChunkStrategy::Sentence
}
