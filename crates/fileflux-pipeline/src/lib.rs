//! # fileflux-pipeline
//!
//! The orchestrator wiring the four stages together:
//!
//! ```text
//! bytes → [readers] → RawContent → ParsedContent → [refine] → RefinedContent
//!       → [chunker] → Chunk[] → [enrich] → enriched Chunk[] → [writers]
//! ```
//!
//! One pipeline run is sequential; parallelism is per-document through
//! [`Pipeline::process_many`]. The chunk cache is shared across runs and
//! consulted before any stage executes; cancelled runs never touch it.

pub mod summary;

pub use summary::ProcessingSummary;

use fileflux_cache::{fingerprint, ChunkCache};
use fileflux_chunker::{Chunker, ModelHint};
use fileflux_core::{
    CancellationToken, Chunk, ChunkingOptions, DocumentMetadata, EnrichOptions, ExtractOptions,
    PageRange, ParsedContent, ParsingInfo, RawContent, RefineOptions, RefinedContent, Result,
    SourceFile,
};
use fileflux_enrich::{DocumentContext, Enricher, EnrichmentEngine};
use fileflux_images::{ImageFilter, ImageProcessor};
use fileflux_readers::{ReaderInput, ReaderRegistry};
use fileflux_refine::Refiner;
use fileflux_writers::{ChunkWriter, ExtractStats, ExtractionArtifacts, OutputFormat, RefinementArtifacts};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// Environment variables whose presence enables AI features.
pub const AI_KEY_VARS: [&str; 3] = ["OPENAI_API_KEY", "ANTHROPIC_API_KEY", "GOOGLE_API_KEY"];

/// Whether any provider key is present in the environment.
pub fn ai_available() -> bool {
    AI_KEY_VARS
        .iter()
        .any(|var| std::env::var(var).is_ok_and(|v| !v.is_empty()))
}

/// Last stage to run; later stages are skipped entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StopAfter {
    /// Stop after extraction; only extract artifacts are written.
    Extract,
    /// Stop after refinement.
    Refine,
    /// Stop after chunking; no enrichment.
    Chunk,
    /// Run the full pipeline.
    #[default]
    Full,
}

/// Pipeline configuration, one value per stage.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Extract-stage options.
    pub extract: ExtractOptions,
    /// Refine-stage options.
    pub refine: RefineOptions,
    /// Chunk-stage options.
    pub chunking: ChunkingOptions,
    /// Enrich-stage options.
    pub enrich: EnrichOptions,
    /// Skip the refine stage.
    pub skip_refine: bool,
    /// Skip the enrich stage.
    pub skip_enrich: bool,
    /// Last stage to run.
    pub stop_after: StopAfter,
    /// Output directory for artifacts; `None` disables writing.
    pub output_dir: Option<PathBuf>,
    /// Chunk artifact format.
    pub output_format: OutputFormat,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            extract: ExtractOptions::default(),
            refine: RefineOptions::default(),
            chunking: ChunkingOptions::default(),
            enrich: EnrichOptions::default(),
            skip_refine: false,
            skip_enrich: false,
            stop_after: StopAfter::default(),
            output_dir: None,
            output_format: OutputFormat::default(),
        }
    }
}

/// Result of processing one document.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    /// Input file path.
    pub file: PathBuf,
    /// Final chunks, enriched when enrichment ran.
    pub chunks: Vec<Chunk>,
    /// Per-stage statistics for the summary panel.
    pub summary: ProcessingSummary,
    /// Whether the chunks came from the cache.
    pub from_cache: bool,
}

/// The document-processing pipeline.
pub struct Pipeline {
    registry: Arc<ReaderRegistry>,
    config: PipelineConfig,
    cache: Arc<ChunkCache>,
    engine: Option<Arc<dyn EnrichmentEngine>>,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("config", &self.config)
            .field("engine", &self.engine.is_some())
            .finish_non_exhaustive()
    }
}

impl Pipeline {
    /// Create a pipeline with the default reader registry and a fresh
    /// cache.
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            registry: Arc::new(ReaderRegistry::with_defaults()),
            config,
            cache: Arc::new(ChunkCache::default()),
            engine: None,
        }
    }

    /// Replace the reader registry.
    #[must_use]
    pub fn with_registry(mut self, registry: Arc<ReaderRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Share an existing cache across pipelines.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<ChunkCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Attach an enrichment engine. Local engines get a warm-up call.
    #[must_use]
    pub fn with_engine(mut self, engine: Arc<dyn EnrichmentEngine>) -> Self {
        engine.warm_up();
        self.engine = Some(engine);
        self
    }

    /// The shared cache, for statistics.
    pub fn cache(&self) -> &ChunkCache {
        &self.cache
    }

    /// Process one document end to end.
    ///
    /// # Errors
    /// Surfaces reader, chunker and I/O failures with the input path;
    /// enrichment failures are recorded on chunks instead.
    pub fn process_file(&self, path: &Path, cancel: &CancellationToken) -> Result<PipelineReport> {
        cancel.check()?;
        let source = SourceFile::from_path(path)?;
        let chunk_stage_runs = matches!(self.config.stop_after, StopAfter::Chunk | StopAfter::Full);
        let key = fingerprint(
            &path.to_string_lossy(),
            source
                .modified
                .map(|t| t.timestamp())
                .unwrap_or_default(),
            source.size,
            &self.config.chunking,
        );
        if chunk_stage_runs {
            if let Some(chunks) = self.cache.get(&key) {
                tracing::debug!(path = %path.display(), "cache hit");
                let summary = ProcessingSummary {
                    chunk_count: chunks.len(),
                    ..Default::default()
                };
                return Ok(PipelineReport {
                    file: path.to_path_buf(),
                    chunks,
                    summary,
                    from_cache: true,
                });
            }
        }

        let report = self.run_stages(path, &source, cancel)?;
        // Only completed runs reach the cache; a cancelled or failed run
        // has already returned.
        if chunk_stage_runs {
            self.cache.insert(&key, report.chunks.clone());
        }
        Ok(report)
    }

    /// Process many documents in parallel. Order of results matches the
    /// input order; failures are per-document.
    pub fn process_many(
        &self,
        paths: &[PathBuf],
        cancel: &CancellationToken,
    ) -> Vec<Result<PipelineReport>> {
        paths
            .par_iter()
            .map(|path| self.process_file(path, cancel))
            .collect()
    }

    fn run_stages(
        &self,
        path: &Path,
        source: &SourceFile,
        cancel: &CancellationToken,
    ) -> Result<PipelineReport> {
        let mut summary = ProcessingSummary::default();
        let input = ReaderInput::path(path);

        // Extract.
        let extract_started = Instant::now();
        let mut raw = self
            .registry
            .extract(&input, &self.config.extract, cancel)?;
        summary.extract_duration = extract_started.elapsed();
        summary.raw_size = source.size;
        summary.extracted_size = raw.text.len();
        summary.warnings = raw.warnings.clone();

        // Image processing.
        if self.config.extract.extract_images && !raw.images.is_empty() {
            if let Some(base) = &self.config.output_dir {
                cancel.check()?;
                let processor = ImageProcessor::new(ImageFilter {
                    min_bytes: self.config.extract.min_image_size,
                    min_dimension: self.config.extract.min_image_dimension,
                    max_bytes: self.config.extract.max_image_size,
                });
                let images_dir = base.join("images");
                let outcome = processor.process(&raw.text, &mut raw.images, &images_dir)?;
                raw.text = outcome.text;
                summary.images_found = outcome.found;
                summary.images_extracted = outcome.extracted;
                summary.images_skipped = outcome.skipped;
            }
        }

        // Parse: normalize the reader output into document shape.
        let parsed = parse_content(source, &raw, summary.extract_duration);
        let parsed_len = parsed.text.len();

        if let Some(base) = &self.config.output_dir {
            ExtractionArtifacts.write(
                base,
                &raw,
                &ExtractStats {
                    raw_size: source.size,
                    extracted_size: raw.text.len(),
                    images_found: summary.images_found,
                    images_extracted: summary.images_extracted,
                    images_skipped: summary.images_skipped,
                },
            )?;
        }

        if self.config.stop_after == StopAfter::Extract {
            return Ok(PipelineReport {
                file: path.to_path_buf(),
                chunks: Vec::new(),
                summary,
                from_cache: false,
            });
        }

        // Refine.
        cancel.check()?;
        let refine_started = Instant::now();
        let refined = if self.config.skip_refine {
            RefinedContent::passthrough(parsed)
        } else {
            Refiner::new(self.config.refine).refine(parsed, Some(&raw), cancel)?
        };
        summary.refine_duration = refine_started.elapsed();
        summary.refined_size = refined.text.len();
        summary.quality = Some(refined.quality);

        if let Some(base) = &self.config.output_dir {
            RefinementArtifacts.write(base, &refined, parsed_len)?;
        }

        if self.config.stop_after == StopAfter::Refine {
            return Ok(PipelineReport {
                file: path.to_path_buf(),
                chunks: Vec::new(),
                summary,
                from_cache: false,
            });
        }

        // Chunk.
        cancel.check()?;
        let chunk_started = Instant::now();
        let model_hint = self.engine.as_ref().map(|engine| ModelHint {
            is_local: engine.is_local(),
            max_enrichment_tokens: engine.max_enrichment_tokens(),
        });
        let outcome = Chunker::new().chunk(
            &refined,
            &self.config.chunking,
            model_hint.as_ref(),
            cancel,
        )?;
        summary.chunk_duration = chunk_started.elapsed();
        summary.strategy = Some(outcome.strategy);
        summary.adjustments = outcome
            .sizing
            .adjustments
            .iter()
            .map(ToString::to_string)
            .collect();
        let mut chunks = outcome.chunks;
        summary.chunk_count = chunks.len();

        if self.config.skip_refine {
            // With refinement skipped the chunk spans index the reader
            // text directly, so page boundaries map cleanly.
            map_page_ranges(&mut chunks, &raw);
        }

        // Enrich, best-effort.
        if self.config.stop_after == StopAfter::Full && !self.config.skip_enrich {
            if let Some(engine) = &self.engine {
                cancel.check()?;
                let enrich_started = Instant::now();
                let ctx = DocumentContext {
                    file_name: source.name.clone(),
                    language: refined.metadata.language.clone(),
                };
                let stats = Enricher::new(engine.as_ref(), self.config.enrich)
                    .enrich_chunks(&mut chunks, Some(&ctx), cancel)?;
                summary.enrich_duration = enrich_started.elapsed();
                summary.enrichment = Some(stats);

                if self.config.enrich.write_sidecar {
                    if let Some(base) = &self.config.output_dir {
                        fileflux_enrich::sidecar::write_sidecar(base, &chunks)?;
                    }
                }
            }
        }

        if let Some(base) = &self.config.output_dir {
            ChunkWriter::new(self.config.output_format).write(base, &chunks)?;
        }

        Ok(PipelineReport {
            file: path.to_path_buf(),
            chunks,
            summary,
            from_cache: false,
        })
    }
}

/// Build [`ParsedContent`] from reader output.
fn parse_content(
    source: &SourceFile,
    raw: &RawContent,
    extract_duration: std::time::Duration,
) -> ParsedContent {
    ParsedContent {
        text: raw.text.clone(),
        metadata: DocumentMetadata {
            file_name: source.name.clone(),
            word_count: raw.text.split_whitespace().count(),
            page_count: raw.hint_usize("page_count"),
            language: fileflux_detect::detect_language(&raw.text).map(str::to_string),
        },
        structure: Vec::new(),
        parsing: ParsingInfo {
            reader: raw.reader.clone(),
            extract_duration,
            refine_duration: std::time::Duration::ZERO,
        },
    }
}

/// Attach page ranges to chunks whose source span falls inside reader-
/// recorded page boundaries.
fn map_page_ranges(chunks: &mut [Chunk], raw: &RawContent) {
    let Some(spans) = raw.hints.get("page_spans") else {
        return;
    };
    let mut pages: Vec<(usize, usize, usize)> = Vec::new();
    for span in spans.split(',') {
        let Some((page, range)) = span.split_once(':') else {
            continue;
        };
        let Some((start, end)) = range.split_once('-') else {
            continue;
        };
        if let (Ok(page), Ok(start), Ok(end)) =
            (page.parse::<usize>(), start.parse::<usize>(), end.parse::<usize>())
        {
            pages.push((page, start, end));
        }
    }
    if pages.is_empty() {
        return;
    }
    for chunk in chunks.iter_mut() {
        let Some(span) = chunk.source_span else {
            continue;
        };
        let first = pages
            .iter()
            .find(|(_, start, end)| span.start >= *start && span.start < *end);
        let last = pages
            .iter()
            .find(|(_, start, end)| span.end > *start && span.end <= *end);
        if let (Some((first_page, _, _)), Some((last_page, _, _))) = (first, last) {
            chunk.page_range = Some(PageRange {
                start: *first_page,
                end: *last_page,
            });
        }
    }
}
