//! FileFlux CLI - document ingestion for RAG indexing.
//!
//! Four subcommands mirror the pipeline stages: `extract` stops after
//! reading, `refine` adds cleanup, `chunk` segments, and `process` runs
//! the full pipeline including enrichment.

// CLI code formats many counts and sizes for display; truncation and
// precision loss are acceptable in that context.
#![allow(clippy::cast_precision_loss)]

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use fileflux_core::{CancellationToken, ChunkStrategy, ChunkingOptions, ExtractOptions};
use fileflux_pipeline::{ai_available, Pipeline, PipelineConfig, PipelineReport, StopAfter};
use fileflux_writers::OutputFormat;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing_subscriber::EnvFilter;

/// Format bytes as a human-readable size.
fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;
    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{bytes} bytes")
    }
}

/// Default output base next to the input, named after its stem.
fn default_output_dir(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    input.with_file_name(stem)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Default)]
enum CliFormat {
    /// One markdown file per chunk.
    #[default]
    Md,
    /// Single JSON array.
    Json,
    /// JSON lines, one chunk per line.
    Jsonl,
}

impl From<CliFormat> for OutputFormat {
    fn from(value: CliFormat) -> Self {
        match value {
            CliFormat::Md => Self::Md,
            CliFormat::Json => Self::Json,
            CliFormat::Jsonl => Self::Jsonl,
        }
    }
}

#[derive(Args, Debug, Clone)]
struct SharedOpts {
    /// Output directory (defaults to a directory named after the input)
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Output format for chunk artifacts
    #[arg(short, long, value_enum, default_value = "md")]
    format: CliFormat,

    /// Skip image extraction entirely
    #[arg(long)]
    no_extract_images: bool,

    /// Minimum decoded image size in bytes
    #[arg(long, value_name = "BYTES")]
    min_image_size: Option<usize>,

    /// Minimum image dimension in pixels (each side)
    #[arg(long, value_name = "PX")]
    min_image_dimension: Option<u32>,
}

#[derive(Args, Debug, Clone)]
struct ChunkOpts {
    /// Chunking strategy
    #[arg(short, long, default_value = "Auto", value_name = "STRATEGY")]
    strategy: String,

    /// Maximum chunk size in tokens
    #[arg(short = 'm', long, default_value_t = 512, value_name = "TOKENS")]
    max_size: usize,

    /// Overlap between chunks in tokens
    #[arg(short = 'l', long, default_value_t = 64, value_name = "TOKENS")]
    overlap: usize,
}

#[derive(Parser, Debug)]
#[command(
    name = "fileflux",
    about = "Convert documents into enriched, size-bounded chunks for RAG indexing",
    version
)]
struct Cli {
    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Verbose diagnostics
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Extract raw text and resources from documents
    Extract {
        /// Input files
        #[arg(value_name = "INPUTS", required = true)]
        inputs: Vec<PathBuf>,

        #[command(flatten)]
        shared: SharedOpts,
    },
    /// Extract and refine text
    Refine {
        /// Input files
        #[arg(value_name = "INPUTS", required = true)]
        inputs: Vec<PathBuf>,

        #[command(flatten)]
        shared: SharedOpts,
    },
    /// Extract, refine and chunk
    Chunk {
        /// Input files
        #[arg(value_name = "INPUTS", required = true)]
        inputs: Vec<PathBuf>,

        #[command(flatten)]
        shared: SharedOpts,

        #[command(flatten)]
        chunk: ChunkOpts,

        /// Skip the refine stage
        #[arg(long)]
        no_refine: bool,
    },
    /// Run the full pipeline including enrichment
    Process {
        /// Input files
        #[arg(value_name = "INPUTS", required = true)]
        inputs: Vec<PathBuf>,

        #[command(flatten)]
        shared: SharedOpts,

        #[command(flatten)]
        chunk: ChunkOpts,

        /// Skip the refine stage
        #[arg(long)]
        no_refine: bool,

        /// Skip the enrich stage
        #[arg(long)]
        no_enrich: bool,

        /// Disable all AI features (enrichment, vision captions)
        #[arg(long)]
        no_ai: bool,
    },
}

fn init_tracing(quiet: bool, verbose: bool) {
    let default_level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "info"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn build_config(
    shared: &SharedOpts,
    chunk: Option<&ChunkOpts>,
    stop_after: StopAfter,
    no_refine: bool,
    no_enrich: bool,
    input: &Path,
) -> Result<PipelineConfig> {
    let mut extract = ExtractOptions::default().with_images(!shared.no_extract_images);
    if let Some(min) = shared.min_image_size {
        extract.min_image_size = min;
    }
    if let Some(min) = shared.min_image_dimension {
        extract.min_image_dimension = min;
    }

    let chunking = match chunk {
        Some(opts) => {
            let strategy = ChunkStrategy::from_str(&opts.strategy)
                .map_err(|e| anyhow::anyhow!(e))
                .context("invalid --strategy")?;
            let chunking = ChunkingOptions::default()
                .with_strategy(strategy)
                .with_sizes(opts.max_size, opts.overlap);
            chunking
                .validate()
                .map_err(|e| anyhow::anyhow!(e))
                .context("invalid chunk sizes")?;
            chunking
        }
        None => ChunkingOptions::default(),
    };

    Ok(PipelineConfig {
        extract,
        chunking,
        stop_after,
        skip_refine: no_refine,
        skip_enrich: no_enrich,
        output_dir: Some(
            shared
                .output
                .clone()
                .unwrap_or_else(|| default_output_dir(input)),
        ),
        output_format: shared.format.into(),
        ..Default::default()
    })
}

fn print_summary(report: &PipelineReport, quiet: bool) {
    if quiet {
        return;
    }
    let summary = &report.summary;
    println!();
    println!(
        "{} {}",
        "processed".green().bold(),
        report.file.display()
    );
    if report.from_cache {
        println!("  {}", "served from cache".dimmed());
        println!("  chunks: {}", summary.chunk_count);
        return;
    }
    println!(
        "  extract: {} ({} -> {})",
        format_duration(summary.extract_duration),
        format_bytes(summary.raw_size),
        format_bytes(summary.extracted_size as u64)
    );
    println!(
        "  refine:  {} (reduction {:.1}%)",
        format_duration(summary.refine_duration),
        summary.reduction_percent()
    );
    if let Some(strategy) = summary.strategy {
        println!(
            "  chunk:   {} ({} chunks, strategy {})",
            format_duration(summary.chunk_duration),
            summary.chunk_count,
            strategy
        );
    }
    for adjustment in &summary.adjustments {
        println!("  {} {}", "size adjusted:".yellow(), adjustment);
    }
    if let Some(stats) = summary.enrichment {
        println!(
            "  enrich:  {} ({}/{} succeeded, {:.0}%)",
            format_duration(summary.enrich_duration),
            stats.succeeded,
            stats.succeeded + stats.failed,
            summary.enrichment_success_rate() * 100.0
        );
    }
    if summary.images_found > 0 {
        println!(
            "  images:  {} found, {} extracted, {} skipped",
            summary.images_found, summary.images_extracted, summary.images_skipped
        );
    }
    for warning in &summary.warnings {
        println!("  {} {}", "warning:".yellow(), warning);
    }
}

fn format_duration(d: std::time::Duration) -> String {
    if d.as_secs() >= 1 {
        format!("{:.1}s", d.as_secs_f64())
    } else {
        format!("{}ms", d.as_millis())
    }
}

fn run_inputs(
    inputs: &[PathBuf],
    shared: &SharedOpts,
    chunk: Option<&ChunkOpts>,
    stop_after: StopAfter,
    no_refine: bool,
    no_enrich: bool,
    quiet: bool,
) -> Result<()> {
    let progress = if quiet || inputs.len() < 2 {
        None
    } else {
        let bar = ProgressBar::new(inputs.len() as u64);
        bar.set_style(
            ProgressStyle::with_template("{bar:30} {pos}/{len} {msg}")
                .expect("progress template"),
        );
        Some(bar)
    };

    let cancel = CancellationToken::new();
    let mut failures = 0usize;
    for input in inputs {
        if let Some(bar) = &progress {
            bar.set_message(input.display().to_string());
        }
        let config = build_config(shared, chunk, stop_after, no_refine, no_enrich, input)?;
        let pipeline = Pipeline::new(config);
        match pipeline.process_file(input, &cancel) {
            Ok(report) => print_summary(&report, quiet),
            Err(err) => {
                failures += 1;
                eprintln!("{} {}: {err}", "error".red().bold(), input.display());
            }
        }
        if let Some(bar) = &progress {
            bar.inc(1);
        }
    }
    if let Some(bar) = progress {
        bar.finish_and_clear();
    }
    if failures > 0 {
        anyhow::bail!("{failures} of {} inputs failed", inputs.len());
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.quiet, cli.verbose);

    let result = match &cli.command {
        Commands::Extract { inputs, shared } => run_inputs(
            inputs,
            shared,
            None,
            StopAfter::Extract,
            true,
            true,
            cli.quiet,
        ),
        Commands::Refine { inputs, shared } => run_inputs(
            inputs,
            shared,
            None,
            StopAfter::Refine,
            false,
            true,
            cli.quiet,
        ),
        Commands::Chunk {
            inputs,
            shared,
            chunk,
            no_refine,
        } => run_inputs(
            inputs,
            shared,
            Some(chunk),
            StopAfter::Chunk,
            *no_refine,
            true,
            cli.quiet,
        ),
        Commands::Process {
            inputs,
            shared,
            chunk,
            no_refine,
            no_enrich,
            no_ai,
        } => {
            let enrich_disabled = *no_enrich || *no_ai || {
                if !ai_available() {
                    if !cli.quiet {
                        eprintln!(
                            "{} no provider API key found; AI features disabled",
                            "warning:".yellow()
                        );
                    }
                    true
                } else {
                    false
                }
            };
            run_inputs(
                inputs,
                shared,
                Some(chunk),
                StopAfter::Full,
                *no_refine,
                enrich_disabled,
                cli.quiet,
            )
        }
    };

    if let Err(err) = result {
        eprintln!("{} {err:#}", "error".red().bold());
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parses() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 bytes");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
    }

    #[test]
    fn test_default_output_dir() {
        assert_eq!(
            default_output_dir(Path::new("/tmp/report.pdf")),
            PathBuf::from("/tmp/report")
        );
    }

    #[test]
    fn test_chunk_args_parse() {
        let cli = Cli::parse_from([
            "fileflux", "chunk", "doc.md", "-s", "sentence", "-m", "256", "-l", "32",
        ]);
        match cli.command {
            Commands::Chunk { chunk, .. } => {
                assert_eq!(chunk.strategy, "sentence");
                assert_eq!(chunk.max_size, 256);
                assert_eq!(chunk.overlap, 32);
            }
            other => panic!("expected Chunk, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_strategy_rejected_in_config() {
        let shared = SharedOpts {
            output: None,
            format: CliFormat::Md,
            no_extract_images: false,
            min_image_size: None,
            min_image_dimension: None,
        };
        let chunk = ChunkOpts {
            strategy: "fancy".to_string(),
            max_size: 512,
            overlap: 64,
        };
        let err = build_config(
            &shared,
            Some(&chunk),
            StopAfter::Chunk,
            false,
            false,
            Path::new("a.md"),
        );
        assert!(err.is_err());
    }

    #[test]
    fn test_process_flags() {
        let cli = Cli::parse_from(["fileflux", "process", "a.md", "--no-enrich", "--no-refine"]);
        match cli.command {
            Commands::Process {
                no_enrich,
                no_refine,
                no_ai,
                ..
            } => {
                assert!(no_enrich);
                assert!(no_refine);
                assert!(!no_ai);
            }
            other => panic!("expected Process, got {other:?}"),
        }
    }
}
