//! pdf_to_txt - Convert multi-column PDFs to reading-ordered plain text
//!
//! Usage:
//!   pdf_to_txt convert paper.pdf [-o paper.txt]
//!   pdf_to_txt batch papers/ [-o texts/] [--workers 4] [--report report.json]
//!   pdf_to_txt preview paper.pdf [--pages 3] [--json]
//!
//! `batch` exits with status 1 when any document failed.

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use pdf_reflow::config::{BackendPolicy, ReadingMode, ReflowConfig};
use pdf_reflow::pipeline::{BatchOrchestrator, ConversionResult, DocumentConverter};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

/// Convert two-column PDFs to plain text in reading order.
#[derive(Parser, Debug)]
#[command(name = "pdf_to_txt")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    options: GlobalOptions,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Convert one PDF to a text file
    Convert {
        /// Input PDF
        input: PathBuf,

        /// Output text file (default: input with .txt extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Convert every PDF in a directory
    Batch {
        /// Directory to scan for *.pdf files
        input_dir: PathBuf,

        /// Directory for text files (default: next to each PDF)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Only convert PDFs directly inside the input directory
        #[arg(long)]
        no_recursive: bool,

        /// Documents converted concurrently (default: number of cores)
        #[arg(long)]
        workers: Option<usize>,

        /// Write a JSON summary of the batch to this file
        #[arg(long)]
        report: Option<PathBuf>,
    },

    /// Show the detected layout of the first pages
    Preview {
        /// Input PDF
        input: PathBuf,

        /// Number of pages to analyse
        #[arg(long, default_value_t = pdf_reflow::pipeline::DEFAULT_PREVIEW_PAGES)]
        pages: usize,

        /// Print the preview as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
struct GlobalOptions {
    /// Skip the primary backend and extract with the fallback only
    #[arg(long, global = true)]
    use_fallback: bool,

    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Minimum gutter width as a fraction of page width
    #[arg(long, global = true)]
    min_gap: Option<f32>,

    /// Maximum number of columns per page
    #[arg(long, global = true)]
    max_columns: Option<usize>,

    /// Vertical tolerance (points) for runs sharing a row
    #[arg(long, global = true)]
    row_tolerance: Option<f32>,

    /// Fraction of pages a header/footer must repeat on to be removed
    #[arg(long, global = true)]
    repeat_threshold: Option<f32>,

    /// Minimum text coverage of the page area before the fallback is used
    #[arg(long, global = true)]
    degenerate_area: Option<f32>,

    /// Per-document time budget in milliseconds
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    /// Emit each column block whole instead of alternating row by row
    #[arg(long, global = true)]
    column_major: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

impl GlobalOptions {
    fn build_config(&self) -> Result<ReflowConfig> {
        let mut config = match &self.config {
            Some(path) => ReflowConfig::from_json_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => ReflowConfig::default(),
        };

        if let Some(v) = self.min_gap {
            config = config.with_min_gap_ratio(v);
        }
        if let Some(v) = self.max_columns {
            config = config.with_max_columns(v);
        }
        if let Some(v) = self.row_tolerance {
            config = config.with_row_tolerance(v);
        }
        if let Some(v) = self.repeat_threshold {
            config = config.with_repetition_threshold(v);
        }
        if let Some(v) = self.degenerate_area {
            config = config.with_degenerate_area_ratio(v);
        }
        if let Some(ms) = self.timeout_ms {
            config = config.with_timeout(Some(Duration::from_millis(ms)));
        }
        if self.column_major {
            config = config.with_reading_mode(ReadingMode::ColumnMajor);
        }
        if self.use_fallback {
            config = config.with_backend_policy(BackendPolicy::FallbackOnly);
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = if cli.options.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            log::error!("{:#}", e);
            ExitCode::FAILURE
        },
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let config = cli.options.build_config()?;
    let converter = DocumentConverter::new(config);

    match cli.command {
        Command::Convert { input, output } => {
            match converter.convert_to_file(&input, output.as_deref()) {
                ConversionResult::Done(doc) => {
                    log::info!("{} characters extracted", doc.text.chars().count());
                    Ok(ExitCode::SUCCESS)
                },
                ConversionResult::Failed(failure) => bail!("{}", failure),
            }
        },
        Command::Batch {
            input_dir,
            output_dir,
            no_recursive,
            workers,
            report,
        } => {
            let mut batch = BatchOrchestrator::new(converter);
            if let Some(n) = workers {
                batch = batch.with_workers(n);
            }

            let results = batch
                .run_directory(&input_dir, output_dir.as_deref(), !no_recursive)
                .with_context(|| format!("converting {}", input_dir.display()))?;

            for failure in results.failures() {
                log::error!("{}", failure);
            }

            if let Some(path) = report {
                let json = serde_json::to_string_pretty(&results.summary())?;
                std::fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
                log::info!("Report written to {}", path.display());
            }

            log::info!(
                "{} of {} documents converted",
                results.succeeded(),
                results.len()
            );

            if results.failed() > 0 {
                Ok(ExitCode::from(1))
            } else {
                Ok(ExitCode::SUCCESS)
            }
        },
        Command::Preview { input, pages, json } => {
            let preview = converter
                .preview_file(&input, Some(pages))
                .with_context(|| format!("previewing {}", input.display()))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&preview)?);
            } else {
                print!("{}", preview);
            }
            Ok(ExitCode::SUCCESS)
        },
    }
}
