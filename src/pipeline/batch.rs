//! Batch conversion of many documents on a bounded worker pool.
//!
//! Each document is converted independently: a failure or a panic while
//! converting one document becomes a `Failed` entry in the [`BatchReport`]
//! and never affects the others.

use super::converter::DocumentConverter;
use super::result::{ConversionFailure, ConversionResult};
use crate::error::{Error, ErrorKind, Result};
use crate::extractors::panic_message;
use rayon::ThreadPoolBuilder;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Per-document results of a batch, keyed by input path.
///
/// Entries can only be added, and each path at most once.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    results: BTreeMap<PathBuf, ConversionResult>,
}

impl BatchReport {
    /// Create an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the result for one input.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the path already has a result.
    pub fn record(&mut self, path: impl Into<PathBuf>, result: ConversionResult) -> Result<()> {
        let path = path.into();
        if self.results.contains_key(&path) {
            return Err(Error::InvalidConfig(format!(
                "duplicate batch entry for {}",
                path.display()
            )));
        }
        self.results.insert(path, result);
        Ok(())
    }

    /// Result for one input.
    pub fn get(&self, path: impl AsRef<Path>) -> Option<&ConversionResult> {
        self.results.get(path.as_ref())
    }

    /// All results in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&PathBuf, &ConversionResult)> {
        self.results.iter()
    }

    /// Number of documents.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Whether the report has no entries.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Number of converted documents.
    pub fn succeeded(&self) -> usize {
        self.results.values().filter(|r| r.is_done()).count()
    }

    /// Number of failed documents.
    pub fn failed(&self) -> usize {
        self.results.values().filter(|r| r.is_failed()).count()
    }

    /// Failures in path order.
    pub fn failures(&self) -> impl Iterator<Item = &ConversionFailure> {
        self.results.values().filter_map(ConversionResult::failure)
    }

    /// Compact, serializable view without the document texts.
    pub fn summary(&self) -> BatchSummary {
        let documents = self
            .results
            .iter()
            .map(|(path, result)| match result {
                ConversionResult::Done(doc) => DocumentSummary {
                    source: path.clone(),
                    status: "done",
                    backend: Some(doc.backend.clone()),
                    pages: doc.pages.len(),
                    chars: doc.text.chars().count(),
                    used_fallback: doc.used_fallback(),
                    kind: None,
                    message: None,
                },
                ConversionResult::Failed(failure) => DocumentSummary {
                    source: path.clone(),
                    status: "failed",
                    backend: failure.backend.clone(),
                    pages: 0,
                    chars: 0,
                    used_fallback: failure.chain.len() > 1,
                    kind: Some(failure.kind),
                    message: Some(failure.message.clone()),
                },
            })
            .collect();

        BatchSummary {
            total: self.len(),
            succeeded: self.succeeded(),
            failed: self.failed(),
            documents,
        }
    }
}

/// Serializable batch overview.
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    /// Documents attempted
    pub total: usize,
    /// Documents converted
    pub succeeded: usize,
    /// Documents failed
    pub failed: usize,
    /// One entry per document, in path order
    pub documents: Vec<DocumentSummary>,
}

/// One document in a [`BatchSummary`].
#[derive(Debug, Clone, Serialize)]
pub struct DocumentSummary {
    /// Input path
    pub source: PathBuf,
    /// "done" or "failed"
    pub status: &'static str,
    /// Backend used
    pub backend: Option<String>,
    /// Pages converted
    pub pages: usize,
    /// Characters of text produced
    pub chars: usize,
    /// Whether the fallback backend was involved
    pub used_fallback: bool,
    /// Failure kind
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<ErrorKind>,
    /// Failure message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// One unit of batch work.
#[derive(Debug, Clone)]
struct Job {
    input: PathBuf,
    output: Option<PathBuf>,
}

/// Runs a [`DocumentConverter`] over many inputs.
#[derive(Debug, Clone)]
pub struct BatchOrchestrator {
    converter: DocumentConverter,
    workers: usize,
}

impl BatchOrchestrator {
    /// Create an orchestrator with one worker per available core.
    pub fn new(converter: DocumentConverter) -> Self {
        let workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        Self { converter, workers }
    }

    /// Set the number of concurrent documents (at least 1).
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Worker count.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// The converter used for each document.
    pub fn converter(&self) -> &DocumentConverter {
        &self.converter
    }

    /// Convert every input without writing output files.
    ///
    /// Duplicate inputs are converted once.
    pub fn run<P: AsRef<Path>>(&self, inputs: &[P]) -> Result<BatchReport> {
        let jobs = inputs
            .iter()
            .map(|p| Job {
                input: p.as_ref().to_path_buf(),
                output: None,
            })
            .collect();
        self.run_jobs(jobs)
    }

    /// Convert every `*.pdf` under `input_dir`, writing `.txt` files.
    ///
    /// Output files mirror the input tree below `output_dir`, which defaults
    /// to `input_dir` itself.
    ///
    /// # Errors
    ///
    /// Fails only when `input_dir` cannot be listed or the worker pool cannot
    /// start; per-document problems are recorded in the report.
    pub fn run_directory(
        &self,
        input_dir: impl AsRef<Path>,
        output_dir: Option<&Path>,
        recursive: bool,
    ) -> Result<BatchReport> {
        let input_dir = input_dir.as_ref();
        let output_dir = output_dir.unwrap_or(input_dir);

        let jobs: Vec<Job> = discover_pdfs(input_dir, recursive)?
            .into_iter()
            .map(|input| {
                let relative = input.strip_prefix(input_dir).unwrap_or(&input);
                let output = output_dir.join(relative).with_extension("txt");
                Job {
                    input,
                    output: Some(output),
                }
            })
            .collect();

        log::info!(
            "Found {} PDF files in {} ({})",
            jobs.len(),
            input_dir.display(),
            if recursive { "recursive" } else { "top level only" }
        );

        self.run_jobs(jobs)
    }

    fn run_jobs(&self, mut jobs: Vec<Job>) -> Result<BatchReport> {
        jobs.sort_by(|a, b| a.input.cmp(&b.input));
        jobs.dedup_by(|a, b| a.input == b.input);

        let pool = ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()
            .map_err(|e| Error::InvalidConfig(format!("cannot start worker pool: {}", e)))?;

        let results: Vec<(PathBuf, ConversionResult)> = pool.install(|| {
            jobs.par_iter()
                .map(|job| (job.input.clone(), self.run_job(job)))
                .collect()
        });

        let mut report = BatchReport::new();
        for (path, result) in results {
            report.record(path, result)?;
        }

        log::info!(
            "Batch complete: {} converted, {} failed",
            report.succeeded(),
            report.failed()
        );
        Ok(report)
    }

    fn run_job(&self, job: &Job) -> ConversionResult {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| match &job.output {
            Some(output) => self.converter.convert_to_file(&job.input, Some(output.as_path())),
            None => self.converter.convert_file(&job.input),
        }));

        outcome.unwrap_or_else(|payload| {
            let message = panic_message(payload.as_ref());
            log::warn!("Conversion of {} panicked: {}", job.input.display(), message);
            ConversionFailure::new(
                job.input.clone(),
                None,
                &Error::extraction("converter", message),
                Vec::new(),
            )
            .into()
        })
    }
}

/// List `*.pdf` files (case-insensitive extension) under a directory, sorted.
pub fn discover_pdfs(dir: &Path, recursive: bool) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(Error::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} is not a directory", dir.display()),
        )));
    }

    let walker = WalkDir::new(dir)
        .follow_links(true)
        .max_depth(if recursive { usize::MAX } else { 1 });

    let mut found = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::warn!("Skipping unreadable entry: {}", e);
                continue;
            },
        };
        let is_pdf = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
        if entry.file_type().is_file() && is_pdf {
            found.push(entry.into_path());
        }
    }

    found.sort();
    Ok(found)
}
