//! Single-document conversion with backend fallback.
//!
//! ```text
//! Pending
//!     ↓
//! ExtractingPrimary ──(failure or degenerate)──→ ExtractingFallback
//!     ↓                                               ↓
//! ReconstructingOrder (per page, parallel) ←──────────┘
//!     ↓
//! Cleaning (whole document)
//!     ↓
//! Done                      any step may end in Failed
//! ```
//!
//! The fallback backend is tried at most once per document. Input without a
//! PDF signature fails immediately without touching either backend.
//!
//! With a time budget, each backend call runs on its own thread and the
//! converter stops waiting once the budget is spent. The abandoned thread
//! finishes in the background and its result is dropped.

use super::result::{Attempt, ConversionFailure, ConversionResult, ConversionState, ConvertedDocument};
use crate::config::{BackendPolicy, ReflowConfig};
use crate::error::{Error, Result};
use crate::extractors::{BackendSet, ExtractionBackend, sniff_pdf};
use crate::layout::column_detector::detect_columns;
use crate::layout::line_builder::merge_words;
use crate::layout::reading_order::{ReconstructedPage, reconstruct_page};
use crate::layout::text_run::PageRuns;
use crate::text::clean_document;
use rayon::prelude::*;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Converts one PDF at a time into reading-ordered plain text.
///
/// A converter holds no per-document state, so one instance can serve many
/// documents concurrently.
#[derive(Debug, Clone)]
pub struct DocumentConverter {
    config: ReflowConfig,
    backends: BackendSet,
}

impl DocumentConverter {
    /// Create a converter using the `pdf-extract` and `lopdf` backends.
    pub fn new(config: ReflowConfig) -> Self {
        Self {
            config,
            backends: BackendSet::default(),
        }
    }

    /// Create a converter with custom backends.
    pub fn with_backends(
        config: ReflowConfig,
        primary: Arc<dyn ExtractionBackend>,
        fallback: Arc<dyn ExtractionBackend>,
    ) -> Self {
        Self {
            config,
            backends: BackendSet::new(primary, fallback),
        }
    }

    /// The active configuration.
    pub fn config(&self) -> &ReflowConfig {
        &self.config
    }

    /// The backends in use.
    pub fn backends(&self) -> &BackendSet {
        &self.backends
    }

    /// Convert a PDF held in memory. `source` labels the result.
    pub fn convert_bytes(&self, source: impl AsRef<Path>, bytes: &[u8]) -> ConversionResult {
        let mut run = Run::new(source.as_ref(), self.config.conversion.timeout());

        if let Err(e) = sniff_pdf(bytes) {
            return run.fail(None, e);
        }

        let (backend, pages, attempts) = match self.extract(&mut run, bytes) {
            Ok(extracted) => extracted,
            Err(failure) => return ConversionResult::Failed(failure),
        };

        run.transition(ConversionState::ReconstructingOrder);
        let pages = self.reconstruct(pages);
        if let Err(e) = run.check_deadline() {
            return run.fail(Some(backend), e);
        }

        run.transition(ConversionState::Cleaning);
        let pages = clean_document(pages, &self.config.cleaning);
        let text = assemble_text(&pages, &self.config.conversion.page_separator);

        run.transition(ConversionState::Done);
        log::info!(
            "Converted {} with {} ({} pages, {} chars{})",
            run.source.display(),
            backend,
            pages.len(),
            text.len(),
            if attempts.is_empty() { "" } else { ", after fallback" }
        );

        ConversionResult::Done(ConvertedDocument {
            source: run.source,
            backend: backend.to_string(),
            pages,
            text,
            attempts,
        })
    }

    /// Read and convert a PDF file.
    pub fn convert_file(&self, path: impl AsRef<Path>) -> ConversionResult {
        let path = path.as_ref();
        match std::fs::read(path) {
            Ok(bytes) => self.convert_bytes(path, &bytes),
            Err(e) => {
                log::warn!("Cannot read {}: {}", path.display(), e);
                ConversionFailure::new(path, None, &Error::Io(e), Vec::new()).into()
            },
        }
    }

    /// Convert a PDF file and write its text.
    ///
    /// Without an explicit `output`, the text goes next to the input with a
    /// `.txt` extension. A failed write turns the result into an `Io` failure.
    pub fn convert_to_file(&self, input: impl AsRef<Path>, output: Option<&Path>) -> ConversionResult {
        let input = input.as_ref();
        let output = output.map(Path::to_path_buf).unwrap_or_else(|| default_output_path(input));

        let doc = match self.convert_file(input) {
            ConversionResult::Done(doc) => doc,
            failed => return failed,
        };

        match write_text(&output, &doc.text) {
            Ok(()) => {
                log::info!("Wrote {}", output.display());
                ConversionResult::Done(doc)
            },
            Err(e) => {
                log::warn!("Cannot write {}: {}", output.display(), e);
                ConversionFailure::new(input, Some(doc.backend.as_str()), &e, doc.attempts).into()
            },
        }
    }

    /// Merge words into lines, detect columns and rebuild reading order for
    /// every page, in parallel.
    ///
    /// Pages are independent; output keeps input page order.
    pub fn reconstruct(&self, pages: Vec<PageRuns>) -> Vec<ReconstructedPage> {
        let detection = &self.config.detection;
        let ordering = &self.config.ordering;
        pages
            .into_par_iter()
            .map(|page| {
                let lines = PageRuns {
                    runs: merge_words(&page.runs, page.width, detection),
                    ..page
                };
                let layout = detect_columns(&lines.runs, lines.width, detection);
                reconstruct_page(&lines, &layout, ordering)
            })
            .collect()
    }

    /// Run the backends according to the policy.
    ///
    /// Returns the backend name, its pages and any earlier failed attempts.
    fn extract(
        &self,
        run: &mut Run,
        bytes: &[u8],
    ) -> std::result::Result<(&str, Vec<PageRuns>, Vec<Attempt>), ConversionFailure> {
        let primary = &self.backends.primary;
        let fallback = &self.backends.fallback;

        if self.config.conversion.backend_policy == BackendPolicy::PrimaryFirst {
            run.transition(ConversionState::ExtractingPrimary);
            let outcome = run.call(primary, bytes);
            run.check_deadline().map_err(|e| run.failure(Some(primary.name()), e))?;

            let rejected = match outcome {
                Ok(pages) => match degenerate_reason(&pages, self.config.conversion.degenerate_area_ratio) {
                    None => return Ok((primary.name(), pages, run.take_attempts())),
                    Some(reason) => Error::DegenerateLayout(reason),
                },
                Err(e) if !e.kind().allows_fallback() => {
                    return Err(run.failure(Some(primary.name()), e));
                },
                Err(e) => e,
            };

            log::warn!(
                "{}: {} failed ({}), trying {}",
                run.source.display(),
                primary.name(),
                rejected,
                fallback.name()
            );
            run.attempts.push(Attempt::from_error(primary.name(), &rejected));
        }

        run.transition(ConversionState::ExtractingFallback);
        let outcome = run.call(fallback, bytes);
        run.check_deadline().map_err(|e| run.failure(Some(fallback.name()), e))?;

        match outcome {
            Ok(pages) if total_runs(&pages) == 0 => Err(run.failure(
                Some(fallback.name()),
                Error::DegenerateLayout("no text runs extracted".to_string()),
            )),
            Ok(pages) => Ok((fallback.name(), pages, run.take_attempts())),
            Err(e) => Err(run.failure(Some(fallback.name()), e)),
        }
    }
}

/// Bookkeeping for one conversion.
struct Run {
    source: PathBuf,
    started: Instant,
    budget: Option<Duration>,
    state: ConversionState,
    attempts: Vec<Attempt>,
}

impl Run {
    fn new(source: &Path, budget: Option<Duration>) -> Self {
        Self {
            source: source.to_path_buf(),
            started: Instant::now(),
            budget,
            state: ConversionState::Pending,
            attempts: Vec::new(),
        }
    }

    fn transition(&mut self, next: ConversionState) {
        log::debug!("{}: {:?} -> {:?}", self.source.display(), self.state, next);
        self.state = next;
    }

    fn check_deadline(&self) -> Result<()> {
        match self.budget {
            Some(budget) if self.started.elapsed() > budget => Err(Error::Timeout(budget)),
            _ => Ok(()),
        }
    }

    fn remaining(&self) -> Option<Duration> {
        self.budget.map(|budget| budget.saturating_sub(self.started.elapsed()))
    }

    /// Run one backend, giving up once the budget is spent.
    ///
    /// A panic inside the backend is re-raised on the calling thread.
    fn call(&self, backend: &Arc<dyn ExtractionBackend>, bytes: &[u8]) -> Result<Vec<PageRuns>> {
        let (budget, remaining) = match (self.budget, self.remaining()) {
            (Some(budget), Some(remaining)) => (budget, remaining),
            _ => return backend.extract(bytes),
        };

        let worker = Arc::clone(backend);
        let input: Arc<[u8]> = Arc::from(bytes);
        let (tx, rx) = mpsc::channel();
        thread::Builder::new()
            .name(format!("extract-{}", backend.name()))
            .spawn(move || {
                let outcome = panic::catch_unwind(AssertUnwindSafe(|| worker.extract(&input)));
                let _ = tx.send(outcome);
            })?;

        match rx.recv_timeout(remaining) {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(payload)) => panic::resume_unwind(payload),
            Err(RecvTimeoutError::Timeout) => {
                log::warn!(
                    "{}: {} still running after {:?}, abandoning it",
                    self.source.display(),
                    backend.name(),
                    budget
                );
                Err(Error::Timeout(budget))
            },
            Err(RecvTimeoutError::Disconnected) => Err(Error::extraction(
                backend.name(),
                "backend thread exited without a result",
            )),
        }
    }

    fn take_attempts(&mut self) -> Vec<Attempt> {
        std::mem::take(&mut self.attempts)
    }

    /// Record the final error and move to `Failed`.
    fn failure(&mut self, backend: Option<&str>, error: Error) -> ConversionFailure {
        if let Some(name) = backend {
            self.attempts.push(Attempt::from_error(name, &error));
        }
        self.transition(ConversionState::Failed);
        log::warn!("Failed {}: {}", self.source.display(), error);
        ConversionFailure::new(self.source.clone(), backend, &error, self.take_attempts())
    }

    fn fail(&mut self, backend: Option<&str>, error: Error) -> ConversionResult {
        ConversionResult::Failed(self.failure(backend, error))
    }
}

/// Why extracted pages are unusable, if they are.
///
/// The coverage test is document-wide: sparse pages (section openers,
/// figure pages) do not make a document degenerate on their own.
pub fn degenerate_reason(pages: &[PageRuns], min_area_ratio: f32) -> Option<String> {
    let runs = total_runs(pages);
    if runs == 0 {
        return Some("no text runs extracted".to_string());
    }

    let page_area: f32 = pages.iter().map(PageRuns::area).sum();
    if page_area <= 0.0 {
        return None;
    }
    let covered: f32 = pages.iter().map(PageRuns::covered_area).sum();
    let ratio = covered / page_area;
    if ratio < min_area_ratio {
        Some(format!(
            "{} runs cover {:.4} of the page area, below {:.4}",
            runs, ratio, min_area_ratio
        ))
    } else {
        None
    }
}

fn total_runs(pages: &[PageRuns]) -> usize {
    pages.iter().map(|p| p.runs.len()).sum()
}

/// Join page texts with the separator, skipping pages left empty by cleaning.
pub fn assemble_text(pages: &[ReconstructedPage], separator: &str) -> String {
    pages
        .iter()
        .filter(|p| !p.is_empty())
        .map(ReconstructedPage::text)
        .collect::<Vec<_>>()
        .join(separator)
}

/// Default text output path: the input with a `.txt` extension.
pub fn default_output_path(input: &Path) -> PathBuf {
    input.with_extension("txt")
}

fn write_text(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, text)?;
    Ok(())
}
