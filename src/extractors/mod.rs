//! Extraction backends: PDF bytes in, positioned runs out.
//!
//! Two interchangeable backends sit behind [`ExtractionBackend`]:
//! - [`PdfExtractBackend`] receives every positioned glyph from `pdf-extract`
//!   and groups them into word runs with accurate boxes
//! - [`LopdfBackend`] uses `lopdf`'s per-page text extraction and yields line
//!   runs with coarse boxes; it is the fallback when the primary fails
//!
//! Backends do no layout reasoning. They report failures as
//! [`Error::Extraction`] and never panic: panics raised inside the parsing
//! libraries are caught and converted.

pub mod fallback;
pub mod primary;

pub use fallback::LopdfBackend;
pub use primary::PdfExtractBackend;

use crate::error::{Error, Result};
use crate::layout::text_run::PageRuns;
use serde::Serialize;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// How far into the input the `%PDF-` signature may appear.
pub const SIGNATURE_WINDOW: usize = 1024;

/// Role of a backend in the fallback policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BackendKind {
    /// Tried first
    Primary,
    /// Tried once when the primary fails or produces degenerate output
    Fallback,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Primary => write!(f, "primary"),
            BackendKind::Fallback => write!(f, "fallback"),
        }
    }
}

/// A PDF text extraction library behind a uniform interface.
///
/// Implementations must be safe to share between worker threads; a single
/// backend instance serves every document of a batch.
pub trait ExtractionBackend: Send + Sync {
    /// Short backend name used in logs and results.
    fn name(&self) -> &str;

    /// Role of the backend.
    fn kind(&self) -> BackendKind;

    /// Extract positioned runs for every page, in page order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Extraction`] when the document cannot be parsed.
    fn extract(&self, bytes: &[u8]) -> Result<Vec<PageRuns>>;
}

/// The primary and fallback backends used by one converter.
#[derive(Clone)]
pub struct BackendSet {
    /// Tried first
    pub primary: Arc<dyn ExtractionBackend>,
    /// Tried once on primary failure
    pub fallback: Arc<dyn ExtractionBackend>,
}

impl BackendSet {
    /// Pair two backends.
    pub fn new(primary: Arc<dyn ExtractionBackend>, fallback: Arc<dyn ExtractionBackend>) -> Self {
        Self { primary, fallback }
    }
}

impl Default for BackendSet {
    fn default() -> Self {
        Self::new(Arc::new(PdfExtractBackend::new()), Arc::new(LopdfBackend::new()))
    }
}

impl fmt::Debug for BackendSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendSet")
            .field("primary", &self.primary.name())
            .field("fallback", &self.fallback.name())
            .finish()
    }
}

/// Check that the input looks like a PDF.
///
/// # Errors
///
/// Returns [`Error::UnsupportedInput`] when `%PDF-` does not appear within
/// the first [`SIGNATURE_WINDOW`] bytes.
///
/// # Examples
///
/// ```
/// use pdf_reflow::extractors::sniff_pdf;
///
/// assert!(sniff_pdf(b"%PDF-1.7\n...").is_ok());
/// assert!(sniff_pdf(b"PK\x03\x04 not a pdf").is_err());
/// ```
pub fn sniff_pdf(bytes: &[u8]) -> Result<()> {
    let window = &bytes[..bytes.len().min(SIGNATURE_WINDOW)];
    if window.windows(5).any(|w| w == b"%PDF-") {
        Ok(())
    } else if bytes.is_empty() {
        Err(Error::UnsupportedInput("empty input".to_string()))
    } else {
        Err(Error::UnsupportedInput("missing %PDF- signature".to_string()))
    }
}

/// Render a caught panic payload as text.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panic: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panic: {}", s)
    } else {
        "panic with non-string payload".to_string()
    }
}
