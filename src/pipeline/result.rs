//! Conversion outcomes.

use crate::error::{Error, ErrorKind};
use crate::layout::reading_order::ReconstructedPage;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Stage of a document conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConversionState {
    /// Not started
    Pending,
    /// Running the primary backend
    ExtractingPrimary,
    /// Running the fallback backend
    ExtractingFallback,
    /// Detecting columns and ordering runs, page by page
    ReconstructingOrder,
    /// Removing headers, footers and noise
    Cleaning,
    /// Text assembled
    Done,
    /// Gave up
    Failed,
}

/// One failed backend attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attempt {
    /// Backend that was tried
    pub backend: String,
    /// Why it was rejected
    pub kind: ErrorKind,
    /// Human-readable detail
    pub message: String,
}

impl Attempt {
    /// Record an error raised by `backend`.
    pub fn from_error(backend: impl Into<String>, error: &Error) -> Self {
        Self {
            backend: backend.into(),
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// A successfully converted document.
#[derive(Debug, Clone, Serialize)]
pub struct ConvertedDocument {
    /// Input path (or label for in-memory input)
    pub source: PathBuf,
    /// Backend whose runs produced the text
    pub backend: String,
    /// Cleaned pages in reading order
    pub pages: Vec<ReconstructedPage>,
    /// Assembled plain text
    pub text: String,
    /// Attempts that failed before the one that succeeded
    pub attempts: Vec<Attempt>,
}

impl ConvertedDocument {
    /// Whether the fallback backend had to be used.
    pub fn used_fallback(&self) -> bool {
        !self.attempts.is_empty()
    }
}

/// A document that could not be converted.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionFailure {
    /// Input path (or label for in-memory input)
    pub source: PathBuf,
    /// Classification of the final error
    pub kind: ErrorKind,
    /// Backend in use when the conversion gave up, if any
    pub backend: Option<String>,
    /// Every failed attempt, in order
    pub chain: Vec<Attempt>,
    /// Final error message
    pub message: String,
}

impl ConversionFailure {
    /// Build a failure from its final error.
    pub fn new(
        source: impl Into<PathBuf>,
        backend: Option<&str>,
        error: &Error,
        chain: Vec<Attempt>,
    ) -> Self {
        Self {
            source: source.into(),
            kind: error.kind(),
            backend: backend.map(str::to_string),
            chain,
            message: error.to_string(),
        }
    }
}

impl fmt::Display for ConversionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:?}: {}", self.source.display(), self.kind, self.message)?;
        if let Some(backend) = &self.backend {
            write!(f, " (backend {})", backend)?;
        }
        Ok(())
    }
}

/// Final outcome of one document.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ConversionResult {
    /// Converted
    Done(ConvertedDocument),
    /// Gave up
    Failed(ConversionFailure),
}

impl ConversionResult {
    /// Whether the document converted.
    pub fn is_done(&self) -> bool {
        matches!(self, ConversionResult::Done(_))
    }

    /// Whether the document failed.
    pub fn is_failed(&self) -> bool {
        matches!(self, ConversionResult::Failed(_))
    }

    /// Input path.
    pub fn source(&self) -> &Path {
        match self {
            ConversionResult::Done(doc) => &doc.source,
            ConversionResult::Failed(failure) => &failure.source,
        }
    }

    /// Assembled text of a converted document.
    pub fn text(&self) -> Option<&str> {
        match self {
            ConversionResult::Done(doc) => Some(&doc.text),
            ConversionResult::Failed(_) => None,
        }
    }

    /// Backend that produced the text, or that was in use when it failed.
    pub fn backend(&self) -> Option<&str> {
        match self {
            ConversionResult::Done(doc) => Some(&doc.backend),
            ConversionResult::Failed(failure) => failure.backend.as_deref(),
        }
    }

    /// The converted document, if any.
    pub fn document(&self) -> Option<&ConvertedDocument> {
        match self {
            ConversionResult::Done(doc) => Some(doc),
            ConversionResult::Failed(_) => None,
        }
    }

    /// The failure, if any.
    pub fn failure(&self) -> Option<&ConversionFailure> {
        match self {
            ConversionResult::Done(_) => None,
            ConversionResult::Failed(failure) => Some(failure),
        }
    }
}

impl From<ConversionFailure> for ConversionResult {
    fn from(failure: ConversionFailure) -> Self {
        ConversionResult::Failed(failure)
    }
}
