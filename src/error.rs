//! Error types for reading-order reconstruction.
//!
//! Only whole-document failures exist. Column detection and reconstruction
//! cannot fail; they degrade to single-column output instead.

use serde::Serialize;
use std::time::Duration;

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while converting a document.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The extraction backend could not parse the input at all
    #[error("{backend} backend could not extract text: {cause}")]
    Extraction {
        /// Name of the backend that failed
        backend: String,
        /// Underlying cause reported by the backend
        cause: String,
    },

    /// Extraction succeeded but produced nothing usable (e.g. scanned pages)
    #[error("Degenerate layout: {0}")]
    DegenerateLayout(String),

    /// The document exceeded its time budget
    #[error("Document exceeded its time budget of {0:?}")]
    Timeout(Duration),

    /// The input is not a document of the expected kind
    #[error("Unsupported input: {0}")]
    UnsupportedInput(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration values out of range or unreadable
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Create an extraction failure for the named backend.
    pub fn extraction(backend: impl Into<String>, cause: impl ToString) -> Self {
        Error::Extraction {
            backend: backend.into(),
            cause: cause.to_string(),
        }
    }

    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Extraction { .. } => ErrorKind::ExtractionFailure,
            Error::DegenerateLayout(_) => ErrorKind::DegenerateLayout,
            Error::Timeout(_) => ErrorKind::Timeout,
            Error::UnsupportedInput(_) => ErrorKind::UnsupportedInput,
            Error::Io(_) => ErrorKind::Io,
            Error::InvalidConfig(_) => ErrorKind::InvalidConfig,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::InvalidConfig(e.to_string())
    }
}

/// Coarse classification of a document failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    /// Backend could not parse the input
    ExtractionFailure,
    /// No usable text runs were extracted
    DegenerateLayout,
    /// Document-level time budget exceeded
    Timeout,
    /// Wrong kind of input (bad signature)
    UnsupportedInput,
    /// Reading input or writing output failed
    Io,
    /// Bad configuration
    InvalidConfig,
}

impl ErrorKind {
    /// Whether the converter may switch to the fallback backend after this kind.
    ///
    /// `UnsupportedInput` fails fast: another backend would not change the outcome.
    pub fn allows_fallback(&self) -> bool {
        matches!(self, ErrorKind::ExtractionFailure | ErrorKind::DegenerateLayout)
    }
}
