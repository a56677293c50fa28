//! Document and batch conversion pipeline.
//!
//! ```text
//! PDF bytes
//!     ↓
//! [ExtractionBackend] (primary, fallback once)
//!     ↓
//! PageRuns[]
//!     ↓  per page, in parallel
//! [merge_words] → [detect_columns] → [reconstruct_page]
//!     ↓
//! ReconstructedPage[]
//!     ↓  whole document
//! [clean_document]
//!     ↓
//! Plain text
//! ```
//!
//! [`BatchOrchestrator`] runs the converter over many files on a bounded
//! worker pool; [`DocumentConverter::preview_bytes`] stops after column
//! detection and reports diagnostics instead of text.

pub mod batch;
pub mod converter;
pub mod preview;
pub mod result;

// Re-export main types
pub use batch::{BatchOrchestrator, BatchReport, BatchSummary, DocumentSummary, discover_pdfs};
pub use converter::{DocumentConverter, assemble_text, default_output_path, degenerate_reason};
pub use preview::{DEFAULT_PREVIEW_PAGES, DocumentPreview, PagePreview};
pub use result::{Attempt, ConversionFailure, ConversionResult, ConversionState, ConvertedDocument};
