//! Layout analysis for column-structured pages.
//!
//! This module provides:
//! - Positioned runs as handed over by the extraction backends
//! - Word-to-line merging
//! - Gap-based column detection over a horizontal density profile
//! - Row-bucketed reading order reconstruction across columns

pub mod column_detector;
pub mod line_builder;
pub mod reading_order;
pub mod text_run;

// Re-export main types
pub use column_detector::{ColumnLayout, Gap, detect_columns, find_gaps};
pub use line_builder::merge_words;
pub use reading_order::{
    ColumnAssignment, PageLine, ReconstructedPage, assign_columns, order_runs, reconstruct_page,
};
pub use text_run::{PageRuns, PositionedRun};
