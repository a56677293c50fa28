//! Document-level text cleaning.
//!
//! Runs after every page of a document has been reconstructed:
//! - Build a [`MarginTable`] of lines seen in the top and bottom margin bands
//! - Drop lines repeated on enough pages (running headers and footers)
//! - Drop standalone page numbers, separator rules and very short lines

pub mod cleaner;
pub mod margins;
pub mod whitespace;

pub use cleaner::{DropReason, clean_document, clean_pages, drop_reason};
pub use margins::{MarginTable, in_margin_band};
