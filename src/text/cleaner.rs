//! Removal of headers, footers, page numbers and noise lines.

use crate::config::CleaningConfig;
use crate::layout::reading_order::ReconstructedPage;
use crate::text::margins::{MarginTable, in_margin_band};
use crate::text::whitespace::{collapse_whitespace, is_page_number, is_separator};

/// Why a line was removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Blank after whitespace collapsing
    Empty,
    /// Header or footer repeated across pages
    RepeatedMargin,
    /// Standalone page number
    PageNumber,
    /// Rule drawn with dashes or equals signs
    Separator,
    /// Shorter than the minimum line length
    TooShort,
}

/// Decide whether a collapsed line should be dropped.
///
/// `in_margin` says whether the line sits in a margin band of its page;
/// only margin lines can be dropped as repeated headers or footers.
pub fn drop_reason(
    line: &str,
    in_margin: bool,
    table: &MarginTable,
    config: &CleaningConfig,
) -> Option<DropReason> {
    if line.is_empty() {
        return Some(DropReason::Empty);
    }
    if in_margin && table.is_repeated(line) {
        return Some(DropReason::RepeatedMargin);
    }
    if config.strip_page_numbers && is_page_number(line) {
        return Some(DropReason::PageNumber);
    }
    if is_separator(line) {
        return Some(DropReason::Separator);
    }
    if line.chars().count() < config.min_line_chars {
        return Some(DropReason::TooShort);
    }
    None
}

/// Clean every page against a prebuilt margin table.
///
/// Line text is collapsed and trimmed; dropped lines are removed. Page order
/// and the order of surviving lines are unchanged.
pub fn clean_pages(
    pages: Vec<ReconstructedPage>,
    table: &MarginTable,
    config: &CleaningConfig,
) -> Vec<ReconstructedPage> {
    let mut dropped = 0usize;

    let cleaned = pages
        .into_iter()
        .map(|mut page| {
            let height = page.height;
            let before = page.lines.len();
            page.lines = page
                .lines
                .into_iter()
                .filter_map(|mut line| {
                    let in_margin = in_margin_band(&line, height, config.margin_band_ratio);
                    line.text = collapse_whitespace(&line.text);
                    match drop_reason(&line.text, in_margin, table, config) {
                        Some(_) => None,
                        None => Some(line),
                    }
                })
                .collect();
            dropped += before - page.lines.len();
            page
        })
        .collect();

    log::debug!("Cleaner dropped {} lines", dropped);
    cleaned
}

/// Build the margin table and clean all pages of one document.
///
/// # Examples
///
/// ```
/// use pdf_reflow::config::CleaningConfig;
/// use pdf_reflow::layout::{PageLine, ReconstructedPage};
/// use pdf_reflow::text::clean_document;
///
/// let page = |i: usize| ReconstructedPage {
///     page_index: i,
///     width: 612.0,
///     height: 792.0,
///     lines: vec![
///         PageLine { text: "Confidential Draft".into(), column: None, row: 0, top: 20.0, bottom: 30.0 },
///         PageLine { text: format!("Body text of page {}", i), column: Some(0), row: 1, top: 300.0, bottom: 310.0 },
///         PageLine { text: format!("{}", i + 1), column: None, row: 2, top: 760.0, bottom: 770.0 },
///     ],
/// };
/// let pages = clean_document((0..4).map(page).collect(), &CleaningConfig::default());
/// assert_eq!(pages[2].text(), "Body text of page 2");
/// ```
pub fn clean_document(pages: Vec<ReconstructedPage>, config: &CleaningConfig) -> Vec<ReconstructedPage> {
    let table = MarginTable::build(&pages, config);
    clean_pages(pages, &table, config)
}
