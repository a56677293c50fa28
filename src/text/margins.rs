//! Repeated header and footer detection across a document.

use crate::config::CleaningConfig;
use crate::layout::reading_order::{PageLine, ReconstructedPage};
use crate::text::whitespace::margin_key;
use std::collections::{HashMap, HashSet};

/// Document-wide counts of lines seen in the top and bottom margin bands.
///
/// A table belongs to one conversion; it is built once all pages are
/// reconstructed and dropped with the document.
#[derive(Debug, Clone, Default)]
pub struct MarginTable {
    counts: HashMap<String, usize>,
    page_count: usize,
    threshold: usize,
}

impl MarginTable {
    /// Count margin lines over all pages.
    ///
    /// Each key is counted at most once per page, so a footer repeated
    /// twice on one page still counts as one occurrence.
    pub fn build(pages: &[ReconstructedPage], config: &CleaningConfig) -> Self {
        let mut counts: HashMap<String, usize> = HashMap::new();

        for page in pages {
            let keys: HashSet<String> = page
                .lines
                .iter()
                .filter(|line| in_margin_band(line, page.height, config.margin_band_ratio))
                .map(|line| margin_key(&line.text))
                .filter(|key| !key.is_empty())
                .collect();
            for key in keys {
                *counts.entry(key).or_insert(0) += 1;
            }
        }

        let page_count = pages.len();
        let by_ratio = (config.repetition_threshold * page_count as f32).ceil() as usize;
        let threshold = config.min_repeat_pages.max(by_ratio).max(1);

        log::debug!(
            "Margin table: {} distinct margin lines over {} pages (repeat threshold {})",
            counts.len(),
            page_count,
            threshold
        );

        Self {
            counts,
            page_count,
            threshold,
        }
    }

    /// Number of pages the table was built from.
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    /// Minimum number of pages a margin line must appear on to be repeated.
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Number of pages on which the line appeared in a margin band.
    pub fn occurrences(&self, line: &str) -> usize {
        self.counts.get(&margin_key(line)).copied().unwrap_or(0)
    }

    /// Whether the line is a repeated header or footer.
    pub fn is_repeated(&self, line: &str) -> bool {
        let count = self.occurrences(line);
        count > 0 && count >= self.threshold
    }

    /// Keys of all repeated lines, sorted.
    pub fn repeated_keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self
            .counts
            .iter()
            .filter(|(_, count)| **count >= self.threshold)
            .map(|(key, _)| key.as_str())
            .collect();
        keys.sort_unstable();
        keys
    }
}

/// Whether a line's vertical centre lies in the top or bottom margin band.
pub fn in_margin_band(line: &PageLine, page_height: f32, band_ratio: f32) -> bool {
    if !(page_height > 0.0) {
        return false;
    }
    let band = page_height * band_ratio;
    let mid = line.mid_y();
    mid <= band || mid >= page_height - band
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(text: &str, top: f32) -> PageLine {
        PageLine {
            text: text.to_string(),
            column: Some(0),
            row: 0,
            top,
            bottom: top + 10.0,
        }
    }

    fn page(index: usize, lines: Vec<PageLine>) -> ReconstructedPage {
        ReconstructedPage {
            page_index: index,
            width: 612.0,
            height: 800.0,
            lines,
        }
    }

    #[test]
    fn test_margin_band() {
        assert!(in_margin_band(&line("header", 20.0), 800.0, 0.1));
        assert!(in_margin_band(&line("footer", 770.0), 800.0, 0.1));
        assert!(!in_margin_band(&line("body", 400.0), 800.0, 0.1));
        assert!(!in_margin_band(&line("body", 400.0), 0.0, 0.1));
    }

    #[test]
    fn test_counts_once_per_page() {
        let pages: Vec<_> = (0..4)
            .map(|i| page(i, vec![line("Running Head", 20.0), line("Running Head", 30.0)]))
            .collect();
        let table = MarginTable::build(&pages, &CleaningConfig::default());
        assert_eq!(table.occurrences("Running Head"), 4);
        assert_eq!(table.page_count(), 4);
    }

    #[test]
    fn test_body_lines_not_counted() {
        let pages: Vec<_> = (0..4).map(|i| page(i, vec![line("Repeated body", 400.0)])).collect();
        let table = MarginTable::build(&pages, &CleaningConfig::default());
        assert_eq!(table.occurrences("Repeated body"), 0);
        assert!(!table.is_repeated("Repeated body"));
    }

    #[test]
    fn test_threshold() {
        let config = CleaningConfig::default();
        let pages: Vec<_> = (0..5).map(|i| page(i, vec![])).collect();
        assert_eq!(MarginTable::build(&pages, &config).threshold(), 3);

        // A single page never has repeated lines under the default minimum
        let single = MarginTable::build(&pages[..1], &config);
        assert_eq!(single.threshold(), 2);
    }

    #[test]
    fn test_page_numbers_fold_together() {
        let pages: Vec<_> = (0..3)
            .map(|i| page(i, vec![line(&format!("Proceedings, p. {}", i + 10), 780.0)]))
            .collect();
        let table = MarginTable::build(&pages, &CleaningConfig::default());
        assert!(table.is_repeated("Proceedings, p. 99"));
        assert_eq!(table.repeated_keys(), vec!["Proceedings, p. #"]);
    }
}
