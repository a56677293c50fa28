//! Layout diagnostics without full conversion.
//!
//! A preview runs extraction and column detection on the first few pages
//! and reports what the converter would see: the column count, where the
//! boundaries fall and a couple of sample lines per column. Reading order is
//! not rebuilt; samples are the first merged lines of each column in
//! extraction order.

use super::converter::DocumentConverter;
use crate::config::BackendPolicy;
use crate::error::Result;
use crate::extractors::{ExtractionBackend, sniff_pdf};
use crate::layout::column_detector::detect_columns;
use crate::layout::line_builder::merge_words;
use crate::layout::text_run::PageRuns;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Pages analysed when no limit is given.
pub const DEFAULT_PREVIEW_PAGES: usize = 3;

/// Sample lines kept per column.
pub const SAMPLES_PER_COLUMN: usize = 2;

/// Longest sample kept, in characters.
const SAMPLE_CHARS: usize = 80;

/// Layout diagnostics for one page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PagePreview {
    /// 0-based page index
    pub page_index: usize,
    /// Page width in points
    pub width: f32,
    /// Page height in points
    pub height: f32,
    /// Detected column count
    pub column_count: usize,
    /// Column boundaries (x positions)
    pub boundaries: Vec<f32>,
    /// Runs extracted from the page
    pub run_count: usize,
    /// Runs assigned to each column
    pub runs_per_column: Vec<usize>,
    /// Runs straddling a boundary
    pub straddling: usize,
    /// First lines of each column
    pub samples: Vec<Vec<String>>,
}

impl PagePreview {
    /// Analyse one page.
    pub fn analyse(page: &PageRuns, converter: &DocumentConverter) -> Self {
        let config = converter.config();
        let layout = detect_columns(&page.runs, page.width, &config.detection);

        let mut runs_per_column = vec![0usize; layout.column_count];
        let mut straddling = 0;
        for run in &page.runs {
            match layout.column_for(&run.bbox) {
                Some(c) if c < runs_per_column.len() => runs_per_column[c] += 1,
                _ => straddling += 1,
            }
        }

        let mut samples = vec![Vec::new(); layout.column_count];
        for line in merge_words(&page.runs, page.width, &config.detection) {
            let text = line.text.trim();
            if text.is_empty() {
                continue;
            }
            if let Some(column_samples) = layout.column_for(&line.bbox).and_then(|c| samples.get_mut(c)) {
                if column_samples.len() < SAMPLES_PER_COLUMN {
                    column_samples.push(truncate(text));
                }
            }
        }

        Self {
            page_index: page.page_index,
            width: page.width,
            height: page.height,
            column_count: layout.column_count,
            boundaries: layout.boundaries,
            run_count: page.runs.len(),
            runs_per_column,
            straddling,
            samples,
        }
    }

    /// Short description of the layout.
    pub fn layout_kind(&self) -> &'static str {
        match (self.run_count, self.column_count) {
            (0, _) => "no text",
            (_, 1) => "single column",
            (_, 2) => "two columns",
            _ => "multi-column",
        }
    }
}

/// Layout diagnostics for the first pages of a document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentPreview {
    /// Input path (or label)
    pub source: PathBuf,
    /// Backend that produced the runs
    pub backend: String,
    /// Pages in the document
    pub page_count: usize,
    /// Analysed pages
    pub pages: Vec<PagePreview>,
}

impl fmt::Display for DocumentPreview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({} pages, backend {})", self.source.display(), self.page_count, self.backend)?;
        for page in &self.pages {
            writeln!(f)?;
            writeln!(
                f,
                "Page {}: {} ({} runs, {} straddling)",
                page.page_index + 1,
                page.layout_kind(),
                page.run_count,
                page.straddling
            )?;
            if !page.boundaries.is_empty() {
                let boundaries: Vec<String> = page.boundaries.iter().map(|b| format!("{:.1}", b)).collect();
                writeln!(f, "  boundaries: {}", boundaries.join(", "))?;
            }
            for (column, samples) in page.samples.iter().enumerate() {
                writeln!(f, "  column {}: {} runs", column + 1, page.runs_per_column[column])?;
                for (i, sample) in samples.iter().enumerate() {
                    writeln!(f, "    {}: {}", i + 1, sample)?;
                }
            }
        }
        Ok(())
    }
}

impl DocumentConverter {
    /// Extract and analyse up to `max_pages` pages of a PDF held in memory.
    ///
    /// Follows the converter's backend policy; the fallback is used when the
    /// primary backend cannot parse the document.
    ///
    /// # Errors
    ///
    /// Returns the fallback's error when no backend can extract the document,
    /// or [`Error::UnsupportedInput`](crate::error::Error::UnsupportedInput)
    /// for non-PDF input.
    pub fn preview_bytes(
        &self,
        source: impl AsRef<Path>,
        bytes: &[u8],
        max_pages: Option<usize>,
    ) -> Result<DocumentPreview> {
        sniff_pdf(bytes)?;

        let (backend, pages) = self.extract_for_preview(bytes)?;
        let limit = max_pages.unwrap_or(DEFAULT_PREVIEW_PAGES);

        Ok(DocumentPreview {
            source: source.as_ref().to_path_buf(),
            backend: backend.to_string(),
            page_count: pages.len(),
            pages: pages
                .iter()
                .take(limit)
                .map(|page| PagePreview::analyse(page, self))
                .collect(),
        })
    }

    /// Read a PDF file and preview it.
    pub fn preview_file(&self, path: impl AsRef<Path>, max_pages: Option<usize>) -> Result<DocumentPreview> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        self.preview_bytes(path, &bytes, max_pages)
    }

    fn extract_for_preview(&self, bytes: &[u8]) -> Result<(&str, Vec<PageRuns>)> {
        let backends = self.backends();
        let primary: &dyn ExtractionBackend = backends.primary.as_ref();
        let fallback: &dyn ExtractionBackend = backends.fallback.as_ref();

        if self.config().conversion.backend_policy == BackendPolicy::PrimaryFirst {
            match primary.extract(bytes) {
                Ok(pages) => return Ok((primary.name(), pages)),
                Err(e) if !e.kind().allows_fallback() => return Err(e),
                Err(e) => log::warn!("{} failed ({}), previewing with {}", primary.name(), e, fallback.name()),
            }
        }

        Ok((fallback.name(), fallback.extract(bytes)?))
    }
}

fn truncate(text: &str) -> String {
    if text.chars().count() > SAMPLE_CHARS {
        let head: String = text.chars().take(SAMPLE_CHARS).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReflowConfig;
    use crate::geometry::BBox;

    fn two_column_page(index: usize) -> PageRuns {
        let mut page = PageRuns::new(index, 612.0, 792.0);
        page.push("A Title Spanning Both Columns", BBox::new(50.0, 60.0, 550.0, 80.0));
        for row in 0..6 {
            let y = 100.0 + row as f32 * 14.0;
            page.push(format!("left {}", row), BBox::new(50.0, y, 280.0, y + 10.0));
            page.push(format!("right {}", row), BBox::new(320.0, y, 550.0, y + 10.0));
        }
        page
    }

    #[test]
    fn test_analyse_two_columns() {
        let converter = DocumentConverter::new(ReflowConfig::default());
        let preview = PagePreview::analyse(&two_column_page(0), &converter);

        assert_eq!(preview.column_count, 2);
        assert_eq!(preview.run_count, 13);
        assert_eq!(preview.runs_per_column, vec![6, 6]);
        assert_eq!(preview.straddling, 1);
        assert_eq!(preview.samples[0], vec!["left 0", "left 1"]);
        assert_eq!(preview.samples[1], vec!["right 0", "right 1"]);
        assert_eq!(preview.layout_kind(), "two columns");
    }

    #[test]
    fn test_samples_follow_extraction_order() {
        let mut page = PageRuns::new(0, 612.0, 792.0);
        for row in 0..4 {
            let y = 100.0 + row as f32 * 14.0;
            page.push("right", BBox::new(320.0, y, 400.0, y + 10.0));
            page.push(format!("line {}", row), BBox::new(404.0, y, 550.0, y + 10.0));
        }
        for row in 0..4 {
            let y = 100.0 + row as f32 * 14.0;
            page.push("left", BBox::new(50.0, y, 120.0, y + 10.0));
            page.push(format!("line {}", row), BBox::new(124.0, y, 280.0, y + 10.0));
        }

        let converter = DocumentConverter::new(ReflowConfig::default());
        let preview = PagePreview::analyse(&page, &converter);

        assert_eq!(preview.column_count, 2);
        assert_eq!(preview.runs_per_column, vec![8, 8]);
        assert_eq!(preview.straddling, 0);
        assert_eq!(preview.samples[0], vec!["left line 0", "left line 1"]);
        assert_eq!(preview.samples[1], vec!["right line 0", "right line 1"]);
    }

    #[test]
    fn test_analyse_empty_page() {
        let converter = DocumentConverter::new(ReflowConfig::default());
        let preview = PagePreview::analyse(&PageRuns::new(3, 612.0, 792.0), &converter);
        assert_eq!(preview.column_count, 1);
        assert_eq!(preview.run_count, 0);
        assert_eq!(preview.layout_kind(), "no text");
    }

    #[test]
    fn test_display() {
        let converter = DocumentConverter::new(ReflowConfig::default());
        let preview = DocumentPreview {
            source: PathBuf::from("paper.pdf"),
            backend: "pdf-extract".into(),
            page_count: 1,
            pages: vec![PagePreview::analyse(&two_column_page(0), &converter)],
        };
        let text = preview.to_string();
        assert!(text.contains("Page 1: two columns"));
        assert!(text.contains("boundaries: 300.0"));
        assert!(text.contains("column 2: 6 runs"));
        assert!(text.contains("1: right 0"));
    }

    #[test]
    fn test_truncate() {
        let long = "x".repeat(100);
        assert_eq!(truncate(&long).chars().count(), 83);
        assert_eq!(truncate("short"), "short");
    }

    #[test]
    fn test_preview_rejects_non_pdf() {
        let converter = DocumentConverter::new(ReflowConfig::default());
        assert!(converter.preview_bytes("x.txt", b"plain text", None).is_err());
    }
}
