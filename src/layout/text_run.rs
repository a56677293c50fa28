//! Positioned text runs as produced by the extraction backends.

use crate::geometry::BBox;
use serde::Serialize;

/// A unit of extracted text (a word or a line) with its position on the page.
///
/// Runs are immutable once a backend has produced them and never cross
/// page boundaries.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionedRun {
    /// The text content
    pub text: String,
    /// Bounding box in page coordinates (top-left origin)
    pub bbox: BBox,
    /// 0-based page index
    pub page_index: usize,
}

impl PositionedRun {
    /// Create a run from its corners.
    pub fn new(text: impl Into<String>, x0: f32, y0: f32, x1: f32, y1: f32, page_index: usize) -> Self {
        Self {
            text: text.into(),
            bbox: BBox::new(x0, y0, x1, y1),
            page_index,
        }
    }
}

/// All runs extracted from one page, with the page size.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageRuns {
    /// 0-based page index
    pub page_index: usize,
    /// Page width in points
    pub width: f32,
    /// Page height in points
    pub height: f32,
    /// Runs in backend (document stream) order
    pub runs: Vec<PositionedRun>,
}

impl PageRuns {
    /// Create an empty page.
    pub fn new(page_index: usize, width: f32, height: f32) -> Self {
        Self {
            page_index,
            width,
            height,
            runs: Vec::new(),
        }
    }

    /// Append a run, stamping it with this page's index.
    pub fn push(&mut self, text: impl Into<String>, bbox: BBox) {
        self.runs.push(PositionedRun {
            text: text.into(),
            bbox,
            page_index: self.page_index,
        });
    }

    /// Page area in square points.
    pub fn area(&self) -> f32 {
        (self.width * self.height).max(0.0)
    }

    /// Area covered by runs, clipped to the page.
    ///
    /// Overlapping runs are counted twice; backends do not emit overlapping
    /// runs in practice and the value is only compared against a threshold.
    pub fn covered_area(&self) -> f32 {
        self.runs
            .iter()
            .map(|r| r.bbox.clip_to(self.width, self.height).area())
            .sum()
    }
}
