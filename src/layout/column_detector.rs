//! Gutter detection for multi-column pages.
//!
//! Column boundaries are found from a horizontal density profile of the
//! page: every run adds weight to the bins its x-extent covers, and a wide
//! band of (near-)empty bins between two populated regions is a gutter.
//! Detection never fails; a page without a qualifying gutter is reported as
//! a single column.

use crate::config::DetectionConfig;
use crate::geometry::{cmp_f32, BBox};
use crate::layout::line_builder::merge_words;
use crate::layout::text_run::PositionedRun;
use serde::Serialize;

/// Upper bound on profile bins per page.
const MAX_BINS: usize = 1 << 16;

/// The column structure of one page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnLayout {
    /// Number of columns (1..=max_columns)
    pub column_count: usize,
    /// Ascending x-coordinates separating adjacent columns (`column_count - 1` entries)
    pub boundaries: Vec<f32>,
    /// Width of the page the layout was computed for
    pub page_width: f32,
}

impl ColumnLayout {
    /// A single-column layout.
    pub fn single(page_width: f32) -> Self {
        Self {
            column_count: 1,
            boundaries: Vec::new(),
            page_width,
        }
    }

    /// Build a layout from explicit boundaries (sorted on construction).
    pub fn from_boundaries(mut boundaries: Vec<f32>, page_width: f32) -> Self {
        boundaries.retain(|b| b.is_finite());
        boundaries.sort_by(|a, b| cmp_f32(*a, *b));
        Self {
            column_count: boundaries.len() + 1,
            boundaries,
            page_width,
        }
    }

    /// Whether this page has a single column.
    pub fn is_single_column(&self) -> bool {
        self.boundaries.is_empty()
    }

    /// Column index for a box, or `None` when the box straddles a boundary.
    ///
    /// # Examples
    ///
    /// ```
    /// use pdf_reflow::geometry::BBox;
    /// use pdf_reflow::layout::ColumnLayout;
    ///
    /// let layout = ColumnLayout::from_boundaries(vec![300.0], 612.0);
    /// assert_eq!(layout.column_for(&BBox::new(50.0, 0.0, 280.0, 10.0)), Some(0));
    /// assert_eq!(layout.column_for(&BBox::new(320.0, 0.0, 550.0, 10.0)), Some(1));
    /// assert_eq!(layout.column_for(&BBox::new(50.0, 0.0, 550.0, 10.0)), None);
    /// ```
    pub fn column_for(&self, bbox: &BBox) -> Option<usize> {
        if self.boundaries.iter().any(|&b| bbox.straddles_x(b)) {
            return None;
        }
        let mid = bbox.mid_x();
        Some(self.boundaries.iter().filter(|&&b| mid >= b).count())
    }
}

/// A horizontal band of low text density between two populated regions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gap {
    /// Left edge of the gap
    pub start: f32,
    /// Right edge of the gap
    pub end: f32,
}

impl Gap {
    /// Gap width in points.
    pub fn width(&self) -> f32 {
        self.end - self.start
    }

    /// Centre of the gap, used as the column boundary.
    pub fn midpoint(&self) -> f32 {
        (self.start + self.end) / 2.0
    }
}

/// Detect the column layout of a page.
///
/// Word runs are merged into visual lines first (see
/// [`merge_words`](crate::layout::merge_words)), and run extents are clipped
/// to the page before profiling.
///
/// # Arguments
///
/// * `runs` - All runs on the page
/// * `page_width` - Page width in points
/// * `config` - Detection thresholds
///
/// # Returns
///
/// The detected layout. Pages without a qualifying gutter (including empty
/// pages and pages without a valid width) are single-column.
pub fn detect_columns(
    runs: &[PositionedRun],
    page_width: f32,
    config: &DetectionConfig,
) -> ColumnLayout {
    let valid_width = page_width > 0.0 && page_width.is_finite();
    if runs.is_empty() || !valid_width || config.max_columns <= 1 {
        return ColumnLayout::single(page_width);
    }

    let min_gap = config.min_gap_ratio * page_width;

    let mut gaps: Vec<Gap> = find_gaps(runs, page_width, config)
        .into_iter()
        .filter(|g| g.width() >= min_gap)
        .collect();

    if gaps.is_empty() {
        log::debug!(
            "Column detection: {} runs, no gap >= {:.1}pt, single column",
            runs.len(),
            min_gap
        );
        return ColumnLayout::single(page_width);
    }

    // Widest gaps win; ties go to the leftmost.
    gaps.sort_by(|a, b| cmp_f32(b.width(), a.width()).then(cmp_f32(a.start, b.start)));
    gaps.truncate(config.max_columns - 1);

    let layout =
        ColumnLayout::from_boundaries(gaps.iter().map(Gap::midpoint).collect(), page_width);

    log::debug!(
        "Column detection: {} runs, {} columns, boundaries={:?}",
        runs.len(),
        layout.column_count,
        layout.boundaries
    );

    layout
}

/// Find every interior low-density band across `[0, extent]`, regardless of
/// width.
pub fn find_gaps(runs: &[PositionedRun], extent: f32, config: &DetectionConfig) -> Vec<Gap> {
    let bin = effective_bin_width(extent, config);
    let lines = merge_words(runs, extent, config);
    let profile = horizontal_density(&lines, extent, bin, config);
    if profile.is_empty() {
        return Vec::new();
    }

    let peak = profile.iter().copied().max().unwrap_or(0);
    if peak == 0 {
        return Vec::new();
    }
    let floor = config.noise_ratio * peak as f32;
    let is_low = |count: u32| count as f32 <= floor;

    // Only bands with populated bins on both sides are gutters; page margins are not.
    let first = match profile.iter().position(|&c| !is_low(c)) {
        Some(i) => i,
        None => return Vec::new(),
    };
    let last = profile.iter().rposition(|&c| !is_low(c)).unwrap_or(first);

    let mut gaps = Vec::new();
    let mut gap_start: Option<usize> = None;

    for (i, &count) in profile.iter().enumerate().take(last + 1).skip(first) {
        match (is_low(count), gap_start) {
            (true, None) => gap_start = Some(i),
            (false, Some(start)) => {
                gaps.push(Gap {
                    start: start as f32 * bin,
                    end: i as f32 * bin,
                });
                gap_start = None;
            },
            _ => {},
        }
    }

    gaps
}

/// Configured bin width, widened when the page would need more than
/// [`MAX_BINS`] bins.
fn effective_bin_width(extent: f32, config: &DetectionConfig) -> f32 {
    if extent <= 0.0 || !extent.is_finite() {
        return config.bin_width;
    }
    config.bin_width.max(extent / MAX_BINS as f32)
}

/// Count, for each bin across the page, how many runs cover it.
///
/// Extents are clipped to `[0, extent]`; runs entirely off the page do not
/// vote. Runs much wider than the text body (titles, full-width captions)
/// are left out so that they cannot bridge a gutter.
fn horizontal_density(
    runs: &[PositionedRun],
    extent: f32,
    bin: f32,
    config: &DetectionConfig,
) -> Vec<u32> {
    if bin <= 0.0 || !bin.is_finite() || extent <= 0.0 || !extent.is_finite() {
        return Vec::new();
    }

    let spans: Vec<(f32, f32)> = runs
        .iter()
        .map(|r| &r.bbox)
        .filter(|b| b.x0.is_finite() && b.x1.is_finite())
        .filter(|b| b.x1 >= 0.0 && b.x0 <= extent)
        .map(|b| (b.x0.clamp(0.0, extent), b.x1.clamp(0.0, extent)))
        .collect();
    if spans.is_empty() {
        return Vec::new();
    }

    let bins = ((extent / bin).ceil() as usize).clamp(1, MAX_BINS);
    let mut profile = vec![0u32; bins];

    let content_left = spans.iter().map(|s| s.0).fold(f32::INFINITY, f32::min);
    let content_right = spans.iter().map(|s| s.1).fold(f32::NEG_INFINITY, f32::max);
    let content_width = (content_right - content_left).max(0.0);
    let max_voter_width = config.spanning_width_ratio * content_width;

    for (x0, x1) in spans {
        if content_width > 0.0 && x1 - x0 > max_voter_width {
            continue;
        }

        let start = ((x0 / bin).floor() as usize).min(bins - 1);
        let end = ((x1 / bin).ceil() as usize).saturating_sub(1).clamp(start, bins - 1);

        for count in &mut profile[start..=end] {
            *count += 1;
        }
    }

    profile
}
