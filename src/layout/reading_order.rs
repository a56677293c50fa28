//! Reading order reconstruction for column layouts.
//!
//! Runs are assigned to columns by their x-midpoint and grouped into row
//! buckets by vertical position. Rows are emitted top to bottom; within a
//! row, one line per column, left to right. Runs that straddle a column
//! boundary (titles, full-width captions) form full-width rows and act as
//! separators between the rows around them. Column runs on the same row as a
//! straddler are fragments of that full-width line and join its row.
//!
//! The result is a pure function of (runs, layout, config): every sort uses
//! a total order with the original run index as the final tie-break.

use crate::config::{OrderingConfig, ReadingMode};
use crate::geometry::cmp_f32;
use crate::layout::column_detector::ColumnLayout;
use crate::layout::text_run::{PageRuns, PositionedRun};
use serde::Serialize;

/// Column and row assigned to one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ColumnAssignment {
    /// Index of the run in the page's run list
    pub run_index: usize,
    /// Column index, or `None` for runs that straddle a boundary
    pub column: Option<usize>,
    /// Row bucket, increasing down the page
    pub row: usize,
}

/// One line of reconstructed text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageLine {
    /// Line text; runs of the same row and column joined by single spaces
    pub text: String,
    /// Column of the line, `None` for full-width lines
    pub column: Option<usize>,
    /// Row bucket the line belongs to
    pub row: usize,
    /// Top edge of the line's runs
    pub top: f32,
    /// Bottom edge of the line's runs
    pub bottom: f32,
}

impl PageLine {
    /// Vertical centre of the line.
    pub fn mid_y(&self) -> f32 {
        (self.top + self.bottom) / 2.0
    }
}

/// A page's text lines in corrected reading order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReconstructedPage {
    /// 0-based page index
    pub page_index: usize,
    /// Page width in points
    pub width: f32,
    /// Page height in points
    pub height: f32,
    /// Lines in reading order
    pub lines: Vec<PageLine>,
}

impl ReconstructedPage {
    /// The page text, one line per output line.
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(|l| l.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Whether the page produced no lines.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[derive(Debug)]
enum RowKind {
    /// Column runs sharing a row bucket, sorted by (column, x, index)
    Columns(Vec<(usize, usize)>),
    /// One full-width line: straddling runs plus any column runs sharing
    /// their row, sorted by (x, index)
    Spanning(Vec<usize>),
}

#[derive(Debug)]
struct Row {
    anchor_y: f32,
    first_index: usize,
    kind: RowKind,
}

/// Assign a column and row bucket to every run, in input order.
pub fn assign_columns(
    runs: &[PositionedRun],
    layout: &ColumnLayout,
    config: &OrderingConfig,
) -> Vec<ColumnAssignment> {
    let rows = build_rows(runs, layout, config);
    let mut assignments: Vec<ColumnAssignment> = (0..runs.len())
        .map(|i| ColumnAssignment {
            run_index: i,
            column: None,
            row: 0,
        })
        .collect();

    for (row_key, row) in rows.iter().enumerate() {
        match &row.kind {
            RowKind::Columns(members) => {
                for &(column, idx) in members {
                    assignments[idx].column = Some(column);
                    assignments[idx].row = row_key;
                }
            },
            RowKind::Spanning(members) => {
                for &idx in members {
                    assignments[idx].column = None;
                    assignments[idx].row = row_key;
                }
            },
        }
    }

    assignments
}

/// Run indices in reading order.
///
/// Within a row every run of column 0 precedes every run of column 1, and so
/// on; runs of the same column are ordered left to right. With
/// [`ReadingMode::ColumnMajor`], whole column blocks are emitted between
/// full-width separators instead.
pub fn order_runs(
    runs: &[PositionedRun],
    layout: &ColumnLayout,
    config: &OrderingConfig,
) -> Vec<usize> {
    group_lines(runs, layout, config)
        .into_iter()
        .flat_map(|line| line.members)
        .collect()
}

/// Rebuild one page's text lines in reading order.
pub fn reconstruct_page(
    page: &PageRuns,
    layout: &ColumnLayout,
    config: &OrderingConfig,
) -> ReconstructedPage {
    let lines = group_lines(&page.runs, layout, config)
        .into_iter()
        .filter_map(|line| {
            let runs: Vec<&PositionedRun> = line.members.iter().map(|&i| &page.runs[i]).collect();
            let text = runs
                .iter()
                .map(|r| r.text.trim())
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            if text.is_empty() {
                return None;
            }
            let top = runs.iter().map(|r| r.bbox.y0).fold(f32::INFINITY, f32::min);
            let bottom = runs.iter().map(|r| r.bbox.y1).fold(f32::NEG_INFINITY, f32::max);
            Some(PageLine {
                text,
                column: line.column,
                row: line.row,
                top,
                bottom,
            })
        })
        .collect();

    ReconstructedPage {
        page_index: page.page_index,
        width: page.width,
        height: page.height,
        lines,
    }
}

struct LineGroup {
    column: Option<usize>,
    row: usize,
    members: Vec<usize>,
}

fn group_lines(
    runs: &[PositionedRun],
    layout: &ColumnLayout,
    config: &OrderingConfig,
) -> Vec<LineGroup> {
    let rows = build_rows(runs, layout, config);

    match config.mode {
        ReadingMode::RowInterleaved => {
            let mut lines = Vec::new();
            for (row_key, row) in rows.iter().enumerate() {
                push_row_lines(row_key, row, &mut lines);
            }
            lines
        },
        ReadingMode::ColumnMajor => {
            let mut lines = Vec::new();
            let mut segment: Vec<LineGroup> = Vec::new();
            for (row_key, row) in rows.iter().enumerate() {
                match &row.kind {
                    RowKind::Columns(_) => push_row_lines(row_key, row, &mut segment),
                    RowKind::Spanning(_) => {
                        flush_column_major(&mut segment, &mut lines);
                        push_row_lines(row_key, row, &mut lines);
                    },
                }
            }
            flush_column_major(&mut segment, &mut lines);
            lines
        },
    }
}

fn push_row_lines(row_key: usize, row: &Row, out: &mut Vec<LineGroup>) {
    match &row.kind {
        RowKind::Spanning(members) => out.push(LineGroup {
            column: None,
            row: row_key,
            members: members.clone(),
        }),
        RowKind::Columns(members) => {
            for &(column, idx) in members {
                match out.last_mut() {
                    Some(line) if line.row == row_key && line.column == Some(column) => {
                        line.members.push(idx)
                    },
                    _ => out.push(LineGroup {
                        column: Some(column),
                        row: row_key,
                        members: vec![idx],
                    }),
                }
            }
        },
    }
}

/// Emit a separator-free segment column by column. The sort is stable, so
/// rows keep their order within each column.
fn flush_column_major(segment: &mut Vec<LineGroup>, out: &mut Vec<LineGroup>) {
    segment.sort_by_key(|line| line.column);
    out.append(segment);
}

fn build_rows(runs: &[PositionedRun], layout: &ColumnLayout, config: &OrderingConfig) -> Vec<Row> {
    let tolerance = config.row_tolerance.max(0.0);
    let by_position = |&a: &usize, &b: &usize| {
        cmp_f32(runs[a].bbox.mid_y(), runs[b].bbox.mid_y())
            .then(cmp_f32(runs[a].bbox.x0, runs[b].bbox.x0))
            .then(a.cmp(&b))
    };

    let (mut straddlers, mut placed): (Vec<usize>, Vec<usize>) =
        (0..runs.len()).partition(|&i| layout.column_for(&runs[i].bbox).is_none());
    straddlers.sort_by(by_position);
    placed.sort_by(by_position);

    // Bucket around the first run of each row so that jitter cannot chain
    // rows together.
    let mut spanning: Vec<(f32, Vec<usize>)> = Vec::new();
    for idx in straddlers {
        let y = runs[idx].bbox.mid_y();
        match spanning.last_mut() {
            Some((anchor, members)) if y - *anchor <= tolerance => members.push(idx),
            _ => spanning.push((y, vec![idx])),
        }
    }

    let mut column_runs: Vec<(usize, usize)> = Vec::with_capacity(placed.len());
    for idx in placed {
        let y = runs[idx].bbox.mid_y();
        let full_width = spanning
            .iter_mut()
            .filter(|(anchor, _)| (y - *anchor).abs() <= tolerance)
            .min_by(|a, b| cmp_f32((y - a.0).abs(), (y - b.0).abs()));
        match (full_width, layout.column_for(&runs[idx].bbox)) {
            (Some((_, members)), _) => members.push(idx),
            (None, Some(column)) => column_runs.push((column, idx)),
            (None, None) => {},
        }
    }

    let mut rows: Vec<Row> = spanning
        .into_iter()
        .map(|(anchor_y, mut members)| {
            members.sort_by(|&a, &b| cmp_f32(runs[a].bbox.x0, runs[b].bbox.x0).then(a.cmp(&b)));
            Row {
                anchor_y,
                first_index: members.iter().copied().min().unwrap_or(0),
                kind: RowKind::Spanning(members),
            }
        })
        .collect();

    let mut current: Option<(f32, Vec<(usize, usize)>)> = None;
    for (column, idx) in column_runs {
        let y = runs[idx].bbox.mid_y();
        match current.as_mut() {
            Some((anchor, members)) if y - *anchor <= tolerance => members.push((column, idx)),
            _ => {
                if let Some((anchor, members)) = current.take() {
                    rows.push(column_row(anchor, members, runs));
                }
                current = Some((y, vec![(column, idx)]));
            },
        }
    }
    if let Some((anchor, members)) = current {
        rows.push(column_row(anchor, members, runs));
    }

    rows.sort_by(|a, b| cmp_f32(a.anchor_y, b.anchor_y).then(a.first_index.cmp(&b.first_index)));
    rows
}

fn column_row(anchor_y: f32, mut members: Vec<(usize, usize)>, runs: &[PositionedRun]) -> Row {
    members.sort_by(|&(col_a, a), &(col_b, b)| {
        col_a
            .cmp(&col_b)
            .then(cmp_f32(runs[a].bbox.x0, runs[b].bbox.x0))
            .then(a.cmp(&b))
    });
    let first_index = members.iter().map(|&(_, idx)| idx).min().unwrap_or(0);
    Row {
        anchor_y,
        first_index,
        kind: RowKind::Columns(members),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(text: &str, x0: f32, y0: f32, x1: f32) -> PositionedRun {
        PositionedRun::new(text, x0, y0, x1, y0 + 10.0, 0)
    }

    fn page(runs: Vec<PositionedRun>) -> PageRuns {
        PageRuns {
            page_index: 0,
            width: 612.0,
            height: 792.0,
            runs,
        }
    }

    fn texts(page: &ReconstructedPage) -> Vec<&str> {
        page.lines.iter().map(|l| l.text.as_str()).collect()
    }

    #[test]
    fn test_single_column_top_to_bottom() {
        let runs = vec![
            run("third", 72.0, 300.0, 200.0),
            run("first", 72.0, 100.0, 200.0),
            run("second", 72.0, 200.0, 200.0),
        ];
        let out = reconstruct_page(
            &page(runs),
            &ColumnLayout::single(612.0),
            &OrderingConfig::default(),
        );
        assert_eq!(texts(&out), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_words_on_one_row_join_left_to_right() {
        let runs = vec![
            run("world", 130.0, 101.0, 180.0),
            run("hello", 72.0, 100.0, 120.0),
        ];
        let out = reconstruct_page(
            &page(runs),
            &ColumnLayout::single(612.0),
            &OrderingConfig::default(),
        );
        assert_eq!(texts(&out), vec!["hello world"]);
        assert_eq!(out.lines[0].top, 100.0);
        assert_eq!(out.lines[0].bottom, 111.0);
    }

    #[test]
    fn test_two_columns_alternate_by_row() {
        let runs = vec![
            run("L1", 50.0, 100.0, 280.0),
            run("L2", 50.0, 114.0, 280.0),
            run("R1", 320.0, 100.0, 550.0),
            run("R2", 320.0, 114.0, 550.0),
        ];
        let layout = ColumnLayout::from_boundaries(vec![300.0], 612.0);
        let out = reconstruct_page(&page(runs), &layout, &OrderingConfig::default());
        assert_eq!(texts(&out), vec!["L1", "R1", "L2", "R2"]);
        assert_eq!(out.lines[0].column, Some(0));
        assert_eq!(out.lines[1].column, Some(1));
        assert_eq!(out.lines[0].row, out.lines[1].row);
    }

    #[test]
    fn test_baseline_jitter_within_tolerance() {
        let runs = vec![run("R1", 320.0, 101.5, 550.0), run("L1", 50.0, 100.0, 280.0)];
        let layout = ColumnLayout::from_boundaries(vec![300.0], 612.0);
        let out = reconstruct_page(&page(runs), &layout, &OrderingConfig::default());
        assert_eq!(texts(&out), vec!["L1", "R1"]);
    }

    #[test]
    fn test_spanning_run_separates_rows() {
        let runs = vec![
            run("L1", 50.0, 100.0, 280.0),
            run("R1", 320.0, 100.0, 550.0),
            run("Figure 1: spanning caption", 50.0, 120.0, 550.0),
            run("L2", 50.0, 140.0, 280.0),
            run("R2", 320.0, 140.0, 550.0),
        ];
        let layout = ColumnLayout::from_boundaries(vec![300.0], 612.0);
        let config = OrderingConfig::default();
        let out = reconstruct_page(&page(runs.clone()), &layout, &config);
        assert_eq!(
            texts(&out),
            vec!["L1", "R1", "Figure 1: spanning caption", "L2", "R2"]
        );
        assert_eq!(out.lines[2].column, None);

        let assignments = assign_columns(&runs, &layout, &config);
        assert_eq!(assignments[2].column, None);
        assert_eq!(assignments[0].row, assignments[1].row);
        assert!(assignments[2].row > assignments[0].row);
        assert!(assignments[3].row > assignments[2].row);
    }

    #[test]
    fn test_word_title_with_straddling_word_is_one_line() {
        // Title words on one baseline; only "Order" crosses the boundary.
        let mut runs = vec![
            run("A", 60.0, 60.0, 66.0),
            run("Study", 70.0, 60.0, 100.0),
            run("of", 104.0, 60.0, 116.0),
            run("Reading", 120.0, 60.0, 262.0),
            run("Order", 266.0, 60.5, 330.0),
            run("in", 334.0, 60.0, 346.0),
            run("Two", 350.0, 59.5, 368.0),
            run("Columns", 372.0, 60.0, 414.0),
        ];
        for i in 0..3 {
            let y = 100.0 + i as f32 * 14.0;
            runs.push(run(&format!("L{}", i), 50.0, y, 280.0));
            runs.push(run(&format!("R{}", i), 320.0, y, 550.0));
        }
        let layout = ColumnLayout::from_boundaries(vec![300.0], 612.0);
        let config = OrderingConfig::default();
        let out = reconstruct_page(&page(runs.clone()), &layout, &config);

        assert_eq!(
            texts(&out),
            vec!["A Study of Reading Order in Two Columns", "L0", "R0", "L1", "R1", "L2", "R2"]
        );
        assert_eq!(out.lines[0].column, None);

        let assignments = assign_columns(&runs, &layout, &config);
        assert!(assignments[..8].iter().all(|a| a.column.is_none() && a.row == 0));
    }

    #[test]
    fn test_column_major_mode() {
        let runs = vec![
            run("L1", 50.0, 100.0, 280.0),
            run("R1", 320.0, 100.0, 550.0),
            run("L2", 50.0, 114.0, 280.0),
            run("R2", 320.0, 114.0, 550.0),
            run("Spanning", 50.0, 130.0, 550.0),
            run("L3", 50.0, 150.0, 280.0),
            run("R3", 320.0, 150.0, 550.0),
        ];
        let layout = ColumnLayout::from_boundaries(vec![300.0], 612.0);
        let config = OrderingConfig {
            mode: ReadingMode::ColumnMajor,
            ..OrderingConfig::default()
        };
        let out = reconstruct_page(&page(runs), &layout, &config);
        assert_eq!(texts(&out), vec!["L1", "L2", "R1", "R2", "Spanning", "L3", "R3"]);
    }

    #[test]
    fn test_order_runs_covers_every_run_once() {
        let runs = vec![
            run("a", 50.0, 100.0, 280.0),
            run("b", 320.0, 100.0, 550.0),
            run("c", 50.0, 120.0, 550.0),
            run("d", 320.0, 140.0, 550.0),
        ];
        let layout = ColumnLayout::from_boundaries(vec![300.0], 612.0);
        let mut order = order_runs(&runs, &layout, &OrderingConfig::default());
        assert_eq!(order, vec![0, 1, 2, 3]);
        order.sort();
        assert_eq!(order, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_blank_runs_are_skipped() {
        let runs = vec![run("   ", 72.0, 100.0, 100.0), run("text", 72.0, 200.0, 100.0)];
        let out = reconstruct_page(
            &page(runs),
            &ColumnLayout::single(612.0),
            &OrderingConfig::default(),
        );
        assert_eq!(texts(&out), vec!["text"]);
    }

    #[test]
    fn test_empty_page() {
        let out = reconstruct_page(
            &page(vec![]),
            &ColumnLayout::single(612.0),
            &OrderingConfig::default(),
        );
        assert!(out.is_empty());
        assert_eq!(out.text(), "");
    }
}
