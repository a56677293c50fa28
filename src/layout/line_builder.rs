//! Word runs to visual line runs.
//!
//! The primary backend reports one run per word. Column detection and
//! ordering work on visual lines instead: words that share a baseline and
//! sit closer than a gutter are merged into one run, so a full-width title
//! arrives as one straddling run rather than a handful of words scattered
//! over both columns.

use crate::config::DetectionConfig;
use crate::geometry::cmp_f32;
use crate::layout::text_run::PositionedRun;

/// Baselines closer than this fraction of the text height belong to one line.
const BASELINE_TOLERANCE_RATIO: f32 = 0.3;

struct LineBuf {
    members: Vec<usize>,
    x1: f32,
    height: f32,
}

/// Merge word runs into line runs.
///
/// Two neighbouring runs on one baseline are merged when the gap between
/// them is at most `word_gap_ratio` times the taller run's height, and
/// narrower than the minimum gutter width (`min_gap_ratio × page_width`).
/// Merged text is joined with single spaces in x order.
///
/// Output runs are ordered by their first member's position in `runs`, so
/// extraction order is kept. Runs with non-finite boxes pass through
/// unchanged.
///
/// # Examples
///
/// ```
/// use pdf_reflow::config::DetectionConfig;
/// use pdf_reflow::layout::{PositionedRun, merge_words};
///
/// let runs = vec![
///     PositionedRun::new("Reading", 60.0, 50.0, 140.0, 70.0, 0),
///     PositionedRun::new("Order", 146.0, 50.0, 200.0, 70.0, 0),
///     PositionedRun::new("left", 50.0, 100.0, 80.0, 110.0, 0),
///     PositionedRun::new("right", 320.0, 100.0, 360.0, 110.0, 0),
/// ];
/// let lines = merge_words(&runs, 612.0, &DetectionConfig::default());
/// let texts: Vec<&str> = lines.iter().map(|r| r.text.as_str()).collect();
/// assert_eq!(texts, vec!["Reading Order", "left", "right"]);
/// ```
pub fn merge_words(runs: &[PositionedRun], page_width: f32, config: &DetectionConfig) -> Vec<PositionedRun> {
    let gutter = if page_width > 0.0 {
        config.min_gap_ratio * page_width
    } else {
        f32::INFINITY
    };

    let (finite, mut passthrough): (Vec<usize>, Vec<usize>) = (0..runs.len()).partition(|&i| {
        let b = &runs[i].bbox;
        b.x0.is_finite() && b.x1.is_finite() && b.y0.is_finite() && b.y1.is_finite()
    });

    let mut order = finite;
    order.sort_by(|&a, &b| {
        cmp_f32(runs[a].bbox.y1, runs[b].bbox.y1)
            .then(cmp_f32(runs[a].bbox.x0, runs[b].bbox.x0))
            .then(a.cmp(&b))
    });

    // Bucket by baseline around the first run of each bucket.
    let mut buckets: Vec<Vec<usize>> = Vec::new();
    let mut anchor: Option<(f32, f32)> = None;
    for idx in order {
        let b = &runs[idx].bbox;
        match (anchor, buckets.last_mut()) {
            (Some((y, h)), Some(bucket)) if b.y1 - y <= BASELINE_TOLERANCE_RATIO * h.max(b.height()) => {
                bucket.push(idx)
            },
            _ => {
                anchor = Some((b.y1, b.height()));
                buckets.push(vec![idx]);
            },
        }
    }

    let mut lines: Vec<Vec<usize>> = Vec::new();
    for mut bucket in buckets {
        bucket.sort_by(|&a, &b| cmp_f32(runs[a].bbox.x0, runs[b].bbox.x0).then(a.cmp(&b)));

        let mut current: Option<LineBuf> = None;
        for idx in bucket {
            let b = &runs[idx].bbox;
            let joins = match &current {
                Some(line) => {
                    let gap = b.x0 - line.x1;
                    gap <= config.word_gap_ratio * line.height.max(b.height()) && gap < gutter
                },
                None => false,
            };

            match current.as_mut() {
                Some(line) if joins => {
                    line.members.push(idx);
                    line.x1 = line.x1.max(b.x1);
                    line.height = line.height.max(b.height());
                },
                _ => {
                    let next = LineBuf {
                        members: vec![idx],
                        x1: b.x1,
                        height: b.height(),
                    };
                    if let Some(done) = current.replace(next) {
                        lines.push(done.members);
                    }
                },
            }
        }
        if let Some(line) = current {
            lines.push(line.members);
        }
    }

    lines.extend(passthrough.drain(..).map(|i| vec![i]));
    lines.sort_by_key(|members| members.iter().copied().min().unwrap_or(0));

    lines.into_iter().map(|members| join_members(runs, &members)).collect()
}

fn join_members(runs: &[PositionedRun], members: &[usize]) -> PositionedRun {
    let first = &runs[members[0]];
    if members.len() == 1 {
        return first.clone();
    }

    let text = members
        .iter()
        .map(|&i| runs[i].text.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    let bbox = members[1..]
        .iter()
        .fold(first.bbox, |acc, &i| acc.union(&runs[i].bbox));

    PositionedRun {
        text,
        bbox,
        page_index: first.page_index,
    }
}
