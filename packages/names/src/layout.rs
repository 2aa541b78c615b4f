//! Reading-order reconstruction for a page's text layer.
//!
//! Runs are ordered top to bottom (descending `y`) and, within a visual
//! line, left to right. Two runs share a line when their baselines differ
//! by less than a fixed tolerance in PDF units.
//!
//! Grouping is done by an explicit sweep over the runs sorted by baseline
//! rather than by a pairwise "same line" comparator inside the sort, so
//! the comparator stays a total order. This is an approximation of
//! comparator-based ordering, not a reproduction of it. The two agree when
//! lines are further apart than the tolerance. When baselines drift within
//! a few points they can differ: with a tolerance of 5, runs
//! A (y 800, x 50), B (y 797, x 100) and C (y 794, x 10) come out as
//! A, B, C here (C starts a new line), while a pairwise comparator puts
//! C between A and B because C and B "share a line".

use paysplit_document_models::{NormalizedLine, PositionedTextRun};
use serde::{Deserialize, Serialize};

/// Default same-line tolerance, in PDF units.
pub const DEFAULT_LINE_TOLERANCE: f64 = 5.0;

/// How a run decides whether it continues the current line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineGrouping {
    /// Compare against the first (highest) run of the current line. A line
    /// never spans more than the tolerance.
    #[default]
    Anchored,
    /// Compare against the previous run. Chains of near-equal baselines
    /// collapse into one line even when their ends differ by more than the
    /// tolerance (transitive clustering).
    Chained,
}

/// Groups runs into lines, top line first, each line sorted by `x`.
#[must_use]
pub fn group_lines(
    runs: &[PositionedTextRun],
    tolerance: f64,
    grouping: LineGrouping,
) -> Vec<NormalizedLine> {
    let mut sorted = runs.to_vec();
    sorted.sort_by(|a, b| b.y.total_cmp(&a.y).then_with(|| a.x.total_cmp(&b.x)));

    let mut lines: Vec<NormalizedLine> = Vec::new();
    let mut reference_y = f64::NAN;

    for run in sorted {
        let y = run.y;
        match lines.last_mut() {
            Some(line) if (reference_y - y).abs() < tolerance => line.runs.push(run),
            _ => {
                reference_y = y;
                lines.push(NormalizedLine { runs: vec![run] });
            }
        }
        if grouping == LineGrouping::Chained {
            reference_y = y;
        }
    }

    for line in &mut lines {
        line.runs.sort_by(|a, b| a.x.total_cmp(&b.x));
    }

    lines
}

/// Flattens [`group_lines`] into a single reading-ordered sequence.
#[must_use]
pub fn reading_order(
    runs: &[PositionedTextRun],
    tolerance: f64,
    grouping: LineGrouping,
) -> Vec<PositionedTextRun> {
    group_lines(runs, tolerance, grouping)
        .into_iter()
        .flat_map(|line| line.runs)
        .collect()
}

/// Joins run texts with single spaces, in the given order.
#[must_use]
pub fn joined_text(runs: &[PositionedTextRun]) -> String {
    runs.iter()
        .map(|r| r.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}
