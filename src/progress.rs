//! Progress computation over a record snapshot
//!
//! Pure functions from goals + check-ins to per-goal progress summaries.
//! No storage access and no rendering; the site builder consumes the output.
//!
//! Aggregation policy is fixed per measurement kind:
//! - Binary: cumulative done state; the first check-in with value 1 marks
//!   the goal done and the series stays at 1 afterwards.
//! - Numeric: delta-sum; each check-in value is added to a running total.
//! - Percent: latest absolute value; the series is the raw values over time.

use chrono::NaiveDate;
use serde::Serialize;

use crate::data::{CheckIn, Goal, MeasureKind, RecordState};

/// Progress summary for one goal, ready for rendering
#[derive(Debug, Clone, Serialize)]
pub struct GoalProgress {
    pub slug: String,
    pub title: String,
    pub description: String,
    pub kind: MeasureKind,
    pub unit: Option<String>,
    pub archived: bool,
    /// Latest aggregate value (running total, latest percent, or 0/1)
    pub current: Option<f64>,
    pub target: Option<f64>,
    /// Completion in [0, 100] when meaningful
    pub percent: Option<f64>,
    /// Time-ordered aggregate series for charting
    pub series: Vec<(NaiveDate, f64)>,
    /// Number of check-ins behind this summary
    pub check_in_count: usize,
}

impl GoalProgress {
    pub fn is_done(&self) -> bool {
        matches!(self.percent, Some(p) if p >= 100.0)
    }
}

/// Compute progress for every goal in the snapshot, preserving the
/// snapshot's (creation) order.
pub fn compute_all(state: &RecordState) -> Vec<GoalProgress> {
    state
        .goals
        .iter()
        .map(|goal| {
            let check_ins = state.check_ins_for(goal.id);
            compute_goal(goal, &check_ins)
        })
        .collect()
}

/// Compute progress for a single goal from its time-ordered check-ins.
pub fn compute_goal(goal: &Goal, check_ins: &[&CheckIn]) -> GoalProgress {
    let (series, current, percent) = match goal.kind {
        MeasureKind::Binary => binary_series(check_ins),
        MeasureKind::Numeric => numeric_series(check_ins, goal.target),
        MeasureKind::Percent => percent_series(check_ins),
    };

    GoalProgress {
        slug: goal.slug.clone(),
        title: goal.title.clone(),
        description: goal.description.clone(),
        kind: goal.kind,
        unit: goal.unit.clone(),
        archived: goal.is_archived(),
        current,
        target: goal.target,
        percent,
        series,
        check_in_count: check_ins.len(),
    }
}

type SeriesResult = (Vec<(NaiveDate, f64)>, Option<f64>, Option<f64>);

fn binary_series(check_ins: &[&CheckIn]) -> SeriesResult {
    let mut done = false;
    let mut series = Vec::with_capacity(check_ins.len());
    for c in check_ins {
        if c.value == 1.0 {
            done = true;
        }
        series.push((c.date, if done { 1.0 } else { 0.0 }));
    }

    if series.is_empty() {
        (series, None, Some(0.0))
    } else {
        let current = if done { 1.0 } else { 0.0 };
        (series, Some(current), Some(current * 100.0))
    }
}

fn numeric_series(check_ins: &[&CheckIn], target: Option<f64>) -> SeriesResult {
    let mut total = 0.0;
    let mut series = Vec::with_capacity(check_ins.len());
    for c in check_ins {
        total += c.value;
        series.push((c.date, total));
    }

    if series.is_empty() {
        return (series, None, Some(0.0));
    }

    // Target is validated > 0 at commit time; guard anyway so rendering
    // never divides by zero on inconsistent input.
    let percent = target
        .filter(|t| *t > 0.0)
        .map(|t| (total / t * 100.0).min(100.0));
    (series, Some(total), percent)
}

fn percent_series(check_ins: &[&CheckIn]) -> SeriesResult {
    let series: Vec<(NaiveDate, f64)> = check_ins.iter().map(|c| (c.date, c.value)).collect();

    match series.last() {
        Some(&(_, latest)) => (series.clone(), Some(latest), Some(latest)),
        None => (series, None, Some(0.0)),
    }
}
