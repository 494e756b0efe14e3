//! Data models for goals and check-ins

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// How progress toward a goal is measured.
///
/// The kind fixes the aggregation policy for the goal's check-in series:
/// - `Binary`: done/not-done; the first check-in with value 1 marks the
///   goal done.
/// - `Numeric`: check-in values are deltas summed into a running total
///   against a required target (e.g. "read 12 books").
/// - `Percent`: check-in values are absolute percentages in [0, 100];
///   the latest value wins.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum MeasureKind {
    Binary,
    Numeric,
    Percent,
}

impl MeasureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MeasureKind::Binary => "binary",
            MeasureKind::Numeric => "numeric",
            MeasureKind::Percent => "percent",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MeasureKind::Binary => "Done / not done",
            MeasureKind::Numeric => "Running total",
            MeasureKind::Percent => "Percentage",
        }
    }
}

impl FromStr for MeasureKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "binary" => Ok(MeasureKind::Binary),
            "numeric" => Ok(MeasureKind::Numeric),
            "percent" => Ok(MeasureKind::Percent),
            other => Err(format!("unknown measure kind: {other}")),
        }
    }
}

/// A tracked target for the year
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    /// Unique identifier
    pub id: Uuid,
    /// Stable user-facing identifier; set on create, never changed or reused
    pub slug: String,
    /// Display title
    pub title: String,
    /// Longer description shown on the detail page
    pub description: String,
    /// Measurement kind; immutable once the goal exists
    pub kind: MeasureKind,
    /// Numeric target; required for Numeric goals, absent otherwise
    pub target: Option<f64>,
    /// Unit label for display (e.g. "books", "km")
    pub unit: Option<String>,
    /// When the goal was created
    pub created_at: DateTime<Utc>,
    /// Last time the goal row was modified
    pub updated_at: DateTime<Utc>,
    /// When the goal was archived (None = active)
    pub archived_at: Option<DateTime<Utc>>,
}

impl Goal {
    /// Create a new active goal
    pub fn new(
        slug: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
        kind: MeasureKind,
        target: Option<f64>,
        unit: Option<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            slug: slug.into(),
            title: title.into(),
            description: description.into(),
            kind,
            target,
            unit,
            created_at: now,
            updated_at: now,
            archived_at: None,
        }
    }

    /// Check if this goal is archived
    pub fn is_archived(&self) -> bool {
        self.archived_at.is_some()
    }
}

/// A single timestamped progress observation against a goal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckIn {
    /// Unique identifier
    pub id: Uuid,
    /// Owning goal ID
    pub goal_id: Uuid,
    /// Day the progress was observed
    pub date: NaiveDate,
    /// Value; domain depends on the owning goal's kind
    pub value: f64,
    /// Optional free-text note
    pub note: Option<String>,
    /// When the check-in was recorded
    pub created_at: DateTime<Utc>,
}

impl CheckIn {
    /// Create a new check-in against a goal
    pub fn new(goal_id: Uuid, date: NaiveDate, value: f64, note: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            goal_id,
            date,
            value,
            note,
            created_at: Utc::now(),
        }
    }
}

/// Fields for a goal to be created
#[derive(Debug, Clone)]
pub struct NewGoal {
    pub slug: String,
    pub title: String,
    pub description: String,
    pub kind: MeasureKind,
    pub target: Option<f64>,
    pub unit: Option<String>,
}

/// Fields for a check-in to be recorded
#[derive(Debug, Clone)]
pub struct NewCheckIn {
    /// Slug of the owning goal
    pub goal_slug: String,
    pub date: NaiveDate,
    pub value: f64,
    pub note: Option<String>,
}

/// A single change to the record, applied as one transaction
#[derive(Debug, Clone)]
pub enum Mutation {
    CreateGoal(NewGoal),
    ArchiveGoal { slug: String },
    ReactivateGoal { slug: String },
    RecordCheckIn(NewCheckIn),
    DeleteCheckIn { id: Uuid },
}

impl Mutation {
    /// Short human label for logs and error context
    pub fn describe(&self) -> String {
        match self {
            Mutation::CreateGoal(g) => format!("create goal '{}'", g.slug),
            Mutation::ArchiveGoal { slug } => format!("archive goal '{slug}'"),
            Mutation::ReactivateGoal { slug } => format!("reactivate goal '{slug}'"),
            Mutation::RecordCheckIn(c) => format!("record check-in for '{}'", c.goal_slug),
            Mutation::DeleteCheckIn { id } => format!("delete check-in {id}"),
        }
    }
}

/// What a successful commit changed
#[derive(Debug, Clone)]
pub struct CommitReceipt {
    /// Slug of the affected goal, when the mutation targets one
    pub goal_slug: Option<String>,
    /// ID of the created check-in, when one was recorded
    pub check_in_id: Option<Uuid>,
}

/// A consistent point-in-time view of the whole record
#[derive(Debug, Clone)]
pub struct RecordState {
    /// All goals, active and archived, in creation order
    pub goals: Vec<Goal>,
    /// All check-ins, sorted by (date, created_at, id)
    pub check_ins: Vec<CheckIn>,
}

impl RecordState {
    /// Check-ins belonging to one goal, preserving the global sort order
    pub fn check_ins_for(&self, goal_id: Uuid) -> Vec<&CheckIn> {
        self.check_ins
            .iter()
            .filter(|c| c.goal_id == goal_id)
            .collect()
    }
}
