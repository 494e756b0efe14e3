//! Record store: the single authoritative write path for goals and check-ins
//!
//! Every mutation goes through [`RecordStore::commit`], which validates the
//! input against the data model invariants and applies it inside one SQLite
//! transaction. A failed commit leaves the database untouched.

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use uuid::Uuid;

use super::models::{
    CheckIn, CommitReceipt, Goal, MeasureKind, Mutation, NewCheckIn, NewGoal, RecordState,
};
use crate::util::slug::is_valid_slug;

/// Bad input, user-correctable, no state change
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("No goal with slug '{0}'")]
    UnknownGoal(String),
    #[error("A goal with slug '{0}' already exists")]
    DuplicateSlug(String),
    #[error("Slug '{0}' must contain only lowercase letters, digits, and underscores")]
    InvalidSlug(String),
    #[error("Goal title must not be empty")]
    EmptyTitle,
    #[error("Numeric goals require a target greater than zero")]
    MissingTarget,
    #[error("{kind} goals do not take a target")]
    UnexpectedTarget { kind: &'static str },
    #[error("Binary check-in value must be 0 or 1, got {0}")]
    NotBinaryValue(f64),
    #[error("Percentage check-in value must be within [0, 100], got {0}")]
    PercentOutOfRange(f64),
    #[error("Check-in value must be a finite number")]
    NonFiniteValue,
    #[error("Goal '{0}' is archived and cannot accept check-ins")]
    GoalArchived(String),
    #[error("Goal '{0}' is already archived")]
    AlreadyArchived(String),
    #[error("Goal '{0}' is not archived")]
    NotArchived(String),
    #[error("No check-in with id {0}")]
    UnknownCheckIn(Uuid),
}

/// Local persistence failure, fatal for the attempt; the store stays at its
/// last-known-good state
#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Lock poisoned")]
    LockPoisoned,
}

/// Data access object for the authoritative record
#[derive(Clone)]
pub struct RecordStore {
    conn: Arc<Mutex<Connection>>,
}

impl RecordStore {
    /// Create a new RecordStore over a database connection
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// Apply one mutation as a single durable transaction.
    ///
    /// Validation failures roll back with nothing applied; SQLite failures
    /// roll back via the dropped transaction.
    pub fn commit(&self, mutation: &Mutation) -> Result<CommitReceipt, StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        let tx = conn.unchecked_transaction()?;

        let receipt = match mutation {
            Mutation::CreateGoal(new_goal) => Self::apply_create_goal(&tx, new_goal)?,
            Mutation::ArchiveGoal { slug } => Self::apply_archive(&tx, slug, true)?,
            Mutation::ReactivateGoal { slug } => Self::apply_archive(&tx, slug, false)?,
            Mutation::RecordCheckIn(new_check_in) => Self::apply_check_in(&tx, new_check_in)?,
            Mutation::DeleteCheckIn { id } => Self::apply_delete_check_in(&tx, *id)?,
        };

        tx.commit()?;
        tracing::debug!(mutation = %mutation.describe(), "Committed mutation");
        Ok(receipt)
    }

    /// Read a consistent point-in-time snapshot of the whole record.
    ///
    /// Goals come back in creation order, check-ins sorted by
    /// (date, created_at, id); neither can observe a commit in progress.
    pub fn read_all(&self) -> Result<RecordState, StoreError> {
        let conn = self.conn.lock().map_err(|_| StoreError::LockPoisoned)?;
        let tx = conn.unchecked_transaction()?;

        let goals = {
            let mut stmt = tx.prepare(
                "SELECT id, slug, title, description, kind, target, unit,
                        created_at, updated_at, archived_at
                 FROM goals ORDER BY created_at, slug",
            )?;
            let goals: Vec<Goal> = stmt
                .query_map([], row_to_goal)?
                .collect::<rusqlite::Result<_>>()?;
            goals
        };

        let check_ins = {
            let mut stmt = tx.prepare(
                "SELECT id, goal_id, date, value, note, created_at
                 FROM check_ins ORDER BY date, created_at, id",
            )?;
            let check_ins: Vec<CheckIn> = stmt
                .query_map([], row_to_check_in)?
                .collect::<rusqlite::Result<_>>()?;
            check_ins
        };

        tx.commit()?;
        Ok(RecordState { goals, check_ins })
    }

    fn apply_create_goal(tx: &Transaction, new_goal: &NewGoal) -> Result<CommitReceipt, StoreError> {
        if new_goal.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle.into());
        }
        if !is_valid_slug(&new_goal.slug) {
            return Err(ValidationError::InvalidSlug(new_goal.slug.clone()).into());
        }

        match (new_goal.kind, new_goal.target) {
            (MeasureKind::Numeric, Some(t)) if t > 0.0 && t.is_finite() => {}
            (MeasureKind::Numeric, _) => return Err(ValidationError::MissingTarget.into()),
            (kind, Some(_)) => {
                return Err(ValidationError::UnexpectedTarget {
                    kind: kind.as_str(),
                }
                .into())
            }
            (_, None) => {}
        }

        let exists: bool = tx.query_row(
            "SELECT EXISTS(SELECT 1 FROM goals WHERE slug = ?1)",
            params![new_goal.slug],
            |row| row.get(0),
        )?;
        if exists {
            return Err(ValidationError::DuplicateSlug(new_goal.slug.clone()).into());
        }

        let goal = Goal::new(
            new_goal.slug.clone(),
            new_goal.title.clone(),
            new_goal.description.clone(),
            new_goal.kind,
            new_goal.target,
            new_goal.unit.clone(),
        );

        tx.execute(
            "INSERT INTO goals (id, slug, title, description, kind, target, unit,
                                created_at, updated_at, archived_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                goal.id.to_string(),
                goal.slug,
                goal.title,
                goal.description,
                goal.kind.as_str(),
                goal.target,
                goal.unit,
                goal.created_at.to_rfc3339(),
                goal.updated_at.to_rfc3339(),
                Option::<String>::None,
            ],
        )?;

        Ok(CommitReceipt {
            goal_slug: Some(goal.slug),
            check_in_id: None,
        })
    }

    fn apply_archive(
        tx: &Transaction,
        slug: &str,
        archive: bool,
    ) -> Result<CommitReceipt, StoreError> {
        let goal = get_goal_by_slug(tx, slug)?
            .ok_or_else(|| ValidationError::UnknownGoal(slug.to_string()))?;

        if archive && goal.is_archived() {
            return Err(ValidationError::AlreadyArchived(slug.to_string()).into());
        }
        if !archive && !goal.is_archived() {
            return Err(ValidationError::NotArchived(slug.to_string()).into());
        }

        let now = Utc::now();
        let archived_at = if archive {
            Some(now.to_rfc3339())
        } else {
            None
        };

        tx.execute(
            "UPDATE goals SET archived_at = ?2, updated_at = ?3 WHERE slug = ?1",
            params![slug, archived_at, now.to_rfc3339()],
        )?;

        Ok(CommitReceipt {
            goal_slug: Some(slug.to_string()),
            check_in_id: None,
        })
    }

    fn apply_check_in(
        tx: &Transaction,
        new_check_in: &NewCheckIn,
    ) -> Result<CommitReceipt, StoreError> {
        let goal = get_goal_by_slug(tx, &new_check_in.goal_slug)?
            .ok_or_else(|| ValidationError::UnknownGoal(new_check_in.goal_slug.clone()))?;

        if goal.is_archived() {
            return Err(ValidationError::GoalArchived(goal.slug).into());
        }

        validate_value(goal.kind, new_check_in.value)?;

        let check_in = CheckIn::new(
            goal.id,
            new_check_in.date,
            new_check_in.value,
            new_check_in.note.clone(),
        );

        tx.execute(
            "INSERT INTO check_ins (id, goal_id, date, value, note, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                check_in.id.to_string(),
                check_in.goal_id.to_string(),
                check_in.date.to_string(),
                check_in.value,
                check_in.note,
                check_in.created_at.to_rfc3339(),
            ],
        )?;

        // Bookkeeping: a check-in counts as a modification of its goal
        tx.execute(
            "UPDATE goals SET updated_at = ?2 WHERE id = ?1",
            params![goal.id.to_string(), Utc::now().to_rfc3339()],
        )?;

        Ok(CommitReceipt {
            goal_slug: Some(goal.slug),
            check_in_id: Some(check_in.id),
        })
    }

    fn apply_delete_check_in(tx: &Transaction, id: Uuid) -> Result<CommitReceipt, StoreError> {
        let goal_id: Option<String> = tx
            .query_row(
                "SELECT goal_id FROM check_ins WHERE id = ?1",
                params![id.to_string()],
                |row| row.get(0),
            )
            .optional()?;

        let goal_id = goal_id.ok_or(ValidationError::UnknownCheckIn(id))?;

        tx.execute(
            "DELETE FROM check_ins WHERE id = ?1",
            params![id.to_string()],
        )?;
        tx.execute(
            "UPDATE goals SET updated_at = ?2 WHERE id = ?1",
            params![goal_id, Utc::now().to_rfc3339()],
        )?;

        let goal_slug: Option<String> = tx
            .query_row(
                "SELECT slug FROM goals WHERE id = ?1",
                params![goal_id],
                |row| row.get(0),
            )
            .optional()?;

        Ok(CommitReceipt {
            goal_slug,
            check_in_id: Some(id),
        })
    }
}

/// Validate a check-in value against the owning goal's measurement kind.
///
/// Out-of-domain values are rejected, never clamped.
fn validate_value(kind: MeasureKind, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() {
        return Err(ValidationError::NonFiniteValue);
    }
    match kind {
        MeasureKind::Binary if value != 0.0 && value != 1.0 => {
            Err(ValidationError::NotBinaryValue(value))
        }
        MeasureKind::Percent if !(0.0..=100.0).contains(&value) => {
            Err(ValidationError::PercentOutOfRange(value))
        }
        _ => Ok(()),
    }
}

fn get_goal_by_slug(tx: &Transaction, slug: &str) -> Result<Option<Goal>, StoreError> {
    let goal = tx
        .query_row(
            "SELECT id, slug, title, description, kind, target, unit,
                    created_at, updated_at, archived_at
             FROM goals WHERE slug = ?1",
            params![slug],
            row_to_goal,
        )
        .optional()?;
    Ok(goal)
}

/// Convert a database row to a Goal
fn row_to_goal(row: &rusqlite::Row) -> rusqlite::Result<Goal> {
    let id_str: String = row.get(0)?;
    let kind_str: String = row.get(4)?;
    let created_at_str: String = row.get(7)?;
    let updated_at_str: String = row.get(8)?;
    let archived_at_str: Option<String> = row.get(9)?;

    Ok(Goal {
        id: parse_uuid(0, &id_str)?,
        slug: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        kind: MeasureKind::from_str(&kind_str)
            .map_err(|e| conversion_error(4, e))?,
        target: row.get(5)?,
        unit: row.get(6)?,
        created_at: parse_timestamp(7, &created_at_str)?,
        updated_at: parse_timestamp(8, &updated_at_str)?,
        archived_at: archived_at_str
            .map(|s| parse_timestamp(9, &s))
            .transpose()?,
    })
}

/// Convert a database row to a CheckIn
fn row_to_check_in(row: &rusqlite::Row) -> rusqlite::Result<CheckIn> {
    let id_str: String = row.get(0)?;
    let goal_id_str: String = row.get(1)?;
    let date_str: String = row.get(2)?;
    let created_at_str: String = row.get(5)?;

    Ok(CheckIn {
        id: parse_uuid(0, &id_str)?,
        goal_id: parse_uuid(1, &goal_id_str)?,
        date: NaiveDate::parse_from_str(&date_str, "%Y-%m-%d")
            .map_err(|e| conversion_error(2, e.to_string()))?,
        value: row.get(3)?,
        note: row.get(4)?,
        created_at: parse_timestamp(5, &created_at_str)?,
    })
}

fn parse_uuid(idx: usize, raw: &str) -> rusqlite::Result<Uuid> {
    Uuid::parse_str(raw).map_err(|e| conversion_error(idx, e.to_string()))
}

fn parse_timestamp(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| conversion_error(idx, e.to_string()))
}

fn conversion_error(idx: usize, message: impl ToString) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        idx,
        rusqlite::types::Type::Text,
        message.to_string().into(),
    )
}
