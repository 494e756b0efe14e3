//! Snapshot builder: record state in, complete artifact tree out
//!
//! `SiteBuilder::build` is a deterministic function of the record snapshot:
//! the same state always produces a byte-identical tree, so version-control
//! diffs of the published site reflect only real content changes. Artifacts
//! are written to a staging directory and only exposed once the whole set
//! is complete; a failed build removes the staging directory.

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use uuid::Uuid;

use super::{chart, pages};
use crate::data::RecordState;
use crate::progress;

/// Internal inconsistency between stored data and rendering assumptions,
/// or I/O failure while staging. Should be unreachable when the record
/// store's invariants hold.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("IO error while staging artifacts: {0}")]
    Io(#[from] std::io::Error),
    #[error("Check-in {check_in} references unknown goal {goal}")]
    OrphanCheckIn { check_in: Uuid, goal: Uuid },
    #[error("Failed to serialize progress bundle: {0}")]
    Json(#[from] serde_json::Error),
}

/// A complete, self-contained artifact tree produced by one build
#[derive(Debug)]
pub struct SnapshotArtifacts {
    /// Root of the staged tree
    pub root: PathBuf,
}

impl SnapshotArtifacts {
    /// Atomically replace `public_dir` with this artifact set.
    ///
    /// The previous tree is moved aside first and only deleted after the
    /// new tree is in place, so a crash mid-swap never leaves the public
    /// directory partially overwritten.
    pub fn install(self, public_dir: &Path) -> std::io::Result<()> {
        let old = public_dir.with_extension("old");
        if old.exists() {
            fs::remove_dir_all(&old)?;
        }

        if public_dir.exists() {
            fs::rename(public_dir, &old)?;
        }

        if let Err(e) = fs::rename(&self.root, public_dir) {
            // Put the previous tree back before reporting failure
            if old.exists() {
                let _ = fs::rename(&old, public_dir);
            }
            return Err(e);
        }

        if old.exists() {
            fs::remove_dir_all(&old)?;
        }
        Ok(())
    }
}

/// Builds the static site from a record snapshot
#[derive(Debug, Clone)]
pub struct SiteBuilder {
    staging_dir: PathBuf,
}

impl SiteBuilder {
    /// Create a builder that stages artifacts under the given directory
    pub fn new(staging_dir: PathBuf) -> Self {
        Self { staging_dir }
    }

    /// Render the complete artifact set for a record snapshot.
    ///
    /// Writes into the staging directory (replacing any leftover staging
    /// tree from an earlier failed run) and returns only once every page,
    /// chart, and asset has been written.
    pub fn build(&self, state: &RecordState) -> Result<SnapshotArtifacts, RenderError> {
        verify_consistency(state)?;

        if self.staging_dir.exists() {
            fs::remove_dir_all(&self.staging_dir)?;
        }

        let result = self.build_into_staging(state);
        if result.is_err() {
            // Never leave a half-written tree behind
            let _ = fs::remove_dir_all(&self.staging_dir);
        }
        result?;

        tracing::info!(
            root = %self.staging_dir.display(),
            goals = state.goals.len(),
            "Built site snapshot"
        );

        Ok(SnapshotArtifacts {
            root: self.staging_dir.clone(),
        })
    }

    fn build_into_staging(&self, state: &RecordState) -> Result<(), RenderError> {
        let assets_dir = self.staging_dir.join("assets");
        let goals_dir = self.staging_dir.join("goals");
        let data_dir = self.staging_dir.join("data");
        fs::create_dir_all(&assets_dir)?;
        fs::create_dir_all(&goals_dir)?;
        fs::create_dir_all(&data_dir)?;

        fs::write(assets_dir.join("style.css"), pages::STYLESHEET)?;

        let progress_list = progress::compute_all(state);
        let marker = last_updated_marker(state);

        fs::write(
            self.staging_dir.join("index.html"),
            pages::render_overview(&progress_list, marker.as_deref()),
        )?;

        for (goal, gp) in state.goals.iter().zip(&progress_list) {
            let goal_dir = goals_dir.join(&gp.slug);
            fs::create_dir_all(&goal_dir)?;

            let check_ins = state.check_ins_for(goal.id);
            fs::write(
                goal_dir.join("index.html"),
                pages::render_goal_page(gp, &check_ins),
            )?;
            fs::write(goal_dir.join("chart.svg"), chart::render_chart(gp))?;
        }

        // JSON bundle of the computed progress, handy for debugging and
        // for anything that wants the data without scraping HTML
        fs::write(
            data_dir.join("progress.json"),
            serde_json::to_string_pretty(&progress_list)?,
        )?;

        Ok(())
    }
}

fn verify_consistency(state: &RecordState) -> Result<(), RenderError> {
    let goal_ids: HashSet<Uuid> = state.goals.iter().map(|g| g.id).collect();
    for check_in in &state.check_ins {
        if !goal_ids.contains(&check_in.goal_id) {
            return Err(RenderError::OrphanCheckIn {
                check_in: check_in.id,
                goal: check_in.goal_id,
            });
        }
    }
    Ok(())
}

/// Derive the "last updated" marker from the record itself.
///
/// Using the newest modification timestamp in the data (instead of the
/// build wall clock) keeps rebuilds of unchanged data byte-identical.
fn last_updated_marker(state: &RecordState) -> Option<String> {
    let newest_goal = state.goals.iter().map(|g| g.updated_at).max();
    let newest_check_in = state.check_ins.iter().map(|c| c.created_at).max();

    let newest: Option<DateTime<Utc>> = match (newest_goal, newest_check_in) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    };

    newest.map(|ts| ts.format("%Y-%m-%d %H:%M UTC").to_string())
}
