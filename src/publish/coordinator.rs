//! Publish coordinator: commit, build, externalize as a gated sequence
//!
//! One publish attempt moves through Committing, Building, and
//! Externalizing; each step only runs when the previous one succeeded.
//! A failure at any step leaves the system in a safe, inspectable state:
//! the store is always consistent, and the public tree is only ever
//! replaced as a whole once a complete new tree exists.

use std::path::PathBuf;
use thiserror::Error;

use super::transport::{DeployResult, GitTransport, TransportError};
use crate::data::{CommitReceipt, Mutation, RecordStore, StoreError};
use crate::site::{RenderError, SiteBuilder};

/// Which step a publish attempt failed at, wrapping the step's own error
#[derive(Error, Debug)]
pub enum PublishError {
    /// The mutation was not committed; the record is unchanged
    #[error("commit failed: {0}")]
    Store(#[from] StoreError),
    /// The record was committed but the snapshot could not be built; the
    /// write is valid data and a manual rebuild can retry without re-entry
    #[error("build failed: {0}")]
    Build(#[from] RenderError),
    /// The snapshot was built but not (fully) externalized; the local
    /// artifacts are intact and publishing can be retried without a rebuild
    #[error("transport failed: {0}")]
    Transport(#[from] TransportError),
}

impl PublishError {
    /// Name of the pipeline step that failed, for display and logs
    pub fn stage(&self) -> &'static str {
        match self {
            PublishError::Store(_) => "commit",
            PublishError::Build(_) => "build",
            PublishError::Transport(_) => "transport",
        }
    }
}

/// What a successful publish attempt did
#[derive(Debug)]
pub struct PublishReport {
    /// Receipt for the committed mutation
    pub receipt: CommitReceipt,
    /// Transport outcome; None when no publish repository is configured
    pub deploy: Option<DeployResult>,
}

/// Orchestrates the update-and-publish pipeline
pub struct Publisher {
    store: RecordStore,
    builder: SiteBuilder,
    site_dir: PathBuf,
    transport: Option<GitTransport>,
}

impl Publisher {
    /// Create a publisher. `transport` is None when no publish repository
    /// is configured; mutations then stop after the local site swap.
    pub fn new(
        store: RecordStore,
        builder: SiteBuilder,
        site_dir: PathBuf,
        transport: Option<GitTransport>,
    ) -> Self {
        Self {
            store,
            builder,
            site_dir,
            transport,
        }
    }

    /// The single entry point invoked for a local write: commit the
    /// mutation, rebuild the snapshot from the committed state, then
    /// externalize it.
    ///
    /// The commit is authoritative the instant it succeeds; build or
    /// transport failures never roll it back.
    pub fn publish_on_update(&self, mutation: &Mutation) -> Result<PublishReport, PublishError> {
        tracing::info!(mutation = %mutation.describe(), "Publishing update");

        let receipt = self.store.commit(mutation)?;

        self.rebuild()?;
        let deploy = match &self.transport {
            Some(transport) => Some(transport.deploy(&self.site_dir)?),
            None => None,
        };

        Ok(PublishReport { receipt, deploy })
    }

    /// Build the snapshot from the current store state and swap it into
    /// the local site directory. Re-runnable on its own for recovery after
    /// a failed build.
    pub fn rebuild(&self) -> Result<(), PublishError> {
        let state = self.store.read_all()?;
        let artifacts = self.builder.build(&state)?;
        artifacts
            .install(&self.site_dir)
            .map_err(TransportError::Io)?;
        Ok(())
    }

    /// Push the current local site directory to the hosting branch.
    /// Re-runnable on its own for recovery after a failed transport;
    /// idempotent when nothing changed.
    pub fn publish_site(&self) -> Result<DeployResult, PublishError> {
        let transport = self
            .transport
            .as_ref()
            .ok_or(TransportError::NotConfigured)?;
        Ok(transport.deploy(&self.site_dir)?)
    }
}
