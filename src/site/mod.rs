//! Static site generation

mod builder;
mod chart;
mod pages;

pub use builder::{RenderError, SiteBuilder, SnapshotArtifacts};
