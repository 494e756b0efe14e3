pub mod cli;
pub mod config;
pub mod data;
pub mod progress;
pub mod publish;
pub mod site;
pub mod util;

pub use config::{Config, PublishConfig};
pub use data::{
    CheckIn, Database, Goal, MeasureKind, Mutation, NewCheckIn, NewGoal, RecordState, RecordStore,
    StoreError, ValidationError,
};
pub use progress::{compute_all, compute_goal, GoalProgress};
pub use publish::{DeployResult, GitTransport, PublishError, PublishReport, Publisher, TransportError};
pub use site::{RenderError, SiteBuilder, SnapshotArtifacts};
