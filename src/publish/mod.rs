//! Publish pipeline: coordinator and git transport

mod coordinator;
mod transport;

pub use coordinator::{PublishError, PublishReport, Publisher};
pub use transport::{DeployResult, GitTransport, TransportError};
