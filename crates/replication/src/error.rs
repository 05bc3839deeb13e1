//! Error types for replica placement.
//!
//! Placement decisions themselves never fail; these errors come from
//! loading training data and from remote load probes.

use std::time::Duration;

use corelib::NodeId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReplicationError {
    /// A node answered the load probe with an error
    #[error("load probe failed for {node}: {reason}")]
    ProbeFailed { node: NodeId, reason: String },

    /// A node did not answer the load probe in time
    #[error("load probe for {node} timed out after {timeout:?}")]
    ProbeTimeout { node: NodeId, timeout: Duration },

    #[error(transparent)]
    Core(#[from] corelib::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ReplicationError>;
