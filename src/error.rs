//! Error types for cluster lookups

use crate::cluster::ClusterId;
use thiserror::Error;

/// Errors returned when resolving a cluster id against an index
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClusterError {
    /// The id was issued by a previous `load` or does not name a cluster in the
    /// current one. Callers should treat this as "collapse / do nothing".
    #[error("stale cluster id {0}")]
    StaleCluster(ClusterId),
}

pub type Result<T> = std::result::Result<T, ClusterError>;
