//! Map marker clustering for film location maps
//!
//! Groups nearby filming locations into clusters for the current viewport,
//! and tracks which single cluster (if any) is spread out into a ring of
//! individually clickable pins.

pub mod cluster;
pub mod error;

pub use cluster::{
    Bounds, ClusterController, ClusterEvent, ClusterFeature, ClusterId, ClusterIndex,
    ClusterOptions, ControllerOptions, ExpansionState, FeatureKind, Point, PointList, SpreadPin,
    SpreadPosition, Viewport,
};
pub use error::{ClusterError, Result};
