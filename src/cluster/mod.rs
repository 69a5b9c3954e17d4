//! Package cluster implements viewport clustering of (lat, lon) points using a K-D Tree
pub mod controller;
pub mod distance;
pub mod index;
pub mod kdtree;
pub mod options;
pub mod point;
pub mod projection;
pub mod spread;

#[cfg(test)]
mod controller_test;
#[cfg(test)]
mod point_test;

pub use controller::{ClusterController, ClusterEvent, ExpansionState, SpreadPin};
pub use distance::{
    DEGREE_RAD, EARTH_R, REFERENCE_ZOOM, bounds_of, centroid_of, distance_km, filter_by_query,
    format_coordinates, group_by_key, is_within_radius, sort_by_distance, unique_groups,
    zoom_for_distance, zoom_to_radius_km,
};
pub use index::{ClusterFeature, ClusterId, ClusterIndex, FeatureKind, visible_point_count};
pub use options::{ClusterOptions, ControllerOptions};
pub use point::{Bounds, Point, PointList, Viewport};
pub use spread::{SpreadPosition, spread_positions};
