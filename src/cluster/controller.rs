//! Click handling for cluster markers
//!
//! At most one cluster is expanded at a time. Small clusters are spread into a
//! ring of pins in place; large ones make the map zoom to where they split.

use log::debug;
use serde::Serialize;

use super::index::{ClusterFeature, ClusterId, ClusterIndex, FeatureKind};
use super::options::ControllerOptions;
use super::point::{Point, Viewport};
use super::spread::{spread_positions, spread_radius_deg};

/// Expansion state owned by the controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum ExpansionState {
    #[default]
    Collapsed,
    Expanded { cluster: ClusterId },
}

/// Side effects for the map view to carry out
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum ClusterEvent {
    /// The cluster is now shown as a ring of pins
    Expanded(ClusterId),
    /// The previously expanded cluster is folded back into one marker
    Collapsed(ClusterId),
    /// Animate the viewport to this center and zoom
    ZoomTo {
        longitude: f64,
        latitude: f64,
        zoom: u8,
    },
    /// A single location was picked
    LocationSelected { id: String },
}

/// A member pin of the expanded cluster and where to draw it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpreadPin<'a> {
    pub point: &'a Point,
    pub latitude: f64,
    pub longitude: f64,
}

/// ClusterController turns marker activations into expansion changes and events
#[derive(Debug, Default)]
pub struct ClusterController {
    options: ControllerOptions,
    state: ExpansionState,
}

impl ClusterController {
    pub fn new(options: ControllerOptions) -> Self {
        Self {
            options,
            state: ExpansionState::Collapsed,
        }
    }

    pub fn state(&self) -> ExpansionState {
        self.state
    }

    pub fn expanded(&self) -> Option<ClusterId> {
        match self.state {
            ExpansionState::Expanded { cluster } => Some(cluster),
            ExpansionState::Collapsed => None,
        }
    }

    /// Handles a click on a rendered feature
    pub fn activate(&mut self, index: &ClusterIndex, feature: &ClusterFeature) -> Option<ClusterEvent> {
        let (id, point_count) = match &feature.kind {
            FeatureKind::Point { id, .. } => {
                debug!("location {id} selected");
                return Some(ClusterEvent::LocationSelected { id: id.clone() });
            }
            FeatureKind::Cluster { id, point_count } => (*id, *point_count),
        };

        if id.generation != index.generation() {
            debug!("ignoring activation of stale {id}");
            return self.collapse();
        }

        if self.expanded() == Some(id) {
            return self.collapse();
        }

        if point_count <= self.options.max_spreadable_size {
            debug!("expanding {id} ({point_count} points)");
            self.state = ExpansionState::Expanded { cluster: id };
            return Some(ClusterEvent::Expanded(id));
        }

        match index.get_expansion_zoom(id) {
            Ok(zoom) => {
                let zoom = zoom.min(index.options().max_zoom);
                debug!("{id} too large to spread ({point_count} points), zooming to {zoom}");
                Some(ClusterEvent::ZoomTo {
                    longitude: feature.longitude,
                    latitude: feature.latitude,
                    zoom,
                })
            }
            Err(e) => {
                debug!("{e}, collapsing");
                self.collapse()
            }
        }
    }

    /// Folds the expanded cluster back, if any
    pub fn collapse(&mut self) -> Option<ClusterEvent> {
        let id = self.expanded()?;
        debug!("collapsing {id}");
        self.state = ExpansionState::Collapsed;
        Some(ClusterEvent::Collapsed(id))
    }

    /// Must be called whenever a new point set is loaded into the index
    pub fn on_points_replaced(&mut self) -> Option<ClusterEvent> {
        self.collapse()
    }

    /// Collapses when the settled viewport no longer shows the expanded
    /// cluster's zoom level, or the cluster belongs to an older load
    pub fn on_viewport_settled(
        &mut self,
        index: &ClusterIndex,
        viewport: &Viewport,
    ) -> Option<ClusterEvent> {
        let id = self.expanded()?;
        if id.generation != index.generation() || id.zoom != index.level_zoom(viewport.zoom) {
            return self.collapse();
        }
        None
    }

    /// Pins for the expanded cluster laid out on a ring around `feature`
    ///
    /// `feature` is the expanded cluster's marker and `zoom` the current map
    /// zoom. Empty when nothing is expanded, `feature` is another marker, or
    /// the cluster is stale.
    pub fn expanded_pins<'a>(
        &self,
        index: &'a ClusterIndex,
        feature: &ClusterFeature,
        zoom: f64,
    ) -> Vec<SpreadPin<'a>> {
        let Some(id) = self.expanded() else {
            return Vec::new();
        };
        if feature.cluster_id() != Some(id) {
            return Vec::new();
        }

        let leaves = match index.get_leaves(id, usize::MAX) {
            Ok(leaves) => leaves,
            Err(e) => {
                debug!("{e}, no pins to spread");
                return Vec::new();
            }
        };

        let radius = spread_radius_deg(
            self.options.spread_base_radius_deg,
            zoom,
            self.options.reference_zoom,
        );
        let positions = spread_positions(feature.latitude, feature.longitude, leaves.len(), radius);

        leaves
            .into_iter()
            .zip(positions)
            .map(|(point, pos)| SpreadPin {
                point,
                latitude: pos.latitude,
                longitude: pos.longitude,
            })
            .collect()
    }
}
