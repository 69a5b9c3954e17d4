/// ClusterOptions configures the spatial indexer
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterOptions {
    /// Clustering radius in pixels
    pub radius: f64,
    /// Tile size in pixels, the pixel width of the world at zoom 0
    pub extent: f64,
    /// Lowest zoom level that gets clustered
    pub min_zoom: u8,
    /// Highest zoom level that gets clustered; above it every point is shown alone
    pub max_zoom: u8,
    /// Minimum number of points that make a cluster (at least 2)
    pub min_points: usize,
}

impl Default for ClusterOptions {
    fn default() -> Self {
        Self {
            radius: 75.0,
            extent: 512.0,
            min_zoom: 0,
            max_zoom: 20,
            min_points: 2,
        }
    }
}

impl ClusterOptions {
    /// Returns a copy with inconsistent settings brought back into range
    pub(crate) fn normalized(&self) -> Self {
        let mut opts = self.clone();
        if opts.min_points < 2 {
            log::warn!("min_points {} raised to 2", opts.min_points);
            opts.min_points = 2;
        }
        // Keep max_zoom + 1 addressable as a level
        opts.max_zoom = opts.max_zoom.min(30);
        if opts.min_zoom > opts.max_zoom {
            log::warn!(
                "min_zoom {} above max_zoom {}, clamping",
                opts.min_zoom,
                opts.max_zoom
            );
            opts.min_zoom = opts.max_zoom;
        }
        if !(opts.radius.is_finite() && opts.radius >= 0.0) {
            log::warn!("invalid radius {}, using default", opts.radius);
            opts.radius = Self::default().radius;
        }
        if !(opts.extent.is_finite() && opts.extent > 0.0) {
            log::warn!("invalid extent {}, using default", opts.extent);
            opts.extent = Self::default().extent;
        }
        opts
    }
}

/// ControllerOptions configures cluster click handling and the radial spread
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerOptions {
    /// Largest cluster that is spread in place; bigger ones zoom the map instead
    pub max_spreadable_size: usize,
    /// Spread ring radius in degrees at `reference_zoom`
    pub spread_base_radius_deg: f64,
    pub reference_zoom: f64,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            max_spreadable_size: 8,
            spread_base_radius_deg: 0.01,
            reference_zoom: super::distance::REFERENCE_ZOOM,
        }
    }
}
