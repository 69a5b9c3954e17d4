use std::f64::consts::PI;

use serde::Serialize;

/// Position of one pin on an expanded cluster's ring
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpreadPosition {
    pub latitude: f64,
    pub longitude: f64,
}

/// Ring radius in degrees for the given zoom
///
/// Doubles with every zoom step out from `reference_zoom`. This is a flat
/// degree offset rather than a geodesic distance, so rings get squashed
/// east-west at high latitudes.
pub fn spread_radius_deg(base_radius_deg: f64, zoom: f64, reference_zoom: f64) -> f64 {
    base_radius_deg * 2f64.powf(reference_zoom - zoom)
}

/// Places `count` pins evenly on a ring around the center
///
/// Pin `i` sits at angle `i * 2π / count`, measured from north towards east,
/// so the i-th leaf of a cluster always lands on the same spot.
pub fn spread_positions(
    center_lat: f64,
    center_lon: f64,
    count: usize,
    radius_deg: f64,
) -> Vec<SpreadPosition> {
    if count == 0 {
        return Vec::new();
    }

    let step = 2.0 * PI / count as f64;
    (0..count)
        .map(|i| {
            let angle = i as f64 * step;
            SpreadPosition {
                latitude: center_lat + radius_deg * angle.cos(),
                longitude: center_lon + radius_deg * angle.sin(),
            }
        })
        .collect()
}
