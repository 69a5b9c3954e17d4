use std::f64::consts::PI;

use super::point::{Bounds, Point, PointList};

/// Coefficient to translate from degrees to radians
pub const DEGREE_RAD: f64 = PI / 180.0;

/// Earth radius in kilometers
pub const EARTH_R: f64 = 6371.0;

/// Zoom level at which a base radius applies unscaled
pub const REFERENCE_ZOOM: f64 = 12.0;

/// Calculates great-circle (haversine) distance between two coordinates
///
/// # Returns
///
/// Distance in kilometers
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1) * DEGREE_RAD;
    let d_lon = (lon2 - lon1) * DEGREE_RAD;

    let a = (d_lat / 2.0).sin().powi(2)
        + (lat1 * DEGREE_RAD).cos() * (lat2 * DEGREE_RAD).cos() * (d_lon / 2.0).sin().powi(2);

    // Rounding can push `a` a hair past 1 for antipodal points
    let a = a.clamp(0.0, 1.0);
    EARTH_R * 2.0 * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Scales a radius given at `reference_zoom` to `zoom`
///
/// Every zoom step halves the radius. The result never drops below 1 km.
pub fn zoom_to_radius_km(base_radius_km: f64, zoom: f64, reference_zoom: f64) -> f64 {
    (base_radius_km * 2f64.powf(reference_zoom - zoom)).max(1.0)
}

/// Calculates the bounding box of the points
///
/// Returns [`Bounds::ZERO`] for an empty slice; check
/// [`Bounds::is_degenerate`] before using the result as a viewport.
pub fn bounds_of(points: &[Point]) -> Bounds {
    let Some(first) = points.first() else {
        return Bounds::ZERO;
    };

    let mut bounds = Bounds::new(first.longitude, first.latitude, first.longitude, first.latitude);
    for p in &points[1..] {
        bounds.north = bounds.north.max(p.latitude);
        bounds.south = bounds.south.min(p.latitude);
        bounds.east = bounds.east.max(p.longitude);
        bounds.west = bounds.west.min(p.longitude);
    }

    bounds
}

/// Checks if the point is within `radius_km` of the center
pub fn is_within_radius(point: &Point, center_lat: f64, center_lon: f64, radius_km: f64) -> bool {
    distance_km(point.latitude, point.longitude, center_lat, center_lon) <= radius_km
}

/// Returns the arithmetic mean `(latitude, longitude)` of the points,
/// or the origin for an empty slice
pub fn centroid_of(points: &[Point]) -> (f64, f64) {
    if points.is_empty() {
        return (0.0, 0.0);
    }

    let (lat, lon) = points
        .iter()
        .fold((0.0, 0.0), |(lat, lon), p| (lat + p.latitude, lon + p.longitude));
    let n = points.len() as f64;

    (lat / n, lon / n)
}

/// Sorts points by distance from the center, closest first
///
/// The sort is stable, so equidistant points keep their relative order.
pub fn sort_by_distance(points: &mut [Point], center_lat: f64, center_lon: f64) {
    points.sort_by(|a, b| {
        let da = distance_km(a.latitude, a.longitude, center_lat, center_lon);
        let db = distance_km(b.latitude, b.longitude, center_lat, center_lon);
        da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
    });
}

/// Picks a zoom level that shows a span of `distance` kilometers
pub fn zoom_for_distance(distance: f64) -> u8 {
    const STEPS: [(f64, u8); 8] = [
        (0.5, 16),
        (2.0, 14),
        (5.0, 13),
        (10.0, 12),
        (20.0, 11),
        (50.0, 10),
        (100.0, 9),
        (200.0, 8),
    ];

    STEPS
        .iter()
        .find(|(limit, _)| distance < *limit)
        .map_or(7, |&(_, zoom)| zoom)
}

/// Formats coordinates as `48.8566°N, 2.3522°E`
pub fn format_coordinates(latitude: f64, longitude: f64, precision: usize) -> String {
    // Round first so that the hemisphere letter and the digits agree
    let lat: f64 = format!("{latitude:.precision$}").parse().unwrap_or(latitude);
    let lon: f64 = format!("{longitude:.precision$}").parse().unwrap_or(longitude);
    let lat_dir = if latitude >= 0.0 { 'N' } else { 'S' };
    let lon_dir = if longitude >= 0.0 { 'E' } else { 'W' };

    format!("{}°{}, {}°{}", lat.abs(), lat_dir, lon.abs(), lon_dir)
}

/// Groups points by `group_key`, keeping groups in first-seen order
pub fn group_by_key(points: &[Point]) -> Vec<(String, Vec<&Point>)> {
    let mut groups: Vec<(String, Vec<&Point>)> = Vec::new();
    let mut slots = std::collections::HashMap::new();

    for p in points {
        let slot = *slots.entry(p.group_key.as_str()).or_insert_with(|| {
            groups.push((p.group_key.clone(), Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(p);
    }

    groups
}

/// Distinct group keys with how many points carry each, in first-seen order
pub fn unique_groups(points: &[Point]) -> Vec<(String, usize)> {
    group_by_key(points)
        .into_iter()
        .map(|(key, members)| (key, members.len()))
        .collect()
}

/// Keeps the points whose id or group key contains `query`, ignoring case
///
/// A blank query keeps everything. The result is a fresh list, ready to be
/// loaded into a new index.
pub fn filter_by_query(points: &[Point], query: &str) -> PointList {
    if query.trim().is_empty() {
        return points.to_vec();
    }

    let query = query.to_lowercase();
    points
        .iter()
        .filter(|p| {
            p.id.to_lowercase().contains(&query) || p.group_key.to_lowercase().contains(&query)
        })
        .cloned()
        .collect()
}
