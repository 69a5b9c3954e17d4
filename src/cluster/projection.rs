//! Spherical Web Mercator projection onto the unit square
//!
//! `x` grows eastward from 0 at -180° to 1 at 180°, `y` grows southward from 0
//! at the top of the map to 1 at the bottom. At zoom `z` one unit spans
//! `extent * 2^z` pixels.

use std::f64::consts::PI;

use super::distance::DEGREE_RAD;

pub fn lng_x(lng: f64) -> f64 {
    lng / 360.0 + 0.5
}

pub fn lat_y(lat: f64) -> f64 {
    let sin = (lat * DEGREE_RAD).sin();
    let y = 0.5 - 0.25 * ((1.0 + sin) / (1.0 - sin)).ln() / PI;
    // Poles project to +-inf
    y.clamp(0.0, 1.0)
}

pub fn x_lng(x: f64) -> f64 {
    (x - 0.5) * 360.0
}

pub fn y_lat(y: f64) -> f64 {
    let y2 = (180.0 - y * 360.0) * DEGREE_RAD;
    360.0 * y2.exp().atan() / PI - 90.0
}

/// Projected `[x, y]` for a lat/lon pair
pub fn project(latitude: f64, longitude: f64) -> [f64; 2] {
    [lng_x(longitude), lat_y(latitude)]
}

/// Converts a pixel distance at `zoom` into unit-square distance
pub fn pixels_to_units(pixels: f64, extent: f64, zoom: u8) -> f64 {
    pixels / (extent * 2f64.powi(i32::from(zoom)))
}
