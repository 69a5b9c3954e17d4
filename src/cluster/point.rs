use serde::Serialize;

/// Point is a single filming location
///
/// Points are immutable once built; a changed location set is loaded into the
/// index as a whole new list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Point {
    /// Unique location id
    pub id: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Opaque grouping key (the film this location belongs to), passed through
    pub group_key: String,
}

/// PointList is a collection of Points
pub type PointList = Vec<Point>;

impl Point {
    pub fn new(
        id: impl Into<String>,
        latitude: f64,
        longitude: f64,
        group_key: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            latitude,
            longitude,
            group_key: group_key.into(),
        }
    }

    /// Checks that both coordinates are finite and inside the lat/lon ranges
    pub fn has_valid_coordinates(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Bounds is an axis-aligned lat/lon box
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl Bounds {
    /// The degenerate box returned for empty input. It means "no bounds",
    /// never a real box at the equator/meridian crossing.
    pub const ZERO: Bounds = Bounds {
        north: 0.0,
        south: 0.0,
        east: 0.0,
        west: 0.0,
    };

    /// The whole Web Mercator world
    pub const WORLD: Bounds = Bounds {
        north: 90.0,
        south: -90.0,
        east: 180.0,
        west: -180.0,
    };

    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            north,
            south,
            east,
            west,
        }
    }

    pub fn is_degenerate(&self) -> bool {
        *self == Self::ZERO
    }
}

/// Viewport is what the map reports when a pan/zoom gesture settles
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
    pub zoom: f64,
}

impl Viewport {
    pub fn new(bounds: Bounds, zoom: f64) -> Self {
        Self {
            west: bounds.west,
            south: bounds.south,
            east: bounds.east,
            north: bounds.north,
            zoom: zoom.max(0.0),
        }
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.west, self.south, self.east, self.north)
    }
}
