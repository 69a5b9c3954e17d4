//! Zoom-level clustering index
//!
//! For every integer zoom between `min_zoom` and `max_zoom` the loaded points
//! are grouped into connected components: two points are linked when their
//! projected distance at that zoom is within the pixel radius, and links chain
//! transitively. Components with at least `min_points` members become
//! clusters; the rest are shown as single points. Zoom `max_zoom + 1` holds
//! every point on its own.
//!
//! The pixel radius halves in world units with each zoom step, so a component
//! at zoom `z + 1` always lies inside one component at zoom `z`.

use std::collections::{HashMap, HashSet};
use std::f64::consts::FRAC_1_SQRT_2;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use bitvec::prelude::*;
use log::{debug, warn};
use serde::Serialize;

use super::kdtree::{Coord, KdTree, sq_dist};
use super::options::ClusterOptions;
use super::point::{Bounds, Point, PointList};
use super::projection::{lat_y, lng_x, pixels_to_units, project, x_lng, y_lat};
use crate::error::{ClusterError, Result};

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

fn next_generation() -> u64 {
    NEXT_GENERATION.fetch_add(1, Ordering::Relaxed)
}

/// Identifies a cluster within one loaded point set
///
/// The generation changes on every [`ClusterIndex::load`], which makes ids
/// handed out before a reload detectably stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ClusterId {
    pub generation: u64,
    pub zoom: u8,
    pub index: u32,
}

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cluster-{}-{}-{}", self.generation, self.zoom, self.index)
    }
}

/// What a rendered feature stands for
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeatureKind {
    Cluster { id: ClusterId, point_count: usize },
    Point { id: String, group_key: String },
}

/// A marker to render: either a cluster at its centroid or a single point
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterFeature {
    pub longitude: f64,
    pub latitude: f64,
    #[serde(flatten)]
    pub kind: FeatureKind,
}

impl ClusterFeature {
    fn single(p: &Point) -> Self {
        Self {
            longitude: p.longitude,
            latitude: p.latitude,
            kind: FeatureKind::Point {
                id: p.id.clone(),
                group_key: p.group_key.clone(),
            },
        }
    }

    pub fn is_cluster(&self) -> bool {
        matches!(self.kind, FeatureKind::Cluster { .. })
    }

    /// Number of points in a cluster, `None` for a single point
    pub fn point_count(&self) -> Option<usize> {
        match self.kind {
            FeatureKind::Cluster { point_count, .. } => Some(point_count),
            FeatureKind::Point { .. } => None,
        }
    }

    pub fn cluster_id(&self) -> Option<ClusterId> {
        match self.kind {
            FeatureKind::Cluster { id, .. } => Some(id),
            FeatureKind::Point { .. } => None,
        }
    }

    /// Cluster id rendered as text, or the point id
    pub fn feature_id(&self) -> String {
        match &self.kind {
            FeatureKind::Cluster { id, .. } => id.to_string(),
            FeatureKind::Point { id, .. } => id.clone(),
        }
    }
}

/// Counts the locations a feature list represents
pub fn visible_point_count(features: &[ClusterFeature]) -> usize {
    features.iter().map(|f| f.point_count().unwrap_or(1)).sum()
}

struct ClusterNode {
    /// Mean of the members' projected coordinates
    coord: Coord,
    /// Point indices in input order
    members: Vec<usize>,
}

enum Entry {
    Cluster(u32),
    Point(usize),
}

struct Level {
    zoom: u8,
    clusters: Vec<ClusterNode>,
    /// Owning cluster per point, `None` for points shown alone
    owner: Vec<Option<u32>>,
    entries: Vec<Entry>,
    /// Position in `entries` of the feature showing each point
    slot: Vec<usize>,
}

/// ClusterIndex owns a point set and its per-zoom clusters
pub struct ClusterIndex {
    options: ClusterOptions,
    generation: u64,
    points: PointList,
    /// Projected positions of `points`
    tree: KdTree,
    levels: Vec<Level>,
}

impl Default for ClusterIndex {
    fn default() -> Self {
        Self::new(ClusterOptions::default())
    }
}

impl ClusterIndex {
    /// Creates an empty index
    pub fn new(options: ClusterOptions) -> Self {
        Self {
            options: options.normalized(),
            generation: next_generation(),
            points: Vec::new(),
            tree: KdTree::new(Vec::new()),
            levels: Vec::new(),
        }
    }

    /// Creates an index and loads the points into it
    pub fn with_points(options: ClusterOptions, points: PointList) -> Self {
        let mut index = Self::new(options);
        index.load(points);
        index
    }

    pub fn options(&self) -> &ClusterOptions {
        &self.options
    }

    /// Epoch tag carried by every cluster id from the current load
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Points accepted by the last load, in input order
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Replaces the point set and rebuilds every zoom level from scratch
    ///
    /// Points with non-finite or out-of-range coordinates are dropped. All
    /// cluster ids issued before this call become stale.
    pub fn load(&mut self, points: PointList) {
        let received = points.len();
        let points: PointList = points
            .into_iter()
            .filter(|p| {
                let ok = p.has_valid_coordinates();
                if !ok {
                    warn!(
                        "skipping point {} with invalid coordinates ({}, {})",
                        p.id, p.latitude, p.longitude
                    );
                }
                ok
            })
            .collect();

        let coords: Vec<Coord> = points
            .iter()
            .map(|p| project(p.latitude, p.longitude))
            .collect();
        let opts = &self.options;
        let levels: Vec<Level> = (opts.min_zoom..=opts.max_zoom + 1)
            .map(|zoom| build_level(&coords, opts, zoom))
            .collect();

        self.generation = next_generation();
        self.points = points;
        self.tree = KdTree::new(coords);
        self.levels = levels;

        debug!(
            "indexed {} of {} points over zoom {}..={} (generation {})",
            self.points.len(),
            received,
            self.options.min_zoom,
            self.options.max_zoom + 1,
            self.generation
        );
    }

    /// Integer level that `query` uses for a (possibly fractional) map zoom
    pub fn level_zoom(&self, zoom: f64) -> u8 {
        let min = self.options.min_zoom;
        let max = self.options.max_zoom + 1;
        if zoom.is_nan() {
            return min;
        }
        zoom.floor().clamp(f64::from(min), f64::from(max)) as u8
    }

    fn level(&self, zoom: u8) -> Option<&Level> {
        let offset = zoom.checked_sub(self.options.min_zoom)?;
        self.levels.get(usize::from(offset))
    }

    /// Returns the features showing the points that fall inside `bbox` at `zoom`
    ///
    /// A cluster is returned when any of its members is inside the box, even
    /// if its centroid is not. Longitudes wrap; a box at least 360° wide covers
    /// the whole world and a box with `west > east` is taken to cross the
    /// antimeridian.
    pub fn query(&self, bbox: &Bounds, zoom: f64) -> Vec<ClusterFeature> {
        if ![bbox.west, bbox.south, bbox.east, bbox.north]
            .iter()
            .all(|v| v.is_finite())
        {
            warn!("rejecting cluster query with non-finite bounds {bbox:?}");
            return Vec::new();
        }

        let Some(level) = self.level(self.level_zoom(zoom)) else {
            return Vec::new();
        };

        let mut min_lng = wrap_lng(bbox.west);
        let min_lat = bbox.south.clamp(-90.0, 90.0);
        let mut max_lng = if bbox.east == 180.0 {
            180.0
        } else {
            wrap_lng(bbox.east)
        };
        let max_lat = bbox.north.clamp(-90.0, 90.0);

        if bbox.east - bbox.west >= 360.0 {
            min_lng = -180.0;
            max_lng = 180.0;
        }

        let found = if min_lng > max_lng {
            let found = self.points_in(min_lng, min_lat, 180.0, max_lat, Vec::new());
            self.points_in(-180.0, min_lat, max_lng, max_lat, found)
        } else {
            self.points_in(min_lng, min_lat, max_lng, max_lat, Vec::new())
        };

        let mut slots: Vec<usize> = found.into_iter().map(|i| level.slot[i]).collect();
        slots.sort_unstable();
        slots.dedup();

        slots
            .into_iter()
            .map(|e| self.feature(level, &level.entries[e]))
            .collect()
    }

    /// Appends the indices of points inside the box to `found`
    fn points_in(
        &self,
        min_lng: f64,
        min_lat: f64,
        max_lng: f64,
        max_lat: f64,
        found: Vec<usize>,
    ) -> Vec<usize> {
        let min = [lng_x(min_lng), lat_y(max_lat)];
        let max = [lng_x(max_lng), lat_y(min_lat)];
        self.tree.range(min, max, found)
    }

    fn feature(&self, level: &Level, entry: &Entry) -> ClusterFeature {
        match *entry {
            Entry::Cluster(index) => {
                let node = &level.clusters[index as usize];
                ClusterFeature {
                    longitude: x_lng(node.coord[0]),
                    latitude: y_lat(node.coord[1]),
                    kind: FeatureKind::Cluster {
                        id: ClusterId {
                            generation: self.generation,
                            zoom: level.zoom,
                            index,
                        },
                        point_count: node.members.len(),
                    },
                }
            }
            Entry::Point(i) => ClusterFeature::single(&self.points[i]),
        }
    }

    /// Every loaded point as its own feature
    pub fn unclustered_features(&self) -> Vec<ClusterFeature> {
        self.points.iter().map(ClusterFeature::single).collect()
    }

    fn resolve(&self, id: ClusterId) -> Result<&ClusterNode> {
        if id.generation != self.generation {
            return Err(ClusterError::StaleCluster(id));
        }
        self.level(id.zoom)
            .and_then(|level| level.clusters.get(id.index as usize))
            .ok_or(ClusterError::StaleCluster(id))
    }

    /// Returns up to `limit` member points of a cluster
    ///
    /// Members always come back in input order, so the n-th leaf of a given
    /// cluster is the same point on every call.
    pub fn get_leaves(&self, id: ClusterId, limit: usize) -> Result<Vec<&Point>> {
        let node = self.resolve(id)?;
        Ok(node
            .members
            .iter()
            .take(limit)
            .map(|&i| &self.points[i])
            .collect())
    }

    /// Returns the features a cluster splits into one zoom level deeper
    pub fn get_children(&self, id: ClusterId) -> Result<Vec<ClusterFeature>> {
        let node = self.resolve(id)?;
        let next = self
            .level(id.zoom + 1)
            .ok_or(ClusterError::StaleCluster(id))?;

        let mut seen = HashSet::new();
        let mut children = Vec::new();
        for &m in &node.members {
            match next.owner[m] {
                Some(c) => {
                    if seen.insert(c) {
                        children.push(self.feature(next, &Entry::Cluster(c)));
                    }
                }
                None => children.push(self.feature(next, &Entry::Point(m))),
            }
        }

        Ok(children)
    }

    /// Returns the lowest zoom at which the cluster falls apart
    ///
    /// Members sitting on identical coordinates never split; for those the
    /// answer is `max_zoom + 1`, where nothing is clustered.
    pub fn get_expansion_zoom(&self, id: ClusterId) -> Result<u8> {
        let node = self.resolve(id)?;
        let first = node.members[0];
        let size = node.members.len();

        for zoom in id.zoom + 1..=self.options.max_zoom {
            let Some(level) = self.level(zoom) else {
                break;
            };
            match level.owner[first] {
                Some(c) if level.clusters[c as usize].members.len() == size => continue,
                _ => return Ok(zoom),
            }
        }

        Ok(self.options.max_zoom + 1)
    }
}

fn wrap_lng(lng: f64) -> f64 {
    if (-180.0..180.0).contains(&lng) {
        return lng;
    }
    (lng + 180.0).rem_euclid(360.0) - 180.0
}

fn build_level(coords: &[Coord], opts: &ClusterOptions, zoom: u8) -> Level {
    let groups = if zoom > opts.max_zoom {
        (0..coords.len()).map(|i| vec![i]).collect()
    } else {
        connected_groups(coords, pixels_to_units(opts.radius, opts.extent, zoom))
    };

    let mut clusters = Vec::new();
    let mut owner = vec![None; coords.len()];
    let mut entries = Vec::new();
    let mut slot = vec![0; coords.len()];

    for members in groups {
        if members.len() >= opts.min_points {
            let index = clusters.len() as u32;
            let n = members.len() as f64;
            let (sx, sy) = members
                .iter()
                .fold((0.0, 0.0), |(sx, sy), &m| (sx + coords[m][0], sy + coords[m][1]));

            for &m in &members {
                owner[m] = Some(index);
                slot[m] = entries.len();
            }
            entries.push(Entry::Cluster(index));
            clusters.push(ClusterNode {
                coord: [sx / n, sy / n],
                members,
            });
        } else {
            for m in members {
                slot[m] = entries.len();
                entries.push(Entry::Point(m));
            }
        }
    }

    Level {
        zoom,
        clusters,
        owner,
        entries,
        slot,
    }
}

/// Cell side as a fraction of the side whose diagonal equals `r`, leaving
/// room for rounding in `cell_key` at deep zooms
const CELL_SHRINK: f64 = 0.999;

/// Widens the cell distance cutoff, which only prunes candidates
const CELL_SLACK: f64 = 1.01;

type CellKey = (i64, i64);

/// Points sharing one grid square
struct Cell {
    key: CellKey,
    members: Vec<usize>,
}

fn cell_key(c: Coord, size: f64) -> CellKey {
    ((c[0] / size).floor() as i64, (c[1] / size).floor() as i64)
}

/// Splits points into groups linked by chains of hops no longer than `r`
///
/// Points are bucketed into square cells whose diagonal stays under `r`, so
/// everything in one cell is linked outright. Cells are then grown into
/// groups, checking point pairs only against cells up to two steps away.
/// Groups come out ordered by their first member; members are sorted.
pub(crate) fn connected_groups(coords: &[Coord], r: f64) -> Vec<Vec<usize>> {
    let size = r * FRAC_1_SQRT_2 * CELL_SHRINK;
    let mut grid: HashMap<CellKey, usize> = HashMap::new();
    let mut cells: Vec<Cell> = Vec::new();

    // Cells are numbered by their first member
    for (i, &c) in coords.iter().enumerate() {
        let key = cell_key(c, size);
        let at = *grid.entry(key).or_insert_with(|| {
            cells.push(Cell {
                key,
                members: Vec::new(),
            });
            cells.len() - 1
        });
        cells[at].members.push(i);
    }

    let mut visited = bitvec![0; cells.len()];
    let mut groups = Vec::new();

    for start in 0..cells.len() {
        if visited[start] {
            continue;
        }
        visited.set(start, true);

        let mut component = vec![start];
        // `component` grows while we walk it
        let mut j = 0;
        while j < component.len() {
            let here = &cells[component[j]];
            for dx in -2..=2 {
                for dy in -2..=2 {
                    let Some(&other) = grid.get(&(here.key.0 + dx, here.key.1 + dy)) else {
                        continue;
                    };
                    if !visited[other] && cells_linked(coords, here, &cells[other], size, r) {
                        visited.set(other, true);
                        component.push(other);
                    }
                }
            }
            j += 1;
        }

        let mut members: Vec<usize> = component
            .iter()
            .flat_map(|&c| cells[c].members.iter().copied())
            .collect();
        members.sort_unstable();
        groups.push(members);
    }

    groups
}

/// Checks whether any point of `a` lies within `r` of any point of `b`
fn cells_linked(coords: &[Coord], a: &Cell, b: &Cell, size: f64, r: f64) -> bool {
    let r2 = r * r;
    let lo = [b.key.0 as f64 * size, b.key.1 as f64 * size];

    a.members
        .iter()
        .map(|&i| coords[i])
        .filter(|&p| sq_dist_to_cell(p, lo, size) <= r2 * CELL_SLACK)
        .any(|p| b.members.iter().any(|&m| sq_dist(p, coords[m]) <= r2))
}

fn sq_dist_to_cell(p: Coord, lo: Coord, size: f64) -> f64 {
    let dx = (lo[0] - p[0]).max(p[0] - (lo[0] + size)).max(0.0);
    let dy = (lo[1] - p[1]).max(p[1] - (lo[1] + size)).max(0.0);
    dx * dx + dy * dy
}
