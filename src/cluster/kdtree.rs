//! Static 2-D tree over projected coordinates
//!
//! Coordinates are separated from nodes. Nodes hold only indices into the
//! coordinate slice, so query results index straight back into whatever list
//! the tree was built from.
//!
//! The cluster index keeps one tree over every loaded point and maps range
//! hits to the feature showing each point at the requested zoom.

/// Projected `[x, y]` coordinate
pub type Coord = [f64; 2];

/// K-D tree for box queries
pub struct KdTree {
    coords: Vec<Coord>,
    root: Option<Box<KdNode>>,
}

/// A node in the K-D tree
struct KdNode {
    /// Index of the coordinate associated with this node
    id: usize,
    /// Splitting axis: 0 for x, 1 for y
    axis: usize,
    left: Option<Box<KdNode>>,
    right: Option<Box<KdNode>>,
}

impl KdTree {
    /// Builds a balanced tree from the given coordinates
    ///
    /// Coordinates must be finite; the index filters its input before building.
    pub fn new(coords: Vec<Coord>) -> Self {
        let mut ids: Vec<usize> = (0..coords.len()).collect();
        let root = build(&coords, &mut ids, 0);
        Self { coords, root }
    }

    /// Finds all coordinates inside the box `[min, max]` (edges inclusive)
    pub fn range(&self, min: Coord, max: Coord, mut found: Vec<usize>) -> Vec<usize> {
        self.range_recursive(self.root.as_deref(), min, max, &mut found);
        found
    }

    fn range_recursive(&self, t: Option<&KdNode>, min: Coord, max: Coord, found: &mut Vec<usize>) {
        let Some(t) = t else {
            return;
        };

        let here = self.coords[t.id];
        if here[0] >= min[0] && here[0] <= max[0] && here[1] >= min[1] && here[1] <= max[1] {
            found.push(t.id);
        }
        // Left holds values <= pivot, right holds values >= pivot
        if min[t.axis] <= here[t.axis] {
            self.range_recursive(t.left.as_deref(), min, max, found);
        }
        if max[t.axis] >= here[t.axis] {
            self.range_recursive(t.right.as_deref(), min, max, found);
        }
    }
}

/// Builds a subtree by splitting at the median on alternating axes
fn build(coords: &[Coord], ids: &mut [usize], depth: usize) -> Option<Box<KdNode>> {
    if ids.is_empty() {
        return None;
    }

    let axis = depth % 2;
    let m = ids.len() / 2;
    ids.select_nth_unstable_by(m, |&a, &b| {
        coords[a][axis]
            .partial_cmp(&coords[b][axis])
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.cmp(&b))
    });

    let id = ids[m];
    let (left, rest) = ids.split_at_mut(m);
    let right = &mut rest[1..];

    Some(Box::new(KdNode {
        id,
        axis,
        left: build(coords, left, depth + 1),
        right: build(coords, right, depth + 1),
    }))
}

pub(crate) fn sq_dist(a: Coord, b: Coord) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    dx * dx + dy * dy
}
