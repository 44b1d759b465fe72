// (c) Copyright 2025 wayfinder contributors
// SPDX-License-Identifier: MIT

use crate::{earth_distance, Graph, Position};

/// Static 2-d tree over node positions, answering "which node is closest to this point"
/// (e.g. a clicked point) in logarithmic time, as opposed to the linear scan
/// of [Graph::find_nearest_node].
///
/// Levels alternate between splitting on latitude (at the root) and on longitude.
/// Distances are [earth_distance], but pruning treats coordinates as planar, so
/// answers may be off near the 180° meridian, near the poles, or over very large areas.
///
/// Nodes removed from the graph after building (e.g. by the [Simplifier](crate::Simplifier))
/// are still returned, so build the tree after simplifying.
#[derive(Debug, Clone)]
pub struct KDTree {
    pivot: (i64, Position),
    left: Option<Box<KDTree>>,
    right: Option<Box<KDTree>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Axis {
    Lat,
    Lon,
}

impl Axis {
    fn of(self, p: Position) -> f64 {
        match self {
            Axis::Lat => p.lat,
            Axis::Lon => p.lon,
        }
    }

    fn next(self) -> Self {
        match self {
            Axis::Lat => Axis::Lon,
            Axis::Lon => Axis::Lat,
        }
    }

    /// Projects `p` onto the line `self = value`.
    fn project(self, p: Position, value: f64) -> Position {
        match self {
            Axis::Lat => Position::new(value, p.lon),
            Axis::Lon => Position::new(p.lat, value),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    id: i64,
    dist: f64,
}

impl KDTree {
    /// Finds the id of the node closest to the given position.
    pub fn find_nearest_node(&self, pos: Position) -> i64 {
        let (id, p) = self.pivot;
        let mut best = Candidate {
            id,
            dist: earth_distance(pos, p),
        };
        self.visit(pos, Axis::Lat, &mut best);
        best.id
    }

    fn visit(&self, pos: Position, axis: Axis, best: &mut Candidate) {
        let (id, p) = self.pivot;
        let dist = earth_distance(pos, p);
        if dist < best.dist {
            *best = Candidate { id, dist };
        }

        let split = axis.of(p);
        let (near, far) = if axis.of(pos) < split {
            (&self.left, &self.right)
        } else {
            (&self.right, &self.left)
        };

        if let Some(subtree) = near {
            subtree.visit(pos, axis.next(), best);
        }

        // Everything behind the split is at least as far as the split line itself
        if let Some(subtree) = far {
            if earth_distance(pos, axis.project(pos, split)) < best.dist {
                subtree.visit(pos, axis.next(), best);
            }
        }
    }

    /// Builds a k-d tree over all nodes of a [Graph].
    /// Returns `None` if the graph is empty.
    pub fn from_graph(g: &Graph) -> Option<Self> {
        let mut points: Vec<(i64, Position)> = g.iter().map(|n| (n.id, n.pos)).collect();
        Self::build(&mut points)
    }

    /// Builds a k-d tree from `(id, position)` pairs, reordering the slice in place.
    pub fn build(points: &mut [(i64, Position)]) -> Option<Self> {
        Self::build_level(points, Axis::Lat)
    }

    fn build_level(points: &mut [(i64, Position)], axis: Axis) -> Option<Self> {
        if points.is_empty() {
            return None;
        }

        let mid = points.len() / 2;
        points.select_nth_unstable_by(mid, |a, b| axis.of(a.1).total_cmp(&axis.of(b.1)));

        let (below, rest) = points.split_at_mut(mid);
        let (pivot, above) = rest.split_first_mut()?;
        Some(Self {
            pivot: *pivot,
            left: Self::build_level(below, axis.next()).map(Box::new),
            right: Self::build_level(above, axis.next()).map(Box::new),
        })
    }
}
