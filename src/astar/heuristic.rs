// (c) Copyright 2025 wayfinder contributors
// SPDX-License-Identifier: MIT

use crate::{euclidean_distance, Node, Position};

/// Estimator of the remaining cost from a node to the sink of a [Search](crate::Search).
///
/// Estimates must be non-negative. To guarantee shortest paths, they must also never
/// exceed the actual remaining cost; this is not checked.
///
/// Implemented for all `Fn(&Node) -> f64` closures.
pub trait Heuristic {
    fn estimate(&self, node: &Node) -> f64;
}

impl<F: Fn(&Node) -> f64> Heuristic for F {
    #[inline]
    fn estimate(&self, node: &Node) -> f64 {
        self(node)
    }
}

/// Heuristic which always estimates zero, turning A* into Dijkstra's algorithm.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ZeroHeuristic;

impl Heuristic for ZeroHeuristic {
    #[inline]
    fn estimate(&self, _: &Node) -> f64 {
        0.0
    }
}

/// Heuristic estimating the straight-line distance to a target position.
///
/// As edge costs are straight-line distances, this heuristic is admissible and consistent
/// when the target is the position of the sink.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StraightLine {
    pub target: Position,
}

impl StraightLine {
    pub fn towards(target: Position) -> Self {
        Self { target }
    }
}

impl Heuristic for StraightLine {
    #[inline]
    fn estimate(&self, node: &Node) -> f64 {
        euclidean_distance(node.pos, self.target)
    }
}
