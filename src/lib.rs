// (c) Copyright 2025 wayfinder contributors
// SPDX-License-Identifier: MIT

//! Road-network graphs built from geographic way/node data.
//!
//! Raw [elements](RawElement) are turned into an undirected [Graph] by the
//! [builder](crate::add_elements). The graph can be [simplified](Simplifier) in place,
//! collapsing nearly-straight intermediate nodes of ways while keeping junctions
//! and way ends intact. Shortest paths are found with an interruptible A* [Search],
//! which writes its progress into every node's [SearchState] so that an external
//! renderer can visualize the expansion while it happens.
//!
//! # Example
//!
//! ```
//! use wayfinder::{RawElement, Simplifier, StraightLine};
//!
//! let (mut g, _) = wayfinder::build_graph([
//!     RawElement::Node { id: 1, lat: 0.0, lon: 0.0 },
//!     RawElement::Node { id: 2, lat: 0.0, lon: 1.0 },
//!     RawElement::Node { id: 3, lat: 0.0, lon: 2.0 },
//!     RawElement::Way { id: 10, refs: vec![1, 2, 3] },
//! ]);
//!
//! Simplifier::default().simplify(&mut g, wayfinder::DEFAULT_PASSES);
//! assert!(g.get_node(2).is_none());
//!
//! let target = g.get_node(3).unwrap().pos;
//! let route = wayfinder::find_path(&mut g, 1, 3, StraightLine::towards(target))
//!     .expect("both nodes exist");
//! assert_eq!(route, Some(vec![1, 3]));
//! ```

mod astar;
mod builder;
mod distance;
mod graph;
mod kd;
mod simplify;
mod wavefront;

pub use astar::{
    find_path, CancelToken, Heuristic, Search, SearchError, SearchOptions, Status, StraightLine,
    Termination, ZeroHeuristic, DEFAULT_YIELD_EVERY,
};
pub use builder::{add_elements, build_graph, BuildStats, GraphBuilder};
pub use distance::{earth_distance, euclidean_distance};
pub use graph::Graph;
pub use kd::KDTree;
pub use simplify::{Simplifier, DEFAULT_ANGLE_LIMIT, DEFAULT_PASSES};
pub use wavefront::Wavefront;

use serde::Deserialize;

/// Geographic position, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Position {
    pub lat: f64,
    pub lon: f64,
}

impl Position {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Per-node state written by a [Search] (and partially by a [Wavefront]).
///
/// `touched`, `last_touched`, `completed` and `on_solution` are only read by
/// renderers; searches keep their own open and closed sets.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchState {
    /// Node through which the best known path from the source arrives.
    pub pred: Option<i64>,

    /// Cost of the best known path from the source.
    pub g: f64,

    /// Heuristic estimate of the remaining cost to the sink.
    pub h: f64,

    pub touched: bool,

    /// Step counter of the run at the moment the node was touched.
    pub last_touched: Option<u64>,

    /// The node was popped from the open set.
    pub completed: bool,

    /// The node lies on the reconstructed path.
    pub on_solution: bool,
}

impl SearchState {
    pub const INITIAL: Self = Self {
        pred: None,
        g: f64::INFINITY,
        h: 0.0,
        touched: false,
        last_touched: None,
        completed: false,
        on_solution: false,
    };

    /// Estimated total cost of a path through this node, `g + h`.
    #[inline]
    pub fn f(&self) -> f64 {
        self.g + self.h
    }
}

impl Default for SearchState {
    fn default() -> Self {
        Self::INITIAL
    }
}

/// Represents a vertex of the [Graph].
///
/// `edges` lists the ids of adjacent nodes. Each neighbor is listed at most once,
/// but, like in any graph edited in place, an id might not exist in the [Graph];
/// users must silently skip such entries.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: i64,
    pub pos: Position,
    pub edges: Vec<i64>,
    pub search: SearchState,
}

impl Node {
    pub fn new(id: i64, pos: Position) -> Self {
        Self {
            id,
            pos,
            edges: Vec::default(),
            search: SearchState::INITIAL,
        }
    }
}

/// Ordered polyline through the [Graph].
///
/// The first and last node are terminal and are never removed by the [Simplifier].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Way {
    pub id: i64,
    pub nodes: Vec<i64>,
}

impl Way {
    /// Returns true if `node_id` is the first or the last node of this way.
    pub fn is_terminal(&self, node_id: i64) -> bool {
        self.nodes.first() == Some(&node_id) || self.nodes.last() == Some(&node_id)
    }
}

/// Raw geographic element, as consumed by the [GraphBuilder].
///
/// Deserializes from objects tagged with `"type": "node"` or `"type": "way"`,
/// e.g. `{"type": "way", "id": 5, "refs": [1, 2, 3]}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RawElement {
    Node { id: i64, lat: f64, lon: f64 },
    Way { id: i64, refs: Vec<i64> },
}
