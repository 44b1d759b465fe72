// (c) Copyright 2025 wayfinder contributors
// SPDX-License-Identifier: MIT

use crate::{earth_distance, euclidean_distance, Node, Position, SearchState, Way};
use std::collections::btree_map::{BTreeMap, Entry};

/// Represents a road network as a set of [Nodes](Node) with undirected edges
/// between them, and the [Ways](Way) those nodes were taken from.
///
/// A graph is "ready" once building has completed, see [Graph::mark_ready].
/// Searches refuse to run over graphs which are not ready.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Graph {
    pub(crate) nodes: BTreeMap<i64, Node>,
    pub(crate) ways: Vec<Way>,
    ready: bool,
}

impl Graph {
    /// Creates a new, empty graph which is not ready.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of nodes in the graph.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the graph has no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns true if building the graph has completed.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Marks the graph as completely built.
    ///
    /// [GraphBuilder](crate::GraphBuilder) does this automatically;
    /// graphs assembled by hand must call this before being searched.
    pub fn mark_ready(&mut self) {
        self.ready = true;
    }

    /// Returns an iterator over all [Nodes](Node) in the graph, ordered by id.
    pub fn iter(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Retrieves a [Node] with the provided id.
    pub fn get_node(&self, id: i64) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Retrieves a mutable [Node] with the provided id.
    ///
    /// Changing `edges` through the returned reference can break the symmetry
    /// of the adjacency lists; prefer [Graph::add_edge] and [Graph::remove_edge].
    pub fn get_node_mut(&mut self, id: i64) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    /// Returns true if a [Node] with the provided id exists.
    pub fn contains(&self, id: i64) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Creates a [Node] with the given id, or updates the position of an existing one.
    ///
    /// Edges of an existing node are preserved.
    pub fn set_node(&mut self, id: i64, pos: Position) {
        match self.nodes.entry(id) {
            Entry::Vacant(e) => {
                e.insert(Node::new(id, pos));
            }
            Entry::Occupied(mut e) => {
                e.get_mut().pos = pos;
            }
        }
    }

    /// Deletes a [Node] with a given `id`, together with all edges referencing it.
    pub fn remove_node(&mut self, id: i64) -> Option<Node> {
        let node = self.nodes.remove(&id)?;
        for neighbor_id in &node.edges {
            if let Some(neighbor) = self.nodes.get_mut(neighbor_id) {
                neighbor.edges.retain(|&e| e != id);
            }
        }
        Some(node)
    }

    /// Gets the ids of all nodes adjacent to the node with the given id.
    /// Returns an empty slice for unknown nodes.
    pub fn neighbors(&self, id: i64) -> &[i64] {
        self.nodes
            .get(&id)
            .map(|n| n.edges.as_slice())
            .unwrap_or_default()
    }

    /// Returns true if there is an edge between `a` and `b`.
    pub fn has_edge(&self, a: i64, b: i64) -> bool {
        self.neighbors(a).contains(&b)
    }

    /// Creates an undirected edge between two nodes.
    ///
    /// Returns false, without changing the graph, if either node doesn't exist,
    /// `a == b`, or the edge already exists.
    pub fn add_edge(&mut self, a: i64, b: i64) -> bool {
        if a == b || !self.contains(a) || !self.contains(b) || self.has_edge(a, b) {
            return false;
        }

        if let Some(node) = self.nodes.get_mut(&a) {
            node.edges.push(b);
        }
        if let Some(node) = self.nodes.get_mut(&b) {
            node.edges.push(a);
        }
        true
    }

    /// Removes the undirected edge between two nodes, if it exists.
    pub fn remove_edge(&mut self, a: i64, b: i64) {
        if let Some(node) = self.nodes.get_mut(&a) {
            node.edges.retain(|&e| e != b);
        }
        if let Some(node) = self.nodes.get_mut(&b) {
            node.edges.retain(|&e| e != a);
        }
    }

    /// Returns all [Ways](Way) of the graph.
    pub fn ways(&self) -> &[Way] {
        &self.ways
    }

    /// Stores a [Way]. Edges between its nodes are not created.
    pub fn add_way(&mut self, way: Way) {
        self.ways.push(way);
    }

    /// Resets the [SearchState] of every node to its initial values.
    pub fn reset_search_state(&mut self) {
        self.nodes
            .values_mut()
            .for_each(|n| n.search = SearchState::INITIAL);
    }

    /// Returns ids of all nodes lying on the last reconstructed solution path.
    pub fn solution(&self) -> Vec<i64> {
        self.nodes
            .values()
            .filter(|n| n.search.on_solution)
            .map(|n| n.id)
            .collect()
    }

    /// Sums up the cost of edges between consecutive nodes of `path`.
    /// Returns [f64::INFINITY] if any of the nodes doesn't exist or any consecutive pair
    /// is not connected.
    pub fn path_cost(&self, path: &[i64]) -> f64 {
        path.windows(2)
            .map(|pair| match (self.get_node(pair[0]), self.get_node(pair[1])) {
                (Some(a), Some(b)) if a.edges.contains(&b.id) => euclidean_distance(a.pos, b.pos),
                _ => f64::INFINITY,
            })
            .sum()
    }

    /// Finds the closest [Node] to the given position.
    ///
    /// This function requires computing the distance to every [Node] in the graph,
    /// and is not suitable for large graphs - use a [KDTree](crate::KDTree) instead.
    pub fn find_nearest_node(&self, pos: Position) -> Option<&Node> {
        self.nodes
            .values()
            .map(|nd| (earth_distance(pos, nd.pos), nd))
            .min_by(|(a_dist, _), (b_dist, _)| a_dist.total_cmp(b_dist))
            .map(|(_, nd)| nd)
    }
}
