// (c) Copyright 2025 wayfinder contributors
// SPDX-License-Identifier: MIT

use std::collections::HashSet;

use crate::{Graph, SearchError};

/// Breadth-first "flame front" spreading over a [Graph] from one or more seed nodes.
///
/// Every [Wavefront::advance] touches one ring of nodes: it sets `touched` and records
/// the current tick in `last_touched` of every node on the front, so that a renderer
/// can fade out edges by their age. Unlike a [Search](crate::Search), there is no sink.
pub struct Wavefront<'g> {
    g: &'g mut Graph,
    front: Vec<i64>,
    tick: u64,
}

impl<'g> Wavefront<'g> {
    /// Prepares a wavefront starting at `seed`, clearing the `touched`
    /// and `last_touched` flags of all nodes.
    pub fn new(g: &'g mut Graph, seed: i64) -> Result<Self, SearchError> {
        if !g.is_ready() {
            return Err(SearchError::NotInitialized);
        }
        if !g.contains(seed) {
            return Err(SearchError::UnknownNode(seed));
        }

        for node in g.nodes.values_mut() {
            node.search.touched = false;
            node.search.last_touched = None;
        }

        Ok(Self {
            g,
            front: vec![seed],
            tick: 0,
        })
    }

    /// Adds another seed node to the front. Unknown and already touched nodes are ignored.
    pub fn push(&mut self, id: i64) {
        let untouched = self.g.get_node(id).is_some_and(|n| !n.search.touched);
        if untouched && !self.front.contains(&id) {
            self.front.push(id);
        }
    }

    /// Returns the nodes which will be touched by the next [Wavefront::advance].
    pub fn front(&self) -> &[i64] {
        &self.front
    }

    /// Returns the number of completed [Wavefront::advance] calls.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn is_done(&self) -> bool {
        self.front.is_empty()
    }

    pub fn graph(&self) -> &Graph {
        &*self.g
    }

    /// Touches every node on the front, and moves the front to their untouched neighbors.
    /// Returns the number of touched nodes.
    pub fn advance(&mut self) -> usize {
        if self.front.is_empty() {
            return 0;
        }

        self.tick += 1;
        let mut ring: Vec<i64> = Vec::with_capacity(self.front.len());

        for id in std::mem::take(&mut self.front) {
            if let Some(node) = self.g.get_node_mut(id) {
                if !node.search.touched {
                    node.search.touched = true;
                    node.search.last_touched = Some(self.tick);
                    ring.push(id);
                }
            }
        }

        let mut queued: HashSet<i64> = HashSet::default();
        for &id in &ring {
            for &neighbor_id in self.g.neighbors(id) {
                let untouched = self
                    .g
                    .get_node(neighbor_id)
                    .is_some_and(|n| !n.search.touched);
                if untouched && queued.insert(neighbor_id) {
                    self.front.push(neighbor_id);
                }
            }
        }

        ring.len()
    }

    /// Runs the wavefront until no untouched node is reachable.
    /// Returns the total number of touched nodes.
    pub fn run(&mut self) -> usize {
        let mut total = 0;
        while !self.is_done() {
            total += self.advance();
        }
        log::debug!("wavefront touched {} nodes in {} ticks", total, self.tick);
        total
    }
}
