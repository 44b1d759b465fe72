// (c) Copyright 2025 wayfinder contributors
// SPDX-License-Identifier: MIT

use std::collections::{BinaryHeap, HashMap, HashSet};
use std::sync::atomic::{self, AtomicBool};
use std::sync::Arc;

use super::{Heuristic, SearchError, DEFAULT_YIELD_EVERY};
use crate::{euclidean_distance, Graph};

#[derive(Debug, Clone, Copy)]
struct QueueItem {
    at: i64,
    cost: f64,
    score: f64,

    /// Order in which `at` first entered the open set; kept when `at` is improved.
    seq: u64,
}

impl PartialEq for QueueItem {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other).is_eq()
    }
}

impl Eq for QueueItem {}

impl PartialOrd for QueueItem {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueItem {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // NOTE: We revert the order of comparison,
        // as lower scores (and nodes opened earlier) are considered better ("higher"),
        // and Rust's BinaryHeap is a max-heap.
        other
            .score
            .total_cmp(&self.score)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// State of a [Search].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Created, no step was taken yet.
    Idle,

    /// Suspended between steps.
    Running,

    /// A path to the sink was found, see [Search::path].
    Found,

    /// All nodes reachable from the source were expanded without reaching the sink.
    Exhausted,

    /// The search was aborted through its [CancelToken].
    Cancelled,
}

impl Status {
    /// Returns true for terminal states, after which [Search::step] has no effect.
    pub fn is_finished(self) -> bool {
        matches!(self, Self::Found | Self::Exhausted | Self::Cancelled)
    }
}

/// When a [Search] concludes that a path has been found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Termination {
    /// Stop as soon as the sink is seen as a neighbor of the expanded node.
    /// Expands fewer nodes, but the path is not guaranteed to be the shortest one.
    #[default]
    OnDiscovery,

    /// Stop only once the sink is popped from the open set. With an admissible
    /// [Heuristic] the path is guaranteed to be the shortest one.
    OnExpansion,
}

/// Additional controls for running a [Search].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    /// Number of steps taken by [Search::resume] before handing control back to the caller.
    /// Zero is treated as one.
    pub yield_every: usize,

    pub termination: Termination,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            yield_every: DEFAULT_YIELD_EVERY,
            termination: Termination::default(),
        }
    }
}

/// Shared flag used to abort a [Search] at its next step.
///
/// Cancelling doesn't reset any search state written into the graph.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, atomic::Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(atomic::Ordering::Relaxed)
    }
}

/// Resumable [A* search](https://en.wikipedia.org/wiki/A*_search_algorithm)
/// between two nodes of a [Graph].
///
/// The search keeps the graph borrowed and records its progress in every node's
/// [SearchState](crate::SearchState), so that the graph can be rendered (through
/// [Search::graph]) between calls to [Search::step] or [Search::resume].
///
/// Edge costs are [euclidean distances](euclidean_distance) between node positions.
/// Among open nodes with the same `f` score, the one opened first is expanded first.
pub struct Search<'g, H: Heuristic> {
    g: &'g mut Graph,
    source: i64,
    sink: i64,
    heuristic: H,
    options: SearchOptions,
    queue: BinaryHeap<QueueItem>,
    /// Open node ids, with the sequence number of their opening.
    open: HashMap<i64, u64>,
    closed: HashSet<i64>,
    status: Status,
    steps: u64,
    seq: u64,
    cancel: CancelToken,
    path: Vec<i64>,
}

impl<'g, H: Heuristic> Search<'g, H> {
    /// Prepares a search from `source` to `sink`, resetting the search state of all nodes.
    pub fn new(
        g: &'g mut Graph,
        source: i64,
        sink: i64,
        heuristic: H,
        options: SearchOptions,
    ) -> Result<Self, SearchError> {
        if !g.is_ready() {
            return Err(SearchError::NotInitialized);
        }
        for id in [source, sink] {
            if !g.contains(id) {
                return Err(SearchError::UnknownNode(id));
            }
        }

        g.reset_search_state();

        let mut search = Self {
            g,
            source,
            sink,
            heuristic,
            options,
            queue: BinaryHeap::default(),
            open: HashMap::default(),
            closed: HashSet::default(),
            status: Status::Idle,
            steps: 0,
            seq: 0,
            cancel: CancelToken::default(),
            path: Vec::default(),
        };
        search.open_node(source, 0.0, None);
        Ok(search)
    }

    /// Replaces the [CancelToken] checked by this search.
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Returns a handle which can be used to abort this search, also from another thread.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Aborts the search. Has no effect on finished searches.
    pub fn cancel(&mut self) {
        self.cancel.cancel();
        if !self.status.is_finished() {
            self.status = Status::Cancelled;
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// Returns the number of steps taken so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Returns the searched graph, e.g. for rendering intermediate state.
    pub fn graph(&self) -> &Graph {
        &*self.g
    }

    pub fn source(&self) -> i64 {
        self.source
    }

    pub fn sink(&self) -> i64 {
        self.sink
    }

    /// Returns true if the node is in the open set (the search frontier).
    pub fn is_open(&self, id: i64) -> bool {
        self.open.contains_key(&id)
    }

    /// Returns true if the node is in the closed set (was expanded).
    pub fn is_closed(&self, id: i64) -> bool {
        self.closed.contains(&id)
    }

    /// Returns the found path, from source to sink, or `None` unless [Status::Found].
    pub fn path(&self) -> Option<&[i64]> {
        match self.status {
            Status::Found => Some(&self.path),
            _ => None,
        }
    }

    /// Returns the cost of the found path, or `None` unless [Status::Found].
    pub fn path_cost(&self) -> Option<f64> {
        match self.status {
            Status::Found => self.g.get_node(self.sink).map(|n| n.search.g),
            _ => None,
        }
    }

    /// Consumes the search, returning the found path.
    pub fn into_path(self) -> Option<Vec<i64>> {
        match self.status {
            Status::Found => Some(self.path),
            _ => None,
        }
    }

    /// Runs [SearchOptions::yield_every] steps, or fewer if the search finishes.
    /// Returns [Status::Running] if the search was suspended.
    pub fn resume(&mut self) -> Status {
        for _ in 0..self.options.yield_every.max(1) {
            if self.step().is_finished() {
                break;
            }
        }
        self.status
    }

    /// Runs the search to completion.
    pub fn run(&mut self) -> Status {
        while !self.resume().is_finished() {}
        self.status
    }

    /// Expands a single node - the open node with the lowest `f` score.
    pub fn step(&mut self) -> Status {
        if self.status.is_finished() {
            return self.status;
        }
        if self.cancel.is_cancelled() {
            log::debug!("search {} -> {} cancelled", self.source, self.sink);
            self.status = Status::Cancelled;
            return self.status;
        }

        self.status = Status::Running;
        self.steps += 1;

        let q = match self.pop_open() {
            Some(q) => q,
            None => {
                log::debug!(
                    "search {} -> {}: no path after {} steps",
                    self.source,
                    self.sink,
                    self.steps
                );
                self.status = Status::Exhausted;
                return self.status;
            }
        };

        self.closed.insert(q);
        let (q_pos, q_cost, neighbors) = match self.g.get_node_mut(q) {
            Some(node) => {
                node.search.completed = true;
                (node.pos, node.search.g, node.edges.clone())
            }
            None => return self.status,
        };
        log::trace!("expanding {} (g = {})", q, q_cost);

        if q == self.sink {
            return self.finish_found();
        }

        for neighbor_id in neighbors {
            // Check if the referred node exists
            let neighbor_pos = match self.g.get_node(neighbor_id) {
                Some(n) => n.pos,
                None => continue,
            };
            let cost = q_cost + euclidean_distance(q_pos, neighbor_pos);

            if neighbor_id == self.sink && self.options.termination == Termination::OnDiscovery {
                self.open_node(neighbor_id, cost, Some(q));
                return self.finish_found();
            }

            if self.closed.contains(&neighbor_id) {
                continue;
            }

            if !self.open.contains_key(&neighbor_id) {
                self.open_node(neighbor_id, cost, Some(q));
            } else {
                self.improve_node(neighbor_id, cost, q);
            }
        }

        self.status
    }

    /// Adds a node to the open set.
    fn open_node(&mut self, id: i64, cost: f64, pred: Option<i64>) {
        let h = match self.g.get_node(id) {
            Some(n) => self.heuristic.estimate(n),
            None => return,
        };

        if let Some(node) = self.g.get_node_mut(id) {
            node.search.g = cost;
            node.search.h = h;
            node.search.pred = pred;
            node.search.touched = true;
            node.search.last_touched = Some(self.steps);
        }

        self.seq += 1;
        self.open.insert(id, self.seq);
        self.push(id, cost, cost + h);
    }

    /// Updates the cost of an open node, if `cost` is better than the known one.
    /// The heuristic is not re-evaluated.
    fn improve_node(&mut self, id: i64, cost: f64, pred: i64) {
        let score = match self.g.get_node_mut(id) {
            Some(node) if cost < node.search.g => {
                node.search.g = cost;
                node.search.pred = Some(pred);
                node.search.f()
            }
            _ => return,
        };

        // The outdated queue item is skipped in pop_open
        self.push(id, cost, score);
    }

    /// Queues an open node, ranked among equal scores by when it was first opened.
    fn push(&mut self, at: i64, cost: f64, score: f64) {
        let seq = self.open.get(&at).copied().unwrap_or(self.seq);
        self.queue.push(QueueItem {
            at,
            cost,
            score,
            seq,
        });
    }

    /// Removes the best node from the open set.
    fn pop_open(&mut self) -> Option<i64> {
        while let Some(item) = self.queue.pop() {
            if self.closed.contains(&item.at) {
                continue;
            }

            let known_cost = self
                .g
                .get_node(item.at)
                .map(|n| n.search.g)
                .unwrap_or(f64::INFINITY);
            if item.cost > known_cost {
                continue;
            }

            self.open.remove(&item.at);
            return Some(item.at);
        }
        None
    }

    fn finish_found(&mut self) -> Status {
        self.status = Status::Found;
        self.path = self.reconstruct_path();
        log::debug!(
            "search {} -> {}: found path of {} nodes after {} steps",
            self.source,
            self.sink,
            self.path.len(),
            self.steps
        );
        self.status
    }

    /// Walks the `pred` links from the sink back to the source,
    /// marking every node as lying on the solution.
    fn reconstruct_path(&mut self) -> Vec<i64> {
        let mut path = vec![];
        let mut at = Some(self.sink);

        while let Some(id) = at {
            let node = match self.g.get_node_mut(id) {
                Some(node) => node,
                None => break,
            };
            node.search.on_solution = true;
            path.push(id);
            at = if id == self.source {
                None
            } else {
                node.search.pred
            };
        }

        path.reverse();
        path
    }
}

/// Uses the [A* algorithm](https://en.wikipedia.org/wiki/A*_search_algorithm)
/// to find a path between two nodes of the provided graph, running the [Search]
/// to completion with default [SearchOptions].
///
/// Returns `Ok(None)` if there is no path between the two nodes. In that case,
/// `pred` of the sink is left unset.
pub fn find_path<H: Heuristic>(
    g: &mut Graph,
    source: i64,
    sink: i64,
    heuristic: H,
) -> Result<Option<Vec<i64>>, SearchError> {
    let mut search = Search::new(g, source, sink, heuristic, SearchOptions::default())?;
    search.run();
    Ok(search.into_path())
}
