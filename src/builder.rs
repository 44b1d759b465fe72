// (c) Copyright 2025 wayfinder contributors
// SPDX-License-Identifier: MIT

use crate::{Graph, Position, RawElement, Way};

/// Summary of anomalies encountered while building a [Graph].
///
/// None of these are errors - data clipped to a bounding box legitimately
/// contains short ways and references to nodes outside of the box.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BuildStats {
    /// Number of node elements added.
    pub nodes: usize,

    /// Number of ways stored in the graph. A way split at missing references
    /// is counted once for every stored piece.
    pub ways: usize,

    /// Number of discarded ways with fewer than 2 distinct consecutive references.
    pub invalid_ways: usize,

    /// Number of way references dropped for repeating the previous reference.
    pub duplicate_references: usize,

    /// Number of way references to nodes absent from the node set.
    pub dangling_references: usize,
}

/// Helper object used for converting [RawElements](RawElement) into a [Graph].
///
/// Nodes are added immediately, while ways are buffered until [GraphBuilder::finish],
/// so that elements may arrive in any order.
pub struct GraphBuilder<'a> {
    g: &'a mut Graph,
    pending_ways: Vec<(i64, Vec<i64>)>,
    stats: BuildStats,
}

impl<'a> GraphBuilder<'a> {
    /// Create a new graph builder, adding elements into `g`.
    pub fn new(g: &'a mut Graph) -> Self {
        Self {
            g,
            pending_ways: Vec::default(),
            stats: BuildStats::default(),
        }
    }

    /// Add all elements from the provided iterator.
    pub fn add_elements<I: IntoIterator<Item = RawElement>>(&mut self, elements: I) {
        elements.into_iter().for_each(|e| self.add_element(e));
    }

    pub fn add_element(&mut self, e: RawElement) {
        match e {
            RawElement::Node { id, lat, lon } => {
                self.g.set_node(id, Position::new(lat, lon));
                self.stats.nodes += 1;
            }

            RawElement::Way { id, mut refs } => {
                let original_len = refs.len();
                refs.dedup();
                if refs.len() < original_len {
                    log::debug!(
                        "way {}: dropped {} repeated reference(s)",
                        id,
                        original_len - refs.len()
                    );
                    self.stats.duplicate_references += original_len - refs.len();
                }

                if refs.len() < 2 {
                    log::debug!("discarding way {} with {} node(s)", id, refs.len());
                    self.stats.invalid_ways += 1;
                } else {
                    self.pending_ways.push((id, refs));
                }
            }
        }
    }

    /// Creates edges for all buffered ways, marks the graph as ready
    /// and returns the [BuildStats].
    pub fn finish(mut self) -> BuildStats {
        for (id, refs) in std::mem::take(&mut self.pending_ways) {
            self.add_way(id, &refs);
        }

        if self.stats.dangling_references > 0 {
            log::warn!(
                "skipped {} reference(s) to unknown nodes",
                self.stats.dangling_references
            );
        }
        log::debug!(
            "built graph with {} nodes and {} ways",
            self.g.len(),
            self.g.ways().len()
        );

        self.g.mark_ready();
        self.stats
    }

    /// Stores every run of known nodes of a way, and links consecutive nodes.
    /// A reference to an unknown node splits the way - no edge bridges the gap.
    fn add_way(&mut self, id: i64, refs: &[i64]) {
        let mut run: Vec<i64> = Vec::with_capacity(refs.len());

        for &node_id in refs {
            if self.g.contains(node_id) {
                run.push(node_id);
            } else {
                self.stats.dangling_references += 1;
                self.store_run(id, std::mem::take(&mut run));
            }
        }

        self.store_run(id, run);
    }

    fn store_run(&mut self, id: i64, nodes: Vec<i64>) {
        if nodes.len() < 2 {
            return;
        }

        nodes.windows(2).for_each(|pair| {
            self.g.add_edge(pair[0], pair[1]);
        });

        self.g.add_way(Way { id, nodes });
        self.stats.ways += 1;
    }
}

/// Add [RawElements](RawElement) to a [Graph], marking it as ready.
pub fn add_elements<I: IntoIterator<Item = RawElement>>(g: &mut Graph, elements: I) -> BuildStats {
    let mut b = GraphBuilder::new(g);
    b.add_elements(elements);
    b.finish()
}

/// Build a new [Graph] from [RawElements](RawElement).
pub fn build_graph<I: IntoIterator<Item = RawElement>>(elements: I) -> (Graph, BuildStats) {
    let mut g = Graph::new();
    let stats = add_elements(&mut g, elements);
    (g, stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: i64, lat: f64, lon: f64) -> RawElement {
        RawElement::Node { id, lat, lon }
    }

    fn way(id: i64, refs: &[i64]) -> RawElement {
        RawElement::Way {
            id,
            refs: refs.to_vec(),
        }
    }

    fn assert_symmetric(g: &Graph) {
        for n in g.iter() {
            for &other in &n.edges {
                assert!(
                    g.neighbors(other).contains(&n.id),
                    "edge {} -> {} has no counterpart",
                    n.id,
                    other
                );
            }
        }
    }

    #[test]
    fn builds_adjacency() {
        //   4
        //   │
        // 1─2─3
        let (g, stats) = build_graph([
            way(10, &[1, 2, 3]),
            node(1, 0.0, 0.0),
            node(2, 0.0, 1.0),
            node(3, 0.0, 2.0),
            node(4, 1.0, 1.0),
            way(11, &[2, 4]),
        ]);

        assert!(g.is_ready());
        assert_eq!(
            stats,
            BuildStats {
                nodes: 4,
                ways: 2,
                invalid_ways: 0,
                duplicate_references: 0,
                dangling_references: 0,
            }
        );
        assert_eq!(g.neighbors(1), &[2]);
        assert_eq!(g.neighbors(2), &[1, 3, 4]);
        assert_eq!(g.neighbors(3), &[2]);
        assert_eq!(g.neighbors(4), &[2]);
        assert_symmetric(&g);
    }

    #[test]
    fn collapses_duplicate_edges() {
        let (g, _) = build_graph([
            node(1, 0.0, 0.0),
            node(2, 0.0, 1.0),
            way(10, &[1, 2]),
            way(11, &[2, 1]),
            way(12, &[1, 1, 2]),
        ]);

        assert_eq!(g.neighbors(1), &[2]);
        assert_eq!(g.neighbors(2), &[1]);
        assert_eq!(g.ways().len(), 3);
        assert_eq!(g.ways()[2].nodes, vec![1, 2]);
    }

    #[test]
    fn drops_repeated_references() {
        let (g, stats) = build_graph([
            node(1, 0.0, 0.0),
            node(2, 0.0, 1.0),
            node(3, 0.0, 2.0),
            way(10, &[1, 2, 2, 3]),
            way(11, &[3, 3]),
        ]);

        assert_eq!(stats.duplicate_references, 2);
        assert_eq!(stats.invalid_ways, 1);
        assert_eq!(stats.ways, 1);
        assert_eq!(g.ways()[0].nodes, vec![1, 2, 3]);
        for pair in g.ways()[0].nodes.windows(2) {
            assert!(g.has_edge(pair[0], pair[1]));
        }
        assert!(!g.has_edge(2, 2));
        assert!(!g.has_edge(3, 3));
    }

    #[test]
    fn discards_degenerate_ways() {
        let (g, stats) = build_graph([
            node(1, 0.0, 0.0),
            node(2, 0.0, 1.0),
            way(10, &[]),
            way(11, &[1]),
        ]);

        assert_eq!(stats.invalid_ways, 2);
        assert_eq!(stats.ways, 0);
        assert!(g.ways().is_empty());
        assert!(g.iter().all(|n| n.edges.is_empty()));
    }

    #[test]
    fn splits_ways_at_dangling_references() {
        let (g, stats) = build_graph([
            node(1, 0.0, 0.0),
            node(2, 0.0, 1.0),
            node(4, 0.0, 3.0),
            node(5, 0.0, 4.0),
            way(10, &[99, 1, 2, 3, 4, 5]),
        ]);

        assert_eq!(stats.dangling_references, 2);
        assert_eq!(stats.ways, 2);
        assert_eq!(
            g.ways(),
            &[
                Way {
                    id: 10,
                    nodes: vec![1, 2]
                },
                Way {
                    id: 10,
                    nodes: vec![4, 5]
                },
            ]
        );
        assert!(g.has_edge(1, 2));
        assert!(!g.has_edge(2, 4));
        assert!(g.has_edge(4, 5));
        assert_symmetric(&g);
    }

    #[test]
    fn way_left_with_one_known_node_is_dropped() {
        let (g, stats) = build_graph([node(1, 0.0, 0.0), way(10, &[1, 2])]);

        assert_eq!(stats.dangling_references, 1);
        assert_eq!(stats.invalid_ways, 0);
        assert!(g.ways().is_empty());
        assert!(g.neighbors(1).is_empty());
    }

    #[test]
    fn adds_to_existing_graph() {
        let mut g = Graph::new();
        add_elements(&mut g, [node(1, 0.0, 0.0), node(2, 1.0, 0.0)]);
        add_elements(&mut g, [node(3, 2.0, 0.0), way(10, &[1, 2, 3])]);

        assert_eq!(g.len(), 3);
        assert!(g.has_edge(1, 2));
        assert!(g.has_edge(2, 3));
    }
}
