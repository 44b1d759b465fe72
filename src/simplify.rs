// (c) Copyright 2025 wayfinder contributors
// SPDX-License-Identifier: MIT

use std::collections::HashSet;
use std::f64::consts::PI;

use crate::{Graph, Position};

/// Default tolerance of the [Simplifier]: a node is removed if the path through it
/// deviates from a straight line by less than π/8 (22.5°).
pub const DEFAULT_ANGLE_LIMIT: f64 = PI / 8.0;

/// Recommended number of passes for [Simplifier::simplify].
pub const DEFAULT_PASSES: usize = 5;

/// Simplifier reduces the number of nodes in a [Graph] by collapsing nearly-straight
/// intermediate nodes of [Ways](crate::Way).
///
/// A node is removed if and only if:
/// - it is an interior node of a way, and not the first or last node of any way,
/// - it has exactly two neighbors (junctions and dead-ends are preserved),
/// - the angle between the vectors to its two neighbors exceeds `π - angle_limit`.
///
/// The removed node is replaced by a direct edge between its neighbors,
/// thus connectivity of the graph is preserved.
///
/// Removing a node may straighten the angle at its neighbors; such nodes are
/// only picked up by a later pass. Use [Simplifier::simplify] for a fixed number of passes,
/// trading fidelity for running time, or [Simplifier::simplify_until_stable] to converge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Simplifier {
    /// Maximum deviation from a straight line (in radians) of a removable node.
    pub angle_limit: f64,
}

impl Default for Simplifier {
    fn default() -> Self {
        Self {
            angle_limit: DEFAULT_ANGLE_LIMIT,
        }
    }
}

impl Simplifier {
    pub fn new(angle_limit: f64) -> Self {
        Self { angle_limit }
    }

    /// Runs `passes` simplification passes and returns the total number of removed nodes.
    pub fn simplify(&self, g: &mut Graph, passes: usize) -> usize {
        let mut removed = 0;
        for i in 0..passes {
            let pass_removed = self.pass(g);
            log::debug!("simplification pass {}: removed {} node(s)", i + 1, pass_removed);
            removed += pass_removed;
        }
        removed
    }

    /// Runs simplification passes until a pass removes no nodes.
    /// Returns the total number of removed nodes and the number of passes run
    /// (including the final, empty one).
    pub fn simplify_until_stable(&self, g: &mut Graph) -> (usize, usize) {
        let mut removed = 0;
        let mut passes = 0;
        loop {
            let pass_removed = self.pass(g);
            passes += 1;
            log::debug!("simplification pass {}: removed {} node(s)", passes, pass_removed);
            if pass_removed == 0 {
                return (removed, passes);
            }
            removed += pass_removed;
        }
    }

    /// Runs a single simplification pass over all ways and returns the number of removed nodes.
    pub fn pass(&self, g: &mut Graph) -> usize {
        let terminals: HashSet<i64> = g
            .ways
            .iter()
            .flat_map(|w| w.nodes.first().into_iter().chain(w.nodes.last()))
            .cloned()
            .collect();

        let mut ways = std::mem::take(&mut g.ways);
        let mut removed: HashSet<i64> = HashSet::default();

        for way in ways.iter_mut() {
            if way.nodes.len() < 3 {
                continue;
            }

            // The predecessor of a candidate is the last node kept so far,
            // so after a removal the next node is measured against it.
            let nodes = std::mem::take(&mut way.nodes);
            let mut kept: Vec<i64> = Vec::with_capacity(nodes.len());
            kept.push(nodes[0]);

            for window in nodes.windows(2).skip(1) {
                let (candidate, next) = (window[0], window[1]);
                let prev = kept[kept.len() - 1];
                if !terminals.contains(&candidate) && self.try_remove(g, candidate, (prev, next)) {
                    removed.insert(candidate);
                } else {
                    kept.push(candidate);
                }
            }

            kept.push(nodes[nodes.len() - 1]);
            way.nodes = kept;
        }

        // A removed node might have also been interior to other ways
        if !removed.is_empty() {
            ways.iter_mut().for_each(|w| {
                w.nodes.retain(|id| !removed.contains(id));
                w.nodes.dedup();
            });
        }

        g.ways = ways;
        removed.len()
    }

    /// Removes a node, linking its two neighbors directly, if the node lies
    /// on a nearly-straight line between them. The neighbors must be the
    /// node's predecessor and successor in the way being scanned.
    fn try_remove(&self, g: &mut Graph, node_id: i64, siblings: (i64, i64)) -> bool {
        let (pos, s1, s2) = match g.get_node(node_id) {
            Some(n) if n.edges.len() == 2 => (n.pos, n.edges[0], n.edges[1]),
            _ => return false,
        };

        if (s1, s2) != siblings && (s2, s1) != siblings {
            return false;
        }

        let (p1, p2) = match (g.get_node(s1), g.get_node(s2)) {
            (Some(a), Some(b)) => (a.pos, b.pos),
            _ => return false,
        };

        match angle_between(pos, p1, p2) {
            Some(angle) if angle > PI - self.angle_limit => {
                g.remove_node(node_id);
                g.add_edge(s1, s2);
                log::trace!("collapsed node {} into edge {} - {}", node_id, s1, s2);
                true
            }
            _ => false,
        }
    }
}

/// Computes the angle (in radians) at `at` between vectors pointing towards `a` and `b`.
/// Returns `None` if either vector has zero length.
fn angle_between(at: Position, a: Position, b: Position) -> Option<f64> {
    let v1 = (a.lat - at.lat, a.lon - at.lon);
    let v2 = (b.lat - at.lat, b.lon - at.lon);

    let len1 = v1.0.hypot(v1.1);
    let len2 = v2.0.hypot(v2.1);
    if len1 == 0.0 || len2 == 0.0 {
        return None;
    }

    let cos = (v1.0 * v2.0 + v1.1 * v2.1) / (len1 * len2);
    Some(cos.clamp(-1.0, 1.0).acos())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{build_graph, RawElement};

    fn node(id: i64, lat: f64, lon: f64) -> RawElement {
        RawElement::Node { id, lat, lon }
    }

    fn way(id: i64, refs: &[i64]) -> RawElement {
        RawElement::Way {
            id,
            refs: refs.to_vec(),
        }
    }

    /// Straight chain 1─2─3─4─5.
    fn straight_chain() -> Graph {
        build_graph([
            node(1, 0.0, 0.0),
            node(2, 0.0, 1.0),
            node(3, 0.0, 2.0),
            node(4, 0.0, 3.0),
            node(5, 0.0, 4.0),
            way(10, &[1, 2, 3, 4, 5]),
        ])
        .0
    }

    fn connected(g: &Graph, from: i64, to: i64) -> bool {
        let mut seen = HashSet::from([from]);
        let mut stack = vec![from];
        while let Some(id) = stack.pop() {
            if id == to {
                return true;
            }
            for &n in g.neighbors(id) {
                if seen.insert(n) {
                    stack.push(n);
                }
            }
        }
        false
    }

    #[test]
    fn angle() {
        let at = Position::new(0.0, 0.0);
        let straight = angle_between(at, Position::new(0.0, -1.0), Position::new(0.0, 1.0));
        assert!((straight.unwrap() - PI).abs() < 1e-9);

        let right = angle_between(at, Position::new(1.0, 0.0), Position::new(0.0, 1.0));
        assert!((right.unwrap() - PI / 2.0).abs() < 1e-9);

        assert_eq!(angle_between(at, at, Position::new(0.0, 1.0)), None);
    }

    #[test]
    fn single_pass_collapses_straight_chain() {
        let mut g = straight_chain();

        let removed = Simplifier::default().pass(&mut g);

        assert_eq!(removed, 3);
        assert_eq!(g.ways()[0].nodes, vec![1, 5]);
        assert!(g.has_edge(1, 5));
        assert_eq!(g.len(), 2);
    }

    #[test]
    fn until_stable_converges() {
        let mut g = straight_chain();

        let (removed, passes) = Simplifier::default().simplify_until_stable(&mut g);

        assert_eq!(removed, 3);
        assert_eq!(passes, 2);
        assert_eq!(Simplifier::default().pass(&mut g), 0);
        assert_eq!(g.neighbors(1), &[5]);
        assert_eq!(g.neighbors(5), &[1]);
    }

    #[test]
    fn keeps_corners() {
        // 1─2
        //   │
        //   3
        let mut g = build_graph([
            node(1, 0.0, 0.0),
            node(2, 0.0, 1.0),
            node(3, -1.0, 1.0),
            way(10, &[1, 2, 3]),
        ])
        .0;

        assert_eq!(Simplifier::default().simplify(&mut g, DEFAULT_PASSES), 0);
        assert!(g.contains(2));
    }

    #[test]
    fn angle_limit_is_configurable() {
        // 2 is 30° off a straight line
        let mut g = build_graph([
            node(1, 0.0, 0.0),
            node(2, 0.0, 1.0),
            node(3, 0.5, 1.0 + 0.75_f64.sqrt()),
            way(10, &[1, 2, 3]),
        ])
        .0;

        assert_eq!(Simplifier::default().pass(&mut g), 0);
        assert_eq!(Simplifier::new(PI / 4.0).pass(&mut g), 1);
        assert!(g.has_edge(1, 3));
    }

    #[test]
    fn keeps_junctions_and_terminals() {
        //         6
        //         │
        // 1─2─3─4─5─7─8
        //
        // Way 10 ends at 4, way 11 starts at 4.
        // 5 is a junction, 8 is a dead end.
        let mut g = build_graph([
            node(1, 0.0, 0.0),
            node(2, 0.0, 1.0),
            node(3, 0.0, 2.0),
            node(4, 0.0, 3.0),
            node(5, 0.0, 4.0),
            node(6, 1.0, 4.0),
            node(7, 0.0, 5.0),
            node(8, 0.0, 6.0),
            way(10, &[1, 2, 3, 4]),
            way(11, &[4, 5, 7, 8]),
            way(12, &[5, 6]),
        ])
        .0;

        let degrees_before: Vec<(i64, usize)> =
            g.iter().map(|n| (n.id, n.edges.len())).collect();
        let terminals_before: Vec<(i64, i64)> = g
            .ways()
            .iter()
            .map(|w| (w.nodes[0], w.nodes[w.nodes.len() - 1]))
            .collect();

        Simplifier::default().simplify(&mut g, 10);

        // Only degree-2 nodes may disappear
        for (id, degree) in degrees_before {
            if degree != 2 {
                assert!(g.contains(id), "node {} with degree {} was removed", id, degree);
            }
        }

        // Way ends are untouched
        let terminals_after: Vec<(i64, i64)> = g
            .ways()
            .iter()
            .map(|w| (w.nodes[0], w.nodes[w.nodes.len() - 1]))
            .collect();
        assert_eq!(terminals_before, terminals_after);

        assert!(g.contains(4));
        assert!(g.contains(5));
        assert!(!g.contains(2));
        assert!(!g.contains(3));
        assert!(!g.contains(7));
        assert_eq!(g.ways()[0].nodes, vec![1, 4]);
        assert_eq!(g.ways()[1].nodes, vec![4, 5, 8]);
        assert_eq!(g.ways()[2].nodes, vec![5, 6]);
    }

    #[test]
    fn preserves_connectivity() {
        // A wiggly grid of ways, some straight, some not
        let mut elements = vec![];
        let mut id = 0;
        for i in 0..6 {
            for j in 0..6 {
                id += 1;
                let wiggle = if (i + j) % 3 == 0 { 0.3 } else { 0.0 };
                elements.push(node(id, i as f64 + wiggle, j as f64));
            }
        }
        for i in 0..6 {
            let row: Vec<i64> = (0..6).map(|j| i * 6 + j + 1).collect();
            let column: Vec<i64> = (0..6).map(|j| j * 6 + i + 1).collect();
            elements.push(way(100 + i, &row[..]));
            if i % 2 == 0 {
                elements.push(way(200 + i, &column[..]));
            }
        }
        let mut g = build_graph(elements).0;

        let ids: Vec<i64> = g.iter().map(|n| n.id).collect();
        let mut connected_before = vec![];
        for &a in &ids {
            for &b in &ids {
                if a < b && connected(&g, a, b) {
                    connected_before.push((a, b));
                }
            }
        }

        let (removed, _) = Simplifier::default().simplify_until_stable(&mut g);
        assert!(removed > 0);

        for (a, b) in connected_before {
            if g.contains(a) && g.contains(b) {
                assert!(connected(&g, a, b), "{} and {} got disconnected", a, b);
            }
        }

        // Consecutive way nodes remain adjacent
        for w in g.ways() {
            for pair in w.nodes.windows(2) {
                assert!(g.has_edge(pair[0], pair[1]));
            }
        }
    }

    #[test]
    fn removes_node_from_all_ways() {
        // Ways 10 and 11 overlap on 1─2─3
        let mut g = build_graph([
            node(1, 0.0, 0.0),
            node(2, 0.0, 1.0),
            node(3, 0.0, 2.0),
            node(9, 0.0, -1.0),
            way(10, &[9, 1, 2, 3]),
            way(11, &[3, 2, 1, 9]),
        ])
        .0;

        // 1 and 2 are interior to both ways
        Simplifier::default().simplify_until_stable(&mut g);

        assert_eq!(g.ways()[0].nodes, vec![9, 3]);
        assert_eq!(g.ways()[1].nodes, vec![3, 9]);
        assert!(g.has_edge(9, 3));
    }

    #[test]
    fn collapses_through_repeated_references() {
        let mut g = build_graph([
            node(1, 0.0, 0.0),
            node(2, 0.0, 1.0),
            node(3, 0.0, 2.0),
            way(10, &[1, 2, 2, 3]),
        ])
        .0;

        let (removed, _) = Simplifier::default().simplify_until_stable(&mut g);

        assert_eq!(removed, 1);
        assert!(!g.contains(2));
        assert_eq!(g.ways()[0].nodes, vec![1, 3]);
        assert!(g.has_edge(1, 3));
    }

    #[test]
    fn long_straight_way_collapses_in_one_pass() {
        let n = 2_000;
        let mut elements: Vec<RawElement> =
            (0..n).map(|i| node(i, 0.0, i as f64)).collect();
        elements.push(way(10, &(0..n).collect::<Vec<i64>>()));
        let mut g = build_graph(elements).0;

        assert_eq!(Simplifier::default().pass(&mut g), (n - 2) as usize);
        assert_eq!(g.ways()[0].nodes, vec![0, n - 1]);
        assert_eq!(g.neighbors(0), &[n - 1]);
    }

    #[test]
    fn skips_coincident_nodes() {
        let mut g = build_graph([
            node(1, 0.0, 0.0),
            node(2, 0.0, 1.0),
            node(3, 0.0, 1.0),
            node(4, 0.0, 2.0),
            way(10, &[1, 2, 3, 4]),
        ])
        .0;

        assert_eq!(Simplifier::default().simplify(&mut g, DEFAULT_PASSES), 0);
        assert_eq!(g.len(), 4);
    }
}
