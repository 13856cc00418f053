//! Weighted betweenness centrality over the restricted view (Brandes).
//!
//! Edge distance is the inverse of strength×confidence, so strong confident
//! dependencies read as short paths and nodes sitting on many strong
//! dependency chains score high.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use rayon::prelude::*;

use crate::graph::EnablesView;

/// Floor for the strength×confidence product before inversion.
const WEIGHT_EPSILON: f64 = 1e-6;

/// Betweenness score per node, normalized by `(n-1)(n-2)` for n > 2.
/// A view with no edges yields all zeros.
pub fn bottleneck_scores(view: &EnablesView) -> HashMap<String, f64> {
    let n = view.len();
    if n == 0 {
        return HashMap::new();
    }
    if view.edge_count() == 0 {
        return view.ids().iter().map(|id| (id.clone(), 0.0)).collect();
    }

    // Distance adjacency: shorter = stronger dependency.
    let distances: Vec<Vec<(usize, f64)>> = (0..n)
        .map(|u| {
            view.out(u)
                .iter()
                .map(|&(v, weight)| (v, 1.0 / weight.max(WEIGHT_EPSILON)))
                .collect()
        })
        .collect();

    // Each source accumulates into a private partial, merged at the end.
    let accumulated: Vec<f64> = (0..n)
        .into_par_iter()
        .fold(
            || vec![0.0f64; n],
            |mut partial, source| {
                accumulate_from_source(&distances, source, &mut partial);
                partial
            },
        )
        .reduce(
            || vec![0.0f64; n],
            |mut a, b| {
                for (x, y) in a.iter_mut().zip(b) {
                    *x += y;
                }
                a
            },
        );

    let scale = if n > 2 {
        1.0 / ((n - 1) as f64 * (n - 2) as f64)
    } else {
        1.0
    };

    view.ids()
        .iter()
        .enumerate()
        .map(|(i, id)| (id.clone(), accumulated[i] * scale))
        .collect()
}

/// One Brandes pass: Dijkstra from `source` with shortest-path counting,
/// then dependency accumulation in reverse settle order.
fn accumulate_from_source(distances: &[Vec<(usize, f64)>], source: usize, partial: &mut [f64]) {
    let n = distances.len();

    let mut dist = vec![f64::INFINITY; n];
    let mut sigma = vec![0.0f64; n];
    let mut preds: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut settled = vec![false; n];
    let mut order: Vec<usize> = Vec::new();

    let mut heap = BinaryHeap::new();
    dist[source] = 0.0;
    sigma[source] = 1.0;
    heap.push(HeapEntry {
        dist: 0.0,
        node: source,
    });

    while let Some(HeapEntry { dist: d, node: v }) = heap.pop() {
        if settled[v] {
            continue;
        }
        settled[v] = true;
        order.push(v);

        for &(w, cost) in &distances[v] {
            if settled[w] {
                continue;
            }
            let candidate = d + cost;
            if candidate < dist[w] {
                dist[w] = candidate;
                sigma[w] = sigma[v];
                preds[w].clear();
                preds[w].push(v);
                heap.push(HeapEntry {
                    dist: candidate,
                    node: w,
                });
            } else if candidate == dist[w] {
                sigma[w] += sigma[v];
                preds[w].push(v);
            }
        }
    }

    let mut delta = vec![0.0f64; n];
    for &w in order.iter().rev() {
        if sigma[w] == 0.0 {
            continue;
        }
        let coefficient = (1.0 + delta[w]) / sigma[w];
        for &v in &preds[w] {
            delta[v] += sigma[v] * coefficient;
        }
        if w != source {
            partial[w] += delta[w];
        }
    }
}

/// Min-heap entry ordered by distance.
#[derive(Debug, Clone, Copy)]
struct HeapEntry {
    dist: f64,
    node: usize,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.dist == other.dist && self.node == other.node
    }
}

impl Eq for HeapEntry {}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: BinaryHeap is a max-heap, we want the nearest node.
        other
            .dist
            .total_cmp(&self.dist)
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_graph;
    use crate::testutil::{enables_edge, gap_node};

    #[test]
    fn edgeless_graph_scores_all_zero() {
        let graph = build_graph(
            vec![gap_node("a", "A", &["x.1"]), gap_node("b", "B", &["x.1"])],
            vec![],
        );
        let scores = bottleneck_scores(&graph.enables_view());
        assert_eq!(scores.len(), 2);
        assert!(scores.values().all(|&v| v == 0.0));
    }

    #[test]
    fn middle_of_a_chain_carries_all_paths() {
        let graph = build_graph(
            vec![
                gap_node("a", "A", &["x.1"]),
                gap_node("b", "B", &["x.1"]),
                gap_node("c", "C", &["x.1"]),
            ],
            vec![
                enables_edge("e1", "a", "b", 1.0, 1.0),
                enables_edge("e2", "b", "c", 0.5, 0.8),
            ],
        );
        let scores = bottleneck_scores(&graph.enables_view());

        // Only the a→c pair routes through b; normalization is (n-1)(n-2)=2.
        assert!((scores["b"] - 0.5).abs() < 1e-9);
        assert_eq!(scores["a"], 0.0);
        assert_eq!(scores["c"], 0.0);
    }

    #[test]
    fn strong_route_beats_weak_direct_edge() {
        // a→d direct but weak (long distance); a→b→d strong. The detour is
        // shorter, so b lies on the a..d shortest path.
        let graph = build_graph(
            vec![
                gap_node("a", "A", &["x.1"]),
                gap_node("b", "B", &["x.1"]),
                gap_node("d", "D", &["x.1"]),
            ],
            vec![
                enables_edge("direct", "a", "d", 0.1, 1.0),
                enables_edge("via1", "a", "b", 1.0, 1.0),
                enables_edge("via2", "b", "d", 1.0, 1.0),
            ],
        );
        let scores = bottleneck_scores(&graph.enables_view());
        assert!(scores["b"] > 0.0);
    }

    #[test]
    fn equal_shortest_paths_split_credit() {
        // Two equally strong routes a→{b,c}→d: each intermediate carries
        // half of the single dependent pair.
        let graph = build_graph(
            vec![
                gap_node("a", "A", &["x.1"]),
                gap_node("b", "B", &["x.1"]),
                gap_node("c", "C", &["x.1"]),
                gap_node("d", "D", &["x.1"]),
            ],
            vec![
                enables_edge("e1", "a", "b", 1.0, 1.0),
                enables_edge("e2", "a", "c", 1.0, 1.0),
                enables_edge("e3", "b", "d", 1.0, 1.0),
                enables_edge("e4", "c", "d", 1.0, 1.0),
            ],
        );
        let scores = bottleneck_scores(&graph.enables_view());

        // (n-1)(n-2) = 6; each of b and c carries 0.5 of one pair.
        assert!((scores["b"] - 0.5 / 6.0).abs() < 1e-9);
        assert!((scores["c"] - 0.5 / 6.0).abs() < 1e-9);
        assert_eq!(scores["a"], 0.0);
        assert_eq!(scores["d"], 0.0);
    }
}
