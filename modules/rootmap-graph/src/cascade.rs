//! Iterative cascade propagation: importance flows backward along enabling
//! edges, so a node's score is driven by the importance of what it enables.
//!
//! Convergence is not guaranteed when many high-weight paths feed a cycle;
//! the loop stops at `max_iterations` and returns whatever values hold, with
//! the convergence flag exposed rather than hidden.

use std::collections::HashMap;

use rayon::prelude::*;
use tracing::debug;

use crate::graph::EnablesView;

pub const DEFAULT_MAX_ITERATIONS: usize = 100;
pub const DEFAULT_DAMPING: f64 = 0.85;
pub const DEFAULT_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Copy)]
pub struct CascadeScorer {
    pub max_iterations: usize,
    pub damping: f64,
    pub tolerance: f64,
}

impl Default for CascadeScorer {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            damping: DEFAULT_DAMPING,
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

/// Result of a cascade run: the last raw vector (unnormalized), how many
/// rounds ran, and whether the tolerance was reached.
#[derive(Debug, Clone)]
pub struct CascadeOutcome {
    pub scores: HashMap<String, f64>,
    pub iterations: usize,
    pub converged: bool,
}

impl CascadeScorer {
    /// Run the synchronous fixed-point iteration over the restricted view.
    ///
    /// Each round computes every node's raw score from the previous round's
    /// importance (the parallel collect is the round barrier), then updates
    /// all importances simultaneously.
    pub fn score(&self, view: &EnablesView) -> CascadeOutcome {
        let n = view.len();
        if n == 0 {
            return CascadeOutcome {
                scores: HashMap::new(),
                iterations: 0,
                converged: true,
            };
        }

        let mut importance = vec![1.0f64; n];
        let mut prev_raw = vec![0.0f64; n];
        let mut iterations = 0usize;
        let mut converged = false;

        for _ in 0..self.max_iterations {
            iterations += 1;

            let raw: Vec<f64> = (0..n)
                .into_par_iter()
                .map(|u| {
                    view.out(u)
                        .iter()
                        .map(|&(v, weight)| weight * importance[v])
                        .sum()
                })
                .collect();

            importance = raw.par_iter().map(|&r| 1.0 + self.damping * r).collect();

            let delta = raw
                .iter()
                .zip(prev_raw.iter())
                .map(|(a, b)| (a - b).abs())
                .fold(0.0f64, f64::max);
            prev_raw = raw;

            if delta < self.tolerance {
                converged = true;
                break;
            }
        }

        debug!(iterations, converged, "Cascade scoring finished");

        let scores = view
            .ids()
            .iter()
            .cloned()
            .zip(prev_raw.iter().copied())
            .collect();
        CascadeOutcome {
            scores,
            iterations,
            converged,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_graph;
    use crate::testutil::{enables_edge, gap_node};

    fn two_chain() -> crate::graph::GapGraph {
        build_graph(
            vec![gap_node("a", "A", &["x.1"]), gap_node("b", "B", &["x.1"])],
            vec![enables_edge("e1", "a", "b", 1.0, 1.0)],
        )
    }

    #[test]
    fn empty_graph_converges_immediately() {
        let graph = build_graph(vec![], vec![]);
        let outcome = CascadeScorer::default().score(&graph.enables_view());
        assert!(outcome.scores.is_empty());
        assert_eq!(outcome.iterations, 0);
        assert!(outcome.converged);
    }

    #[test]
    fn chain_converges_to_downstream_importance() {
        let graph = two_chain();
        let outcome = CascadeScorer::default().score(&graph.enables_view());

        // b enables nothing, so raw[b] = 0 and importance[b] stays 1.0;
        // raw[a] settles at strength*confidence*importance[b] = 1.0.
        assert!(outcome.converged);
        assert_eq!(outcome.iterations, 2);
        assert!((outcome.scores["a"] - 1.0).abs() < 1e-9);
        assert_eq!(outcome.scores["b"], 0.0);
    }

    #[test]
    fn repeated_runs_are_deterministic() {
        let graph = two_chain();
        let view = graph.enables_view();
        let scorer = CascadeScorer::default();
        let first = scorer.score(&view);
        let second = scorer.score(&view);
        assert_eq!(first.iterations, second.iterations);
        assert_eq!(first.scores, second.scores);
    }

    #[test]
    fn single_cycle_contracts_to_fixed_point() {
        let graph = build_graph(
            vec![gap_node("a", "A", &["x.1"]), gap_node("b", "B", &["x.1"])],
            vec![
                enables_edge("e1", "a", "b", 1.0, 1.0),
                enables_edge("e2", "b", "a", 1.0, 1.0),
            ],
        );
        let outcome = CascadeScorer::default().score(&graph.enables_view());

        // raw* = 1 + damping*raw* → raw* = 1/(1-0.85)
        assert!(outcome.converged);
        let expected = 1.0 / (1.0 - DEFAULT_DAMPING);
        assert!((outcome.scores["a"] - expected).abs() < 1e-4);
        assert!((outcome.scores["b"] - expected).abs() < 1e-4);
    }

    #[test]
    fn amplifying_cycle_stops_at_max_iterations() {
        // Two parallel full-strength edges into a cycle give the iteration a
        // gain above 1/damping, so it cannot settle.
        let graph = build_graph(
            vec![gap_node("a", "A", &["x.1"]), gap_node("b", "B", &["x.1"])],
            vec![
                enables_edge("e1", "a", "b", 1.0, 1.0),
                enables_edge("e2", "a", "b", 1.0, 1.0),
                enables_edge("e3", "b", "a", 1.0, 1.0),
            ],
        );
        let scorer = CascadeScorer {
            max_iterations: 50,
            ..CascadeScorer::default()
        };
        let outcome = scorer.score(&graph.enables_view());

        assert!(!outcome.converged);
        assert_eq!(outcome.iterations, 50);
        assert!(outcome.scores.values().all(|v| v.is_finite()));
    }
}
