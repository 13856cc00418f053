//! Cross-field leverage: how far a node's resolution would reach into other
//! scientific domains, discounted by path strength and confidence.

use std::collections::{HashMap, HashSet, VecDeque};

use rayon::prelude::*;

use crate::graph::EnablesView;

/// Score every node by weighted BFS over the restricted view. Origins are
/// independent, so they run in parallel.
pub fn cross_field_scores(view: &EnablesView) -> HashMap<String, f64> {
    (0..view.len())
        .into_par_iter()
        .map(|start| (view.node_id(start).to_string(), reach_score(view, start)))
        .collect()
}

/// BFS from `start`, carrying a multiplicative path weight. Each node is
/// visited at most once — the first-reached weight wins, so the score is not
/// simply proportional to reachable-subgraph size. Domains the origin
/// already carries never count.
fn reach_score(view: &EnablesView, start: usize) -> f64 {
    let start_domains: HashSet<&str> = view.domains(start).iter().map(String::as_str).collect();

    let mut reachable: HashMap<&str, f64> = HashMap::new();
    let mut visited = vec![false; view.len()];
    visited[start] = true;

    let mut queue: VecDeque<(usize, f64)> = VecDeque::new();
    queue.push_back((start, 1.0));

    while let Some((node, weight)) = queue.pop_front() {
        for &(next, edge_weight) in view.out(node) {
            if visited[next] {
                continue;
            }
            visited[next] = true;
            let path_weight = weight * edge_weight;
            for domain in view.domains(next) {
                if !start_domains.contains(domain.as_str()) {
                    let entry = reachable.entry(domain.as_str()).or_insert(0.0);
                    if path_weight > *entry {
                        *entry = path_weight;
                    }
                }
            }
            queue.push_back((next, path_weight));
        }
    }

    reachable.values().sum()
}
