//! Composite leverage ranking over the three graph metrics.

use std::collections::HashMap;

use anyhow::Result;
use serde::Serialize;
use tracing::info;

use rootmap_common::RootMapError;

use crate::bottleneck::bottleneck_scores;
use crate::cascade::{CascadeOutcome, CascadeScorer};
use crate::cross_field::cross_field_scores;
use crate::graph::GapGraph;

/// Min-max normalize a score map to [0,1]. All-equal inputs map to 0.0 for
/// every node rather than dividing by zero.
pub fn min_max_normalize(scores: &HashMap<String, f64>) -> HashMap<String, f64> {
    if scores.is_empty() {
        return HashMap::new();
    }
    let lo = scores.values().cloned().fold(f64::INFINITY, f64::min);
    let hi = scores.values().cloned().fold(f64::NEG_INFINITY, f64::max);
    if hi == lo {
        return scores.keys().map(|k| (k.clone(), 0.0)).collect();
    }
    scores
        .iter()
        .map(|(k, &v)| (k.clone(), (v - lo) / (hi - lo)))
        .collect()
}

/// Metric weights for the composite score. Must sum to 1.0.
#[derive(Debug, Clone, Copy)]
pub struct LeverageWeights {
    pub cascade: f64,
    pub cross_field: f64,
    pub bottleneck: f64,
}

impl LeverageWeights {
    pub fn new(cascade: f64, cross_field: f64, bottleneck: f64) -> Result<Self> {
        for (name, value) in [
            ("cascade", cascade),
            ("cross_field", cross_field),
            ("bottleneck", bottleneck),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(RootMapError::Validation(format!(
                    "{name} weight {value} outside [0, 1]"
                ))
                .into());
            }
        }
        let sum = cascade + cross_field + bottleneck;
        if (sum - 1.0).abs() > 1e-9 {
            return Err(
                RootMapError::Validation(format!("weights sum to {sum}, expected 1.0")).into(),
            );
        }
        Ok(Self {
            cascade,
            cross_field,
            bottleneck,
        })
    }
}

impl Default for LeverageWeights {
    fn default() -> Self {
        Self {
            cascade: 0.45,
            cross_field: 0.30,
            bottleneck: 0.25,
        }
    }
}

/// Normalized component breakdown for one ranked node.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ComponentScores {
    pub cascade: f64,
    pub cross_field: f64,
    pub bottleneck: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct RankedGap {
    pub node_id: String,
    pub leverage: f64,
    pub components: ComponentScores,
}

/// Full ranking plus cascade convergence metadata.
#[derive(Debug, Clone)]
pub struct LeverageRanking {
    pub ranked: Vec<RankedGap>,
    pub cascade_iterations: usize,
    pub cascade_converged: bool,
}

/// Runs the three scorers over one shared restricted view, normalizes each
/// metric independently, and composites them.
pub struct LeverageRanker {
    weights: LeverageWeights,
    cascade: CascadeScorer,
}

impl LeverageRanker {
    pub fn new(weights: LeverageWeights) -> Self {
        Self {
            weights,
            cascade: CascadeScorer::default(),
        }
    }

    pub fn with_cascade(mut self, cascade: CascadeScorer) -> Self {
        self.cascade = cascade;
        self
    }

    /// Rank all nodes descending by composite leverage. Ties keep graph
    /// insertion order (the sort is stable).
    pub fn rank(&self, graph: &GapGraph) -> LeverageRanking {
        let view = graph.enables_view();

        let CascadeOutcome {
            scores: cascade,
            iterations,
            converged,
        } = self.cascade.score(&view);
        let cross_field = cross_field_scores(&view);
        let bottleneck = bottleneck_scores(&view);

        let cascade_n = min_max_normalize(&cascade);
        let cross_field_n = min_max_normalize(&cross_field);
        let bottleneck_n = min_max_normalize(&bottleneck);

        let mut ranked: Vec<RankedGap> = view
            .ids()
            .iter()
            .map(|id| {
                let components = ComponentScores {
                    cascade: cascade_n.get(id).copied().unwrap_or(0.0),
                    cross_field: cross_field_n.get(id).copied().unwrap_or(0.0),
                    bottleneck: bottleneck_n.get(id).copied().unwrap_or(0.0),
                };
                let leverage = self.weights.cascade * components.cascade
                    + self.weights.cross_field * components.cross_field
                    + self.weights.bottleneck * components.bottleneck;
                RankedGap {
                    node_id: id.clone(),
                    leverage,
                    components,
                }
            })
            .collect();
        ranked.sort_by(|a, b| b.leverage.total_cmp(&a.leverage));

        info!(
            nodes = ranked.len(),
            cascade_iterations = iterations,
            cascade_converged = converged,
            "Leverage ranking complete"
        );

        LeverageRanking {
            ranked,
            cascade_iterations: iterations,
            cascade_converged: converged,
        }
    }
}

impl Default for LeverageRanker {
    fn default() -> Self {
        Self::new(LeverageWeights::default())
    }
}
