//! Pairwise cosine similarity and seed-based duplicate clustering.
//!
//! The full symmetric matrix is computed once and shared read-only across
//! all cluster-membership checks. Clustering is seeded, not transitive
//! closure: two nodes both similar to a seed land in its cluster even when
//! they are not similar to each other. Downstream merge semantics rely on
//! this narrower grouping.

use tracing::debug;

/// Cosine similarity threshold above which two candidate nodes are treated
/// as near-duplicates.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.85;

/// Floor applied to vector norms so zero vectors never divide by zero.
const NORM_EPSILON: f32 = 1e-10;

/// Dense symmetric cosine-similarity matrix over N embedding vectors.
pub struct SimilarityMatrix {
    n: usize,
    values: Vec<f32>,
}

impl SimilarityMatrix {
    /// Normalize every vector once, then fill the full N×N matrix.
    pub fn compute(embeddings: &[Vec<f32>]) -> Self {
        let n = embeddings.len();
        let normed: Vec<Vec<f32>> = embeddings.iter().map(|v| normalize(v)).collect();

        let mut values = vec![0.0f32; n * n];
        for i in 0..n {
            for j in i..n {
                let dot: f32 = normed[i]
                    .iter()
                    .zip(normed[j].iter())
                    .map(|(a, b)| a * b)
                    .sum();
                values[i * n + j] = dot;
                values[j * n + i] = dot;
            }
        }

        Self { n, values }
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.values[i * self.n + j] as f64
    }
}

fn normalize(vector: &[f32]) -> Vec<f32> {
    let norm = vector
        .iter()
        .map(|x| x * x)
        .sum::<f32>()
        .sqrt()
        .max(NORM_EPSILON);
    vector.iter().map(|x| x / norm).collect()
}

/// Group indices into duplicate clusters.
///
/// Scans nodes in input order; each node not yet claimed by a cluster seeds
/// one, collecting every node with similarity to the seed at or above
/// `threshold`. All members are marked so they do not seed further clusters.
/// Singletons (no neighbor above threshold) are not returned.
pub fn find_duplicate_clusters(sim: &SimilarityMatrix, threshold: f64) -> Vec<Vec<usize>> {
    let n = sim.len();
    let mut visited = vec![false; n];
    let mut clusters: Vec<Vec<usize>> = Vec::new();

    for i in 0..n {
        if visited[i] {
            continue;
        }
        let similar: Vec<usize> = (0..n)
            .filter(|&j| j != i && sim.get(i, j) >= threshold)
            .collect();
        if similar.is_empty() {
            continue;
        }

        let mut cluster = Vec::with_capacity(similar.len() + 1);
        cluster.push(i);
        cluster.extend(similar);
        for &idx in &cluster {
            visited[idx] = true;
        }
        clusters.push(cluster);
    }

    debug!(
        nodes = n,
        clusters = clusters.len(),
        threshold,
        "Similarity clustering complete"
    );
    clusters
}
