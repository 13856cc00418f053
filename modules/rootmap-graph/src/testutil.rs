//! Test doubles for the two collaborator boundaries, plus record factories.
//!
//! MockEmbedder returns registered vectors for known texts and a
//! deterministic hash-based vector (low similarity to everything) otherwise,
//! so tests control exactly which nodes cluster. MockArbiter replays a fixed
//! outcome; FailingArbiter exercises the failure→Distinct path.

use std::collections::HashMap;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::Utc;

use rootmap_common::{
    Edge, EdgeType, ExtractionMethod, Granularity, Node, NodeStatus, NodeType,
};

use crate::arbiter::{ArbitrationOutcome, ClusterArbiter};
use crate::embedder::TextEmbedder;

/// Standard embedding dimension for test vectors.
pub const TEST_EMBEDDING_DIM: usize = 64;

// ---------------------------------------------------------------------------
// MockEmbedder
// ---------------------------------------------------------------------------

/// Deterministic embedder. Registered texts get exact vectors; unmatched
/// texts get a unique hash-based vector.
pub struct MockEmbedder {
    vectors: HashMap<String, Vec<f32>>,
    dimension: usize,
}

impl MockEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            vectors: HashMap::new(),
            dimension,
        }
    }

    /// Register a text→vector mapping for controlled similarity.
    pub fn on_text(mut self, text: &str, vector: Vec<f32>) -> Self {
        self.vectors.insert(text.to_string(), vector);
        self
    }

    fn vector_for(&self, text: &str) -> Vec<f32> {
        self.vectors
            .get(text)
            .cloned()
            .unwrap_or_else(|| hash_vector(text, self.dimension))
    }
}

#[async_trait]
impl TextEmbedder for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.vector_for(text))
    }

    async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.vector_for(t)).collect())
    }
}

/// Deterministic unit vector derived from the text's hash.
fn hash_vector(text: &str, dimension: usize) -> Vec<f32> {
    use std::hash::{Hash, Hasher};
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    text.hash(&mut hasher);
    let seed = hasher.finish();

    let mut vector = vec![0.0f32; dimension];
    let mut state = seed;
    for value in vector.iter_mut() {
        // Simple LCG PRNG
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        *value = ((state >> 33) as f32 / u32::MAX as f32) * 2.0 - 1.0;
    }
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in vector.iter_mut() {
            *value /= norm;
        }
    }
    vector
}

// ---------------------------------------------------------------------------
// Arbiters
// ---------------------------------------------------------------------------

/// Replays one fixed outcome for every cluster.
pub struct MockArbiter {
    outcome: ArbitrationOutcome,
}

impl MockArbiter {
    pub fn new(outcome: ArbitrationOutcome) -> Self {
        Self { outcome }
    }
}

#[async_trait]
impl ClusterArbiter for MockArbiter {
    async fn arbitrate(&self, _members: &[Node]) -> Result<ArbitrationOutcome> {
        Ok(self.outcome.clone())
    }
}

/// Always errors, standing in for a timed-out or unreachable oracle.
pub struct FailingArbiter;

#[async_trait]
impl ClusterArbiter for FailingArbiter {
    async fn arbitrate(&self, _members: &[Node]) -> Result<ArbitrationOutcome> {
        Err(anyhow!("arbiter unavailable"))
    }
}

// ---------------------------------------------------------------------------
// Record factories
// ---------------------------------------------------------------------------

pub fn gap_node(id: &str, title: &str, fields: &[&str]) -> Node {
    Node {
        id: id.to_string(),
        node_type: NodeType::OpenProblem,
        granularity: Granularity::L2,
        title: title.to_string(),
        description: format!("{title} description"),
        fields: fields.iter().map(|f| f.to_string()).collect(),
        status: NodeStatus::Open,
        confidence: 0.7,
        sources: vec![],
        extraction_method: ExtractionMethod::LlmExtracted,
        suggested_parent: None,
        cross_field_ref: false,
        parent_id: None,
        children_ids: vec![],
        created_at: Utc::now(),
        last_validated: None,
    }
}

pub fn enables_edge(id: &str, source: &str, target: &str, strength: f64, confidence: f64) -> Edge {
    Edge {
        id: id.to_string(),
        edge_type: EdgeType::Enables,
        source_id: source.to_string(),
        target_id: target.to_string(),
        strength,
        confidence,
        mechanism: String::new(),
        evidence: vec![],
        extraction_method: ExtractionMethod::LlmExtracted,
        historically_preceded: false,
        created_at: Utc::now(),
    }
}
