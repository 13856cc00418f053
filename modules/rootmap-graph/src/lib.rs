pub mod arbiter;
pub mod bottleneck;
pub mod builder;
pub mod cascade;
pub mod cross_field;
pub mod dedup;
pub mod embedder;
pub mod graph;
pub mod leverage;
pub mod pipeline;
pub mod similarity;
pub mod testutil;

pub use arbiter::{ArbitrationOutcome, ClaudeArbiter, ClusterArbiter};
pub use builder::{build_graph, graph_stats, GraphStats};
pub use cascade::{CascadeOutcome, CascadeScorer};
pub use cross_field::cross_field_scores;
pub use bottleneck::bottleneck_scores;
pub use dedup::{fast_merge, Deduper, DedupStats};
pub use embedder::{TextEmbedder, VoyageEmbedder};
pub use graph::{EnablesView, GapGraph};
pub use leverage::{
    min_max_normalize, ComponentScores, LeverageRanker, LeverageRanking, LeverageWeights,
    RankedGap,
};
pub use pipeline::{AnalysisOptions, AnalysisReport, GraphPipeline};
pub use similarity::{find_duplicate_clusters, SimilarityMatrix, DEFAULT_SIMILARITY_THRESHOLD};
