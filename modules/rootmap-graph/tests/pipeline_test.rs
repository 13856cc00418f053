//! Full pipeline runs: candidate records with duplicates and dangling edges
//! in, ranked report out.

use std::sync::Arc;

use rootmap_graph::testutil::{enables_edge, gap_node, MockArbiter, MockEmbedder};
use rootmap_graph::{AnalysisOptions, ArbitrationOutcome, GraphPipeline};

/// Route pipeline logs through the test harness when RUST_LOG is set.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

#[tokio::test]
async fn duplicates_collapse_before_graph_build() {
    init_tracing();
    let a = {
        let mut n = gap_node("a", "Scalable qubit fabrication", &["quantum.1"]);
        n.confidence = 0.9;
        n
    };
    let a_dup = {
        let mut n = gap_node("a2", "Qubit fabrication at scale", &["quantum.1"]);
        n.confidence = 0.6;
        n
    };
    let b = gap_node("b", "Cryogenic control electronics", &["electronics.1"]);

    let embedder = MockEmbedder::new(2)
        .on_text(&a.embedding_text(), vec![1.0, 0.0])
        .on_text(&a_dup.embedding_text(), vec![0.95, 0.312])
        .on_text(&b.embedding_text(), vec![0.0, 1.0]);

    let edges = vec![
        enables_edge("e1", "a", "b", 0.8, 1.0),
        // References the merged-away duplicate; dropped at build.
        enables_edge("e2", "a2", "b", 0.8, 1.0),
        enables_edge("e3", "a", "nowhere", 1.0, 1.0),
    ];

    let pipeline = GraphPipeline::new(Arc::new(embedder));
    let report = pipeline
        .run(vec![a, a_dup, b], edges)
        .await
        .unwrap();

    assert_eq!(report.dedup.input_nodes, 3);
    assert_eq!(report.dedup.merged, 1);
    assert_eq!(report.stats.nodes, 2);
    assert_eq!(report.stats.edges, 1);

    // The enabler outranks the leaf once scored.
    assert_eq!(report.ranking.ranked[0].node_id, "a");
    assert!(report.ranking.cascade_converged);
}

#[tokio::test]
async fn hierarchy_outcome_flows_through_to_the_graph() {
    init_tracing();
    let parent = gap_node("p", "Broad synthesis gap", &["chem.1"]);
    let child = gap_node("c", "Narrow synthesis gap", &["chem.1"]);

    let embedder = MockEmbedder::new(2)
        .on_text(&parent.embedding_text(), vec![1.0, 0.0])
        .on_text(&child.embedding_text(), vec![0.95, 0.312]);

    let pipeline = GraphPipeline::new(Arc::new(embedder))
        .with_arbiter(Arc::new(MockArbiter::new(ArbitrationOutcome::Hierarchy)))
        .with_options(AnalysisOptions::default());

    let report = pipeline.run(vec![parent, child], vec![]).await.unwrap();

    assert_eq!(report.dedup.hierarchies, 1);
    assert_eq!(report.stats.nodes, 2);
    let built_parent = report.graph.node("p").unwrap();
    assert_eq!(built_parent.children_ids, vec!["c"]);
    let built_child = report.graph.node("c").unwrap();
    assert_eq!(built_child.parent_id.as_deref(), Some("p"));
}

#[tokio::test]
async fn empty_input_produces_empty_report() {
    init_tracing();
    let pipeline = GraphPipeline::new(Arc::new(MockEmbedder::new(8)));
    let report = pipeline.run(vec![], vec![]).await.unwrap();

    assert_eq!(report.stats.nodes, 0);
    assert!(report.ranking.ranked.is_empty());
}
