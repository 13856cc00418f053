//! Line-delimited JSON exchange format for node and edge records.
//!
//! One record per line, UTF-8, no surrounding array. Individual malformed
//! lines are logged and skipped; only an unreadable stream is fatal.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::types::{Edge, Node};

/// Write records to `path`, one JSON object per line. Creates parent
/// directories as needed.
pub fn save_records<T: Serialize>(items: &[T], path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut out = BufWriter::new(file);
    for item in items {
        let line = serde_json::to_string(item)?;
        writeln!(out, "{line}")?;
    }
    out.flush()?;
    debug!(records = items.len(), path = %path.display(), "Saved JSONL");
    Ok(())
}

/// Read records from `path`. Blank lines are ignored; lines that fail to
/// parse are logged and skipped.
pub fn load_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let reader = BufReader::new(file);

    let mut items = Vec::new();
    let mut skipped = 0usize;
    for (lineno, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("reading {}", path.display()))?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match serde_json::from_str(line) {
            Ok(item) => items.push(item),
            Err(e) => {
                warn!(line = lineno + 1, error = %e, path = %path.display(), "Record parse error, skipping");
                skipped += 1;
            }
        }
    }

    if skipped > 0 {
        warn!(skipped, loaded = items.len(), "Some records were skipped");
    }
    Ok(items)
}

/// Load nodes and enforce record bounds (title/quote truncation, clamping).
pub fn load_nodes(path: &Path) -> Result<Vec<Node>> {
    let mut nodes: Vec<Node> = load_records(path)?;
    for node in &mut nodes {
        node.normalize();
    }
    Ok(nodes)
}

/// Load edges and enforce record bounds.
pub fn load_edges(path: &Path) -> Result<Vec<Edge>> {
    let mut edges: Vec<Edge> = load_records(path)?;
    for edge in &mut edges {
        edge.normalize();
    }
    Ok(edges)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::*;
    use chrono::Utc;

    fn scratch_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("rootmap-jsonl-{}-{}", name, uuid::Uuid::new_v4()))
    }

    fn sample_node(id: &str) -> Node {
        Node {
            id: id.to_string(),
            node_type: NodeType::CapabilityGap,
            granularity: Granularity::L1,
            title: "Room-temperature superconductor synthesis".to_string(),
            description: "No reproducible route exists.".to_string(),
            fields: vec!["materials_science.superconductors".to_string()],
            status: NodeStatus::Open,
            confidence: 0.8,
            sources: vec![SourceRef {
                source_type: SourceType::Paper,
                source_id: "doi:10.1/xyz".to_string(),
                evidence_quote: "remains out of reach".to_string(),
            }],
            extraction_method: ExtractionMethod::LlmExtracted,
            suggested_parent: None,
            cross_field_ref: false,
            parent_id: None,
            children_ids: vec![],
            created_at: Utc::now(),
            last_validated: None,
        }
    }

    fn sample_edge(id: &str, source: &str, target: &str) -> Edge {
        Edge {
            id: id.to_string(),
            edge_type: EdgeType::Enables,
            source_id: source.to_string(),
            target_id: target.to_string(),
            strength: 0.9,
            confidence: 0.6,
            mechanism: "provides the substrate".to_string(),
            evidence: vec![],
            extraction_method: ExtractionMethod::LlmExtracted,
            historically_preceded: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn nodes_round_trip_field_values() {
        let path = scratch_path("nodes");
        let nodes = vec![sample_node("a"), sample_node("b")];
        save_records(&nodes, &path).unwrap();

        let loaded = load_nodes(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].id, nodes[0].id);
        assert_eq!(loaded[0].title, nodes[0].title);
        assert_eq!(loaded[0].fields, nodes[0].fields);
        assert_eq!(loaded[0].confidence, nodes[0].confidence);
        assert_eq!(loaded[0].sources, nodes[0].sources);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn edges_round_trip_field_values() {
        let path = scratch_path("edges");
        let edges = vec![sample_edge("e1", "a", "b")];
        save_records(&edges, &path).unwrap();

        let loaded = load_edges(&path).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].source_id, "a");
        assert_eq!(loaded[0].target_id, "b");
        assert_eq!(loaded[0].strength, 0.9);
        assert_eq!(loaded[0].edge_type, EdgeType::Enables);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn malformed_lines_are_skipped_not_fatal() {
        let path = scratch_path("mixed");
        let good = serde_json::to_string(&sample_node("good")).unwrap();
        std::fs::write(&path, format!("{good}\nnot json at all\n\n{good}\n")).unwrap();

        let loaded = load_nodes(&path).unwrap();
        assert_eq!(loaded.len(), 2);
        assert!(loaded.iter().all(|n| n.id == "good"));
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn missing_file_is_fatal() {
        let path = scratch_path("missing");
        assert!(load_nodes(&path).is_err());
    }

    #[test]
    fn defaults_fill_omitted_fields() {
        let path = scratch_path("sparse");
        std::fs::write(
            &path,
            r#"{"type":"data_gap","granularity":"L3","title":"t","description":"d"}"#,
        )
        .unwrap();

        let loaded = load_nodes(&path).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].confidence, 0.7);
        assert!(loaded[0].id.starts_with("temp_"));
        assert_eq!(loaded[0].status, NodeStatus::Open);
        std::fs::remove_file(&path).ok();
    }
}
