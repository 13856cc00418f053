use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Titles longer than this are truncated with an ellipsis, never rejected.
pub const MAX_TITLE_CHARS: usize = 200;

/// Evidence quotes are capped at this many characters.
pub const MAX_QUOTE_CHARS: usize = 500;

/// Provisional id for records arriving from extraction, replaced when a
/// record is promoted to a canonical graph.
pub fn provisional_id() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("temp_{}", &id[..8])
}

/// The domain of a dot-delimited field tag: everything before the first dot.
pub fn domain_of(tag: &str) -> &str {
    tag.split('.').next().unwrap_or(tag)
}

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    OpenProblem,
    CapabilityGap,
    DataGap,
    InfrastructureGap,
    TheoreticalGap,
    EngineeringBottleneck,
}

impl std::fmt::Display for NodeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeType::OpenProblem => write!(f, "open_problem"),
            NodeType::CapabilityGap => write!(f, "capability_gap"),
            NodeType::DataGap => write!(f, "data_gap"),
            NodeType::InfrastructureGap => write!(f, "infrastructure_gap"),
            NodeType::TheoreticalGap => write!(f, "theoretical_gap"),
            NodeType::EngineeringBottleneck => write!(f, "engineering_bottleneck"),
        }
    }
}

/// Claim scale, from civilizational goal (L0) down to concrete task (L3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Granularity {
    L0,
    L1,
    L2,
    L3,
}

impl std::fmt::Display for Granularity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Granularity::L0 => write!(f, "L0"),
            Granularity::L1 => write!(f, "L1"),
            Granularity::L2 => write!(f, "L2"),
            Granularity::L3 => write!(f, "L3"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    Open,
    PartiallyResolved,
    Resolved,
    Obsolete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    LlmExtracted,
    ExpertCurated,
    PatternMatched,
    CitationInferred,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Paper,
    Patent,
    Grant,
    CuratedList,
}

/// Directed dependency kinds. A→B reads "A enables B" / "A produces for B".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EdgeType {
    Enables,
    ProducesFor,
}

impl std::fmt::Display for EdgeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EdgeType::Enables => write!(f, "ENABLES"),
            EdgeType::ProducesFor => write!(f, "PRODUCES_FOR"),
        }
    }
}

// --- Provenance ---

/// One provenance record: where a claim was observed and the supporting passage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRef {
    pub source_type: SourceType,
    /// DOI, OpenAlex ID, patent number, grant number, or URL.
    pub source_id: String,
    #[serde(default)]
    pub evidence_quote: String,
}

// --- Node ---

/// A claimed scientific gap, problem, or bottleneck.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    #[serde(default = "provisional_id")]
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    pub granularity: Granularity,
    pub title: String,
    pub description: String,
    /// Dot-delimited domain tags, e.g. "materials_science.batteries".
    #[serde(default)]
    pub fields: Vec<String>,
    #[serde(default = "default_status")]
    pub status: NodeStatus,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    #[serde(default)]
    pub sources: Vec<SourceRef>,
    #[serde(default = "default_extraction_method")]
    pub extraction_method: ExtractionMethod,
    /// Extraction-time parent hint, resolved (or discarded) downstream.
    #[serde(default)]
    pub suggested_parent: Option<String>,
    /// Stub created when an edge pointed outside the known node set.
    #[serde(default)]
    pub cross_field_ref: bool,
    #[serde(default)]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub children_ids: Vec<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub last_validated: Option<DateTime<Utc>>,
}

fn default_status() -> NodeStatus {
    NodeStatus::Open
}

fn default_confidence() -> f64 {
    0.7
}

fn default_extraction_method() -> ExtractionMethod {
    ExtractionMethod::LlmExtracted
}

impl Node {
    /// Enforce record bounds in place: title ≤200 chars (ellipsis-truncated),
    /// evidence quotes ≤500 chars, confidence clamped to [0,1].
    pub fn normalize(&mut self) {
        self.title = clamp_title(&self.title);
        self.confidence = self.confidence.clamp(0.0, 1.0);
        for source in &mut self.sources {
            source.evidence_quote = clamp_chars(&source.evidence_quote, MAX_QUOTE_CHARS);
        }
    }

    /// Text handed to the embedding provider for dedup.
    pub fn embedding_text(&self) -> String {
        format!("{}. {}", self.title, self.description)
    }

    /// Unique top-level domains across this node's field tags, in tag order.
    pub fn domains(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        for tag in &self.fields {
            let domain = domain_of(tag);
            if !seen.contains(&domain) {
                seen.push(domain);
            }
        }
        seen
    }
}

// --- Edge ---

/// A directed, typed, weighted dependency between two nodes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    #[serde(default = "provisional_id")]
    pub id: String,
    #[serde(rename = "type")]
    pub edge_type: EdgeType,
    pub source_id: String,
    pub target_id: String,
    /// 1.0 = hard prerequisite.
    #[serde(default = "default_strength")]
    pub strength: f64,
    #[serde(default = "default_confidence")]
    pub confidence: f64,
    #[serde(default)]
    pub mechanism: String,
    #[serde(default)]
    pub evidence: Vec<SourceRef>,
    #[serde(default = "default_extraction_method")]
    pub extraction_method: ExtractionMethod,
    /// Historical-ordering annotation from extraction.
    #[serde(default)]
    pub historically_preceded: bool,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

fn default_strength() -> f64 {
    0.5
}

impl Edge {
    /// Combined traversal weight.
    pub fn weight(&self) -> f64 {
        self.strength * self.confidence
    }

    pub fn is_self_loop(&self) -> bool {
        self.source_id == self.target_id
    }

    /// Clamp probability-like fields and bound evidence quotes.
    pub fn normalize(&mut self) {
        self.strength = self.strength.clamp(0.0, 1.0);
        self.confidence = self.confidence.clamp(0.0, 1.0);
        for source in &mut self.evidence {
            source.evidence_quote = clamp_chars(&source.evidence_quote, MAX_QUOTE_CHARS);
        }
    }
}

fn clamp_title(title: &str) -> String {
    if title.chars().count() <= MAX_TITLE_CHARS {
        return title.to_string();
    }
    let mut truncated: String = title.chars().take(MAX_TITLE_CHARS - 3).collect();
    truncated.push_str("...");
    truncated
}

fn clamp_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        text.chars().take(max).collect()
    }
}
