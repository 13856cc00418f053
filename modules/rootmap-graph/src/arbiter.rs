//! Cluster arbitration: decide whether a cluster of near-duplicate nodes is
//! one problem (MERGE), a granularity ladder (HIERARCHY), or genuinely
//! different claims (DISTINCT).
//!
//! The oracle's reply is free text that should contain a JSON object; parsing
//! is defensive and anything unusable degrades to `Distinct`, never `Merge`.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::debug;

use rootmap_common::{Config, Node};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_DECISION_TOKENS: u32 = 512;

/// Closed set of arbitration results. A MERGE may carry canonical text; when
/// the oracle omits it, the fast-merge base's own text is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArbitrationOutcome {
    Merge {
        title: Option<String>,
        description: Option<String>,
    },
    Hierarchy,
    Distinct,
}

/// Arbitration oracle boundary: given 2+ similar node summaries, pick an
/// outcome. Transport or parse failures surface as `Err` and are treated as
/// `Distinct` by the caller.
#[async_trait]
pub trait ClusterArbiter: Send + Sync {
    async fn arbitrate(&self, members: &[Node]) -> Result<ArbitrationOutcome>;
}

// --- Claude-backed arbiter ---

pub struct ClaudeArbiter {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl ClaudeArbiter {
    pub fn new(api_key: &str, model: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url: ANTHROPIC_API_URL.to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.anthropic_api_key, &config.arbiter_model)
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.to_string();
        self
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        headers.insert("x-api-key", HeaderValue::from_str(&self.api_key)?);
        headers.insert(
            "anthropic-version",
            HeaderValue::from_static(ANTHROPIC_VERSION),
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    async fn chat(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/messages", self.base_url);

        debug!(model = %self.model, "Arbitration request");

        let response = self
            .http
            .post(&url)
            .headers(self.headers()?)
            .json(&MessagesRequest {
                model: self.model.clone(),
                max_tokens: MAX_DECISION_TOKENS,
                messages: vec![MessageParam {
                    role: "user".to_string(),
                    content: prompt.to_string(),
                }],
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(anyhow!("Anthropic API error ({}): {}", status, error_text));
        }

        let body: MessagesResponse = response.json().await?;
        body.content
            .into_iter()
            .find_map(|block| block.text)
            .ok_or_else(|| anyhow!("Anthropic response contained no text block"))
    }
}

#[async_trait]
impl ClusterArbiter for ClaudeArbiter {
    async fn arbitrate(&self, members: &[Node]) -> Result<ArbitrationOutcome> {
        let prompt = build_prompt(members);
        let reply = self.chat(&prompt).await?;
        Ok(parse_decision(&reply))
    }
}

fn build_prompt(members: &[Node]) -> String {
    let cluster_text = members
        .iter()
        .enumerate()
        .map(|(i, n)| {
            format!(
                "Node {}:\n  Title: {}\n  Type: {}\n  Granularity: {}\n  Description: {}",
                i + 1,
                n.title,
                n.node_type,
                n.granularity,
                n.description
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");

    format!(
        r#"These nodes were extracted from different sources and may describe the same scientific problem.

{cluster_text}

Decide ONE of:
A) MERGE - they are the same problem. Produce a single canonical title and merged description.
B) HIERARCHY - they are related but at different granularity levels. The first node is the parent.
C) DISTINCT - they are genuinely different despite surface similarity.

Respond in JSON: {{"decision": "MERGE"|"HIERARCHY"|"DISTINCT", "canonical_title": "...", "canonical_description": "...", "reason": "..."}}"#
    )
}

/// Parse an oracle reply into an outcome. The reply may wrap the JSON object
/// in prose; anything that does not yield a recognized decision is `Distinct`.
pub fn parse_decision(raw: &str) -> ArbitrationOutcome {
    let Some(open) = raw.find('{') else {
        return ArbitrationOutcome::Distinct;
    };
    let Some(close) = raw.rfind('}') else {
        return ArbitrationOutcome::Distinct;
    };
    if close < open {
        return ArbitrationOutcome::Distinct;
    }

    let Ok(value) = serde_json::from_str::<serde_json::Value>(&raw[open..=close]) else {
        return ArbitrationOutcome::Distinct;
    };

    let decision = value
        .get("decision")
        .and_then(|d| d.as_str())
        .unwrap_or("DISTINCT")
        .to_uppercase();

    match decision.as_str() {
        "MERGE" => ArbitrationOutcome::Merge {
            title: non_empty_string(value.get("canonical_title")),
            description: non_empty_string(value.get("canonical_description")),
        },
        "HIERARCHY" => ArbitrationOutcome::Hierarchy,
        _ => ArbitrationOutcome::Distinct,
    }
}

fn non_empty_string(value: Option<&serde_json::Value>) -> Option<String> {
    value
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[derive(Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<MessageParam>,
}

#[derive(Serialize)]
struct MessageParam {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(default)]
    text: Option<String>,
}
