use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use rootmap_common::Config;

const VOYAGE_API_URL: &str = "https://api.voyageai.com/v1";
const DEFAULT_EMBED_MODEL: &str = "voyage-3-large";

// --- TextEmbedder trait ---

/// Embedding provider boundary. Implementations must be deterministic for
/// identical input text within a single run.
#[async_trait]
pub trait TextEmbedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
    async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>>;
}

/// Wrapper around Voyage AI embeddings.
pub struct VoyageEmbedder {
    http: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl VoyageEmbedder {
    pub fn new(api_key: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: api_key.to_string(),
            model: DEFAULT_EMBED_MODEL.to_string(),
            base_url: VOYAGE_API_URL.to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.voyage_api_key)
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.to_string();
        self
    }

    async fn request(&self, input: Vec<String>) -> Result<Vec<Vec<f32>>> {
        let expected = input.len();
        let url = format!("{}/embeddings", self.base_url);

        debug!(model = %self.model, texts = expected, "Voyage embedding request");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&EmbeddingRequest {
                input,
                model: self.model.clone(),
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(anyhow!("Voyage API error ({}): {}", status, error_text));
        }

        let body: EmbeddingResponse = response.json().await?;
        if body.data.len() != expected {
            return Err(anyhow!(
                "Voyage returned {} embeddings for {} inputs",
                body.data.len(),
                expected
            ));
        }

        Ok(body.data.into_iter().map(|row| row.embedding).collect())
    }
}

#[async_trait]
impl TextEmbedder for VoyageEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut embeddings = self.request(vec![text.to_string()]).await?;
        embeddings
            .pop()
            .ok_or_else(|| anyhow!("Voyage returned no embedding"))
    }

    async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        self.request(texts).await
    }
}

#[derive(Serialize)]
struct EmbeddingRequest {
    input: Vec<String>,
    model: String,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingRow>,
}

#[derive(Deserialize)]
struct EmbeddingRow {
    embedding: Vec<f32>,
}
