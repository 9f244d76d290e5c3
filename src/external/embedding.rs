use async_trait::async_trait;
use ollama_rs::{generation::options::GenerationOptions, Ollama};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::external::error::ExternalError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub model: String,
    pub host: String,
    pub port: u16,
}

impl EmbeddingConfig {
    /// Get the full URL for the Ollama service
    pub fn get_url(&self) -> Result<String, ExternalError> {
        let url = if self.host.starts_with("http://") || self.host.starts_with("https://") {
            format!("{}:{}", self.host.trim_end_matches('/'), self.port)
        } else {
            format!("http://{}:{}", self.host, self.port)
        };

        Url::parse(&url).map_err(|e| ExternalError::ConfigError(format!("Invalid URL: {}", e)))?;

        Ok(url)
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: "all-minilm".to_string(),
            host: "localhost".to_string(),
            port: 11434,
        }
    }
}

/// Maps text to fixed-length, unit-normalised vectors.
///
/// One vector is returned per input, in input order.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Identifier of the model the vectors come from.
    fn model(&self) -> &str;

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ExternalError>;
}

/// Scale `v` to unit length. Returns `None` for a zero vector.
pub fn normalize(mut v: Vec<f32>) -> Option<Vec<f32>> {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm == 0.0 || !norm.is_finite() {
        return None;
    }
    for x in v.iter_mut() {
        *x /= norm;
    }
    Some(v)
}

/// Checks that a batch of raw vectors is usable and normalises it.
pub(crate) fn finish_batch(raw: Vec<Vec<f32>>) -> Result<Vec<Vec<f32>>, ExternalError> {
    let mut dims: Option<usize> = None;
    let mut out = Vec::with_capacity(raw.len());
    for (i, v) in raw.into_iter().enumerate() {
        match dims {
            Some(d) if d != v.len() => {
                return Err(ExternalError::EmbeddingService(format!(
                    "embedding {} has {} dimensions, expected {}",
                    i,
                    v.len(),
                    d
                )));
            }
            None => dims = Some(v.len()),
            _ => {}
        }
        let v = normalize(v).ok_or_else(|| {
            ExternalError::EmbeddingService(format!("embedding {} has zero norm", i))
        })?;
        out.push(v);
    }
    Ok(out)
}

/// Wrapper for Ollama embedding engine
pub struct EmbeddingEngine {
    client: Ollama,
    config: EmbeddingConfig,
}

impl EmbeddingEngine {
    /// Create a new embedding engine with the given configuration
    pub fn new(config: EmbeddingConfig) -> Result<Self, ExternalError> {
        let url = config.get_url()?;
        let url = Url::parse(&url)
            .map_err(|e| ExternalError::ConfigError(format!("Invalid URL: {}", e)))?;
        let host = format!(
            "{}://{}",
            url.scheme(),
            url.host_str().unwrap_or("localhost")
        );

        let client = Ollama::new(host, config.port);

        Ok(Self { client, config })
    }

    async fn embed_one(&self, text: &str) -> Result<Vec<f32>, ExternalError> {
        let response = self
            .client
            .generate_embeddings(
                self.config.model.clone(),
                text.to_string(),
                Some(GenerationOptions::default()),
            )
            .await
            .map_err(|e| ExternalError::EmbeddingService(e.to_string()))?;

        // Ollama returns f64
        Ok(response.embeddings.into_iter().map(|x| x as f32).collect())
    }
}

#[async_trait]
impl Embedder for EmbeddingEngine {
    fn model(&self) -> &str {
        &self.config.model
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ExternalError> {
        let mut raw = Vec::with_capacity(texts.len());
        for text in texts {
            raw.push(self.embed_one(text).await?);
        }
        debug!(count = raw.len(), model = %self.config.model, "embedded batch");
        finish_batch(raw)
    }
}
