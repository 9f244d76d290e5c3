use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use ollama_rs::{
    generation::{completion::request::GenerationRequest, options::GenerationOptions},
    Ollama,
};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::external::error::ExternalError;

/// Which hosted service answers completion requests.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// Any OpenAI-compatible chat-completions endpoint (Groq by default).
    Groq,
    Ollama,
}

impl FromStr for LlmProvider {
    type Err = ExternalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "groq" | "openai" => Ok(Self::Groq),
            "ollama" => Ok(Self::Ollama),
            other => Err(ExternalError::ConfigError(format!(
                "Unknown LLM provider: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMConfig {
    pub provider: LlmProvider,
    pub model: String,
    /// Bearer key for the hosted provider. Unused by Ollama.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub base_url: String,
    pub host: String,
    pub port: u16,
    pub temperature: f32,
    pub max_retries: usize,
    pub timeout_secs: u64,
    pub retry_backoff_ms: u64,
}

impl LLMConfig {
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

    /// Endpoint for OpenAI-compatible chat completions.
    pub fn completions_url(&self) -> Result<String, ExternalError> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        Url::parse(&url).map_err(|e| ExternalError::ConfigError(format!("Invalid URL: {}", e)))?;
        Ok(url)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::Groq,
            model: "llama-3.1-8b-instant".to_string(),
            api_key: None,
            base_url: "https://api.groq.com/openai/v1".to_string(),
            host: "localhost".to_string(),
            port: 11434,
            temperature: 0.2,
            max_retries: 2,
            timeout_secs: 30,
            retry_backoff_ms: 500,
        }
    }
}

/// A hosted model that turns a prompt into completion text.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, ExternalError>;
}

/// Build the configured completion backend.
pub fn from_config(config: &LLMConfig) -> Result<Box<dyn LanguageModel>, ExternalError> {
    match config.provider {
        LlmProvider::Groq => Ok(Box::new(ChatCompletionEngine::new(config.clone())?)),
        LlmProvider::Ollama => Ok(Box::new(LLMEngine::new(config.clone())?)),
    }
}

/// Client for OpenAI-compatible `/chat/completions` endpoints.
pub struct ChatCompletionEngine {
    client: Client,
    endpoint: String,
    config: LLMConfig,
}

impl ChatCompletionEngine {
    pub fn new(config: LLMConfig) -> Result<Self, ExternalError> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| ExternalError::ConfigError("GROQ_API_KEY is not set".to_string()))?;

        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {}", api_key);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth)
                .map_err(|_| ExternalError::ConfigError("Invalid API key".to_string()))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(config.timeout())
            .default_headers(headers)
            .build()
            .map_err(|e| ExternalError::ConnectionError(e.to_string()))?;
        let endpoint = config.completions_url()?;

        Ok(Self {
            client,
            endpoint,
            config,
        })
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl LanguageModel for ChatCompletionEngine {
    async fn complete(&self, prompt: &str) -> Result<String, ExternalError> {
        let body = ChatRequest {
            model: &self.config.model,
            temperature: self.config.temperature,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| ExternalError::Generation(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "<body unavailable>".to_string());
            return Err(ExternalError::Generation(format!(
                "completion request failed ({}): {}",
                status, text
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| ExternalError::Generation(format!("invalid completion response: {}", e)))?;
        debug!(choices = parsed.choices.len(), "received completion");

        parsed
            .choices
            .into_iter()
            .find_map(|choice| choice.message.content)
            .ok_or_else(|| ExternalError::Generation("completion had no choices".to_string()))
    }
}

/// Wrapper for Ollama LLM engine
pub struct LLMEngine {
    client: Ollama,
    config: LLMConfig,
}

impl LLMEngine {
    /// Create a new LLM engine with the given configuration
    pub fn new(config: LLMConfig) -> Result<Self, ExternalError> {
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
}

#[async_trait]
impl LanguageModel for LLMEngine {
    async fn complete(&self, prompt: &str) -> Result<String, ExternalError> {
        let mut request = GenerationRequest::new(self.config.model.clone(), prompt.to_string());
        request.options = Some(GenerationOptions::default().temperature(self.config.temperature));

        let response = self
            .client
            .generate(request)
            .await
            .map_err(|e| ExternalError::Generation(e.to_string()))?;

        Ok(response.response)
    }
}
