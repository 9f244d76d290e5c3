use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::external::{EmbeddingConfig, LLMConfig, LlmProvider};
use crate::marks::DEFAULT_MARKS;
use crate::retriever::DEFAULT_TOP_K;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    pub dir: PathBuf,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub top_k: usize,
    /// Plain-text corpus indexed when no persisted index exists
    pub default_corpus: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    pub max_bytes: u64,
    pub max_pages: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_bytes: 10 * 1024 * 1024,
            max_pages: 100,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingConfig {
    pub log_level: String,
    pub max_question_chars: usize,
    pub max_chat_history: usize,
    pub marks: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub data_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub embedding: EmbeddingConfig,
    pub llm: LLMConfig,
    pub index: IndexConfig,
    pub upload: UploadConfig,
    pub processing: ProcessingConfig,
    pub output: OutputConfig,
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn parse_marks(raw: &str) -> Vec<u8> {
    let marks: Vec<u8> = raw
        .split(',')
        .filter_map(|m| m.trim().parse().ok())
        .collect();
    if marks.is_empty() {
        DEFAULT_MARKS.to_vec()
    } else {
        marks
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let ollama_host = var_or("OLLAMA_HOST", "localhost");
        let ollama_port = parse_or("OLLAMA_PORT", 11434u16);

        let embedding = EmbeddingConfig {
            model: var_or("OLLAMA_EMBEDDING_MODEL", "all-minilm"),
            host: ollama_host.clone(),
            port: ollama_port,
        };

        let llm_defaults = LLMConfig::default();
        let provider = match env::var("LLM_PROVIDER") {
            Ok(raw) => LlmProvider::from_str(&raw)?,
            Err(_) => llm_defaults.provider,
        };
        let llm = LLMConfig {
            provider,
            model: var_or("LLM_MODEL", &llm_defaults.model),
            api_key: env::var("GROQ_API_KEY").ok(),
            base_url: var_or("GROQ_BASE_URL", &llm_defaults.base_url),
            host: ollama_host,
            port: ollama_port,
            temperature: parse_or("LLM_TEMPERATURE", llm_defaults.temperature),
            max_retries: parse_or("LLM_MAX_RETRIES", llm_defaults.max_retries),
            timeout_secs: parse_or("LLM_TIMEOUT_SECS", llm_defaults.timeout_secs),
            retry_backoff_ms: parse_or("LLM_RETRY_BACKOFF_MS", llm_defaults.retry_backoff_ms),
        };

        let index = IndexConfig {
            dir: PathBuf::from(var_or("VECTORSTORE_DIR", "vectorstore")),
            chunk_size: parse_or("CHUNK_SIZE", 1000),
            chunk_overlap: parse_or("CHUNK_OVERLAP", 200),
            top_k: parse_or("TOP_K", DEFAULT_TOP_K),
            default_corpus: PathBuf::from(var_or("DATA_FILE", "syllabus.txt")),
        };

        let upload = UploadConfig {
            max_bytes: parse_or("MAX_FILE_SIZE_MB", 10u64).saturating_mul(1024 * 1024),
            max_pages: parse_or("MAX_PAGES", 100),
        };

        let processing = ProcessingConfig {
            log_level: var_or("LOG_LEVEL", "info"),
            max_question_chars: parse_or("MAX_QUESTION_CHARS", 1000),
            max_chat_history: parse_or("MAX_CHAT_HISTORY", 50),
            marks: parse_marks(&var_or("EXAM_MARKS", "")),
        };

        let output = OutputConfig {
            data_dir: PathBuf::from(var_or("DATA_DIR", ".")),
        };

        Ok(Self {
            embedding,
            llm,
            index,
            upload,
            processing,
            output,
        })
    }
}
