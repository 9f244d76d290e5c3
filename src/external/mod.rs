mod embedding;
pub mod error;
mod llm;

pub use embedding::{normalize, Embedder, EmbeddingConfig, EmbeddingEngine};
pub use error::ExternalError;
pub use llm::{
    from_config as language_model_from_config, ChatCompletionEngine, LLMConfig, LLMEngine,
    LanguageModel, LlmProvider,
};
