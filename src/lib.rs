pub mod analytics;
pub mod assistant;
pub mod chunker;
pub mod config;
pub mod document;
pub mod error;
pub mod external;
pub mod generator;
pub mod index;
pub mod marks;
pub mod prompt;
pub mod quiz;
pub mod retriever;
pub mod session;
pub mod smalltalk;

pub use analytics::StudyAnalytics;
pub use assistant::{Answer, IndexReport, Route, StudyAssistant};
pub use chunker::RecursiveChunker;
pub use config::Config;
pub use error::AssistantError;
pub use external::{Embedder, EmbeddingEngine, ExternalError, LLMEngine, LanguageModel};
pub use generator::AnswerGenerator;
pub use index::{IndexError, SearchHit, VectorIndex};
pub use marks::MarkScheme;
pub use quiz::{Difficulty, QuizGenerator};
pub use session::StudySession;
pub use smalltalk::SmallTalk;
