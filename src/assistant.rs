use std::fs;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use crate::chunker::RecursiveChunker;
use crate::config::{Config, IndexConfig, UploadConfig};
use crate::document;
use crate::error::AssistantError;
use crate::external::{Embedder, LanguageModel};
use crate::generator::{AnswerGenerator, APOLOGY};
use crate::index::{IndexError, SearchHit, VectorIndex};
use crate::marks::MarkScheme;
use crate::prompt;
use crate::quiz::{Difficulty, McqQuestion, QuizGenerator, ShortAnswerQuestion};
use crate::retriever::Retriever;
use crate::session::StudySession;
use crate::smalltalk::SmallTalk;

/// How an answer was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    /// Answered from retrieved syllabus context
    Grounded,
    /// No usable index, answered by the model alone
    Direct,
    SmallTalk,
    /// Generation failed; the text is the apology
    Failed { had_context: bool },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    pub route: Route,
    pub mark: Option<u8>,
    /// Context the answer was grounded on, in retrieval order
    pub context: Vec<SearchHit>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexReport {
    /// Pages in the uploaded file; zero for plain text
    pub pages: usize,
    pub pages_processed: usize,
    pub chunks: usize,
}

/// Collapse whitespace runs and cap the length at `max_chars` characters.
pub fn sanitize_question(question: &str, max_chars: usize) -> Result<String, AssistantError> {
    let collapsed = question.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return Err(AssistantError::EmptyInput);
    }
    if collapsed.chars().count() > max_chars {
        let mut truncated: String = collapsed.chars().take(max_chars).collect();
        truncated.push_str("...");
        warn!(max_chars, "question truncated");
        return Ok(truncated);
    }
    Ok(collapsed)
}

/// The caller-facing study assistant.
///
/// Queries read the current index through a shared handle; uploads build a new
/// index off to the side, persist it, then swap it in. A failed upload leaves
/// the previous index in place.
pub struct StudyAssistant {
    embedder: Arc<dyn Embedder>,
    retriever: Retriever,
    generator: AnswerGenerator,
    quiz: QuizGenerator,
    chunker: RecursiveChunker,
    marks: MarkScheme,
    small_talk: SmallTalk,
    index_config: IndexConfig,
    upload: UploadConfig,
    max_question_chars: usize,
    index: RwLock<Option<Arc<VectorIndex>>>,
    build_lock: Mutex<()>,
}

impl StudyAssistant {
    pub fn new(
        config: &Config,
        embedder: Arc<dyn Embedder>,
        model: Arc<dyn LanguageModel>,
    ) -> Result<Self, AssistantError> {
        let chunker = RecursiveChunker::new(config.index.chunk_size, config.index.chunk_overlap)?;
        let generator = AnswerGenerator::from_config(model, &config.llm);

        Ok(Self {
            retriever: Retriever::new(embedder.clone()),
            embedder,
            quiz: QuizGenerator::new(generator.clone()),
            generator,
            chunker,
            marks: MarkScheme::new(&config.processing.marks),
            small_talk: SmallTalk::new(),
            index_config: config.index.clone(),
            upload: config.upload.clone(),
            max_question_chars: config.processing.max_question_chars,
            index: RwLock::new(None),
            build_lock: Mutex::new(()),
        })
    }

    pub async fn has_index(&self) -> bool {
        self.index.read().await.is_some()
    }

    /// Number of chunks in the current index, if there is one.
    pub async fn index_size(&self) -> Option<usize> {
        self.index.read().await.as_ref().map(|i| i.len())
    }

    /// Validate, extract and index an uploaded PDF, replacing the current index.
    pub async fn index_document(
        &self,
        session: &mut StudySession,
        name: &str,
        bytes: &[u8],
    ) -> Result<IndexReport, AssistantError> {
        let doc = document::extract_pdf(name, bytes, &self.upload)?;
        let chunks = self.rebuild(&doc.text).await?;

        session.record_upload(name, bytes.len(), doc.page_count, chunks);
        info!(name, pages = doc.page_count, chunks, "indexed document");
        Ok(IndexReport {
            pages: doc.page_count,
            pages_processed: doc.pages_processed,
            chunks,
        })
    }

    /// Index plain text, replacing the current index.
    pub async fn index_text(&self, text: &str) -> Result<IndexReport, AssistantError> {
        let chunks = self.rebuild(text).await?;
        Ok(IndexReport {
            pages: 0,
            pages_processed: 0,
            chunks,
        })
    }

    async fn rebuild(&self, text: &str) -> Result<usize, AssistantError> {
        let _build = self.build_lock.lock().await;

        let chunks = self.chunker.split(text)?;
        let vectors = self.embedder.embed(&chunks).await?;
        let index = VectorIndex::build(self.embedder.model(), chunks, vectors)?;
        index.persist(&self.index_config.dir)?;

        let count = index.len();
        *self.index.write().await = Some(Arc::new(index));
        Ok(count)
    }

    /// Load the persisted index, or build one from the default corpus when
    /// none exists yet. Returns whether an index is available afterwards.
    pub async fn load_or_bootstrap(&self) -> Result<bool, AssistantError> {
        match VectorIndex::load(&self.index_config.dir) {
            Ok(index) => {
                if index.model() != self.embedder.model() {
                    warn!(
                        stored = index.model(),
                        configured = self.embedder.model(),
                        "index was built with a different embedding model"
                    );
                }
                info!(chunks = index.len(), "loaded persisted index");
                *self.index.write().await = Some(Arc::new(index));
                Ok(true)
            }
            Err(IndexError::NotFound(_)) => {
                let corpus = &self.index_config.default_corpus;
                if !corpus.is_file() {
                    info!(
                        corpus = %corpus.display(),
                        "no index and no default corpus, answering without context"
                    );
                    return Ok(false);
                }
                let text = fs::read_to_string(corpus).map_err(|e| {
                    AssistantError::Validation(format!("reading {}: {}", corpus.display(), e))
                })?;
                let report = self.index_text(&text).await?;
                info!(corpus = %corpus.display(), chunks = report.chunks, "indexed default corpus");
                Ok(true)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Answer a question. Pipeline failures become an apology in the answer
    /// text; only invalid input is returned as an error.
    pub async fn ask(
        &self,
        session: &mut StudySession,
        question: &str,
    ) -> Result<Answer, AssistantError> {
        let question = sanitize_question(question, self.max_question_chars)?;

        if let Some(reply) = self.small_talk.reply(&question) {
            session.record_exchange(&question, reply);
            return Ok(Answer {
                text: reply.to_string(),
                route: Route::SmallTalk,
                mark: None,
                context: Vec::new(),
            });
        }

        let mark = self.marks.detect_marks(&question);
        let context = self.context_for(&question, self.index_config.top_k).await;
        let had_context = !context.is_empty();

        let prompt = if had_context {
            let texts: Vec<&str> = context.iter().map(|h| h.text.as_str()).collect();
            prompt::assemble(&question, &texts, mark)
        } else {
            prompt::direct(&question, mark)
        };

        let (text, route) = match self.generator.generate(&prompt).await {
            Ok(text) => {
                let route = if had_context { Route::Grounded } else { Route::Direct };
                (text, route)
            }
            Err(e) => {
                error!(error = %e, had_context, "answer generation failed");
                session.record_error(e.to_string());
                (APOLOGY.to_string(), Route::Failed { had_context })
            }
        };

        session.record_exchange(&question, &text);
        Ok(Answer {
            text,
            route,
            mark,
            context,
        })
    }

    /// Retrieved context for `query`, or nothing when there is no index or
    /// retrieval fails.
    async fn context_for(&self, query: &str, k: usize) -> Vec<SearchHit> {
        let Some(index) = self.index.read().await.clone() else {
            return Vec::new();
        };
        match self.retriever.retrieve(query, &index, k).await {
            Ok(hits) => hits,
            Err(e) if e.is_recoverable() => {
                debug!(error = %e, "no context available");
                Vec::new()
            }
            Err(e) => {
                warn!(error = %e, "retrieval failed, answering without context");
                Vec::new()
            }
        }
    }

    async fn context_texts(&self, query: &str) -> Vec<String> {
        self.context_for(query, self.index_config.top_k * 2)
            .await
            .into_iter()
            .map(|h| h.text)
            .collect()
    }

    pub async fn quiz_mcq(
        &self,
        count: usize,
        difficulty: Difficulty,
    ) -> Result<Vec<McqQuestion>, AssistantError> {
        let context = self.context_texts(difficulty.focus()).await;
        self.quiz.generate_mcq(&context, count, difficulty).await
    }

    pub async fn quiz_short_answer(
        &self,
        count: usize,
    ) -> Result<Vec<ShortAnswerQuestion>, AssistantError> {
        let context = self.context_texts("important concepts").await;
        self.quiz.generate_short_answer(&context, count).await
    }

    pub async fn suggest_topics(&self, count: usize) -> Result<Vec<String>, AssistantError> {
        let context = self.context_texts("key concepts and definitions").await;
        self.quiz.suggest_topics(&context, count).await
    }

    pub async fn related_questions(
        &self,
        question: &str,
        count: usize,
    ) -> Result<Vec<String>, AssistantError> {
        self.quiz.related_questions(question, count).await
    }
}
