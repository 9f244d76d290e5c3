#![allow(dead_code)]

use std::path::Path;

use async_trait::async_trait;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use mockall::mock;

use exam_assistant::config::{IndexConfig, OutputConfig, ProcessingConfig, UploadConfig};
use exam_assistant::external::{
    normalize, Embedder, EmbeddingConfig, ExternalError, LLMConfig, LanguageModel,
};
use exam_assistant::Config;

mock! {
    pub Embedder {}

    #[async_trait]
    impl Embedder for Embedder {
        fn model(&self) -> &str;
        async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ExternalError>;
    }
}

mock! {
    pub Model {}

    #[async_trait]
    impl LanguageModel for Model {
        async fn complete(&self, prompt: &str) -> Result<String, ExternalError>;
    }
}

/// Embeds text as normalised keyword counts over a small vocabulary, plus a
/// constant component so no vector is ever zero.
pub struct KeywordEmbedder {
    vocabulary: Vec<&'static str>,
}

impl KeywordEmbedder {
    pub fn new(vocabulary: &[&'static str]) -> Self {
        Self {
            vocabulary: vocabulary.to_vec(),
        }
    }

    fn vector(&self, text: &str) -> Vec<f32> {
        let lowered = text.to_lowercase();
        let mut v: Vec<f32> = self
            .vocabulary
            .iter()
            .map(|word| lowered.matches(word).count() as f32)
            .collect();
        v.push(0.1);
        v
    }
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    fn model(&self) -> &str {
        "keyword-test"
    }

    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ExternalError> {
        texts
            .iter()
            .map(|t| {
                normalize(self.vector(t))
                    .ok_or_else(|| ExternalError::EmbeddingService("zero vector".to_string()))
            })
            .collect()
    }
}

/// Configuration for tests: small chunks, no retries, index under `dir`.
pub fn test_config(dir: &Path) -> Config {
    Config {
        embedding: EmbeddingConfig::default(),
        llm: LLMConfig {
            max_retries: 0,
            timeout_secs: 5,
            retry_backoff_ms: 0,
            ..LLMConfig::default()
        },
        index: IndexConfig {
            dir: dir.join("vectorstore"),
            chunk_size: 80,
            chunk_overlap: 0,
            top_k: 1,
            default_corpus: dir.join("syllabus.txt"),
        },
        upload: UploadConfig::default(),
        processing: ProcessingConfig {
            log_level: "debug".to_string(),
            max_question_chars: 1000,
            max_chat_history: 50,
            marks: vec![1, 2, 5, 10, 12],
        },
        output: OutputConfig {
            data_dir: dir.to_path_buf(),
        },
    }
}

/// Build an in-memory PDF with one page per entry; each entry lists the text
/// lines drawn on that page.
pub fn pdf_with_pages(pages: &[&[&str]]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for lines in pages {
        let mut operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 12.into()]),
            Operation::new("Td", vec![72.into(), 720.into()]),
        ];
        for (i, line) in lines.iter().enumerate() {
            if i > 0 {
                operations.push(Operation::new("Td", vec![0.into(), (-14).into()]));
            }
            operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
        }
        operations.push(Operation::new("ET", vec![]));

        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    let pages_dict = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
        "Count" => count,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    doc.save_to(&mut out).unwrap();
    out
}

/// The three-page biology syllabus used across the tests.
pub fn biology_pdf() -> Vec<u8> {
    pdf_with_pages(&[
        &["Plants convert sunlight into sugar through photosynthesis."],
        &["The mitochondria is the powerhouse of the cell."],
        &["Newton described how forces change the motion of objects."],
    ])
}
