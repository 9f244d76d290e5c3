use std::sync::Arc;

use tracing::debug;

use crate::error::AssistantError;
use crate::external::{Embedder, ExternalError};
use crate::index::{SearchHit, VectorIndex};

pub const DEFAULT_TOP_K: usize = 3;

/// Embeds a query and looks it up in an index.
///
/// Callers without an index pick a fallback themselves; the retriever never
/// substitutes content.
#[derive(Clone)]
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self { embedder }
    }

    pub async fn retrieve(
        &self,
        query: &str,
        index: &VectorIndex,
        k: usize,
    ) -> Result<Vec<SearchHit>, AssistantError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AssistantError::EmptyInput);
        }

        let mut vectors = self.embedder.embed(&[query.to_string()]).await?;
        let vector = vectors.pop().ok_or_else(|| {
            ExternalError::EmbeddingService("no embedding returned for query".to_string())
        })?;

        let hits = index.search(&vector, k)?;
        debug!(k, hits = hits.len(), "retrieved context");
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mockall::mock;

    mock! {
        pub Embedder {}

        #[async_trait]
        impl Embedder for Embedder {
            fn model(&self) -> &str;
            async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, ExternalError>;
        }
    }

    fn index() -> VectorIndex {
        VectorIndex::build(
            "mock",
            vec!["osmosis".into(), "mitochondria".into(), "inertia".into()],
            vec![vec![1.0, 0.0], vec![0.0, 1.0], vec![0.7071, 0.7071]],
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_retrieve_embeds_query_once() {
        let mut embedder = MockEmbedder::new();
        embedder
            .expect_embed()
            .withf(|texts: &[String]| texts.len() == 1 && texts[0] == "powerhouse?")
            .times(1)
            .returning(|_| Ok(vec![vec![0.0, 1.0]]));

        let retriever = Retriever::new(Arc::new(embedder));
        let hits = retriever
            .retrieve("  powerhouse?  ", &index(), 2)
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].text, "mitochondria");
        assert_eq!(hits[1].text, "inertia");
    }

    #[tokio::test]
    async fn test_retrieve_rejects_empty_query() {
        let mut embedder = MockEmbedder::new();
        embedder.expect_embed().times(0);

        let retriever = Retriever::new(Arc::new(embedder));
        let err = retriever.retrieve("   ", &index(), 3).await.unwrap_err();
        assert!(matches!(err, AssistantError::EmptyInput));
    }

    #[tokio::test]
    async fn test_retrieve_propagates_embedding_failure() {
        let mut embedder = MockEmbedder::new();
        embedder
            .expect_embed()
            .times(1)
            .returning(|_| Err(ExternalError::EmbeddingService("down".to_string())));

        let retriever = Retriever::new(Arc::new(embedder));
        let err = retriever.retrieve("osmosis", &index(), 3).await.unwrap_err();
        assert!(matches!(
            err,
            AssistantError::External(ExternalError::EmbeddingService(_))
        ));
    }
}
