pub mod error;
pub mod store;

use serde::{Deserialize, Serialize};

pub use error::IndexError;

/// A chunk of source text together with its embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexedChunk {
    /// Position of the chunk in the source document
    pub ordinal: usize,
    pub text: String,
    pub vector: Vec<f32>,
}

/// One search result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub ordinal: usize,
    pub text: String,
    pub score: f32,
}

/// Exact nearest-neighbour index over unit-length vectors.
///
/// Similarity is the dot product, which equals cosine similarity for
/// normalised embeddings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorIndex {
    model: String,
    dims: usize,
    chunks: Vec<IndexedChunk>,
}

impl VectorIndex {
    /// Build a fresh index. Every chunk must have exactly one vector and all
    /// vectors must share a dimension.
    pub fn build(
        model: impl Into<String>,
        chunks: Vec<String>,
        vectors: Vec<Vec<f32>>,
    ) -> Result<Self, IndexError> {
        if chunks.len() != vectors.len() {
            return Err(IndexError::DimensionMismatch(format!(
                "{} chunks but {} vectors",
                chunks.len(),
                vectors.len()
            )));
        }

        let dims = vectors.first().map(Vec::len).unwrap_or(0);
        let mut indexed = Vec::with_capacity(chunks.len());
        for (ordinal, (text, vector)) in chunks.into_iter().zip(vectors).enumerate() {
            if vector.len() != dims {
                return Err(IndexError::DimensionMismatch(format!(
                    "vector {} has {} dimensions, expected {}",
                    ordinal,
                    vector.len(),
                    dims
                )));
            }
            if !is_finite(&vector) {
                return Err(IndexError::InvalidVector(format!(
                    "vector {} has a non-finite component",
                    ordinal
                )));
            }
            indexed.push(IndexedChunk {
                ordinal,
                text,
                vector,
            });
        }

        Ok(Self {
            model: model.into(),
            dims,
            chunks: indexed,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Return up to `k` chunks most similar to `query`, best first.
    /// Equal scores keep document order.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>, IndexError> {
        if self.chunks.is_empty() {
            return Err(IndexError::EmptyIndex);
        }
        if query.len() != self.dims {
            return Err(IndexError::DimensionMismatch(format!(
                "query has {} dimensions, index has {}",
                query.len(),
                self.dims
            )));
        }
        if !is_finite(query) {
            return Err(IndexError::InvalidVector(
                "query has a non-finite component".to_string(),
            ));
        }

        let mut scored: Vec<(usize, f32)> = self
            .chunks
            .iter()
            .map(|c| (c.ordinal, dot(query, &c.vector)))
            .collect();

        // sort_by is stable, and chunks are stored in ordinal order.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(ordinal, score)| SearchHit {
                ordinal,
                text: self.chunks[ordinal].text.clone(),
                score,
            })
            .collect())
    }

    /// Internal consistency check used after deserialising.
    pub(crate) fn validate(&self) -> Result<(), String> {
        for (i, c) in self.chunks.iter().enumerate() {
            if c.ordinal != i {
                return Err(format!("chunk at position {} has ordinal {}", i, c.ordinal));
            }
            if c.vector.len() != self.dims {
                return Err(format!(
                    "chunk {} has {} dimensions, expected {}",
                    i,
                    c.vector.len(),
                    self.dims
                ));
            }
            if !is_finite(&c.vector) {
                return Err(format!("chunk {} has a non-finite component", i));
            }
        }
        Ok(())
    }
}

fn is_finite(v: &[f32]) -> bool {
    v.iter().all(|x| x.is_finite())
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}
