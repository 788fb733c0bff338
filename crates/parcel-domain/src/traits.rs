//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the extraction engine and its
//! backends. Implementations live in other crates.

use crate::chunk::Chunk;
use crate::error::{GenerationError, RetrievalError};
use async_trait::async_trait;
use std::sync::Arc;

/// A chunk returned by a search, with its relevance score
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    /// Retrieved chunk
    pub chunk: Chunk,

    /// Relevance score, higher is better
    pub score: f32,
}

impl SearchResult {
    /// Pair a chunk with its score
    pub fn new(chunk: Chunk, score: f32) -> Self {
        Self { chunk, score }
    }
}

/// Optional metadata restriction applied alongside the document filter
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetadataFilter {
    /// Only return chunks from these pages
    pub pages: Option<Vec<u32>>,
}

impl MetadataFilter {
    /// Restrict results to the given pages
    pub fn pages(pages: impl Into<Vec<u32>>) -> Self {
        Self {
            pages: Some(pages.into()),
        }
    }

    /// True if the chunk passes the filter
    pub fn matches(&self, chunk: &Chunk) -> bool {
        match &self.pages {
            Some(pages) => pages.contains(&chunk.page_number()),
            None => true,
        }
    }
}

/// Semantic search over ingested chunks
///
/// Implemented by the infrastructure layer (parcel-store)
#[async_trait]
pub trait RetrievalBackend: Send + Sync {
    /// Return at most `top_k` chunks ranked by descending score
    async fn search(
        &self,
        query: &str,
        top_k: usize,
        doc_id: Option<&str>,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<SearchResult>, RetrievalError>;

    /// Whether any chunk of the document has been ingested
    async fn contains_document(&self, _doc_id: &str) -> Result<bool, RetrievalError> {
        Ok(true)
    }
}

/// Language-model text generation
///
/// Implemented by the infrastructure layer (parcel-llm)
#[async_trait]
pub trait GenerationBackend: Send + Sync {
    /// Generate a completion for the prompt
    async fn generate(
        &self,
        prompt: &str,
        temperature: f64,
        max_tokens: u32,
    ) -> Result<String, GenerationError>;

    /// Model identifier, recorded in result metadata
    fn model_name(&self) -> &str;
}

#[async_trait]
impl<T: RetrievalBackend + ?Sized> RetrievalBackend for Arc<T> {
    async fn search(
        &self,
        query: &str,
        top_k: usize,
        doc_id: Option<&str>,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<SearchResult>, RetrievalError> {
        (**self).search(query, top_k, doc_id, filter).await
    }

    async fn contains_document(&self, doc_id: &str) -> Result<bool, RetrievalError> {
        (**self).contains_document(doc_id).await
    }
}

#[async_trait]
impl<T: GenerationBackend + ?Sized> GenerationBackend for Arc<T> {
    async fn generate(
        &self,
        prompt: &str,
        temperature: f64,
        max_tokens: u32,
    ) -> Result<String, GenerationError> {
        (**self).generate(prompt, temperature, max_tokens).await
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }
}
