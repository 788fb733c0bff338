//! Parcel Storage Layer
//!
//! In-memory implementation of the `RetrievalBackend` contract, used by tests
//! and local runs.
//!
//! # Architecture
//!
//! - Chunks are embedded once at ingestion with an [`EmbeddingModel`]
//! - Search is a brute-force cosine scan over the candidate chunks
//! - The index sits behind a `RwLock`: ingestion completes before reads see it
//!
//! # Examples
//!
//! ```
//! use parcel_domain::{Chunk, RetrievalBackend};
//! use parcel_store::InMemoryVectorStore;
//!
//! let store = InMemoryVectorStore::default();
//! store
//!     .add_document("deed_1", vec![Chunk::new("c0", "deed_1", 1, "Owner: John Smith", 0, 17)])
//!     .unwrap();
//!
//! let rt = tokio::runtime::Runtime::new().unwrap();
//! let hits = rt.block_on(store.search("owner name", 5, Some("deed_1"), None)).unwrap();
//! assert_eq!(hits[0].chunk.id(), "c0");
//! ```

#![warn(missing_docs)]

pub mod embedding;

use async_trait::async_trait;
use embedding::{cosine_similarity, EmbeddingError};
use parcel_domain::{Chunk, MetadataFilter, RetrievalBackend, RetrievalError, SearchResult};
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;

pub use embedding::{EmbeddingModel, HashingEmbedder};

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// A chunk could not be embedded
    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    /// A chunk was filed under a different document
    #[error("Chunk {chunk_id} belongs to {actual}, not {expected}")]
    DocumentMismatch {
        /// Chunk identifier
        chunk_id: String,
        /// Document the chunks were added under
        expected: String,
        /// Document the chunk names
        actual: String,
    },

    /// Document not found
    #[error("Document not found: {0}")]
    NotFound(String),
}

#[derive(Debug, Clone)]
struct IndexedChunk {
    chunk: Chunk,
    embedding: Vec<f32>,
}

/// In-memory vector store keyed by document
///
/// # Thread Safety
///
/// All methods take `&self`; share the store behind an `Arc`.
pub struct InMemoryVectorStore<E = HashingEmbedder> {
    embedder: E,
    documents: RwLock<BTreeMap<String, Vec<IndexedChunk>>>,
}

impl Default for InMemoryVectorStore<HashingEmbedder> {
    fn default() -> Self {
        Self::new(HashingEmbedder::default())
    }
}

impl<E: EmbeddingModel> InMemoryVectorStore<E> {
    /// Create an empty store using the given embedding model
    pub fn new(embedder: E) -> Self {
        Self {
            embedder,
            documents: RwLock::new(BTreeMap::new()),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<String, Vec<IndexedChunk>>> {
        self.documents.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<String, Vec<IndexedChunk>>> {
        self.documents.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn index(&self, doc_id: &str, chunks: Vec<Chunk>) -> Result<Vec<IndexedChunk>, StoreError> {
        chunks
            .into_iter()
            .map(|chunk| {
                if chunk.doc_id() != doc_id {
                    return Err(StoreError::DocumentMismatch {
                        chunk_id: chunk.id().to_string(),
                        expected: doc_id.to_string(),
                        actual: chunk.doc_id().to_string(),
                    });
                }
                let embedding = self.embedder.embed(chunk.text())?;
                Ok(IndexedChunk { chunk, embedding })
            })
            .collect()
    }

    /// Append chunks to a document, creating it if needed
    ///
    /// Every chunk is embedded before the index is touched, so a failing
    /// chunk leaves the store unchanged. Returns the number of chunks added.
    pub fn add_document(&self, doc_id: &str, chunks: Vec<Chunk>) -> Result<usize, StoreError> {
        let indexed = self.index(doc_id, chunks)?;
        let added = indexed.len();
        self.write()
            .entry(doc_id.to_string())
            .or_default()
            .extend(indexed);

        tracing::debug!(doc_id, added, "Indexed document chunks");
        Ok(added)
    }

    /// Replace every chunk of an existing document
    pub fn update_document(&self, doc_id: &str, chunks: Vec<Chunk>) -> Result<usize, StoreError> {
        let indexed = self.index(doc_id, chunks)?;
        let count = indexed.len();
        let mut documents = self.write();
        match documents.get_mut(doc_id) {
            Some(existing) => {
                *existing = indexed;
                tracing::debug!(doc_id, count, "Replaced document chunks");
                Ok(count)
            }
            None => Err(StoreError::NotFound(doc_id.to_string())),
        }
    }

    /// Remove a document; returns whether it existed
    pub fn delete_document(&self, doc_id: &str) -> bool {
        self.write().remove(doc_id).is_some()
    }

    /// Whether the document has been ingested
    pub fn document_exists(&self, doc_id: &str) -> bool {
        self.read().contains_key(doc_id)
    }

    /// Chunks of a document in ingestion order
    pub fn get_document_chunks(&self, doc_id: &str) -> Vec<Chunk> {
        self.read()
            .get(doc_id)
            .map(|chunks| chunks.iter().map(|c| c.chunk.clone()).collect())
            .unwrap_or_default()
    }

    /// Number of ingested documents
    pub fn document_count(&self) -> usize {
        self.read().len()
    }

    /// Total number of indexed chunks
    pub fn chunk_count(&self) -> usize {
        self.read().values().map(Vec::len).sum()
    }

    /// Drop every document
    pub fn clear(&self) {
        self.write().clear();
    }

    fn rank(
        &self,
        query: &str,
        top_k: usize,
        doc_id: Option<&str>,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<SearchResult>, RetrievalError> {
        if top_k == 0 {
            return Ok(Vec::new());
        }
        let query_embedding = self
            .embedder
            .embed(query)
            .map_err(|e| RetrievalError::Embedding(e.to_string()))?;

        let documents = self.read();
        let candidates: Box<dyn Iterator<Item = &IndexedChunk>> = match doc_id {
            Some(id) => Box::new(documents.get(id).into_iter().flatten()),
            None => Box::new(documents.values().flatten()),
        };

        let mut results: Vec<SearchResult> = candidates
            .filter(|indexed| filter.is_none_or(|f| f.matches(&indexed.chunk)))
            .map(|indexed| {
                let score = cosine_similarity(&query_embedding, &indexed.embedding);
                SearchResult::new(indexed.chunk.clone(), score)
            })
            .collect();

        // Stable sort: ties keep ingestion order
        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        results.truncate(top_k);
        Ok(results)
    }
}

#[async_trait]
impl<E: EmbeddingModel> RetrievalBackend for InMemoryVectorStore<E> {
    async fn search(
        &self,
        query: &str,
        top_k: usize,
        doc_id: Option<&str>,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<SearchResult>, RetrievalError> {
        self.rank(query, top_k, doc_id, filter)
    }

    async fn contains_document(&self, doc_id: &str) -> Result<bool, RetrievalError> {
        Ok(self.document_exists(doc_id))
    }
}
