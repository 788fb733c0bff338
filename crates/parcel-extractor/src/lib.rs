//! Parcel Extractor
//!
//! Retrieval-augmented extraction of property features from document text.
//!
//! # Overview
//!
//! Page text is cut into overlapping chunks and ingested by a retrieval
//! backend. For every feature of a schema the extractor builds a query,
//! retrieves the most relevant chunks, asks a generation backend for a
//! `{value, confidence, reasoning}` answer, and keeps the value only when the
//! confidence clears the threshold. Every value carries the chunks and pages
//! it was grounded on.
//!
//! # Architecture
//!
//! ```text
//! page text → DocumentChunker → chunks → RetrievalBackend
//! feature → generate_query → search → PromptBuilder → GenerationBackend
//!         → parse_response → threshold → FeatureValue
//! schema → ExtractionOrchestrator → ExtractionReport → BatchExtractor
//! ```
//!
//! # Guarantees
//!
//! - **Total coverage**: the result map has exactly one entry per schema feature
//! - **No invention**: missing context, failures and low confidence all yield null
//! - **Bounded retry**: transient generation failures are retried a fixed number of times
//! - **Per-document timeout**: unfinished features resolve to null
//!
//! # Example Usage
//!
//! ```no_run
//! use parcel_domain::schema::property_feature_schema;
//! use parcel_extractor::{DocumentChunker, ExtractionOrchestrator, ExtractorConfig};
//! use parcel_llm::MockProvider;
//! use parcel_store::InMemoryVectorStore;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ExtractorConfig::default();
//! let chunker = DocumentChunker::new(config.chunk.clone())?;
//!
//! let store = Arc::new(InMemoryVectorStore::default());
//! let chunks = chunker.chunk_document("Owner: John Smith. Parcel ID 12-345.", "deed_1", 1);
//! store.add_document("deed_1", chunks)?;
//!
//! let llm = Arc::new(MockProvider::new(r#"{"value": "John Smith", "confidence": 0.9}"#));
//! let orchestrator = ExtractionOrchestrator::new(store, llm, config)?;
//!
//! let report = orchestrator.extract_features("deed_1", &property_feature_schema()).await?;
//! println!("{}", report.result.to_json_pretty()?);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod batch;
mod chunking;
mod config;
mod error;
mod extractor;
mod orchestrator;
mod parser;
mod prompt;
mod provider;
mod query;
mod retry;
mod types;

#[cfg(test)]
mod tests;

pub use batch::{BatchExtractor, BatchResult, DocumentJob, DocumentOutcome};
pub use chunking::DocumentChunker;
pub use config::{ChunkConfig, ExtractorConfig, PipelineConfig, RagConfig, MAX_GENERATION_ATTEMPTS};
pub use error::ExtractorError;
pub use extractor::FeatureExtractor;
pub use orchestrator::ExtractionOrchestrator;
pub use parser::{
    apply_threshold, clamp_confidence, convert_value, parse_response, strip_code_fences,
    ParseError, ParsedResponse,
};
pub use prompt::PromptBuilder;
pub use provider::generation_backend;
pub use query::{datatype_hint, generate_query};
pub use retry::{Attempted, RetryPolicy};
pub use types::{Component, Diagnostic, DiagnosticKind, ExtractionReport, FeatureOutcome};
