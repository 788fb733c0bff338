//! Parcel Domain Layer
//!
//! Core data model and collaborator contracts for property feature extraction.
//! Every other crate in the workspace depends on this one; it holds no I/O.
//!
//! ## Key Concepts
//!
//! - **Chunk**: a bounded, positioned span of page text used as a retrieval unit
//! - **Feature**: a named property attribute to extract (owner name, sale price)
//! - **FeatureValue**: an extracted value with confidence and source attribution
//! - **ExtractionResult**: the complete feature map for one document
//!
//! ## Architecture
//!
//! - Data types are plain serde-serializable values
//! - Retrieval and generation backends are async traits implemented elsewhere
//!   (`parcel-store`, `parcel-llm`)
//! - The default property schema lives in [`schema`]

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod chunk;
pub mod error;
pub mod feature;
pub mod result;
pub mod schema;
pub mod traits;
pub mod value;

// Re-exports for convenience
pub use chunk::Chunk;
pub use error::{FatalKind, GenerationError, RetrievalError};
pub use feature::{DataType, FeatureDefinition, FeatureSchema, ValidationRule};
pub use result::{ExtractionMetadata, ExtractionResult};
pub use traits::{GenerationBackend, MetadataFilter, RetrievalBackend, SearchResult};
pub use value::{ExtractedValue, FeatureValue};
