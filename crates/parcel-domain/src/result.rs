//! Per-document extraction results

use crate::value::FeatureValue;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Result of feature extraction from a document
///
/// `features` holds exactly one entry per schema feature, in schema order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Document identifier
    pub doc_id: String,

    /// Feature name to extracted value
    pub features: IndexMap<String, FeatureValue>,

    /// Wall-clock time of the whole extraction pass, in seconds
    pub processing_time: f64,

    /// Run metadata
    pub metadata: ExtractionMetadata,
}

impl ExtractionResult {
    /// Look up a feature by name
    pub fn feature(&self, name: &str) -> Option<&FeatureValue> {
        self.features.get(name)
    }

    /// Serialize to a JSON string
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to an indented JSON string
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Metadata about an extraction pass
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExtractionMetadata {
    /// Name of the generation model
    pub model: String,

    /// Sampling temperature used for every call
    pub temperature: f64,

    /// Chunks retrieved per feature
    pub top_k: usize,

    /// Confidence threshold applied
    pub confidence_threshold: f64,

    /// Unix timestamp (seconds) when the pass finished
    pub timestamp: u64,

    /// Features with a non-null value
    pub features_extracted: usize,

    /// Features whose value was suppressed by the confidence threshold
    pub features_suppressed: usize,

    /// Features that ended with an error diagnostic
    pub features_failed: usize,

    /// Whether the per-document timeout expired
    #[serde(default)]
    pub timed_out: bool,
}
