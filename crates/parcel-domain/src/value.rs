//! Extracted feature values

use serde::{Deserialize, Serialize};
use std::fmt;

/// A typed extracted value
///
/// Serializes untagged: numbers as JSON numbers, everything else as strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExtractedValue {
    /// Whole number
    Integer(i64),
    /// Number with a fractional component
    Float(f64),
    /// Text, passed through as produced by the generation backend
    Text(String),
}

impl ExtractedValue {
    /// Text content, if this is a text value
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ExtractedValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric content as f64, if this is a number
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ExtractedValue::Integer(i) => Some(*i as f64),
            ExtractedValue::Float(f) => Some(*f),
            ExtractedValue::Text(_) => None,
        }
    }
}

impl fmt::Display for ExtractedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractedValue::Integer(i) => write!(f, "{}", i),
            ExtractedValue::Float(v) => write!(f, "{}", v),
            ExtractedValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for ExtractedValue {
    fn from(s: &str) -> Self {
        ExtractedValue::Text(s.to_string())
    }
}

impl From<String> for ExtractedValue {
    fn from(s: String) -> Self {
        ExtractedValue::Text(s)
    }
}

impl From<i64> for ExtractedValue {
    fn from(i: i64) -> Self {
        ExtractedValue::Integer(i)
    }
}

impl From<f64> for ExtractedValue {
    fn from(f: f64) -> Self {
        ExtractedValue::Float(f)
    }
}

/// An extracted feature value with confidence and provenance
///
/// `value` is `None` when the confidence fell below the threshold, when the
/// document held no relevant chunks, or when extraction failed. Source lists
/// are empty only when nothing was retrieved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureValue {
    /// Extracted value, or null
    pub value: Option<ExtractedValue>,

    /// Confidence in `[0, 1]`
    pub confidence: f64,

    /// Ids of every chunk shown to the generation backend, in retrieval order
    pub source_chunk_ids: Vec<String>,

    /// Distinct pages of those chunks, ascending
    pub source_pages: Vec<u32>,
}

impl FeatureValue {
    /// The null outcome: no value, zero confidence, no sources
    pub fn null() -> Self {
        Self {
            value: None,
            confidence: 0.0,
            source_chunk_ids: Vec::new(),
            source_pages: Vec::new(),
        }
    }

    /// Null value with zero confidence that still records its grounding set
    pub fn null_with_sources(source_chunk_ids: Vec<String>, source_pages: Vec<u32>) -> Self {
        Self {
            value: None,
            confidence: 0.0,
            source_chunk_ids,
            source_pages,
        }
    }

    /// True if no value was extracted
    pub fn is_null(&self) -> bool {
        self.value.is_none()
    }
}

impl Default for FeatureValue {
    fn default() -> Self {
        Self::null()
    }
}
