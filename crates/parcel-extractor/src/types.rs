//! Types for extraction outcomes and diagnostics

use crate::error::ExtractorError;
use indexmap::IndexMap;
use parcel_domain::{ExtractionResult, FeatureValue};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Pipeline stage a diagnostic came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Component {
    /// Retrieval backend search
    Retrieval,
    /// Generation backend call
    Generation,
    /// Response parsing and conversion
    Parser,
    /// Document-level orchestration
    Orchestrator,
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Component::Retrieval => "retrieval",
            Component::Generation => "generation",
            Component::Parser => "parser",
            Component::Orchestrator => "orchestrator",
        };
        f.write_str(name)
    }
}

/// What happened to a feature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Retrieval found nothing; a legitimate null answer
    NoContext,
    /// The retrieval backend returned an error
    RetrievalFailed,
    /// The generation backend failed permanently
    GenerationFailed,
    /// Every allowed generation attempt failed transiently
    RetriesExhausted,
    /// The response could not be parsed or converted
    ParseFailed,
    /// The per-document timeout expired first
    TimedOut,
}

impl DiagnosticKind {
    /// Whether the feature ended in an error
    pub fn is_failure(&self) -> bool {
        !matches!(self, DiagnosticKind::NoContext)
    }

    /// Whether the failure points at a backend rather than at the document
    pub fn is_infrastructure(&self) -> bool {
        matches!(
            self,
            DiagnosticKind::RetrievalFailed
                | DiagnosticKind::GenerationFailed
                | DiagnosticKind::RetriesExhausted
                | DiagnosticKind::TimedOut
        )
    }
}

/// Out-of-band explanation attached to a feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Originating stage
    pub component: Component,

    /// Outcome class
    pub kind: DiagnosticKind,

    /// Human-readable detail
    pub message: String,

    /// Generation calls made before the outcome
    pub attempts: u32,
}

impl Diagnostic {
    /// Create a diagnostic with no generation attempts recorded
    pub fn new(component: Component, kind: DiagnosticKind, message: impl Into<String>) -> Self {
        Self {
            component,
            kind,
            message: message.into(),
            attempts: 0,
        }
    }

    /// Record the number of generation calls
    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.component, self.message)
    }
}

/// What FeatureExtractor returns for one feature
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureOutcome {
    /// The value placed in the result map
    pub value: FeatureValue,

    /// Why the value is null, when it is null for a reason other than the threshold
    pub diagnostic: Option<Diagnostic>,

    /// Generation calls made
    pub attempts: u32,

    /// A value was parsed but fell below the confidence threshold
    pub suppressed: bool,
}

impl FeatureOutcome {
    /// A null value explained by `diagnostic`
    pub fn null(value: FeatureValue, diagnostic: Diagnostic) -> Self {
        Self {
            attempts: diagnostic.attempts,
            value,
            diagnostic: Some(diagnostic),
            suppressed: false,
        }
    }

    /// Whether the feature ended in an error
    pub fn is_failure(&self) -> bool {
        self.diagnostic
            .as_ref()
            .is_some_and(|d| d.kind.is_failure())
    }
}

/// What the orchestrator returns for one document
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExtractionReport {
    /// The complete feature map
    pub result: ExtractionResult,

    /// Diagnostics by feature name, in schema order
    pub diagnostics: IndexMap<String, Diagnostic>,
}

impl ExtractionReport {
    /// Names of features that ended in an error
    pub fn failed_features(&self) -> Vec<&str> {
        self.diagnostics
            .iter()
            .filter(|(_, d)| d.kind.is_failure())
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// True when every feature failed for backend reasons
    ///
    /// A document whose features merely found nothing is not a failure.
    pub fn infrastructure_failure(&self) -> bool {
        !self.result.features.is_empty()
            && self.result.features.keys().all(|name| {
                self.diagnostics
                    .get(name)
                    .is_some_and(|d| d.kind.is_infrastructure())
            })
    }

    /// Serialize result and diagnostics to JSON
    pub fn to_json(&self) -> Result<String, ExtractorError> {
        Ok(serde_json::to_string(self)?)
    }
}
