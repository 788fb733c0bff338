//! Single-feature extraction: query, retrieve, generate, parse, threshold

use crate::config::ExtractorConfig;
use crate::error::ExtractorError;
use crate::parser::{apply_threshold, convert_value, parse_response};
use crate::prompt::PromptBuilder;
use crate::query::generate_query;
use crate::retry::RetryPolicy;
use crate::types::{Component, Diagnostic, DiagnosticKind, FeatureOutcome};
use parcel_domain::{FeatureDefinition, FeatureValue, GenerationBackend, RetrievalBackend};
use std::sync::Arc;
use tracing::{debug, warn};

/// Extracts one feature from one document
///
/// Operational failures never escape as errors: every path ends in a
/// [`FeatureOutcome`], with a diagnostic explaining a null value.
pub struct FeatureExtractor<R: ?Sized, G: ?Sized> {
    retrieval: Arc<R>,
    generation: Arc<G>,
    config: ExtractorConfig,
    retry: RetryPolicy,
}

impl<R, G> FeatureExtractor<R, G>
where
    R: RetrievalBackend + ?Sized,
    G: GenerationBackend + ?Sized,
{
    /// Create an extractor, rejecting an invalid configuration
    pub fn new(
        retrieval: Arc<R>,
        generation: Arc<G>,
        config: ExtractorConfig,
    ) -> Result<Self, ExtractorError> {
        config.validate().map_err(ExtractorError::Config)?;
        let retry = RetryPolicy::from_config(&config.pipeline);
        Ok(Self {
            retrieval,
            generation,
            config,
            retry,
        })
    }

    /// A new extractor sharing the same backends under another configuration
    pub fn with_config(&self, config: ExtractorConfig) -> Result<Self, ExtractorError> {
        Self::new(Arc::clone(&self.retrieval), Arc::clone(&self.generation), config)
    }

    /// The configuration in use
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// The retrieval backend
    pub fn retrieval(&self) -> &Arc<R> {
        &self.retrieval
    }

    /// The generation backend
    pub fn generation(&self) -> &Arc<G> {
        &self.generation
    }

    /// Extract `feature` from document `doc_id`
    pub async fn extract_single_feature(
        &self,
        doc_id: &str,
        feature: &FeatureDefinition,
    ) -> FeatureOutcome {
        let rag = &self.config.rag;
        let query = generate_query(feature);

        let mut results = match self
            .retrieval
            .search(&query, rag.top_k_retrieval, Some(doc_id), None)
            .await
        {
            Ok(results) => results,
            Err(e) => {
                warn!(doc_id, feature = %feature.name, "Retrieval failed: {}", e);
                return FeatureOutcome::null(
                    FeatureValue::null(),
                    Diagnostic::new(Component::Retrieval, DiagnosticKind::RetrievalFailed, e.to_string()),
                );
            }
        };

        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        results.truncate(rag.top_k_retrieval);

        if results.is_empty() {
            debug!(doc_id, feature = %feature.name, "No chunks retrieved");
            return FeatureOutcome::null(
                FeatureValue::null(),
                Diagnostic::new(
                    Component::Retrieval,
                    DiagnosticKind::NoContext,
                    "No relevant chunks retrieved",
                ),
            );
        }

        let source_chunk_ids: Vec<String> =
            results.iter().map(|r| r.chunk.id().to_string()).collect();
        let mut source_pages: Vec<u32> = results.iter().map(|r| r.chunk.page_number()).collect();
        source_pages.sort_unstable();
        source_pages.dedup();

        let prompt = PromptBuilder::new(feature).with_chunks(&results).build();
        debug!(feature = %feature.name, chunks = results.len(), prompt_len = prompt.len(), "Calling generation backend");

        let attempted = self
            .retry
            .run(|_| self.generation.generate(&prompt, rag.llm_temperature, rag.max_tokens))
            .await;
        let attempts = attempted.attempts;
        let exhausted = attempted.exhausted();

        let raw = match attempted.result {
            Ok(raw) => raw,
            Err(e) => {
                let kind = if exhausted {
                    DiagnosticKind::RetriesExhausted
                } else {
                    DiagnosticKind::GenerationFailed
                };
                warn!(doc_id, feature = %feature.name, attempts, "Generation failed: {}", e);
                return FeatureOutcome::null(
                    FeatureValue::null_with_sources(source_chunk_ids, source_pages),
                    Diagnostic::new(Component::Generation, kind, e.to_string()).with_attempts(attempts),
                );
            }
        };

        let parsed = parse_response(&raw).and_then(|response| {
            convert_value(&response.value, feature.data_type).map(|value| (value, response.confidence))
        });
        let (value, confidence) = match parsed {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(doc_id, feature = %feature.name, "Failed to parse response: {}", e);
                return FeatureOutcome::null(
                    FeatureValue::null_with_sources(source_chunk_ids, source_pages),
                    Diagnostic::new(Component::Parser, DiagnosticKind::ParseFailed, e.to_string())
                        .with_attempts(attempts),
                );
            }
        };

        let threshold = rag.confidence_threshold;
        let suppressed = value.is_some() && confidence < threshold;
        if suppressed {
            debug!(feature = %feature.name, confidence, threshold, "Value suppressed by confidence threshold");
        }

        FeatureOutcome {
            value: FeatureValue {
                value: apply_threshold(value, confidence, threshold),
                confidence,
                source_chunk_ids,
                source_pages,
            },
            diagnostic: None,
            attempts,
            suppressed,
        }
    }
}
