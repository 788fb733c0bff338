//! Whole-schema extraction for one document

use crate::config::ExtractorConfig;
use crate::error::ExtractorError;
use crate::extractor::FeatureExtractor;
use crate::types::{Component, Diagnostic, DiagnosticKind, ExtractionReport, FeatureOutcome};
use futures::stream::{FuturesUnordered, StreamExt};
use indexmap::IndexMap;
use parcel_domain::{
    ExtractionMetadata, ExtractionResult, FeatureSchema, FeatureValue, GenerationBackend,
    RetrievalBackend,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::time::{timeout_at, Instant};
use tracing::{info, warn};

/// Runs a [`FeatureExtractor`] over every feature of a schema
///
/// Features are extracted concurrently and independently; the result map
/// always holds one entry per schema feature, in schema order.
pub struct ExtractionOrchestrator<R: ?Sized, G: ?Sized> {
    extractor: FeatureExtractor<R, G>,
}

impl<R, G> ExtractionOrchestrator<R, G>
where
    R: RetrievalBackend + ?Sized,
    G: GenerationBackend + ?Sized,
{
    /// Create an orchestrator, rejecting an invalid configuration
    pub fn new(
        retrieval: Arc<R>,
        generation: Arc<G>,
        config: ExtractorConfig,
    ) -> Result<Self, ExtractorError> {
        Ok(Self::from_extractor(FeatureExtractor::new(retrieval, generation, config)?))
    }

    /// Wrap an existing extractor
    pub fn from_extractor(extractor: FeatureExtractor<R, G>) -> Self {
        Self { extractor }
    }

    /// A new orchestrator sharing the same backends under another configuration
    pub fn with_config(&self, config: ExtractorConfig) -> Result<Self, ExtractorError> {
        Ok(Self::from_extractor(self.extractor.with_config(config)?))
    }

    /// A new orchestrator with TOML `overrides` merged over the current configuration
    pub fn with_overrides(&self, overrides: &str) -> Result<Self, ExtractorError> {
        self.with_config(self.config().with_overrides(overrides)?)
    }

    /// The underlying feature extractor
    pub fn extractor(&self) -> &FeatureExtractor<R, G> {
        &self.extractor
    }

    /// The configuration in use
    pub fn config(&self) -> &ExtractorConfig {
        self.extractor.config()
    }

    /// Extract every feature of `schema` from document `doc_id`
    ///
    /// Fails only before any feature work starts: an empty schema, a document
    /// the retrieval backend does not hold, or a backend that cannot be asked.
    /// The document timeout runs from the start of the call, so a document
    /// check that outlasts it fails with [`ExtractorError::Timeout`].
    pub async fn extract_features(
        &self,
        doc_id: &str,
        schema: &FeatureSchema,
    ) -> Result<ExtractionReport, ExtractorError> {
        let started = Instant::now();
        let pipeline = &self.config().pipeline;
        let deadline = started + pipeline.document_timeout();

        if schema.is_empty() {
            return Err(ExtractorError::EmptySchema);
        }
        match timeout_at(deadline, self.extractor.retrieval().contains_document(doc_id)).await {
            Ok(Ok(true)) => {}
            Ok(Ok(false)) => return Err(ExtractorError::DocumentNotFound(doc_id.to_string())),
            Ok(Err(e)) => return Err(ExtractorError::BackendUnavailable(e.to_string())),
            Err(_) => {
                warn!(
                    doc_id,
                    timeout_secs = pipeline.document_timeout_secs,
                    "Document timeout expired while checking the retrieval backend"
                );
                return Err(ExtractorError::Timeout);
            }
        }

        info!(doc_id, features = schema.len(), "Starting feature extraction");

        let mut pending: FuturesUnordered<_> = schema
            .iter()
            .map(|(name, feature)| async move {
                let outcome = self.extractor.extract_single_feature(doc_id, feature).await;
                (name.as_str(), outcome)
            })
            .collect();

        let mut completed: HashMap<&str, FeatureOutcome> = HashMap::with_capacity(schema.len());
        let timed_out = timeout_at(deadline, async {
            while let Some((name, outcome)) = pending.next().await {
                completed.insert(name, outcome);
            }
        })
        .await
        .is_err();
        // Abandon whatever is still in flight
        drop(pending);

        if timed_out {
            warn!(
                doc_id,
                completed = completed.len(),
                total = schema.len(),
                timeout_secs = pipeline.document_timeout_secs,
                "Document timeout expired"
            );
        }

        let mut features = IndexMap::with_capacity(schema.len());
        let mut diagnostics = IndexMap::new();
        let mut metadata = self.metadata();
        metadata.timed_out = timed_out;

        for name in schema.keys() {
            let outcome = completed.remove(name.as_str()).unwrap_or_else(|| {
                FeatureOutcome::null(
                    FeatureValue::null(),
                    Diagnostic::new(
                        Component::Orchestrator,
                        DiagnosticKind::TimedOut,
                        format!(
                            "Document timeout of {}s expired before the feature finished",
                            pipeline.document_timeout_secs
                        ),
                    ),
                )
            });

            if !outcome.value.is_null() {
                metadata.features_extracted += 1;
            }
            if outcome.suppressed {
                metadata.features_suppressed += 1;
            }
            if outcome.is_failure() {
                metadata.features_failed += 1;
            }
            if let Some(diagnostic) = outcome.diagnostic {
                diagnostics.insert(name.clone(), diagnostic);
            }
            features.insert(name.clone(), outcome.value);
        }

        let processing_time = started.elapsed().as_secs_f64();
        info!(
            doc_id,
            extracted = metadata.features_extracted,
            suppressed = metadata.features_suppressed,
            failed = metadata.features_failed,
            processing_time,
            "Feature extraction finished"
        );

        Ok(ExtractionReport {
            result: ExtractionResult {
                doc_id: doc_id.to_string(),
                features,
                processing_time,
                metadata,
            },
            diagnostics,
        })
    }

    fn metadata(&self) -> ExtractionMetadata {
        let rag = &self.config().rag;
        ExtractionMetadata {
            model: self.extractor.generation().model_name().to_string(),
            temperature: rag.llm_temperature,
            top_k: rag.top_k_retrieval,
            confidence_threshold: rag.confidence_threshold,
            timestamp: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
            ..ExtractionMetadata::default()
        }
    }
}
