//! Multi-document extraction with bounded concurrency

use crate::error::ExtractorError;
use crate::orchestrator::ExtractionOrchestrator;
use crate::types::{DiagnosticKind, ExtractionReport};
use futures::future::join_all;
use parcel_domain::{FeatureSchema, GenerationBackend, RetrievalBackend};
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{info, warn};

/// One document to extract
#[derive(Debug, Clone)]
pub struct DocumentJob {
    /// Document identifier in the retrieval backend
    pub doc_id: String,

    /// Features to extract
    pub schema: FeatureSchema,
}

impl DocumentJob {
    /// Create a job
    pub fn new(doc_id: impl Into<String>, schema: FeatureSchema) -> Self {
        Self {
            doc_id: doc_id.into(),
            schema,
        }
    }
}

/// Outcome for one document of a batch
#[derive(Debug)]
pub struct DocumentOutcome {
    /// Document identifier
    pub doc_id: String,

    /// The report, or the document-level error
    pub result: Result<ExtractionReport, ExtractorError>,
}

/// Outcome of a whole batch, in job order
#[derive(Debug)]
pub struct BatchResult {
    /// Per-document outcomes
    pub documents: Vec<DocumentOutcome>,

    /// Documents that produced a report
    pub succeeded: usize,

    /// Documents that failed
    pub failed: usize,

    /// Wall-clock time of the batch (seconds)
    pub total_time: f64,
}

impl BatchResult {
    /// Outcome for a document
    pub fn get(&self, doc_id: &str) -> Option<&DocumentOutcome> {
        self.documents.iter().find(|d| d.doc_id == doc_id)
    }

    /// Reports of the documents that succeeded
    pub fn reports(&self) -> impl Iterator<Item = &ExtractionReport> {
        self.documents.iter().filter_map(|d| d.result.as_ref().ok())
    }
}

/// Runs the orchestrator over many documents
///
/// At most `pipeline.batch_concurrency` documents are in flight at once.
pub struct BatchExtractor<R: ?Sized, G: ?Sized> {
    orchestrator: ExtractionOrchestrator<R, G>,
}

impl<R, G> BatchExtractor<R, G>
where
    R: RetrievalBackend + ?Sized,
    G: GenerationBackend + ?Sized,
{
    /// Create a batch extractor
    pub fn new(orchestrator: ExtractionOrchestrator<R, G>) -> Self {
        Self { orchestrator }
    }

    /// The orchestrator used for each document
    pub fn orchestrator(&self) -> &ExtractionOrchestrator<R, G> {
        &self.orchestrator
    }

    /// Extract every job
    pub async fn extract_batch(&self, jobs: Vec<DocumentJob>) -> BatchResult {
        let started = Instant::now();
        let concurrency = self.orchestrator.config().pipeline.batch_concurrency;
        let semaphore = Semaphore::new(concurrency);

        info!(documents = jobs.len(), concurrency, "Starting batch extraction");

        let outcomes = join_all(jobs.iter().map(|job| {
            let semaphore = &semaphore;
            async move {
                let result = match semaphore.acquire().await {
                    Ok(_permit) => self.extract_document(job).await,
                    Err(e) => Err(ExtractorError::BackendUnavailable(e.to_string())),
                };
                if let Err(e) = &result {
                    warn!(doc_id = %job.doc_id, "Document extraction failed: {}", e);
                }
                DocumentOutcome {
                    doc_id: job.doc_id.clone(),
                    result,
                }
            }
        }))
        .await;

        let succeeded = outcomes.iter().filter(|o| o.result.is_ok()).count();
        let failed = outcomes.len() - succeeded;
        let total_time = started.elapsed().as_secs_f64();
        info!(succeeded, failed, total_time, "Batch extraction finished");

        BatchResult {
            documents: outcomes,
            succeeded,
            failed,
            total_time,
        }
    }

    /// Extract one document, turning an all-backend failure into an error
    async fn extract_document(&self, job: &DocumentJob) -> Result<ExtractionReport, ExtractorError> {
        let report = self
            .orchestrator
            .extract_features(&job.doc_id, &job.schema)
            .await?;

        if !report.infrastructure_failure() {
            return Ok(report);
        }

        let all_timed_out = report
            .diagnostics
            .values()
            .all(|d| d.kind == DiagnosticKind::TimedOut);
        if all_timed_out {
            return Err(ExtractorError::Timeout);
        }

        let first = report
            .diagnostics
            .values()
            .find(|d| d.kind != DiagnosticKind::TimedOut)
            .map(|d| d.to_string())
            .unwrap_or_default();
        Err(ExtractorError::BackendUnavailable(format!(
            "every feature failed ({})",
            first
        )))
    }
}
