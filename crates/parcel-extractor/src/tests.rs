//! Integration tests for the Extractor

#[cfg(test)]
mod tests {
    use crate::{
        BatchExtractor, ChunkConfig, DiagnosticKind, DocumentChunker, DocumentJob,
        ExtractionOrchestrator, ExtractorConfig, ExtractorError, FeatureExtractor,
    };
    use async_trait::async_trait;
    use parcel_domain::schema::property_feature_schema;
    use parcel_domain::{
        Chunk, DataType, ExtractedValue, FatalKind, FeatureDefinition, FeatureSchema,
        GenerationError, MetadataFilter, RetrievalBackend, RetrievalError, SearchResult,
    };
    use parcel_llm::{MockProvider, RateLimitedProvider};
    use parcel_store::InMemoryVectorStore;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    const OWNER_ANSWER: &str = r#"{"value": "John Smith", "confidence": 0.92, "reasoning": "Labeled as owner"}"#;

    /// Retrieval double answering from fixed tables
    #[derive(Default)]
    struct StaticRetriever {
        default: Vec<SearchResult>,
        errors: Vec<String>,
        delays: Vec<(String, Duration)>,
        contains: Option<Result<bool, RetrievalError>>,
        contains_delay: Option<Duration>,
        searches: AtomicUsize,
        in_flight: AtomicUsize,
        peak_in_flight: AtomicUsize,
    }

    impl StaticRetriever {
        fn returning(results: Vec<SearchResult>) -> Self {
            Self {
                default: results,
                ..Self::default()
            }
        }

        /// Fail searches whose query contains `pattern`
        fn failing_for(mut self, pattern: &str) -> Self {
            self.errors.push(pattern.to_string());
            self
        }

        /// Delay searches whose query contains `pattern`
        fn delaying(mut self, pattern: &str, delay: Duration) -> Self {
            self.delays.push((pattern.to_string(), delay));
            self
        }

        fn with_contains(mut self, answer: Result<bool, RetrievalError>) -> Self {
            self.contains = Some(answer);
            self
        }

        fn with_contains_delay(mut self, delay: Duration) -> Self {
            self.contains_delay = Some(delay);
            self
        }

        fn search_count(&self) -> usize {
            self.searches.load(Ordering::SeqCst)
        }

        /// Most searches that were ever running at the same time
        fn peak_in_flight(&self) -> usize {
            self.peak_in_flight.load(Ordering::SeqCst)
        }

        async fn answer(&self, query: &str) -> Result<Vec<SearchResult>, RetrievalError> {
            if let Some((_, delay)) = self.delays.iter().find(|(p, _)| query.contains(p.as_str())) {
                tokio::time::sleep(*delay).await;
            }
            if self.errors.iter().any(|p| query.contains(p.as_str())) {
                return Err(RetrievalError::Unavailable("connection refused".into()));
            }
            Ok(self.default.clone())
        }
    }

    #[async_trait]
    impl RetrievalBackend for StaticRetriever {
        async fn search(
            &self,
            query: &str,
            _top_k: usize,
            _doc_id: Option<&str>,
            _filter: Option<&MetadataFilter>,
        ) -> Result<Vec<SearchResult>, RetrievalError> {
            self.searches.fetch_add(1, Ordering::SeqCst);
            let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak_in_flight.fetch_max(running, Ordering::SeqCst);
            let answer = self.answer(query).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
            answer
        }

        async fn contains_document(&self, _doc_id: &str) -> Result<bool, RetrievalError> {
            if let Some(delay) = self.contains_delay {
                tokio::time::sleep(delay).await;
            }
            self.contains.clone().unwrap_or(Ok(true))
        }
    }

    fn fast_config() -> ExtractorConfig {
        let mut config = ExtractorConfig::default();
        config.pipeline.retry_base_delay_ms = 0;
        config.pipeline.retry_max_delay_ms = 0;
        config
    }

    fn owner_chunk() -> SearchResult {
        SearchResult::new(
            Chunk::new("deed_1_chunk_0_abcd1234", "deed_1", 1, "Owner: John Smith", 0, 17),
            0.91,
        )
    }

    fn owner_feature() -> FeatureDefinition {
        FeatureDefinition::new("owner_name", "name of property owner", DataType::String)
    }

    fn extractor(
        retriever: StaticRetriever,
        llm: &MockProvider,
    ) -> FeatureExtractor<StaticRetriever, MockProvider> {
        FeatureExtractor::new(Arc::new(retriever), Arc::new(llm.clone()), fast_config()).unwrap()
    }

    #[tokio::test]
    async fn test_owner_name_scenario() {
        let llm = MockProvider::new(r#"{"value":"John Smith","confidence":0.92}"#);
        let extractor = extractor(StaticRetriever::returning(vec![owner_chunk()]), &llm);

        let outcome = extractor.extract_single_feature("deed_1", &owner_feature()).await;

        assert_eq!(outcome.value.value, Some(ExtractedValue::Text("John Smith".into())));
        assert_eq!(outcome.value.confidence, 0.92);
        assert_eq!(outcome.value.source_chunk_ids, vec!["deed_1_chunk_0_abcd1234"]);
        assert_eq!(outcome.value.source_pages, vec![1]);
        assert!(outcome.diagnostic.is_none());
        assert_eq!(outcome.attempts, 1);

        let prompt = &llm.prompts()[0];
        assert!(prompt.contains("[Excerpt 1 | page 1]\nOwner: John Smith"));
    }

    #[tokio::test]
    async fn test_transient_failures_then_success_on_third_call() {
        let llm = MockProvider::new(OWNER_ANSWER).with_sequence(vec![
            Err(GenerationError::Transient("connection reset".into())),
            Err(GenerationError::RateLimited { retry_after: None }),
        ]);
        let extractor = extractor(StaticRetriever::returning(vec![owner_chunk()]), &llm);

        let outcome = extractor.extract_single_feature("deed_1", &owner_feature()).await;

        assert_eq!(outcome.value.value, Some(ExtractedValue::from("John Smith")));
        assert_eq!(outcome.attempts, 3);
        assert_eq!(llm.call_count(), 3);
    }

    #[tokio::test]
    async fn test_three_transient_failures_exhaust_budget() {
        let llm = MockProvider::new(OWNER_ANSWER).with_sequence(vec![
            Err(GenerationError::Transient("timeout".into()));
            4
        ]);
        let extractor = extractor(StaticRetriever::returning(vec![owner_chunk()]), &llm);

        let outcome = extractor.extract_single_feature("deed_1", &owner_feature()).await;

        assert!(outcome.value.is_null());
        assert_eq!(outcome.value.confidence, 0.0);
        assert_eq!(outcome.value.source_chunk_ids.len(), 1);
        assert_eq!(llm.call_count(), 3);
        let diagnostic = outcome.diagnostic.unwrap();
        assert_eq!(diagnostic.kind, DiagnosticKind::RetriesExhausted);
        assert_eq!(diagnostic.attempts, 3);
    }

    #[tokio::test]
    async fn test_fatal_error_short_circuits() {
        let llm = MockProvider::new(OWNER_ANSWER).with_sequence(vec![Err(GenerationError::fatal(
            FatalKind::Authentication,
            "invalid api key",
        ))]);
        let extractor = extractor(StaticRetriever::returning(vec![owner_chunk()]), &llm);

        let outcome = extractor.extract_single_feature("deed_1", &owner_feature()).await;

        assert!(outcome.value.is_null());
        assert_eq!(llm.call_count(), 1);
        assert_eq!(outcome.diagnostic.unwrap().kind, DiagnosticKind::GenerationFailed);
    }

    #[tokio::test]
    async fn test_threshold_suppression_keeps_confidence_and_sources() {
        let llm = MockProvider::new(r#"{"value": "John Smith", "confidence": 0.3}"#);
        let extractor = extractor(StaticRetriever::returning(vec![owner_chunk()]), &llm);

        let outcome = extractor.extract_single_feature("deed_1", &owner_feature()).await;

        assert!(outcome.value.is_null());
        assert_eq!(outcome.value.confidence, 0.3);
        assert_eq!(outcome.value.source_chunk_ids, vec!["deed_1_chunk_0_abcd1234"]);
        assert_eq!(outcome.value.source_pages, vec![1]);
        assert!(outcome.suppressed);
        assert!(!outcome.is_failure());
    }

    #[tokio::test]
    async fn test_empty_retrieval_yields_null_without_generation() {
        let llm = MockProvider::new(OWNER_ANSWER);
        let extractor = extractor(StaticRetriever::returning(Vec::new()), &llm);

        let outcome = extractor.extract_single_feature("deed_1", &owner_feature()).await;

        assert!(outcome.value.is_null());
        assert_eq!(outcome.value.confidence, 0.0);
        assert!(outcome.value.source_chunk_ids.is_empty());
        assert!(outcome.value.source_pages.is_empty());
        assert_eq!(outcome.diagnostic.unwrap().kind, DiagnosticKind::NoContext);
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_retrieval_error_treated_as_empty() {
        let llm = MockProvider::new(OWNER_ANSWER);
        let retriever = StaticRetriever::returning(vec![owner_chunk()]).failing_for("owner");
        let extractor = extractor(retriever, &llm);

        let outcome = extractor.extract_single_feature("deed_1", &owner_feature()).await;

        assert!(outcome.value.is_null());
        assert!(outcome.value.source_chunk_ids.is_empty());
        assert_eq!(outcome.diagnostic.unwrap().kind, DiagnosticKind::RetrievalFailed);
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_parse_failure_not_retried() {
        let llm = MockProvider::new("I could not find the owner.");
        let extractor = extractor(StaticRetriever::returning(vec![owner_chunk()]), &llm);

        let outcome = extractor.extract_single_feature("deed_1", &owner_feature()).await;

        assert!(outcome.value.is_null());
        assert_eq!(outcome.value.confidence, 0.0);
        assert_eq!(outcome.diagnostic.unwrap().kind, DiagnosticKind::ParseFailed);
        assert_eq!(llm.call_count(), 1);
    }

    #[tokio::test]
    async fn test_number_feature_converted() {
        let llm = MockProvider::new("```json\n{\"value\": \"2,450\", \"confidence\": 0.8}\n```");
        let extractor = extractor(StaticRetriever::returning(vec![owner_chunk()]), &llm);
        let feature = FeatureDefinition::new("square_footage", "living area", DataType::Number);

        let outcome = extractor.extract_single_feature("deed_1", &feature).await;

        assert_eq!(outcome.value.value, Some(ExtractedValue::Integer(2450)));
    }

    #[tokio::test]
    async fn test_sources_sorted_by_score_and_pages_deduplicated() {
        let chunks = vec![
            SearchResult::new(Chunk::new("c_low", "d", 3, "Owner history", 0, 13), 0.2),
            SearchResult::new(Chunk::new("c_high", "d", 1, "Owner: John Smith", 0, 17), 0.9),
            SearchResult::new(Chunk::new("c_mid", "d", 3, "Grantee John Smith", 20, 38), 0.5),
        ];
        let llm = MockProvider::new(OWNER_ANSWER);
        let extractor = extractor(StaticRetriever::returning(chunks), &llm);

        let outcome = extractor.extract_single_feature("d", &owner_feature()).await;

        assert_eq!(outcome.value.source_chunk_ids, vec!["c_high", "c_mid", "c_low"]);
        assert_eq!(outcome.value.source_pages, vec![1, 3]);
    }

    #[tokio::test]
    async fn test_total_coverage_with_mixed_failures() {
        let schema = property_feature_schema();
        let llm = MockProvider::new(r#"{"value": null, "confidence": 0.0}"#)
            .with_model("gpt-4")
            .with_response_for("Field: owner_name", OWNER_ANSWER)
            .with_response_for("Field: lot_size", "not json at all")
            .with_error_for(
                "Field: sale_price",
                GenerationError::fatal(FatalKind::MalformedRequest, "prompt too long"),
            );
        let retriever = StaticRetriever::returning(vec![owner_chunk()]).failing_for("zoning");
        let orchestrator =
            ExtractionOrchestrator::new(Arc::new(retriever), Arc::new(llm), fast_config()).unwrap();

        let report = orchestrator.extract_features("deed_1", &schema).await.unwrap();
        let result = &report.result;

        assert_eq!(result.features.len(), schema.len());
        assert!(result.features.keys().eq(schema.keys()));
        assert_eq!(
            result.feature("owner_name").unwrap().value,
            Some(ExtractedValue::from("John Smith"))
        );
        assert!(result.feature("lot_size").unwrap().is_null());
        assert!(result.feature("zoning_classification").unwrap().is_null());

        assert_eq!(report.diagnostics["lot_size"].kind, DiagnosticKind::ParseFailed);
        assert_eq!(report.diagnostics["sale_price"].kind, DiagnosticKind::GenerationFailed);
        assert_eq!(
            report.diagnostics["zoning_classification"].kind,
            DiagnosticKind::RetrievalFailed
        );

        assert_eq!(result.metadata.features_extracted, 1);
        assert_eq!(result.metadata.features_failed, 3);
        assert_eq!(result.metadata.model, "gpt-4");
        assert!(!result.metadata.timed_out);
        assert!(!report.infrastructure_failure());
        assert!(result.processing_time >= 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_keeps_completed_features() {
        let mut schema = FeatureSchema::new();
        schema.insert("owner_name".into(), owner_feature());
        schema.insert(
            "sale_price".into(),
            FeatureDefinition::new("sale_price", "most recent sale price", DataType::Currency),
        );
        schema.insert(
            "year_built".into(),
            FeatureDefinition::new("year_built", "year of construction", DataType::Number),
        );

        let retriever = StaticRetriever::returning(vec![owner_chunk()])
            .delaying("sale price", Duration::from_secs(30))
            .delaying("year built", Duration::from_secs(30));
        let llm = MockProvider::new(OWNER_ANSWER);
        let mut config = fast_config();
        config.pipeline.document_timeout_secs = 1;
        let orchestrator =
            ExtractionOrchestrator::new(Arc::new(retriever), Arc::new(llm), config).unwrap();

        let report = orchestrator.extract_features("deed_1", &schema).await.unwrap();

        assert_eq!(report.result.features.len(), 3);
        assert!(report.result.metadata.timed_out);
        assert!(!report.result.feature("owner_name").unwrap().is_null());
        for name in ["sale_price", "year_built"] {
            assert!(report.result.feature(name).unwrap().is_null());
            assert_eq!(report.diagnostics[name].kind, DiagnosticKind::TimedOut);
        }
        assert_eq!(report.failed_features(), vec!["sale_price", "year_built"]);
    }

    #[tokio::test]
    async fn test_orchestrator_input_errors() {
        let llm = Arc::new(MockProvider::default());

        let orchestrator = ExtractionOrchestrator::new(
            Arc::new(StaticRetriever::default()),
            Arc::clone(&llm),
            fast_config(),
        )
        .unwrap();
        assert!(matches!(
            orchestrator.extract_features("deed_1", &FeatureSchema::new()).await,
            Err(ExtractorError::EmptySchema)
        ));

        let missing = StaticRetriever::default().with_contains(Ok(false));
        let orchestrator =
            ExtractionOrchestrator::new(Arc::new(missing), Arc::clone(&llm), fast_config()).unwrap();
        assert!(matches!(
            orchestrator.extract_features("deed_9", &property_feature_schema()).await,
            Err(ExtractorError::DocumentNotFound(id)) if id == "deed_9"
        ));

        let down = StaticRetriever::default()
            .with_contains(Err(RetrievalError::Unavailable("refused".into())));
        let down = Arc::new(down);
        let orchestrator =
            ExtractionOrchestrator::new(Arc::clone(&down), Arc::clone(&llm), fast_config()).unwrap();
        assert!(matches!(
            orchestrator.extract_features("deed_1", &property_feature_schema()).await,
            Err(ExtractorError::BackendUnavailable(_))
        ));
        assert_eq!(down.search_count(), 0);
        assert_eq!(llm.call_count(), 0);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = ExtractorConfig::default();
        config.rag.top_k_retrieval = 0;
        let result = ExtractionOrchestrator::new(
            Arc::new(StaticRetriever::default()),
            Arc::new(MockProvider::default()),
            config,
        );
        assert!(matches!(result, Err(ExtractorError::Config(_))));
    }

    #[tokio::test]
    async fn test_overrides_build_new_orchestrator() {
        let llm = MockProvider::new(OWNER_ANSWER);
        let orchestrator = ExtractionOrchestrator::new(
            Arc::new(StaticRetriever::returning(vec![owner_chunk()])),
            Arc::new(llm),
            fast_config(),
        )
        .unwrap();
        let strict = orchestrator
            .with_overrides("[rag]\nconfidence_threshold = 0.95")
            .unwrap();

        let mut schema = FeatureSchema::new();
        schema.insert("owner_name".into(), owner_feature());

        let lenient_report = orchestrator.extract_features("deed_1", &schema).await.unwrap();
        let strict_report = strict.extract_features("deed_1", &schema).await.unwrap();

        assert!(!lenient_report.result.feature("owner_name").unwrap().is_null());
        assert!(strict_report.result.feature("owner_name").unwrap().is_null());
        assert_eq!(strict_report.result.metadata.features_suppressed, 1);
        assert_eq!(orchestrator.config().rag.confidence_threshold, 0.5);
    }

    #[tokio::test]
    async fn test_chunk_ingest_extract_flow() {
        let chunker = DocumentChunker::new(ChunkConfig {
            chunk_size: 60,
            chunk_overlap: 20,
            min_chunk_size: 10,
            ..ChunkConfig::default()
        })
        .unwrap();
        let store = Arc::new(InMemoryVectorStore::default());

        let page_1 = "Warranty Deed. Owner name: John Smith of Springfield.";
        let page_2 = "Zoning classification is R-1 residential. Lot size is 0.25 acres.";
        let mut chunks = chunker.chunk_document(page_1, "deed_1", 1);
        chunks.extend(chunker.chunk_document(page_2, "deed_1", 2));
        store.add_document("deed_1", chunks).unwrap();

        let llm = MockProvider::new(OWNER_ANSWER);
        let mut config = fast_config();
        config.rag.top_k_retrieval = 1;
        let orchestrator =
            ExtractionOrchestrator::new(Arc::clone(&store), Arc::new(llm.clone()), config).unwrap();

        let mut schema = FeatureSchema::new();
        schema.insert("owner_name".into(), owner_feature());
        let report = orchestrator.extract_features("deed_1", &schema).await.unwrap();

        let owner = report.result.feature("owner_name").unwrap();
        assert_eq!(owner.value, Some(ExtractedValue::from("John Smith")));
        assert_eq!(owner.source_chunk_ids.len(), 1);
        assert_eq!(owner.source_pages, vec![1]);
        assert!(owner.source_chunk_ids[0].starts_with("deed_1_chunk_"));
        assert!(llm.prompts()[0].contains("John Smith of Springfield"));

        let json: serde_json::Value = serde_json::from_str(&report.result.to_json().unwrap()).unwrap();
        assert_eq!(json["features"]["owner_name"]["value"], "John Smith");
    }

    #[tokio::test]
    async fn test_batch_reports_document_level_failures() {
        let store = Arc::new(InMemoryVectorStore::default());
        for doc_id in ["deed_1", "deed_2"] {
            store
                .add_document(
                    doc_id,
                    vec![Chunk::new(format!("{}_c0", doc_id), doc_id, 1, "Owner: John Smith", 0, 17)],
                )
                .unwrap();
        }

        let llm = MockProvider::new(OWNER_ANSWER);
        let mut config = fast_config();
        config.pipeline.batch_concurrency = 2;
        let batch = BatchExtractor::new(
            ExtractionOrchestrator::new(store, Arc::new(llm.clone()), config).unwrap(),
        );

        let mut schema = FeatureSchema::new();
        schema.insert("owner_name".into(), owner_feature());
        let jobs = vec![
            DocumentJob::new("deed_1", schema.clone()),
            DocumentJob::new("deed_missing", schema.clone()),
            DocumentJob::new("deed_2", schema.clone()),
            DocumentJob::new("deed_empty", FeatureSchema::new()),
        ];

        let result = batch.extract_batch(jobs).await;

        assert_eq!(result.succeeded, 2);
        assert_eq!(result.failed, 2);
        assert_eq!(result.documents[0].doc_id, "deed_1");
        assert!(matches!(
            result.get("deed_missing").unwrap().result,
            Err(ExtractorError::DocumentNotFound(_))
        ));
        assert!(matches!(
            result.get("deed_empty").unwrap().result,
            Err(ExtractorError::EmptySchema)
        ));
        assert_eq!(result.reports().count(), 2);
        assert_eq!(llm.call_count(), 2);
    }

    #[tokio::test]
    async fn test_batch_surfaces_infrastructure_failure() {
        let retriever = StaticRetriever::returning(vec![owner_chunk()]).failing_for(" ");
        let batch = BatchExtractor::new(
            ExtractionOrchestrator::new(
                Arc::new(retriever),
                Arc::new(MockProvider::new(OWNER_ANSWER)),
                fast_config(),
            )
            .unwrap(),
        );

        let result = batch
            .extract_batch(vec![DocumentJob::new("deed_1", property_feature_schema())])
            .await;

        assert_eq!(result.failed, 1);
        assert!(matches!(
            result.documents[0].result,
            Err(ExtractorError::BackendUnavailable(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_document_check_bounded_by_timeout() {
        let retriever = StaticRetriever::returning(vec![owner_chunk()])
            .with_contains_delay(Duration::from_secs(600));
        let llm = MockProvider::new(OWNER_ANSWER);
        let mut config = fast_config();
        config.pipeline.document_timeout_secs = 5;
        let orchestrator =
            ExtractionOrchestrator::new(Arc::new(retriever), Arc::new(llm.clone()), config).unwrap();

        let start = tokio::time::Instant::now();
        let result = orchestrator.extract_features("deed_1", &property_feature_schema()).await;

        assert!(matches!(result, Err(ExtractorError::Timeout)));
        assert!(start.elapsed() < Duration::from_secs(6));
        assert_eq!(llm.call_count(), 0);
    }

    fn owner_batch(count: usize) -> Vec<DocumentJob> {
        let mut schema = FeatureSchema::new();
        schema.insert("owner_name".into(), owner_feature());
        (0..count)
            .map(|i| DocumentJob::new(format!("deed_{}", i), schema.clone()))
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_runs_one_document_at_a_time() {
        let retriever = Arc::new(
            StaticRetriever::returning(vec![owner_chunk()])
                .delaying("owner", Duration::from_millis(100)),
        );
        let llm = MockProvider::new(OWNER_ANSWER).with_delay(Duration::from_millis(50));
        let mut config = fast_config();
        config.pipeline.batch_concurrency = 1;
        let batch = BatchExtractor::new(
            ExtractionOrchestrator::new(Arc::clone(&retriever), Arc::new(llm.clone()), config)
                .unwrap(),
        );

        let start = tokio::time::Instant::now();
        let result = batch.extract_batch(owner_batch(3)).await;

        assert_eq!(result.succeeded, 3);
        assert_eq!(retriever.search_count(), 3);
        assert_eq!(retriever.peak_in_flight(), 1);
        assert_eq!(llm.call_count(), 3);
        assert!(start.elapsed() >= Duration::from_millis(450));
    }

    #[tokio::test(start_paused = true)]
    async fn test_batch_overlaps_documents_up_to_limit() {
        let retriever = Arc::new(
            StaticRetriever::returning(vec![owner_chunk()])
                .delaying("owner", Duration::from_millis(100)),
        );
        let llm = MockProvider::new(OWNER_ANSWER).with_delay(Duration::from_millis(50));
        let mut config = fast_config();
        config.pipeline.batch_concurrency = 2;
        let batch = BatchExtractor::new(
            ExtractionOrchestrator::new(Arc::clone(&retriever), Arc::new(llm), config).unwrap(),
        );

        let result = batch.extract_batch(owner_batch(5)).await;

        assert_eq!(result.succeeded, 5);
        assert_eq!(retriever.peak_in_flight(), 2);
    }

    #[tokio::test]
    async fn test_features_queue_on_shared_generation_budget() {
        let mut schema = FeatureSchema::new();
        for name in ["owner_name", "grantor_name", "grantee_name", "buyer_name"] {
            schema.insert(
                name.into(),
                FeatureDefinition::new(name, "a party to the deed", DataType::String),
            );
        }
        let llm = MockProvider::new(OWNER_ANSWER);
        let limited = RateLimitedProvider::with_burst(llm.clone(), 20, 1).unwrap();
        let orchestrator = ExtractionOrchestrator::new(
            Arc::new(StaticRetriever::returning(vec![owner_chunk()])),
            Arc::new(limited),
            fast_config(),
        )
        .unwrap();

        let start = std::time::Instant::now();
        let report = orchestrator.extract_features("deed_1", &schema).await.unwrap();

        assert_eq!(llm.call_count(), 4);
        assert!(report.diagnostics.is_empty());
        assert_eq!(report.result.metadata.features_extracted, 4);
        // burst of one at 20/s spaces the four calls 50ms apart
        assert!(start.elapsed() >= Duration::from_millis(140));
    }
}
