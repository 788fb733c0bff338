//! Configuration for the Extractor
//!
//! Configuration is an immutable value: overrides build a new one.

use crate::error::ExtractorError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Most generation calls allowed for one feature, first attempt included
pub const MAX_GENERATION_ATTEMPTS: u32 = 3;

/// Chunking settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkConfig {
    /// Maximum chunk length (characters)
    pub chunk_size: usize,

    /// Maximum overlap carried into the next chunk (characters)
    pub chunk_overlap: usize,

    /// Texts shorter than this are kept as a single chunk (characters)
    pub min_chunk_size: usize,

    /// Characters that may end a sentence
    pub sentence_terminators: String,
}

impl ChunkConfig {
    /// Validate the chunking settings
    pub fn validate(&self) -> Result<(), String> {
        if self.chunk_size == 0 {
            return Err("chunk_size must be greater than 0".to_string());
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err("chunk_overlap must be less than chunk_size".to_string());
        }
        if self.min_chunk_size > self.chunk_size {
            return Err("min_chunk_size cannot exceed chunk_size".to_string());
        }
        if self.sentence_terminators.trim().is_empty() {
            return Err("sentence_terminators must not be empty".to_string());
        }
        Ok(())
    }
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: 800,
            chunk_overlap: 100,
            min_chunk_size: 50,
            sentence_terminators: ".!?".to_string(),
        }
    }
}

/// Retrieval and generation settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Generation model name
    pub model: String,

    /// Sampling temperature (0.0 - 2.0)
    pub llm_temperature: f64,

    /// Chunks retrieved per feature (1 - 20)
    pub top_k_retrieval: usize,

    /// Generation token limit (100 - 4000)
    pub max_tokens: u32,

    /// Values below this confidence are suppressed to null (0.0 - 1.0)
    pub confidence_threshold: f64,
}

impl RagConfig {
    /// Validate the retrieval and generation settings
    pub fn validate(&self) -> Result<(), String> {
        if self.model.trim().is_empty() {
            return Err("model must not be empty".to_string());
        }
        if !(0.0..=2.0).contains(&self.llm_temperature) {
            return Err("llm_temperature must be between 0.0 and 2.0".to_string());
        }
        if !(1..=20).contains(&self.top_k_retrieval) {
            return Err("top_k_retrieval must be between 1 and 20".to_string());
        }
        if !(100..=4000).contains(&self.max_tokens) {
            return Err("max_tokens must be between 100 and 4000".to_string());
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err("confidence_threshold must be between 0.0 and 1.0".to_string());
        }
        Ok(())
    }
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4".to_string(),
            llm_temperature: 0.0,
            top_k_retrieval: 5,
            max_tokens: 1000,
            confidence_threshold: 0.5,
        }
    }
}

/// Retry, concurrency and timeout settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Generation calls per feature, first attempt included
    pub max_attempts: u32,

    /// Delay before the second attempt; doubles afterwards (milliseconds)
    pub retry_base_delay_ms: u64,

    /// Upper bound for any retry delay (milliseconds)
    pub retry_max_delay_ms: u64,

    /// Documents extracted concurrently in a batch
    pub batch_concurrency: usize,

    /// Generation calls allowed per minute
    pub rate_limit_per_minute: u32,

    /// Maximum time for one document's extraction pass (seconds)
    pub document_timeout_secs: u64,
}

impl PipelineConfig {
    /// Delay before the second attempt
    pub fn retry_base_delay(&self) -> Duration {
        Duration::from_millis(self.retry_base_delay_ms)
    }

    /// Upper bound for any retry delay
    pub fn retry_max_delay(&self) -> Duration {
        Duration::from_millis(self.retry_max_delay_ms)
    }

    /// Get the document timeout as a Duration
    pub fn document_timeout(&self) -> Duration {
        Duration::from_secs(self.document_timeout_secs)
    }

    /// Validate the pipeline settings
    pub fn validate(&self) -> Result<(), String> {
        if !(1..=MAX_GENERATION_ATTEMPTS).contains(&self.max_attempts) {
            return Err(format!(
                "max_attempts must be between 1 and {}",
                MAX_GENERATION_ATTEMPTS
            ));
        }
        if self.retry_max_delay_ms < self.retry_base_delay_ms {
            return Err("retry_max_delay_ms cannot be less than retry_base_delay_ms".to_string());
        }
        if self.batch_concurrency == 0 {
            return Err("batch_concurrency must be greater than 0".to_string());
        }
        if self.rate_limit_per_minute == 0 {
            return Err("rate_limit_per_minute must be greater than 0".to_string());
        }
        if self.document_timeout_secs == 0 {
            return Err("document_timeout_secs must be greater than 0".to_string());
        }
        Ok(())
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_attempts: MAX_GENERATION_ATTEMPTS,
            retry_base_delay_ms: 1_000,
            retry_max_delay_ms: 2_000,
            batch_concurrency: 5,
            rate_limit_per_minute: 60,
            document_timeout_secs: 300,
        }
    }
}

/// Configuration for the Extractor
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Chunking settings
    pub chunk: ChunkConfig,

    /// Retrieval and generation settings
    pub rag: RagConfig,

    /// Retry, concurrency and timeout settings
    pub pipeline: PipelineConfig,
}

impl ExtractorConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        self.chunk.validate()?;
        self.rag.validate()?;
        self.pipeline.validate()
    }

    /// Aggressive preset: smaller chunks, stricter threshold, shorter timeouts
    pub fn aggressive() -> Self {
        Self {
            chunk: ChunkConfig {
                chunk_size: 500,
                chunk_overlap: 50,
                min_chunk_size: 30,
                ..ChunkConfig::default()
            },
            rag: RagConfig {
                top_k_retrieval: 3,
                max_tokens: 500,
                confidence_threshold: 0.7,
                ..RagConfig::default()
            },
            pipeline: PipelineConfig {
                max_attempts: 2,
                batch_concurrency: 10,
                document_timeout_secs: 120,
                ..PipelineConfig::default()
            },
        }
    }

    /// Lenient preset: larger chunks, more context, lower threshold
    pub fn lenient() -> Self {
        Self {
            chunk: ChunkConfig {
                chunk_size: 1200,
                chunk_overlap: 200,
                ..ChunkConfig::default()
            },
            rag: RagConfig {
                top_k_retrieval: 10,
                max_tokens: 2000,
                confidence_threshold: 0.3,
                ..RagConfig::default()
            },
            pipeline: PipelineConfig {
                batch_concurrency: 2,
                document_timeout_secs: 600,
                ..PipelineConfig::default()
            },
        }
    }

    /// Load configuration from TOML string; missing keys take their defaults
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }

    /// Build a new validated configuration with `overrides` merged over this one
    ///
    /// # Examples
    ///
    /// ```
    /// use parcel_extractor::ExtractorConfig;
    ///
    /// let base = ExtractorConfig::default();
    /// let tuned = base.with_overrides("[rag]\ntop_k_retrieval = 8").unwrap();
    /// assert_eq!(tuned.rag.top_k_retrieval, 8);
    /// assert_eq!(tuned.rag.model, base.rag.model);
    /// assert_eq!(base.rag.top_k_retrieval, 5);
    /// ```
    pub fn with_overrides(&self, overrides: &str) -> Result<Self, ExtractorError> {
        let mut merged = match toml::Value::try_from(self) {
            Ok(toml::Value::Table(table)) => table,
            Ok(_) => return Err(ExtractorError::Config("Config is not a table".to_string())),
            Err(e) => {
                return Err(ExtractorError::Config(format!(
                    "Failed to serialize config: {}",
                    e
                )))
            }
        };
        let overrides: toml::Table = toml::from_str(overrides)
            .map_err(|e| ExtractorError::Config(format!("Failed to parse overrides: {}", e)))?;

        merge_tables(&mut merged, overrides);

        let config: Self = toml::Value::Table(merged)
            .try_into()
            .map_err(|e| ExtractorError::Config(format!("Invalid overrides: {}", e)))?;
        config.validate().map_err(ExtractorError::Config)?;
        Ok(config)
    }
}

fn merge_tables(base: &mut toml::Table, overrides: toml::Table) {
    for (key, value) in overrides {
        match (base.get_mut(&key), value) {
            (Some(toml::Value::Table(existing)), toml::Value::Table(nested)) => {
                merge_tables(existing, nested);
            }
            (_, value) => {
                base.insert(key, value);
            }
        }
    }
}
