//! Prompt construction for single-feature extraction

use parcel_domain::{FeatureDefinition, SearchResult};

const EXTRACTION_INSTRUCTIONS: &str = "\
You are extracting one field from property documents such as deeds, tax records and appraisals.
Use only the document excerpts below. Do not guess or invent information.";

const RESOLUTION_RULES: &str = "\
Rules:
- If the excerpts do not contain the information, return null as the value.
- If the field appears several times with different values, prefer the most recent or most authoritative one.
- Copy the value as written in the document; do not reformat it.
- Confidence is a number between 0.0 and 1.0 reflecting how clearly the excerpts state the value.";

const OUTPUT_FORMAT: &str = r#"Respond with a single JSON object and nothing else:
{"value": <extracted value or null>, "confidence": <0.0-1.0>, "reasoning": "<short explanation>"}"#;

/// Builds the generation prompt for one feature
pub struct PromptBuilder<'a> {
    feature: &'a FeatureDefinition,
    chunks: &'a [SearchResult],
}

impl<'a> PromptBuilder<'a> {
    /// Create a builder for a feature with no context yet
    pub fn new(feature: &'a FeatureDefinition) -> Self {
        Self {
            feature,
            chunks: &[],
        }
    }

    /// Set the retrieved chunks shown to the model
    pub fn with_chunks(mut self, chunks: &'a [SearchResult]) -> Self {
        self.chunks = chunks;
        self
    }

    /// Build the complete extraction prompt
    pub fn build(&self) -> String {
        let feature = self.feature;
        let mut prompt = String::new();

        prompt.push_str(EXTRACTION_INSTRUCTIONS);
        prompt.push_str("\n\n");

        prompt.push_str(&format!("Field: {}\n", feature.name));
        prompt.push_str(&format!("Description: {}\n", feature.description));
        prompt.push_str(&format!("Data type: {}\n", feature.data_type));
        prompt.push_str(&format!(
            "Required: {}\n",
            if feature.required { "yes" } else { "no" }
        ));
        if !feature.extraction_prompt_template.trim().is_empty() {
            prompt.push_str(&format!(
                "Instructions: {}\n",
                feature.extraction_prompt_template.trim()
            ));
        }
        prompt.push('\n');

        prompt.push_str("Document excerpts:\n");
        for (idx, result) in self.chunks.iter().enumerate() {
            prompt.push_str(&format!(
                "[Excerpt {} | page {}]\n{}\n\n",
                idx + 1,
                result.chunk.page_number(),
                result.chunk.text()
            ));
        }

        prompt.push_str(RESOLUTION_RULES);
        prompt.push_str("\n\n");
        prompt.push_str(OUTPUT_FORMAT);

        prompt
    }
}
