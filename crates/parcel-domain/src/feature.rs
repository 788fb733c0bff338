//! Feature definitions and schemas

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Declared type of a feature value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    /// Free text
    String,
    /// Integer or floating-point number
    Number,
    /// Monetary amount, kept as text
    Currency,
    /// Calendar date, kept as text
    Date,
}

impl DataType {
    /// Lowercase name used in prompts and serialized schemas
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::String => "string",
            DataType::Number => "number",
            DataType::Currency => "currency",
            DataType::Date => "date",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "string" => Ok(DataType::String),
            "number" => Ok(DataType::Number),
            "currency" => Ok(DataType::Currency),
            "date" => Ok(DataType::Date),
            other => Err(format!("Unknown data type: {}", other)),
        }
    }
}

/// A validation rule attached to a feature
///
/// Rules travel with the schema for downstream validators; the extraction
/// engine does not enforce them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationRule {
    /// Rule identifier (e.g. `min_length`, `pattern`)
    pub rule_type: String,

    /// Rule parameters
    #[serde(default)]
    pub parameters: serde_json::Map<String, serde_json::Value>,
}

impl ValidationRule {
    /// Create a rule from a type and a JSON object of parameters
    pub fn new(rule_type: impl Into<String>, parameters: serde_json::Value) -> Self {
        let parameters = match parameters {
            serde_json::Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        Self {
            rule_type: rule_type.into(),
            parameters,
        }
    }
}

/// Definition of a property feature to extract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureDefinition {
    /// Feature name, also the key in the result map
    pub name: String,

    /// Human-readable description, used in queries and prompts
    pub description: String,

    /// Declared value type
    pub data_type: DataType,

    /// Whether downstream consumers expect this feature to be present
    #[serde(default)]
    pub required: bool,

    /// Feature-specific instructions embedded in the generation prompt
    #[serde(default)]
    pub extraction_prompt_template: String,

    /// Informational validation rules
    #[serde(default)]
    pub validation_rules: Vec<ValidationRule>,
}

impl FeatureDefinition {
    /// Create an optional feature with no extra instructions
    ///
    /// # Examples
    ///
    /// ```
    /// use parcel_domain::{DataType, FeatureDefinition};
    ///
    /// let feature = FeatureDefinition::new("owner_name", "name of property owner", DataType::String)
    ///     .required(true);
    /// assert!(feature.required);
    /// ```
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        data_type: DataType,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            data_type,
            required: false,
            extraction_prompt_template: String::new(),
            validation_rules: Vec::new(),
        }
    }

    /// Set the required flag
    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Set the extraction instructions
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.extraction_prompt_template = prompt.into();
        self
    }

    /// Append a validation rule
    pub fn with_rule(mut self, rule: ValidationRule) -> Self {
        self.validation_rules.push(rule);
        self
    }
}

/// Ordered mapping from feature name to definition
pub type FeatureSchema = IndexMap<String, FeatureDefinition>;
