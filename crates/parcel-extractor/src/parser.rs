//! Parse generation output into a typed feature value
//!
//! Everything here is pure: the same response always parses the same way,
//! which is why parse failures are never retried.

use parcel_domain::{DataType, ExtractedValue};
use serde_json::{Map, Value};
use thiserror::Error;

/// Why a model response could not be used
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// Nothing but whitespace came back
    #[error("Empty response")]
    EmptyResponse,

    /// No JSON object could be decoded
    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    /// A `number` feature held something that is not a number
    #[error("Invalid number: {0}")]
    InvalidNumber(String),
}

/// The decoded `{value, confidence, reasoning}` answer
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedResponse {
    /// Raw JSON value, `Null` when absent
    pub value: Value,

    /// Confidence, clamped to `[0, 1]`
    pub confidence: f64,

    /// Model's explanation, if any
    pub reasoning: Option<String>,
}

/// Decode a model response
///
/// Code fences are stripped first; if the remainder is not a JSON object the
/// outermost `{...}` substring is tried.
pub fn parse_response(response: &str) -> Result<ParsedResponse, ParseError> {
    let body = strip_code_fences(response);
    if body.is_empty() {
        return Err(ParseError::EmptyResponse);
    }

    let object = decode_object(body).or_else(|first_err| {
        outer_braces(body)
            .and_then(|inner| decode_object(inner).ok())
            .ok_or(first_err)
    })?;

    let confidence = clamp_confidence(
        object
            .get("confidence")
            .and_then(confidence_of)
            .unwrap_or(0.0),
    );
    let reasoning = object
        .get("reasoning")
        .and_then(Value::as_str)
        .map(str::to_string);

    Ok(ParsedResponse {
        value: object.get("value").cloned().unwrap_or(Value::Null),
        confidence,
        reasoning,
    })
}

fn decode_object(text: &str) -> Result<Map<String, Value>, ParseError> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ParseError::InvalidJson("Expected a JSON object".to_string())),
        Err(e) => Err(ParseError::InvalidJson(e.to_string())),
    }
}

fn confidence_of(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

/// Remove a surrounding markdown code block, if present
pub fn strip_code_fences(response: &str) -> &str {
    let trimmed = response.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // Drop the info string (```json) on the opening line
    let rest = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest.trim_start_matches(|c: char| c.is_alphanumeric()),
    };
    rest.trim_end().trim_end_matches("```").trim()
}

fn outer_braces(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

/// Convert a decoded JSON value to the feature's data type
///
/// `number` features become integers when they have no fractional part and
/// floats otherwise; string numbers lose their thousands separators first.
/// Every other type is kept as text without normalization.
pub fn convert_value(
    value: &Value,
    data_type: DataType,
) -> Result<Option<ExtractedValue>, ParseError> {
    if value.is_null() {
        return Ok(None);
    }

    match data_type {
        DataType::Number => convert_number(value).map(Some),
        DataType::String | DataType::Currency | DataType::Date => Ok(Some(match value {
            Value::String(s) => ExtractedValue::Text(s.clone()),
            other => ExtractedValue::Text(other.to_string()),
        })),
    }
}

fn convert_number(value: &Value) -> Result<ExtractedValue, ParseError> {
    let number = match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Ok(ExtractedValue::Integer(i));
            }
            n.as_f64()
                .ok_or_else(|| ParseError::InvalidNumber(n.to_string()))?
        }
        Value::String(s) => {
            let cleaned: String = s.trim().chars().filter(|c| *c != ',').collect();
            cleaned
                .parse::<f64>()
                .map_err(|_| ParseError::InvalidNumber(s.clone()))?
        }
        other => return Err(ParseError::InvalidNumber(other.to_string())),
    };

    if !number.is_finite() {
        return Err(ParseError::InvalidNumber(number.to_string()));
    }
    if number.fract() == 0.0 && number.abs() < i64::MAX as f64 {
        Ok(ExtractedValue::Integer(number as i64))
    } else {
        Ok(ExtractedValue::Float(number))
    }
}

/// Clamp a confidence into `[0, 1]`; NaN becomes 0.0
pub fn clamp_confidence(confidence: f64) -> f64 {
    if confidence.is_nan() {
        0.0
    } else {
        confidence.clamp(0.0, 1.0)
    }
}

/// Null the value when its confidence is below the threshold
pub fn apply_threshold(
    value: Option<ExtractedValue>,
    confidence: f64,
    threshold: f64,
) -> Option<ExtractedValue> {
    if confidence < threshold {
        None
    } else {
        value
    }
}
