//! Pure value conversions used during merge.
//!
//! Every function either produces a final storage value or fails; nothing
//! here touches a record, so a failed coercion leaves the field untouched
//! at the call site.

use std::fmt;

use serde_json::Value;

use crate::model::FieldValue;

#[derive(Debug, Clone, PartialEq)]
pub enum CoerceError {
    /// Input cannot be parsed as a number.
    InvalidNumericValue(String),
    /// Structured field given something other than a list or mapping.
    UnsupportedStructuredType(String),
}

impl fmt::Display for CoerceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidNumericValue(v) => write!(f, "not a numeric value: {v}"),
            Self::UnsupportedStructuredType(v) => {
                write!(f, "unsupported structured value type: {v}")
            }
        }
    }
}

impl std::error::Error for CoerceError {}

/// Convert a numeric field input to an integer. Accepts JSON integers,
/// finite floats (truncated toward zero), and numeric strings in either
/// form.
pub fn to_integer(value: &Value) -> Result<i64, CoerceError> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                return Ok(i);
            }
            if let Some(f) = n.as_f64() {
                if f.is_finite() {
                    return Ok(f.trunc() as i64);
                }
            }
            Err(CoerceError::InvalidNumericValue(n.to_string()))
        }
        Value::String(s) => {
            let s = s.trim();
            if let Ok(i) = s.parse::<i64>() {
                return Ok(i);
            }
            match s.parse::<f64>() {
                Ok(f) if f.is_finite() => Ok(f.trunc() as i64),
                _ => Err(CoerceError::InvalidNumericValue(s.to_string())),
            }
        }
        other => Err(CoerceError::InvalidNumericValue(other.to_string())),
    }
}

/// Serialize a structured (list/mapping) value to its canonical text
/// encoding. serde_json never escapes to ASCII, so full Unicode content
/// is preserved. Anything that is not a list or mapping is rejected.
pub fn to_structured_text(value: &Value) -> Result<String, CoerceError> {
    match value {
        Value::Array(_) | Value::Object(_) => serde_json::to_string(value)
            .map_err(|e| CoerceError::UnsupportedStructuredType(e.to_string())),
        other => Err(CoerceError::UnsupportedStructuredType(type_name(other).to_string())),
    }
}

/// Render any scalar as text. Strings pass through unchanged; other
/// values use their JSON display form.
pub fn to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Coerce a tagged payload value to its storage form.
pub fn to_storage(value: &FieldValue<'_>) -> Result<String, CoerceError> {
    match value {
        FieldValue::Number(v) => to_integer(v).map(|n| n.to_string()),
        FieldValue::Text(s) => Ok((*s).to_string()),
        FieldValue::Structured(v) => to_structured_text(v),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
