//! Template JSON parsing and loose value coercion for helpers

use crate::{Result, Template, TemplateError};
use serde_json::Value;

/// Parse a template from JSON string
pub fn parse_template(json: &str) -> Result<Template> {
    serde_json::from_str(json).map_err(|e| TemplateError::ParseError(e.to_string()))
}

/// Loose numeric coercion of a helper argument
///
/// `null`, `false` and blank strings are `0`, `true` is `1`, numeric strings
/// parse. Arrays, objects and anything unparseable are `None`.
pub fn to_number(value: &Value) -> Option<f64> {
    match value {
        Value::Null => Some(0.0),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::Number(n) => n.as_f64(),
        Value::String(s) if s.trim().is_empty() => Some(0.0),
        Value::String(_) => form_engine::parse_number(value),
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// Check if a helper argument is truthy
///
/// Only `null`, `false`, `0` and `""` are false. Unlike `{{#if}}`, empty
/// arrays and objects are true.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|n| n != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
