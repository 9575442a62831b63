//! Per-field validation and input coercion

use crate::field::{ArrayRules, FieldDef, FieldKind, NumberRules, SelectRules, TextFormat, TextRules};
use crate::value::{is_empty, number_value, parse_number, value_to_string};
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

/// Validate a field value
///
/// Returns `None` when the value is acceptable, otherwise a message. Array
/// fields validate every item against their item fields.
pub fn validate_field(field: &FieldDef, value: Option<&Value>) -> Option<String> {
    let label = field.display_name();

    if is_empty(value) {
        if !field.required {
            return None;
        }
        return Some(format!("{label} is required"));
    }

    // Not empty, so a value is present
    let value = value?;

    match &field.kind {
        FieldKind::Number(rules) => validate_number(label, rules, value),
        FieldKind::Text(rules) | FieldKind::Textarea(rules) | FieldKind::Date(rules) => {
            validate_text(label, rules, value)
        }
        FieldKind::Image(rules) => validate_text(label, &rules.text, value),
        FieldKind::Select(rules) => validate_select(label, rules, value),
        FieldKind::Array(rules) => validate_array(label, rules, value),
    }
}

fn validate_number(label: &str, rules: &NumberRules, value: &Value) -> Option<String> {
    let Some(n) = parse_number(value) else {
        return Some(format!("{label} must be a number"));
    };

    if rules.integer && n.fract() != 0.0 {
        return Some(format!("{label} must be an integer"));
    }
    if let Some(min) = rules.min {
        if n < min {
            return Some(format!("{label} must be at least {min}"));
        }
    }
    if let Some(max) = rules.max {
        if n > max {
            return Some(format!("{label} must be at most {max}"));
        }
    }

    None
}

fn validate_text(label: &str, rules: &TextRules, value: &Value) -> Option<String> {
    let text = value_to_string(value);
    let len = text.chars().count();

    if let Some(min) = rules.min_length {
        if len < min {
            return Some(format!("{label} must be at least {min} characters"));
        }
    }
    if let Some(max) = rules.max_length {
        if len > max {
            return Some(format!("{label} must be at most {max} characters"));
        }
    }
    if let Some(pattern) = &rules.pattern {
        if !pattern.is_match(&text) {
            return Some(format!("{label} has an invalid format"));
        }
    }

    match &rules.format {
        Some(TextFormat::Email) if !email_regex().is_match(&text) => {
            Some(format!("{label} must be a valid email address"))
        }
        Some(TextFormat::Url) if !is_valid_url(&text) => {
            Some(format!("{label} must be a valid URL"))
        }
        _ => None,
    }
}

fn validate_select(label: &str, rules: &SelectRules, value: &Value) -> Option<String> {
    if rules.options.is_empty() {
        return None;
    }

    if rules.options.iter().any(|option| option.matches(value)) {
        None
    } else {
        Some(format!("{label} must be one of the available options"))
    }
}

fn validate_array(label: &str, rules: &ArrayRules, value: &Value) -> Option<String> {
    let Some(items) = value.as_array() else {
        return Some(format!("{label} must be a list"));
    };

    if let Some(min) = rules.min_items {
        if items.len() < min {
            return Some(format!("{label} requires at least {min} items"));
        }
    }

    for (idx, item) in items.iter().enumerate() {
        for item_field in &rules.item_fields {
            let item_value = item.get(&item_field.name);
            if let Some(error) = validate_field(item_field, item_value) {
                return Some(format!("{label} item {}: {error}", idx + 1));
            }
        }
    }

    if let Some(max) = rules.max_items {
        if items.len() > max {
            return Some(format!("{label} allows at most {max} items"));
        }
    }

    None
}

fn email_regex() -> &'static Regex {
    static EMAIL_RE: OnceLock<Regex> = OnceLock::new();
    EMAIL_RE.get_or_init(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap())
}

fn is_valid_url(text: &str) -> bool {
    url::Url::parse(text.trim()).is_ok_and(|url| url.has_host())
}

/// Coerce raw input for a number field
///
/// Blank strings become `""` (cleared). Other strings parse as a float;
/// when `integer` is set only integral results (`"7.0"`, `"1e3"`) are
/// converted. Anything else is kept as typed so validation can report it.
/// Non-string values pass through.
pub fn coerce_number(integer: bool, raw: Value) -> Value {
    let Value::String(text) = &raw else {
        return raw;
    };

    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Value::String(String::new());
    }

    match trimmed.parse::<f64>() {
        Ok(n) if n.is_finite() && (!integer || n.fract() == 0.0) => number_value(n),
        _ => raw,
    }
}
