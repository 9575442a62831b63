//! Built-in helpers

use super::{HelperKind, HelperRegistry};
use crate::parser::{is_truthy, to_number};
use doc_format::DEFAULT_LOCALE;
use form_engine::number_value;
use serde_json::{Map, Value};
use std::cmp::Ordering;

/// Locale used by `formatDate` when none is given
pub const DEFAULT_DATE_LOCALE: &str = "es-ES";

const DEFAULT_CURRENCY: &str = "USD";

pub(super) fn register_all(registry: &mut HelperRegistry) {
    registry.register_fn("json", json);
    registry.register_fn("formatCurrency", format_currency);
    registry.register_fn("formatDate", format_date);

    registry.register_fn("calculate_subtotal", calculate_subtotal);
    registry.register_fn("calculate_tax", calculate_tax);
    registry.register_fn("calculate_grand_total", calculate_grand_total);

    registry.register_fn("add", |p, _| arithmetic(p, |a, b| a + b));
    registry.register_fn("subtract", |p, _| arithmetic(p, |a, b| a - b));
    registry.register_fn("multiply", |p, _| arithmetic(p, |a, b| a * b));
    registry.register_fn("divide", divide);

    registry.register_fn("eq", |p, _| Value::Bool(strict_eq(arg(p, 0), arg(p, 1))));
    registry.register_fn("neq", |p, _| Value::Bool(!strict_eq(arg(p, 0), arg(p, 1))));
    registry.register_fn("lt", |p, _| ordered(p, |o| o == Ordering::Less));
    registry.register_fn("gt", |p, _| ordered(p, |o| o == Ordering::Greater));
    registry.register_fn("lte", |p, _| ordered(p, |o| o != Ordering::Greater));
    registry.register_fn("gte", |p, _| ordered(p, |o| o != Ordering::Less));

    registry.register_fn("and", |p, _| Value::Bool(p.iter().all(is_truthy)));
    registry.register_fn("or", |p, _| Value::Bool(p.iter().any(is_truthy)));
    registry.register_fn("not", |p, _| Value::Bool(!is_truthy(arg(p, 0))));

    registry.register_block("if_eq", HelperKind::IfEq);
}

fn arg(params: &[Value], idx: usize) -> &Value {
    static NULL: Value = Value::Null;
    params.get(idx).unwrap_or(&NULL)
}

/// Strict equality: same kind and same value
///
/// Numbers compare by value (`1` equals `1.0`). Arrays and objects are never
/// equal, not even to themselves.
pub fn strict_eq(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Null, Value::Null) => true,
        _ => false,
    }
}

/// Ordering between two values of the same comparable kind
fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

fn ordered(params: &[Value], accept: fn(Ordering) -> bool) -> Value {
    let result = compare(arg(params, 0), arg(params, 1)).is_some_and(accept);
    Value::Bool(result)
}

fn json(params: &[Value], _: &Map<String, Value>) -> Value {
    params
        .first()
        .and_then(|v| serde_json::to_string_pretty(v).ok())
        .map(Value::String)
        .unwrap_or(Value::Null)
}

/// `{{formatCurrency value currency="EUR" locale="es-ES"}}`
///
/// Currency and locale may also be passed positionally. Values that are not
/// JSON numbers come back unchanged.
fn format_currency(params: &[Value], hash: &Map<String, Value>) -> Value {
    let value = arg(params, 0);
    let Some(amount) = value.as_f64() else {
        return value.clone();
    };

    let option = |key: &str, idx: usize, default: &'static str| -> String {
        hash.get(key)
            .or_else(|| params.get(idx))
            .and_then(Value::as_str)
            .unwrap_or(default)
            .to_string()
    };
    let currency = option("currency", 1, DEFAULT_CURRENCY);
    let locale = option("locale", 2, DEFAULT_LOCALE);

    match doc_format::format_currency(amount, &currency, &locale) {
        Ok(formatted) => Value::String(formatted),
        Err(e) => {
            tracing::warn!("formatCurrency: {}", e);
            number_value(amount)
        }
    }
}

/// `{{formatDate isoString "en-US"}}`
fn format_date(params: &[Value], _: &Map<String, Value>) -> Value {
    let value = arg(params, 0);
    if !is_truthy(value) {
        return Value::String(String::new());
    }
    let Some(iso) = value.as_str() else {
        return value.clone();
    };

    let locale = params
        .get(1)
        .and_then(Value::as_str)
        .unwrap_or(DEFAULT_DATE_LOCALE);

    match doc_format::format_date_long(iso, locale) {
        Ok(formatted) => Value::String(formatted),
        Err(e) => {
            tracing::debug!("formatDate: {}", e);
            value.clone()
        }
    }
}

/// Item value with falsy values replaced by `fallback`
fn item_number(item: &Value, key: &str, fallback: f64) -> Option<f64> {
    match item.get(key) {
        Some(v) if is_truthy(v) => to_number(v),
        _ => Some(fallback),
    }
}

/// Sum of `unit_price * quantity` over line items
///
/// A missing price counts as 0 and a missing quantity as 1. Lines with a
/// non-numeric price or quantity contribute nothing.
fn subtotal(items: &[Value]) -> f64 {
    items
        .iter()
        .map(|item| {
            match (
                item_number(item, "unit_price", 0.0),
                item_number(item, "quantity", 1.0),
            ) {
                (Some(price), Some(quantity)) => price * quantity,
                _ => 0.0,
            }
        })
        .sum()
}

fn calculate_subtotal(params: &[Value], _: &Map<String, Value>) -> Value {
    match arg(params, 0) {
        Value::Array(items) => number_value(subtotal(items)),
        _ => Value::from(0),
    }
}

fn calculate_tax(params: &[Value], _: &Map<String, Value>) -> Value {
    match (to_number(arg(params, 0)), to_number(arg(params, 1))) {
        (Some(base), Some(percent)) => number_value(base * percent / 100.0),
        _ => Value::from(0),
    }
}

/// `subtotal + VAT - IRPF` over line items
fn calculate_grand_total(params: &[Value], _: &Map<String, Value>) -> Value {
    let Value::Array(items) = arg(params, 0) else {
        return Value::from(0);
    };

    let subtotal = subtotal(items);
    let vat = to_number(arg(params, 1)).unwrap_or(0.0);
    let irpf = to_number(arg(params, 2)).unwrap_or(0.0);

    number_value(subtotal + subtotal * vat / 100.0 - subtotal * irpf / 100.0)
}

/// Numeric coercion then arithmetic; `null` when either side is not a number
fn arithmetic(params: &[Value], op: fn(f64, f64) -> f64) -> Value {
    match (to_number(arg(params, 0)), to_number(arg(params, 1))) {
        (Some(a), Some(b)) => number_value(op(a, b)),
        _ => Value::Null,
    }
}

fn divide(params: &[Value], _: &Map<String, Value>) -> Value {
    if to_number(arg(params, 1)) == Some(0.0) {
        return Value::String("Cannot divide by zero".to_string());
    }
    arithmetic(params, |a, b| a / b)
}
