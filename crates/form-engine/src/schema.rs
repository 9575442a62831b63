//! Schema loading

use crate::field::{FieldDef, FieldKind};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

/// Declarative description of a form
///
/// Deserializing a schema never fails on individual fields: malformed
/// entries are skipped (see [`Schema::load`]).
#[derive(Debug, Clone, Default, Serialize)]
pub struct Schema {
    pub title: String,
    pub description: String,

    pub fields: Vec<FieldDef>,
}

/// A field definition that was skipped while loading a schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaIssue {
    /// Location of the entry (`fields[2]`, `items.itemFields[0]`)
    pub path: String,
    pub message: String,
}

impl std::fmt::Display for SchemaIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

impl Schema {
    /// Load a schema, dropping malformed fields
    pub fn from_value(value: &Value) -> Self {
        Self::load(value).0
    }

    /// Load a schema from a JSON string
    pub fn from_json(json: &str) -> crate::Result<Self> {
        let value: Value = serde_json::from_str(json)?;
        Ok(Self::from_value(&value))
    }

    /// Load a schema and report every skipped field
    ///
    /// A missing or non-array `fields` entry yields an empty field list.
    /// Unknown types, array fields without `itemFields`, arrays nested in
    /// arrays, invalid patterns, blank names and duplicate names are skipped.
    pub fn load(value: &Value) -> (Self, Vec<SchemaIssue>) {
        let mut issues = Vec::new();

        let text = |key: &str| {
            value
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        let fields = match value.get("fields") {
            Some(Value::Array(entries)) => load_fields(entries, "fields", false, &mut issues),
            Some(_) => {
                issues.push(SchemaIssue {
                    path: "fields".to_string(),
                    message: "expected an array of field definitions".to_string(),
                });
                Vec::new()
            }
            None => Vec::new(),
        };

        for issue in &issues {
            tracing::warn!("Skipping schema entry {}", issue);
        }
        tracing::debug!("Loaded schema with {} fields", fields.len());

        (
            Schema {
                title: text("title"),
                description: text("description"),
                fields,
            },
            issues,
        )
    }

    /// Find a top-level field by name
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }
}

impl<'de> Deserialize<'de> for Schema {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(Schema::from_value(&value))
    }
}

fn load_fields(
    entries: &[Value],
    path: &str,
    nested: bool,
    issues: &mut Vec<SchemaIssue>,
) -> Vec<FieldDef> {
    let mut fields = Vec::new();
    let mut seen = HashSet::new();

    for (idx, entry) in entries.iter().enumerate() {
        let entry_path = format!("{path}[{idx}]");
        let Some(field) = load_field(entry, &entry_path, nested, issues) else {
            continue;
        };

        if !seen.insert(field.name.clone()) {
            issues.push(SchemaIssue {
                path: entry_path,
                message: format!("duplicate field name '{}'", field.name),
            });
            continue;
        }
        fields.push(field);
    }

    fields
}

fn load_field(
    entry: &Value,
    path: &str,
    nested: bool,
    issues: &mut Vec<SchemaIssue>,
) -> Option<FieldDef> {
    let mut issue = |message: String| {
        issues.push(SchemaIssue {
            path: path.to_string(),
            message,
        });
    };

    let Some(object) = entry.as_object() else {
        issue("expected an object".to_string());
        return None;
    };

    let is_array = object.get("type").and_then(Value::as_str) == Some("array");

    if is_array && nested {
        issue("array fields cannot be nested inside array items".to_string());
        return None;
    }

    // Item fields are loaded one by one so a single bad item field does not
    // take the whole group down with it.
    let mut object = object.clone();
    let item_entries = if is_array {
        match object.get_mut("itemFields").map(Value::take) {
            Some(Value::Array(items)) => {
                object.insert("itemFields".to_string(), Value::Array(Vec::new()));
                Some(items)
            }
            _ => {
                issue("array fields must define itemFields".to_string());
                return None;
            }
        }
    } else {
        None
    };

    let mut field: FieldDef = match serde_json::from_value(Value::Object(object)) {
        Ok(field) => field,
        Err(e) => {
            issue(e.to_string());
            return None;
        }
    };

    if field.name.trim().is_empty() {
        issue("field name must not be blank".to_string());
        return None;
    }

    if let (Some(items), FieldKind::Array(rules)) = (item_entries, &mut field.kind) {
        let item_path = format!("{}.itemFields", field.name);
        rules.item_fields = load_fields(&items, &item_path, true, issues);
    }

    Some(field)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_load_schema() {
        let (schema, issues) = Schema::load(&json!({
            "title": "Invoice",
            "description": "Simple invoice",
            "fields": [
                { "name": "client", "label": "Client", "type": "text", "required": true },
                { "name": "items", "type": "array", "itemFields": [
                    { "name": "unit_price", "type": "number" }
                ]}
            ]
        }));

        assert!(issues.is_empty());
        assert_eq!(schema.title, "Invoice");
        assert_eq!(schema.fields.len(), 2);
        assert_eq!(schema.field("items").unwrap().item_fields().unwrap().len(), 1);
    }

    #[test]
    fn test_numeric_select_options_load() {
        let (schema, issues) = Schema::load(&json!({
            "fields": [
                { "name": "vat", "type": "select", "options": [
                    { "value": 21, "label": "21%" },
                    { "value": "exempt", "label": "Exempt" }
                ] },
                { "name": "client", "type": "text" }
            ]
        }));

        assert!(issues.is_empty());
        assert_eq!(schema.fields.len(), 2);
        assert!(schema.field("vat").is_some());
    }

    #[test]
    fn test_missing_fields_degrades_to_empty() {
        let (schema, issues) = Schema::load(&json!({ "title": "Nothing" }));
        assert!(schema.fields.is_empty());
        assert!(issues.is_empty());

        let (schema, issues) = Schema::load(&json!({ "fields": "oops" }));
        assert!(schema.fields.is_empty());
        assert_eq!(issues.len(), 1);
    }

    #[test]
    fn test_malformed_fields_are_skipped() {
        let (schema, issues) = Schema::load(&json!({
            "fields": [
                { "name": "ok", "type": "text" },
                { "name": "weird", "type": "hologram" },
                { "name": "items", "type": "array" },
                { "name": "", "type": "text" },
                { "name": "ok", "type": "number" },
                "not an object"
            ]
        }));

        assert_eq!(schema.fields.len(), 1);
        assert_eq!(schema.fields[0].name, "ok");
        assert_eq!(issues.len(), 5);
        assert_eq!(issues[0].path, "fields[1]");
    }

    #[test]
    fn test_bad_item_fields_are_skipped_individually() {
        let (schema, issues) = Schema::load(&json!({
            "fields": [
                { "name": "items", "type": "array", "itemFields": [
                    { "name": "qty", "type": "number" },
                    { "name": "nested", "type": "array", "itemFields": [] },
                    { "name": "bad", "type": "text", "pattern": "(" }
                ]}
            ]
        }));

        let items = schema.field("items").unwrap().item_fields().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "qty");
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].path, "items.itemFields[1]");
    }

    #[test]
    fn test_deserialize_is_lenient() {
        let schema: Schema = serde_json::from_str(
            r#"{ "fields": [ { "name": "a", "type": "text" }, { "name": "b", "type": "?" } ] }"#,
        )
        .unwrap();
        assert_eq!(schema.fields.len(), 1);
    }
}
