//! Integration tests for schema loading and form sessions

use form_engine::{FieldKind, FormError, FormSession, Schema};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

const INVOICE_SCHEMA: &str = r#"{
    "title": "Invoice",
    "description": "Simple invoice",
    "fields": [
        { "name": "client_name", "label": "Client", "type": "text", "required": true },
        { "name": "email", "label": "Email", "type": "text", "format": "email" },
        { "name": "issue_date", "label": "Issue date", "type": "date", "required": true },
        { "name": "currency", "label": "Currency", "type": "select",
          "options": [ { "value": "EUR", "label": "Euro" }, { "value": "USD", "label": "US Dollar" } ] },
        { "name": "vat", "label": "VAT %", "type": "number", "min": 0, "max": 100, "step": 0.5 },
        { "name": "notes", "label": "Notes", "type": "textarea", "maxLength": 200 },
        { "name": "logo", "label": "Logo", "type": "image", "maxSizeMB": 2 },
        { "name": "items", "label": "Items", "type": "array", "required": true, "minItems": 1,
          "itemFields": [
            { "name": "description", "label": "Description", "type": "text", "required": true },
            { "name": "quantity", "label": "Quantity", "type": "number", "integer": true, "min": 1 },
            { "name": "unit_price", "label": "Unit price", "type": "number", "min": 0 }
          ] }
    ]
}"#;

fn schema() -> Schema {
    Schema::from_json(INVOICE_SCHEMA).unwrap()
}

#[test]
fn test_parse_invoice_schema() {
    let schema = schema();

    assert_eq!(schema.title, "Invoice");
    assert_eq!(schema.fields.len(), 8);

    let types: Vec<&str> = schema.fields.iter().map(|f| f.type_name()).collect();
    assert_eq!(
        types,
        vec!["text", "text", "date", "select", "number", "textarea", "image", "array"]
    );

    match &schema.field("vat").unwrap().kind {
        FieldKind::Number(rules) => {
            assert_eq!(rules.min, Some(0.0));
            assert_eq!(rules.step, Some(0.5));
        }
        other => panic!("unexpected kind {other:?}"),
    }
}

#[test]
fn test_fill_and_submit_invoice() {
    let mut session = FormSession::new(schema(), &json!({ "currency": "EUR" }));
    assert!(!session.can_submit());

    session.set_field("client_name", json!("ACME Corp")).unwrap();
    session.set_field("issue_date", json!("2024-07-30")).unwrap();
    session.set_field("vat", json!("21")).unwrap();

    let idx = session.add_array_item("items").unwrap();
    session.set_array_item("items", idx, "description", json!("Consulting")).unwrap();
    session.set_array_item("items", idx, "quantity", json!("10")).unwrap();
    session.set_array_item("items", idx, "unit_price", json!("45.5")).unwrap();

    let data = session.submit().unwrap();
    assert_eq!(
        Value::Object(data),
        json!({
            "client_name": "ACME Corp",
            "email": "",
            "issue_date": "2024-07-30",
            "currency": "EUR",
            "vat": 21,
            "notes": "",
            "logo": "",
            "items": [ { "description": "Consulting", "quantity": 10, "unit_price": 45.5 } ]
        })
    );
}

#[test]
fn test_submit_collects_every_error() {
    let mut session = FormSession::new(
        schema(),
        &json!({ "email": "not-an-email", "currency": "GBP" }),
    );

    let errors = session.submit().unwrap_err();
    let failing: Vec<&str> = errors
        .iter()
        .filter(|(_, e)| e.is_some())
        .map(|(name, _)| name.as_str())
        .collect();

    assert_eq!(
        failing,
        vec!["client_name", "currency", "email", "issue_date", "items"]
    );
}

#[test]
fn test_item_errors_surface_on_array_field() {
    let mut session = FormSession::new(
        schema(),
        &json!({ "items": [ { "description": "A", "quantity": 1 } ] }),
    );
    assert_eq!(session.error("items"), None);

    session.set_array_item("items", 0, "quantity", json!("0")).unwrap();
    assert_eq!(
        session.error("items"),
        Some("Items item 1: Quantity must be at least 1")
    );

    session.remove_array_item("items", 0).unwrap();
    assert_eq!(session.error("items"), Some("Items is required"));
}

#[test]
fn test_lenient_schema_keeps_good_fields() {
    let (schema, issues) = Schema::load(&json!({
        "fields": [
            { "name": "a", "type": "text" },
            { "name": "b", "type": "signature" },
            { "name": "c", "type": "number", "min": "zero" }
        ]
    }));

    assert_eq!(schema.fields.len(), 1);
    assert_eq!(issues.len(), 2);

    let mut session = FormSession::new(schema, &json!({ "b": "ignored" }));
    assert!(session.value("b").is_none());
    assert!(matches!(
        session.set_field("b", json!("x")),
        Err(FormError::UnknownField(_))
    ));
}

#[test]
fn test_load_data_from_json() {
    let mut session = FormSession::new(schema(), &json!({}));
    session
        .load_json(r#"{ "client_name": "Loaded", "items": [ { "description": "X" } ] }"#)
        .unwrap();

    assert_eq!(session.value("client_name"), Some(&json!("Loaded")));
    assert_eq!(session.error("items"), None);
    assert_eq!(session.error("issue_date"), Some("Issue date is required"));
}

#[test]
fn test_image_upload_limits() {
    let schema = schema();
    let FieldKind::Image(rules) = &schema.field("logo").unwrap().kind else {
        panic!("logo should be an image field");
    };

    assert!(rules.check_upload("image/png", 1024).is_none());
    assert!(rules.check_upload("application/pdf", 1024).is_some());
    assert!(rules.check_upload("image/png", 3 * 1024 * 1024).is_some());
}
