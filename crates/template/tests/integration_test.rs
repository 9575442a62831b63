//! Integration tests for template compilation

use form_engine::FormSession;
use pretty_assertions::assert_eq;
use serde_json::json;
use template::{
    compile_preview, parse_template, render_and_store, CustomHelper, MemoryStore, PreviewRequest,
    Template, TemplateCompiler, TemplateError,
};

const INVOICE_TEMPLATE: &str = r#"{
    "id": "invoice-es",
    "name": "Factura",
    "description": "Invoice with VAT and IRPF",
    "schema": {
        "title": "Factura",
        "fields": [
            { "name": "client_name", "label": "Cliente", "type": "text", "required": true },
            { "name": "issue_date", "label": "Fecha", "type": "date", "required": true },
            { "name": "vat", "label": "IVA", "type": "number", "min": 0, "max": 100 },
            { "name": "irpf", "label": "IRPF", "type": "number", "min": 0, "max": 100 },
            { "name": "line_items", "label": "Conceptos", "type": "array", "required": true,
              "itemFields": [
                { "name": "description", "label": "Concepto", "type": "text", "required": true },
                { "name": "quantity", "label": "Cantidad", "type": "number", "integer": true },
                { "name": "unit_price", "label": "Precio", "type": "number", "min": 0 }
              ] }
        ]
    },
    "html": "<h1>{{client_name}}</h1><p>{{formatDate issue_date}}</p><ul>{{#each line_items}}<li>{{description}} x{{quantity}} = {{formatCurrency (multiply quantity unit_price) currency=\"EUR\" locale=\"es-ES\"}}</li>{{/each}}</ul><p>{{formatCurrency (calculate_subtotal line_items) currency=\"EUR\" locale=\"es-ES\"}}</p><p>{{formatCurrency (calculate_grand_total line_items vat irpf) currency=\"EUR\" locale=\"es-ES\"}}</p>{{#if_eq irpf 0}}<small>sin IRPF</small>{{/if_eq}}",
    "css": "h1 { font-size: 18px; }",
    "helpers": null
}"#;

fn invoice() -> Template {
    parse_template(INVOICE_TEMPLATE).unwrap()
}

#[test]
fn test_render_invoice() {
    let template = invoice();
    let data = json!({
        "client_name": "ACME S.L.",
        "issue_date": "2024-07-30",
        "vat": 21,
        "irpf": 15,
        "line_items": [
            { "description": "Consultoría", "quantity": 10, "unit_price": 50 },
            { "description": "Soporte", "quantity": 2, "unit_price": 25.5 }
        ]
    });

    let html = TemplateCompiler::new()
        .render_template(&template, &data)
        .unwrap()
        .html;

    assert_eq!(
        html,
        "<style>h1 { font-size: 18px; }</style>\
         <h1>ACME S.L.</h1>\
         <p>30 de julio de 2024</p>\
         <ul><li>Consultoría x10 = 500,00\u{a0}€</li><li>Soporte x2 = 51,00\u{a0}€</li></ul>\
         <p>551,00\u{a0}€</p>\
         <p>584,06\u{a0}€</p>"
    );
}

#[test]
fn test_if_eq_branch() {
    let template = invoice();
    let data = json!({ "client_name": "A", "issue_date": "", "irpf": 0, "line_items": [] });

    let html = TemplateCompiler::new()
        .render_template(&template, &data)
        .unwrap()
        .html;

    assert!(html.ends_with("<small>sin IRPF</small>"));
    assert!(html.contains("<p></p>"));
}

#[test]
fn test_form_to_document_pipeline() {
    let template = invoice();
    let mut session = FormSession::new(template.schema.clone(), &json!({ "vat": 21 }));
    session.set_field("client_name", json!("Globex")).unwrap();
    session.set_field("issue_date", json!("2024-01-05")).unwrap();
    session.set_field("irpf", json!("0")).unwrap();
    let idx = session.add_array_item("line_items").unwrap();
    session
        .set_array_item("line_items", idx, "description", json!("Hosting"))
        .unwrap();
    session
        .set_array_item("line_items", idx, "unit_price", json!("100"))
        .unwrap();

    let mut store = MemoryStore::new();
    let outcome = render_and_store(
        &TemplateCompiler::new(),
        &template,
        &mut session,
        "Factura 2024-001",
        &mut store,
        None,
    )
    .unwrap();

    let stored = &store.documents()[0];
    assert_eq!(stored.template_id, "invoice-es");
    assert_eq!(stored.data["irpf"], json!(0));
    assert!(outcome.document.rendered_html.contains("<p>121,00\u{a0}€</p>"));
    assert!(outcome.document.rendered_html.contains("5 de enero de 2024"));

    let persisted = serde_json::to_value(stored).unwrap();
    assert_eq!(persisted["template"], json!("invoice-es"));
    assert!(persisted["rendered_html"].is_string());
}

#[test]
fn test_custom_helpers_from_template() {
    let mut template = invoice();
    template.html = "{{initials client_name}} {{line_count line_items}}".to_string();
    template.helpers = vec![
        CustomHelper::new(
            "initials",
            r#"|name| {
                let out = "";
                for word in name.split(" ") {
                    out += word.sub_string(0, 1);
                }
                out
            }"#,
        ),
        CustomHelper::new("line_count", "|items| items.len()"),
    ];

    let output = TemplateCompiler::new()
        .render_template(
            &template,
            &json!({ "client_name": "Ada Lovelace", "line_items": [ {}, {} ] }),
        )
        .unwrap();

    assert!(output.html.ends_with("AL 2"));
    assert!(output.warnings.is_empty());
}

#[test]
fn test_preview_matches_render() {
    let template = invoice();
    let data = json!({ "client_name": "A", "issue_date": "2024-07-30", "line_items": [] });

    let request: PreviewRequest = serde_json::from_value(json!({
        "html": template.html,
        "css": template.css,
        "data": data
    }))
    .unwrap();

    let compiler = TemplateCompiler::new();
    let preview = compile_preview(&compiler, &request).unwrap();
    let rendered = compiler.render_template(&template, &data).unwrap();

    assert_eq!(preview.preview_html, rendered.html);
}

#[test]
fn test_error_kinds_are_distinct() {
    let compiler = TemplateCompiler::new();

    assert!(matches!(
        compiler.compile("{{#each}}", &json!({}), &[]),
        Err(TemplateError::CompileError(_))
    ));
    assert!(matches!(
        parse_template("{ \"name\": 1 }"),
        Err(TemplateError::ParseError(_))
    ));
}
