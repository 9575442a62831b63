//! Render Document
//!
//! Loads a template record and a data file, validates the data against the
//! template's schema and prints the final HTML.
//!
//! Run with: cargo run --example render_document -- template.json data.json
//!
//! Without arguments a built-in receipt template and sample data are used.

use anyhow::{bail, Context};
use form_engine::FormSession;
use template::{parse_template, render_and_store, DocumentStore, MemoryStore, TemplateCompiler};
use tracing_subscriber::EnvFilter;

const SAMPLE_TEMPLATE: &str = r#"{
    "id": "receipt",
    "name": "Receipt",
    "schema": {
        "title": "Receipt",
        "fields": [
            { "name": "client", "label": "Client", "type": "text", "required": true },
            { "name": "date", "label": "Date", "type": "date" },
            { "name": "vat", "label": "VAT %", "type": "number", "min": 0, "max": 100 },
            { "name": "items", "label": "Items", "type": "array", "itemFields": [
                { "name": "description", "type": "text", "required": true },
                { "name": "quantity", "type": "number", "integer": true },
                { "name": "unit_price", "type": "number", "min": 0 }
            ] }
        ]
    },
    "html": "<h1>{{client}}</h1><p>{{formatDate date}}</p><ul>{{#each items}}<li>{{add @index 1}}. {{description}}: {{formatCurrency (multiply quantity unit_price) currency=\"EUR\" locale=\"es-ES\"}}</li>{{/each}}</ul><p>Total: {{formatCurrency (calculate_grand_total items vat 0) currency=\"EUR\" locale=\"es-ES\"}}</p>",
    "css": "body { font-family: sans-serif; }"
}"#;

const SAMPLE_DATA: &str = r#"{
    "client": "ACME S.L.",
    "date": "2024-07-30",
    "vat": 21,
    "items": [
        { "description": "Hosting", "quantity": 12, "unit_price": 9.5 },
        { "description": "Domain", "quantity": 1, "unit_price": 12 }
    ]
}"#;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (template_json, data_json) = match args.as_slice() {
        [] => (SAMPLE_TEMPLATE.to_string(), SAMPLE_DATA.to_string()),
        [template_path, data_path] => (
            std::fs::read_to_string(template_path)
                .with_context(|| format!("reading {template_path}"))?,
            std::fs::read_to_string(data_path).with_context(|| format!("reading {data_path}"))?,
        ),
        _ => bail!("usage: render_document [template.json data.json]"),
    };

    let parsed = parse_template(&template_json)?;
    let id = parsed.id.clone();
    let mut store = MemoryStore::new();
    store.insert_template(parsed);
    let template = store.template(&id)?;

    let mut session = FormSession::new(template.schema.clone(), &serde_json::Value::Null);
    session.load_json(&data_json)?;

    let outcome = render_and_store(
        &TemplateCompiler::new(),
        &template,
        &mut session,
        &template.name,
        &mut store,
        None,
    )?;

    for warning in &outcome.warnings {
        tracing::warn!("{}", warning);
    }
    tracing::info!("Stored {}", outcome.document_id);

    println!("{}", outcome.document.rendered_html);

    Ok(())
}
