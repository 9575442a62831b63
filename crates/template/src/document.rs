//! Rendered-document pipeline and its collaborators

use crate::{RenderedDocument, Result, Template, TemplateCompiler, TemplateError};
use form_engine::{FieldKind, FormSession};
use serde_json::Value;
use std::collections::BTreeMap;

/// Template and document persistence
pub trait DocumentStore {
    /// Fetch a template by id
    fn template(&self, id: &str) -> Result<Template>;

    /// Persist a rendered document, returning its id
    fn create_document(&mut self, document: &RenderedDocument) -> Result<String>;
}

/// External HTML to PDF service
pub trait PdfRenderer {
    fn render_pdf(&self, html: &str) -> Result<Vec<u8>>;
}

/// Image upload target
pub trait AssetStore {
    /// Store the bytes, returning the public URL
    fn upload(&mut self, filename: &str, mime: &str, bytes: &[u8]) -> Result<String>;
}

/// Everything produced by [`render_and_store`]
#[derive(Debug, Clone)]
pub struct RenderOutcome {
    pub document_id: String,
    pub document: RenderedDocument,
    pub pdf: Option<Vec<u8>>,
    pub warnings: Vec<String>,
}

/// Validate a session, compile the template, persist the document and
/// optionally render a PDF
///
/// Nothing is stored when the form has invalid fields or the template
/// fails to compile.
pub fn render_and_store<S: DocumentStore + ?Sized>(
    compiler: &TemplateCompiler,
    template: &Template,
    session: &mut FormSession,
    name: &str,
    store: &mut S,
    pdf: Option<&dyn PdfRenderer>,
) -> Result<RenderOutcome> {
    let data = session.submit().map_err(|errors| {
        let invalid: Vec<&str> = errors
            .iter()
            .filter(|(_, e)| e.is_some())
            .map(|(name, _)| name.as_str())
            .collect();
        TemplateError::DocumentError(format!("invalid fields: {}", invalid.join(", ")))
    })?;

    let output = compiler.render_template(template, &Value::Object(data.clone()))?;
    let document = RenderedDocument::new(name, &template.id, data, output.html)?;

    let document_id = store.create_document(&document)?;
    tracing::debug!("Stored document '{}' as {}", document.name, document_id);

    let pdf = match pdf {
        Some(renderer) => Some(renderer.render_pdf(&document.rendered_html)?),
        None => None,
    };

    Ok(RenderOutcome {
        document_id,
        document,
        pdf,
        warnings: output.warnings,
    })
}

/// Upload an image for an `image` field and store the returned URL as the
/// field value
///
/// The field's `acceptMime` and `maxSizeMB` rules are checked before
/// anything is sent to the store.
pub fn attach_image<A: AssetStore + ?Sized>(
    session: &mut FormSession,
    field: &str,
    filename: &str,
    mime: &str,
    bytes: &[u8],
    assets: &mut A,
) -> Result<String> {
    let rules = match session.schema().field(field).map(|def| &def.kind) {
        Some(FieldKind::Image(rules)) => rules.clone(),
        Some(_) => {
            return Err(TemplateError::UploadError(format!(
                "Field '{field}' does not accept images"
            )))
        }
        None => return Err(form_engine::FormError::UnknownField(field.to_string()).into()),
    };

    if let Some(message) = rules.check_upload(mime, bytes.len() as u64) {
        return Err(TemplateError::UploadError(message));
    }

    let url = assets.upload(filename, mime, bytes)?;
    tracing::debug!("Uploaded {} for '{}' to {}", filename, field, url);
    session.set_field(field, Value::String(url.clone()))?;
    Ok(url)
}

/// In-memory [`DocumentStore`]
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    templates: BTreeMap<String, Template>,
    documents: Vec<RenderedDocument>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_template(&mut self, template: Template) {
        self.templates.insert(template.id.clone(), template);
    }

    pub fn documents(&self) -> &[RenderedDocument] {
        &self.documents
    }
}

impl DocumentStore for MemoryStore {
    fn template(&self, id: &str) -> Result<Template> {
        self.templates
            .get(id)
            .cloned()
            .ok_or_else(|| TemplateError::StorageError(format!("Template not found: {id}")))
    }

    fn create_document(&mut self, document: &RenderedDocument) -> Result<String> {
        self.documents.push(document.clone());
        Ok(format!("doc-{}", self.documents.len()))
    }
}
