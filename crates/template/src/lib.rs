//! Template Engine - HTML template compilation with helpers
//!
//! This crate provides:
//! - Template records (schema + html + css + custom helpers)
//! - A per-compilation helper registry with built-in formatting,
//!   arithmetic, comparison and invoice helpers
//! - Sandboxed script helpers supplied alongside a template
//! - Final document assembly (`<style>` + compiled HTML)
//! - The compile-preview boundary and the rendered-document pipeline
//!
//! # Example
//!
//! ```
//! use template::TemplateCompiler;
//! use serde_json::json;
//!
//! let compiler = TemplateCompiler::new();
//! let html = compiler
//!     .compile(
//!         "<p>{{client}}: {{formatCurrency (calculate_subtotal items) currency=\"EUR\" locale=\"es-ES\"}}</p>",
//!         &json!({ "client": "ACME", "items": [ { "unit_price": 1200, "quantity": 2 } ] }),
//!         &[],
//!     )
//!     .unwrap();
//! assert_eq!(html.html, "<p>ACME: 2400,00\u{a0}€</p>");
//! ```

mod compiler;
pub mod document;
pub mod helpers;
pub mod parser;
pub mod preview;
mod schema;

pub use compiler::{CompileOptions, CompileOutput, TemplateCompiler};
pub use document::{
    attach_image, render_and_store, AssetStore, DocumentStore, MemoryStore, PdfRenderer,
    RenderOutcome,
};
pub use helpers::{HelperRegistry, ScriptLimits};
pub use parser::parse_template;
pub use preview::{
    compile_preview, handle_preview_json, PreviewError, PreviewRequest, PreviewResponse,
};
pub use schema::*;

use thiserror::Error;

/// Errors that can occur during template processing
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Failed to parse template: {0}")]
    ParseError(String),

    /// Template syntax failure, carrying the engine message
    #[error("Template compilation error: {0}")]
    CompileError(String),

    #[error("Render error: {0}")]
    RenderError(String),

    #[error("Helper error: {0}")]
    HelperError(String),

    #[error("Invalid document: {0}")]
    DocumentError(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("Upload rejected: {0}")]
    UploadError(String),

    #[error(transparent)]
    FormError(#[from] form_engine::FormError),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type for template operations
pub type Result<T> = std::result::Result<T, TemplateError>;
