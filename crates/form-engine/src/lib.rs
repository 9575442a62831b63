//! Form Engine - schema-driven form state and validation
//!
//! This crate provides:
//! - Typed field definitions (text, number, textarea, select, date, image, array)
//! - Lenient schema loading that skips malformed fields instead of failing
//! - Per-field validation, recursive for repeated groups
//! - An editing session that keeps data and errors in sync
//!
//! # Example
//!
//! ```
//! use form_engine::{FormSession, Schema};
//! use serde_json::json;
//!
//! let schema = Schema::from_value(&json!({
//!     "title": "Invoice",
//!     "fields": [
//!         { "name": "client", "label": "Client", "type": "text", "required": true },
//!         { "name": "vat", "label": "VAT", "type": "number", "min": 0, "max": 100 }
//!     ]
//! }));
//!
//! let mut session = FormSession::new(schema, &json!({}));
//! assert!(!session.can_submit());
//!
//! session.set_field("client", json!("ACME")).unwrap();
//! session.set_field("vat", json!("21")).unwrap();
//! let data = session.submit().unwrap();
//! assert_eq!(data["vat"], json!(21));
//! ```

pub mod field;
pub mod schema;
mod session;
mod validate;
mod value;

pub use field::{
    ArrayRules, FieldDef, FieldKind, FieldPattern, ImageRules, NumberRules, SelectOption,
    SelectRules, TextFormat, TextRules,
};
pub use schema::{Schema, SchemaIssue};
pub use session::{FormSession, FormState, ValidationState};
pub use validate::{coerce_number, validate_field};
pub use value::{is_empty, number_value, parse_number, value_to_string};

use thiserror::Error;

/// Errors that can occur while editing a form
///
/// Validation problems are never reported here; they live in the
/// [`ValidationState`] of the session.
#[derive(Debug, Error)]
pub enum FormError {
    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Field '{0}' is not an array field")]
    NotAnArray(String),

    #[error("Index {index} out of bounds for '{field}' ({len} items)")]
    IndexOutOfBounds {
        field: String,
        index: usize,
        len: usize,
    },

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type for form operations
pub type Result<T> = std::result::Result<T, FormError>;
