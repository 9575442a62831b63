//! WASM bindings for docforge
//!
//! This crate provides JavaScript-friendly API for:
//! - Editing form data against a schema (validation, coercion, repeated groups)
//! - Compiling template previews with built-in and custom helpers
//! - Locale-aware currency and date formatting
//!
//! # Example (JavaScript)
//!
//! ```javascript
//! import init, { FormSession, TemplateCompiler } from 'docforge-wasm';
//!
//! await init();
//!
//! const form = new FormSession(template.schema, { vat: 21 });
//! form.setField('client_name', 'ACME');
//! const idx = form.addArrayItem('line_items');
//! form.setArrayItem('line_items', idx, 'unit_price', '100');
//!
//! if (form.canSubmit()) {
//!   const compiler = new TemplateCompiler();
//!   const { previewHtml } = compiler.compilePreview({
//!     html: template.html,
//!     css: template.css,
//!     data: form.submit(),
//!     helpers: template.helpers,
//!   });
//! }
//! ```

use serde::Serialize;
use wasm_bindgen::prelude::*;

// Initialize panic hook for better error messages in browser console
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(JsValue::from)
}

fn js_error(message: impl std::fmt::Display) -> JsValue {
    js_sys::Error::new(&message.to_string()).into()
}

/// Form editing session
#[wasm_bindgen]
pub struct FormSession {
    inner: form_engine::FormSession,
}

#[wasm_bindgen]
impl FormSession {
    /// Create a session
    ///
    /// @param schema - Schema object `{ title, description, fields }`
    /// @param initialData - Initial values (optional)
    #[wasm_bindgen(constructor)]
    pub fn new(schema: JsValue, initial_data: JsValue) -> Result<FormSession, JsValue> {
        let schema: serde_json::Value = serde_wasm_bindgen::from_value(schema)?;
        let initial: serde_json::Value = if initial_data.is_undefined() || initial_data.is_null() {
            serde_json::Value::Null
        } else {
            serde_wasm_bindgen::from_value(initial_data)?
        };

        Ok(FormSession {
            inner: form_engine::FormSession::new(
                form_engine::Schema::from_value(&schema),
                &initial,
            ),
        })
    }

    /// Re-initialize from a JSON document string
    ///
    /// Invalid JSON throws and leaves the form untouched.
    #[wasm_bindgen(js_name = loadJson)]
    pub fn load_json(&mut self, json: &str) -> Result<(), JsValue> {
        self.inner.load_json(json).map_err(js_error)
    }

    /// Current data object
    pub fn state(&self) -> Result<JsValue, JsValue> {
        to_js(self.inner.state())
    }

    /// Current errors: `{ field: message | null }`
    pub fn errors(&self) -> Result<JsValue, JsValue> {
        to_js(self.inner.errors())
    }

    /// Current error of one field
    pub fn error(&self, name: &str) -> Option<String> {
        self.inner.error(name).map(str::to_string)
    }

    #[wasm_bindgen(js_name = canSubmit)]
    pub fn can_submit(&self) -> bool {
        self.inner.can_submit()
    }

    /// Set a top-level field (number fields coerce strings)
    #[wasm_bindgen(js_name = setField)]
    pub fn set_field(&mut self, name: &str, value: JsValue) -> Result<(), JsValue> {
        let value: serde_json::Value = serde_wasm_bindgen::from_value(value)?;
        self.inner.set_field(name, value).map_err(js_error)
    }

    /// Set one sub-field of one array item
    #[wasm_bindgen(js_name = setArrayItem)]
    pub fn set_array_item(
        &mut self,
        array: &str,
        index: usize,
        field: &str,
        value: JsValue,
    ) -> Result<(), JsValue> {
        let value: serde_json::Value = serde_wasm_bindgen::from_value(value)?;
        self.inner
            .set_array_item(array, index, field, value)
            .map_err(js_error)
    }

    /// Append an empty item
    ///
    /// @returns Index of the new item
    #[wasm_bindgen(js_name = addArrayItem)]
    pub fn add_array_item(&mut self, array: &str) -> Result<usize, JsValue> {
        self.inner.add_array_item(array).map_err(js_error)
    }

    /// Remove an item
    #[wasm_bindgen(js_name = removeArrayItem)]
    pub fn remove_array_item(&mut self, array: &str, index: usize) -> Result<(), JsValue> {
        self.inner
            .remove_array_item(array, index)
            .map(|_| ())
            .map_err(js_error)
    }

    /// Validate everything
    ///
    /// @returns The data object; throws the errors object when invalid
    pub fn submit(&mut self) -> Result<JsValue, JsValue> {
        match self.inner.submit() {
            Ok(data) => to_js(&data),
            Err(errors) => Err(to_js(&errors)?),
        }
    }

    /// Check an image before uploading it
    ///
    /// @returns Error message, or undefined when the file is acceptable
    #[wasm_bindgen(js_name = checkUpload)]
    pub fn check_upload(&self, field: &str, mime: &str, size_bytes: f64) -> Option<String> {
        match &self.inner.schema().field(field)?.kind {
            form_engine::FieldKind::Image(rules) => rules.check_upload(mime, size_bytes as u64),
            _ => None,
        }
    }
}

/// Template compiler
#[wasm_bindgen]
pub struct TemplateCompiler {
    inner: template::TemplateCompiler,
}

#[wasm_bindgen]
impl TemplateCompiler {
    /// Create a compiler
    ///
    /// @param options - `{ strict_mode, escape_html, script }` (optional)
    #[wasm_bindgen(constructor)]
    pub fn new(options: JsValue) -> Result<TemplateCompiler, JsValue> {
        let options: template::CompileOptions = if options.is_undefined() || options.is_null() {
            template::CompileOptions::default()
        } else {
            serde_wasm_bindgen::from_value(options)?
        };

        Ok(TemplateCompiler {
            inner: template::TemplateCompiler::with_options(options),
        })
    }

    /// Compile a preview
    ///
    /// @param request - `{ html, css, data, helpers }`
    /// @returns `{ previewHtml, warnings? }`; throws `{ message, error? }`
    #[wasm_bindgen(js_name = compilePreview)]
    pub fn compile_preview(&self, request: JsValue) -> Result<JsValue, JsValue> {
        let request: template::PreviewRequest = serde_wasm_bindgen::from_value(request)?;

        match template::compile_preview(&self.inner, &request) {
            Ok(response) => to_js(&response),
            Err(error) => Err(to_js(&error)?),
        }
    }

    /// Render a template record with data
    ///
    /// @returns Final HTML (`<style>` + compiled HTML)
    #[wasm_bindgen(js_name = renderTemplate)]
    pub fn render_template(&self, record: JsValue, data: JsValue) -> Result<String, JsValue> {
        let record: template::Template = serde_wasm_bindgen::from_value(record)?;
        let data: serde_json::Value = serde_wasm_bindgen::from_value(data)?;

        self.inner
            .render_template(&record, &data)
            .map(|output| output.html)
            .map_err(js_error)
    }
}

/// Locale formatting utilities
#[wasm_bindgen]
pub struct DocFormatter;

#[wasm_bindgen]
impl DocFormatter {
    /// Format an amount as currency
    ///
    /// @param amount - Amount
    /// @param currency - ISO 4217 code (e.g., "EUR")
    /// @param locale - Locale tag (e.g., "es-ES")
    #[wasm_bindgen(js_name = formatCurrency)]
    pub fn format_currency(amount: f64, currency: &str, locale: &str) -> Result<String, JsValue> {
        doc_format::format_currency(amount, currency, locale).map_err(js_error)
    }

    /// Format an ISO date as a long localized date
    ///
    /// @returns e.g. "30 de julio de 2024"
    #[wasm_bindgen(js_name = formatDate)]
    pub fn format_date(iso: &str, locale: &str) -> Result<String, JsValue> {
        doc_format::format_date_long(iso, locale).map_err(js_error)
    }
}
