//! Compile-preview boundary
//!
//! Request/response shapes for previewing a template while it is being
//! edited. Status codes follow HTTP: missing input is a client error, any
//! compilation or render failure is a server error.

use crate::{CustomHelper, TemplateCompiler};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Preview input
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PreviewRequest {
    pub html: Option<String>,

    #[serde(default)]
    pub css: Option<String>,

    /// `None` when absent; an explicit `null` is `Some(Value::Null)`
    #[serde(default, deserialize_with = "present")]
    pub data: Option<Value>,

    #[serde(default, deserialize_with = "null_as_empty")]
    pub helpers: Vec<CustomHelper>,
}

/// Preview output
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreviewResponse {
    #[serde(rename = "previewHtml")]
    pub preview_html: String,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Preview failure with its status code
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{message}")]
pub struct PreviewError {
    #[serde(skip)]
    pub status: u16,

    pub message: String,

    /// Underlying engine message
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl PreviewError {
    fn missing_input() -> Self {
        Self {
            status: 400,
            message: "Template HTML or data is missing.".to_string(),
            error: None,
        }
    }

    fn compile_failed(error: impl ToString) -> Self {
        Self {
            status: 500,
            message: "Error compiling template".to_string(),
            error: Some(error.to_string()),
        }
    }
}

/// Compile a preview
pub fn compile_preview(
    compiler: &TemplateCompiler,
    request: &PreviewRequest,
) -> Result<PreviewResponse, PreviewError> {
    let (Some(html), Some(data)) = (&request.html, &request.data) else {
        return Err(PreviewError::missing_input());
    };
    let css = request.css.as_deref().unwrap_or_default();

    let output = compiler
        .render(html, css, data, &request.helpers)
        .map_err(|e| {
            tracing::warn!("Error compiling template: {}", e);
            PreviewError::compile_failed(e)
        })?;

    Ok(PreviewResponse {
        preview_html: output.html,
        warnings: output.warnings,
    })
}

/// Handle a raw JSON request body, returning status and JSON response body
pub fn handle_preview_json(compiler: &TemplateCompiler, body: &str) -> (u16, Value) {
    let result = serde_json::from_str::<PreviewRequest>(body)
        .map_err(PreviewError::compile_failed)
        .and_then(|request| compile_preview(compiler, &request));

    let (status, body) = match result {
        Ok(response) => (200, serde_json::to_value(response)),
        Err(error) => (error.status, serde_json::to_value(error)),
    };
    (status, body.unwrap_or(Value::Null))
}

fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

fn null_as_empty<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Vec<CustomHelper>, D::Error> {
    Ok(Option::<Vec<CustomHelper>>::deserialize(deserializer)?.unwrap_or_default())
}
