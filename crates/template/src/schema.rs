//! Template and document record types

use crate::{Result, TemplateError};
use form_engine::{FormState, Schema};
use serde::{Deserialize, Deserializer, Serialize};

/// Root template structure
///
/// Templates are authored elsewhere and consumed as-is. Missing `css` and a
/// `null` helper list are accepted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Template {
    /// Persistence identifier
    #[serde(default)]
    pub id: String,

    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Form schema for the template data
    #[serde(default)]
    pub schema: Schema,

    /// Handlebars HTML source
    pub html: String,

    #[serde(default)]
    pub css: String,

    /// Helpers registered before compiling `html`
    #[serde(default, deserialize_with = "null_as_empty")]
    pub helpers: Vec<CustomHelper>,
}

impl Template {
    /// Parse a template from JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        crate::parser::parse_template(json)
    }

    /// Serialize the template to pretty JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(TemplateError::JsonError)
    }
}

/// Helper supplied alongside a template
///
/// `body` is a script closure such as `|a, b| a + b`. It receives the
/// helper's positional arguments and its return value is rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomHelper {
    pub name: String,
    pub body: String,
}

impl CustomHelper {
    pub fn new(name: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            body: body.into(),
        }
    }
}

/// Output artifact of compiling a template against filled data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderedDocument {
    pub name: String,

    /// Id of the source template
    #[serde(rename = "template")]
    pub template_id: String,

    pub data: FormState,

    pub rendered_html: String,
}

impl RenderedDocument {
    /// Assemble a document, rejecting a blank name or empty HTML
    pub fn new(
        name: impl Into<String>,
        template_id: impl Into<String>,
        data: FormState,
        rendered_html: impl Into<String>,
    ) -> Result<Self> {
        let name = name.into();
        let rendered_html = rendered_html.into();

        if name.trim().is_empty() {
            return Err(TemplateError::DocumentError(
                "document name must not be blank".to_string(),
            ));
        }
        if rendered_html.is_empty() {
            return Err(TemplateError::DocumentError(
                "rendered HTML must not be empty".to_string(),
            ));
        }

        Ok(Self {
            name: name.trim().to_string(),
            template_id: template_id.into(),
            data,
            rendered_html,
        })
    }
}

fn null_as_empty<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
