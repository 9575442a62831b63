//! Field definition types

use crate::value::{parse_number, value_to_string};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Default accepted MIME list for image uploads
pub const DEFAULT_ACCEPT_MIME: &str = "image/*";

/// Default maximum image upload size in megabytes
pub const DEFAULT_MAX_SIZE_MB: f64 = 5.0;

/// One named, typed, constrained input slot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDef {
    /// Key of the value in the data object
    pub name: String,

    /// Display text
    #[serde(default)]
    pub label: String,

    /// Empty values are an error when set
    #[serde(default)]
    pub required: bool,

    /// Input placeholder (UI only)
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,

    /// Type tag and type-specific constraints
    #[serde(flatten)]
    pub kind: FieldKind,
}

impl FieldDef {
    /// Label for messages, falling back to the field name
    pub fn display_name(&self) -> &str {
        if self.label.trim().is_empty() {
            &self.name
        } else {
            &self.label
        }
    }

    /// Whether this is a number field that only accepts integers
    pub fn is_integer(&self) -> bool {
        matches!(&self.kind, FieldKind::Number(rules) if rules.integer)
    }

    /// Item fields when this is an array field
    pub fn item_fields(&self) -> Option<&[FieldDef]> {
        match &self.kind {
            FieldKind::Array(rules) => Some(&rules.item_fields),
            _ => None,
        }
    }

    /// Type tag as written in schemas
    pub fn type_name(&self) -> &'static str {
        match &self.kind {
            FieldKind::Text(_) => "text",
            FieldKind::Number(_) => "number",
            FieldKind::Textarea(_) => "textarea",
            FieldKind::Select(_) => "select",
            FieldKind::Date(_) => "date",
            FieldKind::Image(_) => "image",
            FieldKind::Array(_) => "array",
        }
    }
}

/// Field kind (tagged union on `type`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldKind {
    /// Single-line text
    Text(TextRules),

    /// Number, coerced from text input
    Number(NumberRules),

    /// Multi-line text
    Textarea(TextRules),

    /// One value out of a fixed option list
    Select(SelectRules),

    /// Date string (`YYYY-MM-DD`)
    Date(TextRules),

    /// URL of an uploaded image
    Image(ImageRules),

    /// Repeated group of item fields
    Array(ArrayRules),
}

/// Constraints for text-like fields
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TextRules {
    /// Minimum length in characters
    #[serde(rename = "minLength")]
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,

    /// Maximum length in characters
    #[serde(rename = "maxLength")]
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,

    /// Regular expression the value must match (unanchored)
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<FieldPattern>,

    /// Well-known format
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<TextFormat>,
}

/// Constraints for number fields
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NumberRules {
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,

    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,

    /// Input step (UI only)
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step: Option<f64>,

    /// Reject values with a fractional part
    #[serde(default)]
    pub integer: bool,
}

/// Constraints for select fields
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SelectRules {
    #[serde(default)]
    pub options: Vec<SelectOption>,
}

/// Select option
///
/// Option values may be strings, numbers or booleans.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SelectOption {
    #[serde(deserialize_with = "scalar_value")]
    pub value: Value,

    #[serde(default)]
    pub label: String,
}

impl SelectOption {
    /// Whether a form value selects this option
    ///
    /// `21`, `21.0` and `"21"` all select an option with value `21`.
    pub fn matches(&self, value: &Value) -> bool {
        if value_to_string(&self.value) == value_to_string(value) {
            return true;
        }
        match (&self.value, value) {
            (Value::Bool(_), _) | (_, Value::Bool(_)) => false,
            _ => matches!(
                (parse_number(&self.value), parse_number(value)),
                (Some(a), Some(b)) if a == b
            ),
        }
    }
}

fn scalar_value<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Value, D::Error> {
    match Value::deserialize(deserializer)? {
        value @ (Value::String(_) | Value::Number(_) | Value::Bool(_)) => Ok(value),
        other => Err(serde::de::Error::custom(format!(
            "option value must be a string, number or boolean, got {other}"
        ))),
    }
}

/// Constraints for image fields
///
/// The stored value is the URL returned by asset storage, so text rules
/// apply to it. `acceptMime` and `maxSizeMB` are checked by the uploader
/// through [`ImageRules::check_upload`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImageRules {
    #[serde(flatten)]
    pub text: TextRules,

    /// Comma-separated MIME list, `type/*` wildcards allowed
    #[serde(rename = "acceptMime")]
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accept_mime: Option<String>,

    /// Upload size limit in megabytes
    #[serde(rename = "maxSizeMB")]
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_size_mb: Option<f64>,
}

impl ImageRules {
    /// Check an upload before it is sent to asset storage
    ///
    /// Returns an error message when the MIME type is not accepted or the
    /// file is larger than the limit.
    pub fn check_upload(&self, mime: &str, size_bytes: u64) -> Option<String> {
        let accept = self.accept_mime.as_deref().unwrap_or(DEFAULT_ACCEPT_MIME);
        if !mime_allowed(mime, accept) {
            return Some("File type is not allowed. Select a valid image.".to_string());
        }

        let max_mb = self.max_size_mb.unwrap_or(DEFAULT_MAX_SIZE_MB);
        let max_bytes = max_mb * 1024.0 * 1024.0;
        if size_bytes as f64 > max_bytes {
            return Some(format!(
                "File exceeds the maximum allowed size of {max_mb} MB."
            ));
        }

        None
    }
}

fn mime_allowed(mime: &str, accept: &str) -> bool {
    if accept.trim().is_empty() {
        return true;
    }

    let mime = mime.trim().to_ascii_lowercase();
    accept
        .split(',')
        .map(|part| part.trim().to_ascii_lowercase())
        .any(|part| match part.strip_suffix("/*") {
            Some(prefix) => mime.starts_with(&format!("{prefix}/")),
            None => mime == part,
        })
}

/// Constraints for array fields
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArrayRules {
    /// Fields of each item (never arrays themselves)
    #[serde(rename = "itemFields")]
    pub item_fields: Vec<FieldDef>,

    #[serde(rename = "minItems")]
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_items: Option<usize>,

    #[serde(rename = "maxItems")]
    #[serde(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<usize>,
}

/// Compiled validation pattern
#[derive(Debug, Clone)]
pub struct FieldPattern(Regex);

impl FieldPattern {
    /// Compile a pattern
    pub fn new(pattern: &str) -> Result<Self, regex::Error> {
        Regex::new(pattern).map(Self)
    }

    /// Whether the value contains a match
    pub fn is_match(&self, value: &str) -> bool {
        self.0.is_match(value)
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Serialize for FieldPattern {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for FieldPattern {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let pattern = String::deserialize(deserializer)?;
        FieldPattern::new(&pattern).map_err(serde::de::Error::custom)
    }
}

/// Well-known text formats
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextFormat {
    Email,
    Url,
    /// Unrecognized format name, not checked
    Other(String),
}

impl TextFormat {
    pub fn as_str(&self) -> &str {
        match self {
            TextFormat::Email => "email",
            TextFormat::Url => "url",
            TextFormat::Other(name) => name,
        }
    }
}

impl From<&str> for TextFormat {
    fn from(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "email" => TextFormat::Email,
            "url" => TextFormat::Url,
            _ => TextFormat::Other(name.to_string()),
        }
    }
}

impl Serialize for TextFormat {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for TextFormat {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(TextFormat::from(name.as_str()))
    }
}
