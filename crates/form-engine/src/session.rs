//! Form editing session

use crate::field::{FieldDef, FieldKind};
use crate::schema::Schema;
use crate::validate::{coerce_number, validate_field};
use crate::{FormError, Result};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Current value of every schema field, keyed by field name
pub type FormState = Map<String, Value>;

/// Current error of every schema field (`None` = valid)
pub type ValidationState = BTreeMap<String, Option<String>>;

/// Live, validated data object for one editing session
#[derive(Debug, Clone)]
pub struct FormSession {
    schema: Schema,
    state: FormState,
    errors: ValidationState,
}

impl FormSession {
    /// Start a session for a schema, pre-filled with `initial` data
    ///
    /// Every field gets `initial[name]` when present, else `[]` for arrays
    /// and `""` for everything else. Errors are computed right away so
    /// invalid pre-filled data is visible without any edit.
    pub fn new(schema: Schema, initial: &Value) -> Self {
        let mut session = Self {
            schema: Schema::default(),
            state: FormState::new(),
            errors: ValidationState::new(),
        };
        session.initialize(schema, initial);
        session
    }

    /// Replace the schema and rebuild all state from `initial`
    pub fn initialize(&mut self, schema: Schema, initial: &Value) {
        self.schema = schema;
        self.reset(initial);
    }

    /// Re-initialize the current schema from a JSON document
    ///
    /// Invalid JSON leaves the session untouched.
    pub fn load_json(&mut self, json: &str) -> Result<()> {
        let data: Value = serde_json::from_str(json)?;
        self.reset(&data);
        Ok(())
    }

    fn reset(&mut self, initial: &Value) {
        self.state = self
            .schema
            .fields
            .iter()
            .map(|field| {
                let value = initial
                    .get(&field.name)
                    .cloned()
                    .unwrap_or_else(|| empty_value(field));
                (field.name.clone(), value)
            })
            .collect();
        self.revalidate_all();

        tracing::debug!(
            "Initialized form '{}' with {} fields",
            self.schema.title,
            self.state.len()
        );
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn state(&self) -> &FormState {
        &self.state
    }

    pub fn errors(&self) -> &ValidationState {
        &self.errors
    }

    /// Current value of a field
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.state.get(name)
    }

    /// Current error of a field
    pub fn error(&self, name: &str) -> Option<&str> {
        self.errors.get(name).and_then(|e| e.as_deref())
    }

    /// Whether every field is currently valid
    pub fn can_submit(&self) -> bool {
        self.errors.values().all(Option::is_none)
    }

    /// Set a top-level field
    ///
    /// Number fields coerce string input (see [`coerce_number`]). Only this
    /// field's error is recomputed.
    pub fn set_field(&mut self, name: &str, raw: Value) -> Result<()> {
        let field = self.field_def(name)?;
        let value = coerce_input(field, raw);
        let error = validate_field(field, Some(&value));

        self.state.insert(name.to_string(), value);
        self.errors.insert(name.to_string(), error);
        Ok(())
    }

    /// Set one sub-field of one array item
    ///
    /// The item is replaced by a shallow-merged copy and the whole array
    /// field is revalidated.
    pub fn set_array_item(
        &mut self,
        array: &str,
        index: usize,
        item_field: &str,
        value: Value,
    ) -> Result<()> {
        let field = self.field_def(array)?;
        let item_def = field
            .item_fields()
            .ok_or_else(|| FormError::NotAnArray(array.to_string()))?
            .iter()
            .find(|f| f.name == item_field)
            .ok_or_else(|| FormError::UnknownField(format!("{array}.{item_field}")))?;
        let value = coerce_input(item_def, value);
        self.check_index(array, index)?;

        let items = self.items_mut(array)?;
        let len = items.len();
        let item = items.get_mut(index).ok_or(FormError::IndexOutOfBounds {
            field: array.to_string(),
            index,
            len,
        })?;

        let mut merged = match item {
            Value::Object(map) => map.clone(),
            _ => Map::new(),
        };
        merged.insert(item_field.to_string(), value);
        *item = Value::Object(merged);

        self.revalidate(array);
        Ok(())
    }

    /// Append an empty item to an array field, returning its index
    pub fn add_array_item(&mut self, array: &str) -> Result<usize> {
        let item: Map<String, Value> = self
            .field_def(array)?
            .item_fields()
            .ok_or_else(|| FormError::NotAnArray(array.to_string()))?
            .iter()
            .map(|f| (f.name.clone(), Value::String(String::new())))
            .collect();

        let items = self.items_mut(array)?;
        items.push(Value::Object(item));
        let index = items.len() - 1;

        self.revalidate(array);
        Ok(index)
    }

    /// Remove an item from an array field, returning it
    pub fn remove_array_item(&mut self, array: &str, index: usize) -> Result<Value> {
        self.field_def(array)?
            .item_fields()
            .ok_or_else(|| FormError::NotAnArray(array.to_string()))?;

        self.check_index(array, index)?;

        let removed = self.items_mut(array)?.remove(index);

        self.revalidate(array);
        Ok(removed)
    }

    /// Validate everything and hand out the data if it is all valid
    ///
    /// On failure the full validation state is returned so every error can be
    /// shown, not just the first.
    pub fn submit(&mut self) -> std::result::Result<FormState, ValidationState> {
        self.revalidate_all();

        if self.can_submit() {
            Ok(self.state.clone())
        } else {
            let failing = self.errors.values().filter(|e| e.is_some()).count();
            tracing::debug!("Submit rejected with {} invalid fields", failing);
            Err(self.errors.clone())
        }
    }

    /// Consume the session, returning the current data
    pub fn into_state(self) -> FormState {
        self.state
    }

    fn field_def(&self, name: &str) -> Result<&FieldDef> {
        self.schema.field(name).ok_or_else(|| {
            tracing::warn!("Edit of unknown field '{}' ignored", name);
            FormError::UnknownField(name.to_string())
        })
    }

    /// Bounds check against the current value; a non-array holds no items
    fn check_index(&self, array: &str, index: usize) -> Result<()> {
        let len = self
            .state
            .get(array)
            .and_then(Value::as_array)
            .map_or(0, Vec::len);
        if index < len {
            Ok(())
        } else {
            Err(FormError::IndexOutOfBounds {
                field: array.to_string(),
                index,
                len,
            })
        }
    }

    /// Array value of a field, replacing a non-array value with `[]`
    fn items_mut(&mut self, array: &str) -> Result<&mut Vec<Value>> {
        let slot = self
            .state
            .entry(array.to_string())
            .or_insert_with(|| Value::Array(Vec::new()));
        if !slot.is_array() {
            *slot = Value::Array(Vec::new());
        }
        slot.as_array_mut()
            .ok_or_else(|| FormError::NotAnArray(array.to_string()))
    }

    fn revalidate(&mut self, name: &str) {
        if let Some(field) = self.schema.field(name) {
            let error = validate_field(field, self.state.get(name));
            self.errors.insert(name.to_string(), error);
        }
    }

    fn revalidate_all(&mut self) {
        self.errors = self
            .schema
            .fields
            .iter()
            .map(|field| {
                (
                    field.name.clone(),
                    validate_field(field, self.state.get(&field.name)),
                )
            })
            .collect();
    }
}

fn empty_value(field: &FieldDef) -> Value {
    match field.kind {
        FieldKind::Array(_) => Value::Array(Vec::new()),
        _ => Value::String(String::new()),
    }
}

fn coerce_input(field: &FieldDef, raw: Value) -> Value {
    match &field.kind {
        FieldKind::Number(rules) => coerce_number(rules.integer, raw),
        _ => raw,
    }
}
