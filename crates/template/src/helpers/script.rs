//! Sandboxed script helpers

use crate::{Result, TemplateError};
use form_engine::number_value;
use rhai::module_resolvers::DummyModuleResolver;
use rhai::{Dynamic, Engine, FnPtr, AST};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::sync::Arc;

/// Resource limits for script helpers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptLimits {
    /// Operations per call (bounds loops)
    pub max_operations: u64,
    pub max_call_levels: usize,
    pub max_expr_depth: usize,
    pub max_string_size: usize,
    pub max_array_size: usize,
    pub max_map_size: usize,
}

impl Default for ScriptLimits {
    fn default() -> Self {
        Self {
            max_operations: 100_000,
            max_call_levels: 32,
            max_expr_depth: 64,
            max_string_size: 1_000_000,
            max_array_size: 10_000,
            max_map_size: 10_000,
        }
    }
}

/// Build an engine with the given limits and no module loading
pub(super) fn sandboxed_engine(limits: &ScriptLimits) -> Engine {
    let mut engine = Engine::new();

    engine.set_max_operations(limits.max_operations);
    engine.set_max_call_levels(limits.max_call_levels);
    engine.set_max_expr_depths(limits.max_expr_depth, limits.max_expr_depth);
    engine.set_max_string_size(limits.max_string_size);
    engine.set_max_array_size(limits.max_array_size);
    engine.set_max_map_size(limits.max_map_size);
    engine.set_module_resolver(DummyModuleResolver::new());

    engine.on_print(|text| tracing::debug!("script helper: {}", text));
    engine.on_debug(|text, _, pos| tracing::debug!("script helper {:?}: {}", pos, text));

    engine
}

/// Helper whose body is a script closure (`|a, b| a + b`)
///
/// Arguments are converted to script values, padded with `()` or truncated
/// to the closure's parameter count, and the return value is converted back
/// to JSON. Numbers arrive as floats, so `|a| a / 2` on `7` is `3.5`.
/// Named arguments (`{{h x unit="kg"}}`) arrive as one map in the last
/// parameter.
pub struct ScriptHelper {
    name: String,
    engine: Arc<Engine>,
    ast: AST,
    func: FnPtr,
    /// `None` when the function is not defined by the body itself
    arity: Option<usize>,
}

impl std::fmt::Debug for ScriptHelper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptHelper")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}

impl ScriptHelper {
    /// Compile a helper body
    ///
    /// The body must evaluate to a function pointer, either a closure or
    /// `Fn("name")` of a function it defines.
    pub fn compile(name: &str, body: &str, engine: Arc<Engine>) -> Result<Self> {
        let ast = engine
            .compile(body)
            .map_err(|e| TemplateError::HelperError(e.to_string()))?;

        let value: Dynamic = engine
            .eval_ast(&ast)
            .map_err(|e| TemplateError::HelperError(e.to_string()))?;

        let type_name = value.type_name();
        let func = value.try_cast::<FnPtr>().ok_or_else(|| {
            TemplateError::HelperError(format!(
                "body must evaluate to a function, got {type_name}"
            ))
        })?;

        let arity = ast
            .iter_functions()
            .find(|f| f.name == func.fn_name())
            .map(|f| f.params.len().saturating_sub(func.curry().len()));

        tracing::debug!("Compiled script helper '{}' ({:?} params)", name, arity);

        Ok(Self {
            name: name.to_string(),
            engine,
            ast,
            func,
            arity,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the helper
    pub fn call(&self, params: &[Value], hash: &Map<String, Value>) -> Result<Value> {
        let mut args = params
            .iter()
            .map(|v| self.to_script(v))
            .collect::<Result<Vec<Dynamic>>>()?;

        if !hash.is_empty() {
            if let Some(arity) = self.arity {
                args.resize(arity.saturating_sub(1), Dynamic::UNIT);
            }
            if self.arity != Some(0) {
                args.push(self.to_script(&Value::Object(hash.clone()))?);
            }
        } else if let Some(arity) = self.arity {
            args.resize(arity, Dynamic::UNIT);
        }

        let result: Dynamic = self
            .func
            .call(&self.engine, &self.ast, args)
            .map_err(|e| self.error(e.to_string()))?;

        rhai::serde::from_dynamic::<Value>(&result)
            .map(from_script_numbers)
            .map_err(|e| self.error(format!("unsupported return value: {e}")))
    }

    fn to_script(&self, value: &Value) -> Result<Dynamic> {
        rhai::serde::to_dynamic(to_script_numbers(value))
            .map_err(|e| self.error(format!("bad argument: {e}")))
    }

    fn error(&self, message: String) -> TemplateError {
        TemplateError::HelperError(format!("helper '{}' failed: {}", self.name, message))
    }
}

/// Every number as a float
fn to_script_numbers(value: &Value) -> Value {
    match value {
        Value::Number(n) => n
            .as_f64()
            .and_then(Number::from_f64)
            .map_or(Value::Null, Value::Number),
        Value::Array(items) => Value::Array(items.iter().map(to_script_numbers).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), to_script_numbers(v)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Integral floats back to JSON integers
fn from_script_numbers(value: Value) -> Value {
    match value {
        Value::Number(n) if n.is_f64() => n.as_f64().map_or(Value::Null, number_value),
        Value::Array(items) => Value::Array(items.into_iter().map(from_script_numbers).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(k, v)| (k, from_script_numbers(v)))
                .collect(),
        ),
        other => other,
    }
}
