//! Helper registry
//!
//! A [`HelperRegistry`] is a plain value: every compilation clones the
//! canonical built-in set, adds the template's script helpers to its own copy
//! and installs the result into a fresh Handlebars instance. Nothing is
//! shared between compilations.

mod builtin;
mod script;

pub use builtin::{strict_eq, DEFAULT_DATE_LOCALE};
pub use script::{ScriptHelper, ScriptLimits};

use crate::{CustomHelper, Result, TemplateError};
use handlebars::{
    Context, Handlebars, Helper, HelperDef, HelperResult, Output, RenderContext, RenderError,
    RenderErrorReason, Renderable, ScopedJson,
};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

/// Value helper: positional arguments and hash arguments in, value out
pub type ValueFn = fn(&[Value], &Map<String, Value>) -> Value;

/// Handlebars structural helpers that templates cannot replace
const RESERVED: &[&str] = &[
    "if",
    "unless",
    "each",
    "with",
    "lookup",
    "helperMissing",
    "blockHelperMissing",
];

/// A registered helper
#[derive(Debug, Clone)]
pub enum HelperKind {
    /// Built-in function usable inline and in subexpressions
    Value(ValueFn),

    /// `{{#if_eq a b}}...{{else}}...{{/if_eq}}`
    IfEq,

    /// Sandboxed script supplied with a template
    Script(Arc<ScriptHelper>),
}

/// Named helper set for one compilation
#[derive(Debug, Clone, Default)]
pub struct HelperRegistry {
    helpers: BTreeMap<String, HelperKind>,
    warnings: Vec<String>,
}

impl HelperRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the canonical built-in helper set
    pub fn builtin() -> Self {
        static BUILTINS: OnceLock<HelperRegistry> = OnceLock::new();
        BUILTINS
            .get_or_init(|| {
                let mut registry = HelperRegistry::new();
                builtin::register_all(&mut registry);
                registry
            })
            .clone()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.helpers.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&HelperKind> {
        self.helpers.get(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.helpers.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.helpers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.helpers.is_empty()
    }

    /// Warnings recorded while registering helpers
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn take_warnings(&mut self) -> Vec<String> {
        std::mem::take(&mut self.warnings)
    }

    /// Register a value helper, overwriting any helper of the same name
    pub fn register_fn(&mut self, name: &str, func: ValueFn) {
        self.insert(name, HelperKind::Value(func));
    }

    pub(crate) fn register_block(&mut self, name: &str, kind: HelperKind) {
        self.insert(name, kind);
    }

    /// Compile and register script helpers
    ///
    /// A helper that fails to compile is skipped with a warning; the others
    /// are still registered. All helpers share one sandboxed engine.
    pub fn register_scripts(&mut self, helpers: &[CustomHelper], limits: &ScriptLimits) {
        if helpers.is_empty() {
            return;
        }

        let engine = Arc::new(script::sandboxed_engine(limits));

        for helper in helpers {
            let name = helper.name.trim();
            if name.is_empty() {
                self.warn("Skipping custom helper with a blank name".to_string());
                continue;
            }
            if RESERVED.contains(&name) {
                self.warn(format!("Helper '{name}' is reserved and cannot be replaced"));
                continue;
            }

            match ScriptHelper::compile(name, &helper.body, Arc::clone(&engine)) {
                Ok(script) => self.insert(name, HelperKind::Script(Arc::new(script))),
                Err(e) => self.warn(format!("Failed to register helper '{name}': {e}")),
            }
        }
    }

    /// Call a value or script helper directly
    pub fn call(&self, name: &str, params: &[Value], hash: &Map<String, Value>) -> Result<Value> {
        match self.helpers.get(name) {
            Some(HelperKind::Value(func)) => Ok(func(params, hash)),
            Some(HelperKind::Script(script)) => script.call(params, hash),
            Some(HelperKind::IfEq) => Err(TemplateError::HelperError(format!(
                "'{name}' is a block helper"
            ))),
            None => Err(TemplateError::HelperError(format!("Unknown helper: {name}"))),
        }
    }

    /// Install every helper into a Handlebars instance
    ///
    /// Also installs `helperMissing` and `blockHelperMissing` fallbacks so
    /// unknown helpers render as empty, inline or as blocks.
    pub(crate) fn install(&self, hb: &mut Handlebars<'_>) {
        hb.register_helper("helperMissing", Box::new(MissingHelper));
        hb.register_helper("blockHelperMissing", Box::new(MissingBlockHelper));

        for (name, kind) in &self.helpers {
            match kind {
                HelperKind::Value(func) => hb.register_helper(name, Box::new(ValueHelper(*func))),
                HelperKind::IfEq => hb.register_helper(name, Box::new(IfEqHelper)),
                HelperKind::Script(script) => {
                    hb.register_helper(name, Box::new(ScriptAdapter(Arc::clone(script))))
                }
            }
        }
    }

    fn insert(&mut self, name: &str, kind: HelperKind) {
        if self.helpers.insert(name.to_string(), kind).is_some() {
            self.warn(format!(
                "Helper '{name}' already exists and will be overwritten"
            ));
        }
    }

    fn warn(&mut self, message: String) {
        tracing::warn!("{}", message);
        self.warnings.push(message);
    }
}

fn collect_args(h: &Helper<'_>) -> (Vec<Value>, Map<String, Value>) {
    let params = h.params().iter().map(|p| p.value().clone()).collect();
    let hash = h
        .hash()
        .iter()
        .map(|(k, v)| (k.to_string(), v.value().clone()))
        .collect();
    (params, hash)
}

struct ValueHelper(ValueFn);

impl HelperDef for ValueHelper {
    fn call_inner<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _: &'reg Handlebars<'reg>,
        _: &'rc Context,
        _: &mut RenderContext<'reg, 'rc>,
    ) -> std::result::Result<ScopedJson<'rc>, RenderError> {
        let (params, hash) = collect_args(h);
        Ok(ScopedJson::Derived((self.0)(&params, &hash)))
    }
}

struct ScriptAdapter(Arc<ScriptHelper>);

impl HelperDef for ScriptAdapter {
    fn call_inner<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _: &'reg Handlebars<'reg>,
        _: &'rc Context,
        _: &mut RenderContext<'reg, 'rc>,
    ) -> std::result::Result<ScopedJson<'rc>, RenderError> {
        let (params, hash) = collect_args(h);
        match self.0.call(&params, &hash) {
            Ok(value) => Ok(ScopedJson::Derived(value)),
            Err(e) => {
                tracing::warn!("{}", e);
                Err(RenderErrorReason::Other(e.to_string()).into())
            }
        }
    }
}

struct IfEqHelper;

impl HelperDef for IfEqHelper {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        r: &'reg Handlebars<'reg>,
        ctx: &'rc Context,
        rc: &mut RenderContext<'reg, 'rc>,
        out: &mut dyn Output,
    ) -> HelperResult {
        static NULL: Value = Value::Null;
        let a = h.param(0).map(|p| p.value()).unwrap_or(&NULL);
        let b = h.param(1).map(|p| p.value()).unwrap_or(&NULL);

        let branch = if strict_eq(a, b) {
            h.template()
        } else {
            h.inverse()
        };

        match branch {
            Some(t) => t.render(r, ctx, rc, out),
            None => Ok(()),
        }
    }
}

struct MissingHelper;

impl HelperDef for MissingHelper {
    fn call_inner<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _: &'reg Handlebars<'reg>,
        _: &'rc Context,
        _: &mut RenderContext<'reg, 'rc>,
    ) -> std::result::Result<ScopedJson<'rc>, RenderError> {
        tracing::debug!("No helper or value for '{}', rendered as empty", h.name());
        Ok(ScopedJson::Derived(Value::Null))
    }
}

struct MissingBlockHelper;

impl HelperDef for MissingBlockHelper {
    fn call<'reg: 'rc, 'rc>(
        &self,
        h: &Helper<'rc>,
        _: &'reg Handlebars<'reg>,
        _: &'rc Context,
        _: &mut RenderContext<'reg, 'rc>,
        _: &mut dyn Output,
    ) -> HelperResult {
        tracing::debug!("No block helper '{}', block rendered as empty", h.name());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn call(registry: &HelperRegistry, name: &str, params: &[Value]) -> Value {
        registry.call(name, params, &Map::new()).unwrap()
    }

    #[test]
    fn test_builtin_set() {
        let registry = HelperRegistry::builtin();
        for name in [
            "json",
            "formatCurrency",
            "formatDate",
            "calculate_subtotal",
            "calculate_tax",
            "calculate_grand_total",
            "add",
            "subtract",
            "multiply",
            "divide",
            "eq",
            "neq",
            "lt",
            "gt",
            "lte",
            "gte",
            "and",
            "or",
            "not",
            "if_eq",
        ] {
            assert!(registry.contains(name), "missing {name}");
        }
        assert!(registry.warnings().is_empty());
    }

    #[test]
    fn test_builtin_copies_are_independent() {
        let mut first = HelperRegistry::builtin();
        first.register_scripts(&[CustomHelper::new("add", "|a, b| \"custom\"")], &ScriptLimits::default());

        let second = HelperRegistry::builtin();
        assert_eq!(call(&first, "add", &[json!(1), json!(2)]), json!("custom"));
        assert_eq!(call(&second, "add", &[json!(1), json!(2)]), json!(3));
    }

    #[test]
    fn test_overwrite_records_warning_and_keeps_others() {
        let mut registry = HelperRegistry::builtin();
        registry.register_scripts(
            &[CustomHelper::new("multiply", "|a, b| a * b * 10")],
            &ScriptLimits::default(),
        );

        assert_eq!(registry.warnings().len(), 1);
        assert!(registry.warnings()[0].contains("multiply"));
        assert_eq!(call(&registry, "multiply", &[json!(2), json!(3)]), json!(60));
        assert_eq!(call(&registry, "subtract", &[json!(5), json!(3)]), json!(2));
    }

    #[test]
    fn test_bad_helper_does_not_block_others() {
        let mut registry = HelperRegistry::new();
        registry.register_scripts(
            &[
                CustomHelper::new("broken", "|a| a +"),
                CustomHelper::new("double", "|a| a * 2"),
                CustomHelper::new("if", "|a| a"),
                CustomHelper::new(" ", "|a| a"),
            ],
            &ScriptLimits::default(),
        );

        assert!(!registry.contains("broken"));
        assert!(!registry.contains("if"));
        assert_eq!(call(&registry, "double", &[json!(21)]), json!(42));
        assert_eq!(registry.warnings().len(), 3);
    }

    #[test]
    fn test_call_block_and_unknown() {
        let registry = HelperRegistry::builtin();
        assert!(registry.call("if_eq", &[], &Map::new()).is_err());
        assert!(registry.call("nope", &[], &Map::new()).is_err());
    }
}
