//! Template compilation

use crate::helpers::{HelperRegistry, ScriptLimits};
use crate::{CustomHelper, Result, Template, TemplateError};
use handlebars::Handlebars;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const DOCUMENT: &str = "document";

/// Compiler settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    /// Fail on references to missing data instead of rendering empty
    pub strict_mode: bool,

    /// HTML-escape `{{...}}` output (`{{{...}}}` is never escaped)
    pub escape_html: bool,

    /// Limits for script helpers
    pub script: ScriptLimits,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            strict_mode: false,
            escape_html: true,
            script: ScriptLimits::default(),
        }
    }
}

/// Result of one compilation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompileOutput {
    pub html: String,

    /// Helper registration warnings (overwrites, skipped helpers)
    pub warnings: Vec<String>,
}

/// Stateless template compiler
///
/// Holds the canonical helper set. Each call works on its own copy of it
/// and its own Handlebars instance, so a compiler can be shared freely.
#[derive(Debug, Clone)]
pub struct TemplateCompiler {
    options: CompileOptions,
    registry: HelperRegistry,
}

impl Default for TemplateCompiler {
    fn default() -> Self {
        Self::new()
    }
}

impl TemplateCompiler {
    /// Create a compiler with default options and the built-in helpers
    pub fn new() -> Self {
        Self::with_options(CompileOptions::default())
    }

    pub fn with_options(options: CompileOptions) -> Self {
        Self {
            options,
            registry: HelperRegistry::builtin(),
        }
    }

    /// Replace the canonical helper set
    pub fn with_registry(mut self, registry: HelperRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    pub fn registry(&self) -> &HelperRegistry {
        &self.registry
    }

    /// Compile an HTML template against data
    ///
    /// Template syntax errors are [`TemplateError::CompileError`]; failures
    /// while rendering (strict-mode misses, script helper errors) are
    /// [`TemplateError::RenderError`]. Custom helpers that fail to register
    /// only produce warnings. Unknown helpers render as empty, inline or as
    /// blocks.
    pub fn compile(
        &self,
        html: &str,
        data: &Value,
        helpers: &[CustomHelper],
    ) -> Result<CompileOutput> {
        let compiled = handlebars::Template::compile(html)
            .map_err(|e| TemplateError::CompileError(e.to_string()))?;

        let mut registry = self.registry.clone();
        registry.register_scripts(helpers, &self.options.script);

        let mut hb = Handlebars::new();
        hb.set_strict_mode(self.options.strict_mode);
        if !self.options.escape_html {
            hb.register_escape_fn(handlebars::no_escape);
        }
        registry.install(&mut hb);
        hb.register_template(DOCUMENT, compiled);

        let html = hb
            .render(DOCUMENT, data)
            .map_err(|e| TemplateError::RenderError(e.to_string()))?;

        tracing::debug!(
            "Compiled template with {} helpers ({} custom), {} bytes",
            registry.len(),
            helpers.len(),
            html.len()
        );

        Ok(CompileOutput {
            html,
            warnings: registry.take_warnings(),
        })
    }

    /// Compile and prepend the stylesheet
    ///
    /// The result is exactly `<style>` + css + `</style>` + compiled HTML.
    pub fn render(
        &self,
        html: &str,
        css: &str,
        data: &Value,
        helpers: &[CustomHelper],
    ) -> Result<CompileOutput> {
        let mut output = self.compile(html, data, helpers)?;
        output.html = format!("<style>{css}</style>{}", output.html);
        Ok(output)
    }

    /// Render a template record with its own css and helpers
    pub fn render_template(&self, template: &Template, data: &Value) -> Result<CompileOutput> {
        self.render(&template.html, &template.css, data, &template.helpers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn compile(html: &str, data: Value) -> String {
        TemplateCompiler::new().compile(html, &data, &[]).unwrap().html
    }

    #[test]
    fn test_interpolation_is_escaped() {
        assert_eq!(
            compile("{{name}}", json!({ "name": "<b>x</b>" })),
            "&lt;b&gt;x&lt;/b&gt;"
        );
        assert_eq!(compile("{{{name}}}", json!({ "name": "<b>x</b>" })), "<b>x</b>");
    }

    #[test]
    fn test_escaping_can_be_disabled() {
        let compiler = TemplateCompiler::with_options(CompileOptions {
            escape_html: false,
            ..Default::default()
        });
        let out = compiler
            .compile("{{name}}", &json!({ "name": "<i>y</i>" }), &[])
            .unwrap();
        assert_eq!(out.html, "<i>y</i>");
    }

    #[test]
    fn test_conditionals_and_loops() {
        let html = "{{#if paid}}PAID{{else}}DUE{{/if}}|{{#each items}}{{description}};{{/each}}";
        let data = json!({
            "paid": false,
            "items": [ { "description": "A" }, { "description": "B" } ]
        });
        assert_eq!(compile(html, data), "DUE|A;B;");
    }

    #[test]
    fn test_subexpressions() {
        let html = "{{#if (gt (calculate_subtotal items) 100)}}big{{else}}small{{/if}}";
        let data = json!({ "items": [ { "unit_price": 60, "quantity": 2 } ] });
        assert_eq!(compile(html, data), "big");

        let html = "{{multiply (add a b) 2}}";
        assert_eq!(compile(html, json!({ "a": 1, "b": "2" })), "6");
    }

    #[test]
    fn test_if_eq_block() {
        let html = "{{#if_eq status \"paid\"}}yes{{else}}no{{/if_eq}}";
        assert_eq!(compile(html, json!({ "status": "paid" })), "yes");
        assert_eq!(compile(html, json!({ "status": "open" })), "no");
    }

    #[test]
    fn test_if_eq_inside_each_uses_item_context() {
        let html = "{{#each items}}{{#if_eq kind \"hour\"}}{{qty}}h {{/if_eq}}{{/each}}";
        let data = json!({ "items": [ { "kind": "hour", "qty": 3 }, { "kind": "unit", "qty": 1 } ] });
        assert_eq!(compile(html, data), "3h ");
    }

    #[test]
    fn test_missing_values_and_helpers_render_empty() {
        assert_eq!(compile("[{{missing}}]", json!({})), "[]");
        assert_eq!(compile("[{{nohelper name}}]", json!({ "name": "x" })), "[]");
    }

    #[test]
    fn test_strict_mode_rejects_missing_values() {
        let compiler = TemplateCompiler::with_options(CompileOptions {
            strict_mode: true,
            ..Default::default()
        });
        let result = compiler.compile("{{missing}}", &json!({}), &[]);
        assert!(matches!(result, Err(TemplateError::RenderError(_))));
    }

    #[test]
    fn test_syntax_error_is_compile_error() {
        let result = TemplateCompiler::new().compile("{{#if x}}open", &json!({}), &[]);
        assert!(matches!(result, Err(TemplateError::CompileError(_))));
    }

    #[test]
    fn test_divide_by_zero_renders_message() {
        assert_eq!(compile("{{divide 1 0}}", json!({})), "Cannot divide by zero");
    }

    #[test]
    fn test_custom_helpers() {
        let helpers = vec![
            CustomHelper::new("shout", "|s| s.to_upper()"),
            CustomHelper::new("add", "|a, b| `${a}+${b}`"),
            CustomHelper::new("half", "|a| a / 2"),
            CustomHelper::new("mul", "|a, b| a * b"),
            CustomHelper::new("unit", r#"|n, opts| `${n} ${opts.unit}`"#),
            CustomHelper::new("broken", "|a| a +"),
        ];
        let out = TemplateCompiler::new()
            .compile(
                "{{shout name}} {{add \"1\" \"2\"}} {{subtract 5 2}} [{{broken 1}}] {{half 7}} {{mul 9.5 12}} {{unit \"5\" unit=\"kg\"}}",
                &json!({ "name": "acme" }),
                &helpers,
            )
            .unwrap();

        assert_eq!(out.html, "ACME 1+2 3 [] 3.5 114 5 kg");
        assert_eq!(out.warnings.len(), 2);
    }

    #[test]
    fn test_missing_block_helper_renders_empty() {
        assert_eq!(
            compile("a{{#nohelper x}}B{{else}}C{{/nohelper}}z", json!({ "x": 1 })),
            "az"
        );
        assert_eq!(
            compile(
                "{{#each rows}}[{{#fancy this mode=\"x\"}}{{this}}{{/fancy}}]{{/each}}",
                json!({ "rows": [1, 2] })
            ),
            "[][]"
        );
        assert_eq!(compile("<{{#nothing}}x{{/nothing}}>", json!({})), "<>");
    }

    #[test]
    fn test_custom_helpers_do_not_leak_between_calls() {
        let compiler = TemplateCompiler::new();
        let helpers = vec![CustomHelper::new("add", "|a, b| 0")];

        assert_eq!(
            compiler.compile("{{add 1 2}}", &json!({}), &helpers).unwrap().html,
            "0"
        );
        assert_eq!(compiler.compile("{{add 1 2}}", &json!({}), &[]).unwrap().html, "3");
    }

    #[test]
    fn test_failing_script_helper_aborts_render() {
        let helpers = vec![CustomHelper::new("boom", "|a| { throw \"nope\"; }")];
        let result = TemplateCompiler::new().compile("{{boom 1}}", &json!({}), &helpers);
        assert!(matches!(result, Err(TemplateError::RenderError(_))));
    }

    #[test]
    fn test_render_prepends_style() {
        let out = TemplateCompiler::new()
            .render("<p>{{x}}</p>", "p { margin: 0; }", &json!({ "x": 1 }), &[])
            .unwrap();
        assert_eq!(out.html, "<style>p { margin: 0; }</style><p>1</p>");
    }

    #[test]
    fn test_options_from_json() {
        let options: CompileOptions =
            serde_json::from_str(r#"{ "strict_mode": true, "script": { "max_operations": 10 } }"#)
                .unwrap();
        assert!(options.strict_mode);
        assert!(options.escape_html);
        assert_eq!(options.script.max_operations, 10);
        assert_eq!(options.script.max_call_levels, 32);
    }
}
