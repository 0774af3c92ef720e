//! Tool plans and plan-step normalization.
//!
//! The planning model returns a weakly structured JSON document. Steps are
//! normalized once, at this boundary, into [`NormalizedCall`]; nothing
//! downstream branches on field aliases.

use serde_json::{Map, Value};

use crate::llm::extract_json_block;

/// A decoded tool plan: an ordered step list, or the upstream failure that
/// prevented one from being produced.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolPlan {
    Steps(Vec<Value>),
    Failed(String),
}

impl ToolPlan {
    pub fn empty() -> Self {
        Self::Steps(Vec::new())
    }
}

/// Canonical form of one plan step.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedCall {
    pub name: Option<String>,
    pub input: Map<String, Value>,
}

/// Decode the planner model's text into a [`ToolPlan`].
///
/// The text may be fenced in a markdown code block. A document carrying a
/// top-level `error` becomes `Failed`; a valid object without `tool_calls`
/// is an empty plan, not an error.
pub fn parse_tool_plan(text: &str) -> ToolPlan {
    let body = extract_json_block(text);
    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(_) => {
            tracing::error!("failed to parse tool plan as JSON");
            return ToolPlan::Failed("failed to parse tool plan response".to_string());
        }
    };

    if let Some(message) = value.get("error").and_then(Value::as_str) {
        return ToolPlan::Failed(message.to_string());
    }
    match value.get("tool_calls").and_then(Value::as_array) {
        Some(steps) => ToolPlan::Steps(steps.clone()),
        None => ToolPlan::empty(),
    }
}

/// Extract `(name, input)` from one raw step.
///
/// Name priority: `tool`, then `tool_name`, then `function.name`, then
/// `name`. Input priority: `input`, then `parameters`, then `arguments`,
/// then `function.arguments`. First present wins. A step missing both
/// resolves to `(None, {})`; the dispatcher skips it, never errors.
pub fn normalize_step(step: &Value) -> NormalizedCall {
    let Some(step) = step.as_object() else {
        return NormalizedCall { name: None, input: Map::new() };
    };

    let function = step.get("function").and_then(Value::as_object);

    let name = step
        .get("tool")
        .or_else(|| step.get("tool_name"))
        .or_else(|| function.and_then(|function| function.get("name")))
        .or_else(|| step.get("name"))
        .and_then(Value::as_str)
        .map(str::to_string);

    let input = step
        .get("input")
        .or_else(|| step.get("parameters"))
        .or_else(|| step.get("arguments"))
        .or_else(|| function.and_then(|function| function.get("arguments")))
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default();

    NormalizedCall { name, input }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn all_name_aliases_normalize_identically() {
        let variants = [
            json!({ "tool": "calculate", "input": { "expression": "1+1" } }),
            json!({ "tool_name": "calculate", "parameters": { "expression": "1+1" } }),
            json!({ "function": { "name": "calculate", "arguments": { "expression": "1+1" } } }),
            json!({ "name": "calculate", "arguments": { "expression": "1+1" } }),
        ];
        let expected = normalize_step(&variants[0]);
        assert_eq!(expected.name.as_deref(), Some("calculate"));
        for variant in &variants[1..] {
            assert_eq!(normalize_step(variant), expected);
        }
    }

    #[test]
    fn name_priority_prefers_tool_over_nested_function() {
        let step = json!({
            "tool": "verify",
            "function": { "name": "calculate" },
            "name": "show_reasoning"
        });
        assert_eq!(normalize_step(&step).name.as_deref(), Some("verify"));
    }

    #[test]
    fn input_priority_prefers_input_over_parameters() {
        let step = json!({
            "tool": "calculate",
            "input": { "expression": "2+2" },
            "parameters": { "expression": "ignored" }
        });
        let call = normalize_step(&step);
        assert_eq!(call.input.get("expression"), Some(&json!("2+2")));
    }

    #[test]
    fn missing_name_and_input_resolve_to_absent_and_empty() {
        let call = normalize_step(&json!({ "comment": "not a tool call" }));
        assert!(call.name.is_none());
        assert!(call.input.is_empty());
    }

    #[test]
    fn non_object_step_resolves_to_absent() {
        let call = normalize_step(&json!("review_summary_tool"));
        assert!(call.name.is_none());
        assert!(call.input.is_empty());
    }

    #[test]
    fn plan_with_error_field_fails() {
        assert_eq!(
            parse_tool_plan(r#"{ "error": "no plan" }"#),
            ToolPlan::Failed("no plan".to_string())
        );
    }

    #[test]
    fn fenced_plan_parses() {
        let text = "```json\n{ \"tool_calls\": [ { \"tool_name\": \"calculate\" } ] }\n```";
        match parse_tool_plan(text) {
            ToolPlan::Steps(steps) => assert_eq!(steps.len(), 1),
            other => panic!("expected steps, got {other:?}"),
        }
    }

    #[test]
    fn object_without_tool_calls_is_an_empty_plan() {
        assert_eq!(parse_tool_plan(r#"{ "note": "hi" }"#), ToolPlan::empty());
    }

    #[test]
    fn unparseable_text_fails() {
        match parse_tool_plan("not json at all") {
            ToolPlan::Failed(message) => assert!(message.contains("parse")),
            other => panic!("expected failure, got {other:?}"),
        }
    }
}
