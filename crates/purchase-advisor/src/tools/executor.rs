//! Plan execution pipeline.
//!
//! Steps run strictly in plan order; each remote call is awaited before the
//! next step starts, because later steps consume earlier results. Failure
//! handling is split in two: a step with a bad shape or an unrecognized
//! name is skipped with a warning, while a transport error from the tool
//! channel aborts the remaining plan.

use std::sync::Arc;

use serde_json::{json, Map, Value};

use crate::error::{CoreError, CoreResult};
use crate::planner::plan::{normalize_step, ToolPlan};
use crate::session::{SessionState, ToolResults};
use crate::tools::catalog::{ResponseFormat, ToolKind};
use crate::tools::channel::ToolChannel;
use crate::tools::{chain, resolver};

pub struct PlanExecutor {
    channel: Arc<dyn ToolChannel>,
}

impl PlanExecutor {
    pub fn new(channel: Arc<dyn ToolChannel>) -> Self {
        Self { channel }
    }

    /// Run a plan end to end and return the accumulated results.
    ///
    /// A plan that failed upstream short-circuits without any tool call.
    /// The first channel error aborts the remaining steps and fails the
    /// whole plan; partial results are not returned.
    pub async fn execute(
        &self,
        session: &mut SessionState,
        plan: &ToolPlan,
    ) -> CoreResult<ToolResults> {
        let steps = match plan {
            ToolPlan::Failed(message) => return Err(CoreError::Plan(message.clone())),
            ToolPlan::Steps(steps) => steps,
        };

        session.results = ToolResults::new();
        for step in steps {
            let call = normalize_step(step);
            let Some(name) = call.name.as_deref() else {
                tracing::warn!("skipping plan step without a tool name");
                continue;
            };
            let Some(kind) = ToolKind::from_name(name) else {
                tracing::warn!(tool = name, "unknown tool name, skipping step");
                continue;
            };

            tracing::info!(tool = kind.wire_name(), "executing tool");
            let value = self.dispatch(session, kind, &call.input).await?;
            session.results.insert(kind.result_key().to_string(), value);
        }

        Ok(session.results.clone())
    }

    /// Build the payload for one recognized tool, call it, decode the
    /// response text per the tool's format.
    async fn dispatch(
        &self,
        session: &SessionState,
        kind: ToolKind,
        input: &Map<String, Value>,
    ) -> CoreResult<Value> {
        let payload = match kind {
            ToolKind::ClassifyProduct => resolver::classify_args(input, session),
            ToolKind::ReviewSummary => resolver::review_summary_args(input, session),
            ToolKind::ConfidenceScore => json!({
                "sentiment_data": chain::confidence_input(&session.results)
            }),
            ToolKind::SelfCheck => json!({
                "tools_results": chain::self_check_input(&session.results)
            }),
            ToolKind::ShowReasoning => json!({
                "product_data": chain::reasoning_input(session, &session.results)
            }),
            ToolKind::Calculate => json!({ "expression": resolver::expression(input) }),
            ToolKind::Verify => json!({
                "expression": resolver::expression(input),
                "expected": resolver::expected(input)
            }),
            ToolKind::ConsistencyCheck => json!({
                "reviews_data": chain::consistency_input(&session.results)
            }),
            ToolKind::LegacyConsistency => json!({
                "steps": resolver::consistency_steps(input)
            }),
        };

        let response = self
            .channel
            .call_tool(kind.wire_name(), json!({ "input": payload }))
            .await?;
        Ok(decode_response(kind, response.first_text()))
    }
}

fn decode_response(kind: ToolKind, text: &str) -> Value {
    match kind.response_format() {
        ResponseFormat::Json => match serde_json::from_str(text) {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!(
                    tool = kind.wire_name(),
                    "tool response was not valid JSON, storing raw text"
                );
                Value::String(text.to_string())
            }
        },
        ResponseFormat::JsonOrText => serde_json::from_str(text)
            .unwrap_or_else(|_| Value::String(text.to_string())),
        ResponseFormat::Text => Value::String(text.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::channel::mock::MockToolChannel;
    use crate::types::ProductData;

    fn session_with_reviews(reviews: &[&str]) -> SessionState {
        SessionState::new(ProductData {
            title: "Widget Pro".to_string(),
            site: Some("amazon.com".to_string()),
            price: None,
            url: None,
            reviews: reviews.iter().map(|review| review.to_string()).collect(),
        })
    }

    fn executor(channel: MockToolChannel) -> (PlanExecutor, Arc<MockToolChannel>) {
        let channel = Arc::new(channel);
        (PlanExecutor::new(channel.clone()), channel)
    }

    #[tokio::test]
    async fn failed_plan_short_circuits_without_tool_calls() {
        let (executor, channel) = executor(MockToolChannel::new());
        let mut session = session_with_reviews(&[]);
        let plan = ToolPlan::Failed("x".to_string());

        let error = executor.execute(&mut session, &plan).await.unwrap_err();
        assert_eq!(error.to_string(), "x");
        assert!(channel.recorded_calls().is_empty());
    }

    #[tokio::test]
    async fn unknown_tool_is_skipped_and_known_tool_runs() {
        let (executor, channel) =
            executor(MockToolChannel::new().with_response("classify_product", "smartphone"));
        let mut session = session_with_reviews(&[]);
        let plan = ToolPlan::Steps(vec![
            json!({ "tool_name": "fetch_prices", "parameters": {} }),
            json!({ "tool_name": "classify_product", "parameters": {} }),
        ]);

        let results = executor.execute(&mut session, &plan).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results["classify_product"], json!("smartphone"));
        assert_eq!(channel.recorded_calls().len(), 1);
    }

    #[tokio::test]
    async fn step_without_any_name_is_skipped() {
        let (executor, channel) = executor(MockToolChannel::new());
        let mut session = session_with_reviews(&[]);
        let plan = ToolPlan::Steps(vec![json!({ "parameters": { "title": "x" } })]);

        let results = executor.execute(&mut session, &plan).await.unwrap();
        assert!(results.is_empty());
        assert!(channel.recorded_calls().is_empty());
    }

    #[tokio::test]
    async fn review_summary_request_uses_session_reviews_and_defaults() {
        let (executor, channel) = executor(
            MockToolChannel::new()
                .with_response("review_summary_tool", r#"{"sentiment_score": 0.5}"#),
        );
        let mut session = session_with_reviews(&["good", "bad"]);
        let plan = ToolPlan::Steps(vec![json!({
            "tool_name": "review_summary_tool",
            "parameters": { "product": "X", "reviews": ["forged"] }
        })]);

        executor.execute(&mut session, &plan).await.unwrap();

        let calls = channel.recorded_calls();
        assert_eq!(calls.len(), 1);
        let (name, arguments) = &calls[0];
        assert_eq!(name, "review_summary_tool");
        let input = &arguments["input"];
        assert_eq!(input["product"], "X");
        assert_eq!(input["reviews"], json!(["good", "bad"]));
        assert_eq!(input["num_reviews"], 1000);
        assert_eq!(input["site"], "amazon.com");
    }

    #[tokio::test]
    async fn channel_error_aborts_the_whole_plan() {
        let (executor, channel) = executor(
            MockToolChannel::new()
                .with_response("classify_product", "smartphone")
                .failing("calculate"),
        );
        let mut session = session_with_reviews(&[]);
        let plan = ToolPlan::Steps(vec![
            json!({ "tool_name": "classify_product" }),
            json!({ "tool_name": "calculate", "parameters": { "expression": "1+1" } }),
            json!({ "tool_name": "verify" }),
        ]);

        let error = executor.execute(&mut session, &plan).await.unwrap_err();
        assert!(matches!(error, CoreError::ToolChannel(_)));
        // The step after the failure never ran.
        assert_eq!(channel.recorded_calls().len(), 2);
    }

    #[tokio::test]
    async fn confidence_step_chains_the_review_summary() {
        let (executor, channel) = executor(
            MockToolChannel::new()
                .with_response(
                    "review_summary_tool",
                    r#"{"sentiment_score": 0.75, "review_count": 10}"#,
                )
                .with_response("calculate_confidence_score", r#"{"confidence_score": 85}"#),
        );
        let mut session = session_with_reviews(&["good"]);
        let plan = ToolPlan::Steps(vec![
            json!({ "tool_name": "review_summary_tool" }),
            json!({ "tool_name": "calculate_confidence_score" }),
        ]);

        let results = executor.execute(&mut session, &plan).await.unwrap();
        assert_eq!(results["calculate_confidence_score"]["confidence_score"], 85);

        let calls = channel.recorded_calls();
        let sentiment_data = &calls[1].1["input"]["sentiment_data"];
        assert_eq!(sentiment_data["sentiment_score"], 0.75);
    }

    #[tokio::test]
    async fn self_check_step_receives_all_prior_results() {
        let (executor, channel) = executor(
            MockToolChannel::new()
                .with_response("classify_product", "smartphone")
                .with_response("self_check_tool_results", r#"{"reliability_score": 60}"#),
        );
        let mut session = session_with_reviews(&[]);
        let plan = ToolPlan::Steps(vec![
            json!({ "tool_name": "classify_product" }),
            json!({ "tool_name": "self_check_tool_results" }),
        ]);

        executor.execute(&mut session, &plan).await.unwrap();

        let calls = channel.recorded_calls();
        let tools_results = &calls[1].1["input"]["tools_results"];
        assert_eq!(tools_results["classify_product"], "smartphone");
    }

    #[tokio::test]
    async fn undecodable_structured_response_is_stored_as_raw_text() {
        let (executor, _channel) = executor(
            MockToolChannel::new().with_response("review_summary_tool", "Error: upstream down"),
        );
        let mut session = session_with_reviews(&[]);
        let plan = ToolPlan::Steps(vec![json!({ "tool_name": "review_summary_tool" })]);

        let results = executor.execute(&mut session, &plan).await.unwrap();
        assert_eq!(results["review_summary_tool"], json!("Error: upstream down"));
    }

    #[tokio::test]
    async fn legacy_consistency_decodes_json_with_text_fallback() {
        let (executor, _channel) = executor(
            MockToolChannel::new().with_response("check_consistency", r#"{"consistent": true}"#),
        );
        let mut session = session_with_reviews(&[]);
        let plan = ToolPlan::Steps(vec![json!({
            "tool": "check_consistency",
            "input": { "steps": ["a", "b"] }
        })]);

        let results = executor.execute(&mut session, &plan).await.unwrap();
        assert_eq!(results["check_consistency"], json!({ "consistent": true }));
    }

    #[tokio::test]
    async fn alias_step_is_stored_under_the_canonical_key() {
        let (executor, _channel) = executor(
            MockToolChannel::new().with_response("review_summary_tool", r#"{"review_count": 1}"#),
        );
        let mut session = session_with_reviews(&["ok"]);
        let plan = ToolPlan::Steps(vec![json!({ "tool_name": "review_summary" })]);

        let results = executor.execute(&mut session, &plan).await.unwrap();
        assert!(results.contains_key("review_summary_tool"));
    }
}
