//! Primary facade for the analysis pipeline.

use std::sync::Arc;

use serde_json::Value;

use crate::error::CoreResult;
use crate::llm::TextGenerator;
use crate::planner::{LlmPlanner, ToolPlan};
use crate::preferences::process_preferences;
use crate::session::SessionState;
use crate::storage::HistoryStore;
use crate::synthesis::{preference_match, Synthesizer};
use crate::tools::catalog::ToolKind;
use crate::tools::selfcheck::run_self_check;
use crate::tools::{PlanExecutor, ToolChannel};
use crate::types::ProductData;

pub struct Advisor {
    channel: Arc<dyn ToolChannel>,
    planner: LlmPlanner,
    executor: PlanExecutor,
    synthesizer: Synthesizer,
    history: Option<Arc<HistoryStore>>,
}

impl Advisor {
    pub fn new(
        channel: Arc<dyn ToolChannel>,
        generator: Arc<dyn TextGenerator>,
        history: Option<Arc<HistoryStore>>,
    ) -> Self {
        Self {
            planner: LlmPlanner::new(generator.clone()),
            executor: PlanExecutor::new(channel.clone()),
            synthesizer: Synthesizer::new(generator),
            channel,
            history,
        }
    }

    /// Run one full analysis: classify, plan, execute, self-check,
    /// synthesize, store. Per-request state lives in a local
    /// [`SessionState`]; concurrent analyses never share it.
    pub async fn analyze(
        &self,
        product: ProductData,
        user_preferences: Option<Value>,
    ) -> CoreResult<Value> {
        let preferences = process_preferences(user_preferences.as_ref());
        let mut session = SessionState::new(product);

        let category = self.classify(&session).await?;
        tracing::info!(category = %category, title = %session.product.title, "product classified");
        session.category = Some(category.clone());

        let plan = self
            .planner
            .plan(&session.product, &category, &preferences)
            .await;
        if let ToolPlan::Steps(steps) = &plan {
            tracing::info!(step_count = steps.len(), "executing tool plan");
        }

        let results = match self.executor.execute(&mut session, &plan).await {
            Ok(results) => results,
            Err(error) => {
                tracing::error!(%error, "tool plan execution failed");
                return Ok(serde_json::json!({ "error": error.to_string() }));
            }
        };

        let self_check = run_self_check(self.channel.as_ref(), &results).await;

        let mut report = self
            .synthesizer
            .finalize(&session, &results, &self_check, &preferences)
            .await;

        // A bare `{"error": ...}` object gets no decoration; degraded-but-
        // structured reports (the synthesis fallback) still do.
        let bare_error = report
            .as_object()
            .map_or(true, |object| object.contains_key("error") && object.len() == 1);
        if !bare_error {
            let matched = preference_match(&report, &session, &preferences);
            merge(&mut report, matched);
            if session.product.reviews.is_empty() {
                merge_note(&mut report);
            }
        }

        if let Some(history) = &self.history {
            if let Err(error) = history
                .store_analysis(&session.product, &report, &preferences)
                .await
            {
                tracing::error!(%error, "failed to store analysis history");
            }
        }

        Ok(report)
    }

    /// Classify the product category up front; the category feeds both the
    /// planning prompt and the final synthesis.
    async fn classify(&self, session: &SessionState) -> CoreResult<String> {
        let arguments = serde_json::json!({
            "input": { "title": session.product.title }
        });
        let response = self
            .channel
            .call_tool(ToolKind::ClassifyProduct.wire_name(), arguments)
            .await?;
        Ok(response.first_text().to_string())
    }
}

fn merge(report: &mut Value, extra: Value) {
    if let (Some(report), Some(extra)) = (report.as_object_mut(), extra.as_object()) {
        for (key, value) in extra {
            report.insert(key.clone(), value.clone());
        }
    }
}

fn merge_note(report: &mut Value) {
    if let Some(report) = report.as_object_mut() {
        report.insert(
            "review_note".to_string(),
            Value::String(
                "No reviews were provided for analysis. The results are based on limited information."
                    .to_string(),
            ),
        );
    }
}
