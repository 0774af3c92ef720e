//! LLM-backed planner.

use std::sync::Arc;

use crate::llm::TextGenerator;
use crate::planner::plan::{parse_tool_plan, ToolPlan};
use crate::planner::prompt::planning_prompt;
use crate::preferences::Preferences;
use crate::types::ProductData;

/// Asks the language model for a tool invocation plan.
///
/// Never fails the request: any channel error or timeout becomes a
/// `ToolPlan::Failed`, which the executor short-circuits on.
pub struct LlmPlanner {
    generator: Arc<dyn TextGenerator>,
}

impl LlmPlanner {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    pub async fn plan(
        &self,
        product: &ProductData,
        category: &str,
        preferences: &Preferences,
    ) -> ToolPlan {
        let prompt = planning_prompt(product, category, preferences);
        tracing::info!(title = %product.title, "requesting tool invocation plan");

        match self.generator.generate(&prompt).await {
            Ok(Some(text)) => {
                let plan = parse_tool_plan(&text);
                if let ToolPlan::Steps(steps) = &plan {
                    tracing::info!(step_count = steps.len(), "received tool plan");
                }
                plan
            }
            Ok(None) => {
                tracing::error!("no plan response from language model");
                ToolPlan::Failed("failed to get plan response from language model".to_string())
            }
            Err(error) => {
                tracing::error!(%error, "planner generation failed");
                ToolPlan::Failed("failed to get plan response from language model".to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CoreError, CoreResult};
    use async_trait::async_trait;

    struct FixedGenerator(CoreResult<Option<String>>);

    #[async_trait]
    impl TextGenerator for FixedGenerator {
        async fn generate(&self, _prompt: &str) -> CoreResult<Option<String>> {
            self.0.clone()
        }
    }

    fn product() -> ProductData {
        ProductData {
            title: "Widget".to_string(),
            site: None,
            price: None,
            url: None,
            reviews: Vec::new(),
        }
    }

    #[tokio::test]
    async fn plan_parses_generator_output() {
        let generator = FixedGenerator(Ok(Some(
            r#"{ "tool_calls": [ { "tool_name": "classify_product" } ] }"#.to_string(),
        )));
        let planner = LlmPlanner::new(Arc::new(generator));
        match planner.plan(&product(), "other", &Preferences::default()).await {
            ToolPlan::Steps(steps) => assert_eq!(steps.len(), 1),
            other => panic!("expected steps, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn timeout_becomes_failed_plan() {
        let planner = LlmPlanner::new(Arc::new(FixedGenerator(Ok(None))));
        let plan = planner.plan(&product(), "other", &Preferences::default()).await;
        assert!(matches!(plan, ToolPlan::Failed(_)));
    }

    #[tokio::test]
    async fn channel_error_becomes_failed_plan() {
        let generator = FixedGenerator(Err(CoreError::Llm("boom".to_string())));
        let planner = LlmPlanner::new(Arc::new(generator));
        let plan = planner.plan(&product(), "other", &Preferences::default()).await;
        assert!(matches!(plan, ToolPlan::Failed(_)));
    }
}
