pub mod llm_planner;
pub mod plan;
pub mod prompt;

pub use llm_planner::LlmPlanner;
pub use plan::{normalize_step, parse_tool_plan, NormalizedCall, ToolPlan};
