//! Reliability self-check over accumulated tool results.
//!
//! Always runs once after plan execution. This pass must never fail: a
//! channel error or an undecodable response degrades to a deterministic
//! low-reliability report.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::session::ToolResults;
use crate::tools::catalog::ToolKind;
use crate::tools::channel::ToolChannel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReliabilityLevel {
    Low,
    Medium,
    High,
}

impl ReliabilityLevel {
    /// Parse a level label from tool output. Labels like "Very Low" or
    /// unknown text collapse to `Low`.
    pub fn from_label(label: &str) -> Self {
        let label = label.to_ascii_lowercase();
        if label.contains("high") {
            Self::High
        } else if label.contains("medium") {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

impl fmt::Display for ReliabilityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "Low"),
            Self::Medium => write!(f, "Medium"),
            Self::High => write!(f, "High"),
        }
    }
}

/// Outcome of the reliability pass. Recomputed fresh on every invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelfCheckReport {
    pub reliability_score: f64,
    pub reliability_level: ReliabilityLevel,
    pub issues: Vec<String>,
    pub warnings: Vec<String>,
    pub insights: Vec<String>,
}

impl SelfCheckReport {
    /// The deterministic report used when the self-check tool cannot be
    /// reached or its response cannot be decoded.
    pub fn degraded() -> Self {
        Self {
            reliability_score: 0.0,
            reliability_level: ReliabilityLevel::Low,
            issues: vec!["Invalid response format from self-check tool".to_string()],
            warnings: vec!["Could not parse self-check results".to_string()],
            insights: Vec::new(),
        }
    }

    /// Compact `(issues, warnings, insights)` counts for logging.
    pub fn counts(&self) -> (usize, usize, usize) {
        (self.issues.len(), self.warnings.len(), self.insights.len())
    }
}

/// Run the self-check tool over the full result map and reduce its output
/// to a [`SelfCheckReport`]. Never returns an error.
pub async fn run_self_check(
    channel: &dyn ToolChannel,
    results: &ToolResults,
) -> SelfCheckReport {
    let arguments = json!({ "input": { "tools_results": Value::Object(results.clone()) } });
    let report = match channel
        .call_tool(ToolKind::SelfCheck.wire_name(), arguments)
        .await
    {
        Ok(response) => decode_report(response.first_text()),
        Err(error) => {
            tracing::error!(%error, "self-check tool call failed");
            SelfCheckReport::degraded()
        }
    };

    let (issues, warnings, insights) = report.counts();
    tracing::info!(
        reliability_score = report.reliability_score,
        reliability_level = %report.reliability_level,
        issues,
        warnings,
        insights,
        "self-check complete"
    );
    report
}

fn decode_report(text: &str) -> SelfCheckReport {
    let Ok(value) = serde_json::from_str::<Value>(text) else {
        tracing::warn!("self-check response was not valid JSON");
        return SelfCheckReport::degraded();
    };
    let Some(object) = value.as_object() else {
        return SelfCheckReport::degraded();
    };

    SelfCheckReport {
        reliability_score: object
            .get("reliability_score")
            .and_then(Value::as_f64)
            .unwrap_or(0.0),
        reliability_level: object
            .get("reliability_level")
            .and_then(Value::as_str)
            .map(ReliabilityLevel::from_label)
            .unwrap_or(ReliabilityLevel::Low),
        issues: string_list(object.get("issues")),
        warnings: string_list(object.get("warnings")),
        insights: string_list(object.get("insights")),
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}
