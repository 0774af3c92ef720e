//! The fixed tool identity space.
//!
//! Seven analysis tools plus one deprecated alias. Plans may name a tool
//! under a loose alias; everything downstream works with [`ToolKind`].

/// How a tool's response text is decoded before storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    /// JSON-decode; on failure the raw text is stored as a string.
    Json,
    /// Stored verbatim.
    Text,
    /// Try JSON, keep raw text on failure (deprecated consistency alias).
    JsonOrText,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    ClassifyProduct,
    ReviewSummary,
    ConfidenceScore,
    SelfCheck,
    ShowReasoning,
    Calculate,
    Verify,
    ConsistencyCheck,
    /// Deprecated alias for the consistency check.
    LegacyConsistency,
}

impl ToolKind {
    /// Resolve a plan-supplied name to a known tool.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "classify_product" => Some(Self::ClassifyProduct),
            "review_summary_tool" | "review_summary" => Some(Self::ReviewSummary),
            "calculate_confidence_score" => Some(Self::ConfidenceScore),
            "self_check_tool_results" => Some(Self::SelfCheck),
            "show_reasoning" => Some(Self::ShowReasoning),
            "calculate" => Some(Self::Calculate),
            "verify" => Some(Self::Verify),
            "review_consistency_check" => Some(Self::ConsistencyCheck),
            "check_consistency" => Some(Self::LegacyConsistency),
            _ => None,
        }
    }

    /// Name sent over the tool channel.
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::ClassifyProduct => "classify_product",
            Self::ReviewSummary => "review_summary_tool",
            Self::ConfidenceScore => "calculate_confidence_score",
            Self::SelfCheck => "self_check_tool_results",
            Self::ShowReasoning => "show_reasoning",
            Self::Calculate => "calculate",
            Self::Verify => "verify",
            Self::ConsistencyCheck => "review_consistency_check",
            Self::LegacyConsistency => "check_consistency",
        }
    }

    /// Key under which this tool's output is stored in the result map.
    pub fn result_key(self) -> &'static str {
        self.wire_name()
    }

    pub fn response_format(self) -> ResponseFormat {
        match self {
            Self::ReviewSummary | Self::ConfidenceScore | Self::SelfCheck => ResponseFormat::Json,
            Self::LegacyConsistency => ResponseFormat::JsonOrText,
            _ => ResponseFormat::Text,
        }
    }
}
