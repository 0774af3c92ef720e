use std::fmt;

/// Unified error type for the purchase-advisor crate.
#[derive(Debug, Clone)]
pub enum CoreError {
    /// Invalid input provided by the caller.
    InvalidInput(String),
    /// The remote tool channel failed (transport, HTTP status, bad envelope).
    ToolChannel(String),
    /// The language-model channel failed.
    Llm(String),
    /// The tool plan itself was rejected upstream. `Display` is the bare
    /// message so it can surface verbatim as a response `error` field.
    Plan(String),
    /// Internal error.
    Internal(String),
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoreError::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            CoreError::ToolChannel(msg) => write!(f, "tool channel error: {msg}"),
            CoreError::Llm(msg) => write!(f, "llm error: {msg}"),
            CoreError::Plan(msg) => write!(f, "{msg}"),
            CoreError::Internal(msg) => write!(f, "internal error: {msg}"),
        }
    }
}

impl std::error::Error for CoreError {}

/// Result type alias using [`CoreError`].
pub type CoreResult<T> = Result<T, CoreError>;
