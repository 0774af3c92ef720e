//! Remote tool-call channel.
//!
//! Tools are an external capability reached over a request/response
//! protocol. A response carries a sequence of content parts; consumers
//! read the first part's text.

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{CoreError, CoreResult};

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Deserialize)]
pub struct ContentPart {
    pub text: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ToolResponse {
    pub content: Vec<ContentPart>,
}

impl ToolResponse {
    /// Build a single-part text response.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentPart { text: text.into() }],
        }
    }

    pub fn first_text(&self) -> &str {
        self.content.first().map(|part| part.text.as_str()).unwrap_or("")
    }
}

#[async_trait]
pub trait ToolChannel: Send + Sync {
    /// Invoke a remote tool by name with an arguments object.
    async fn call_tool(&self, name: &str, arguments: Value) -> CoreResult<ToolResponse>;
}

/// HTTP-backed tool channel: `POST {base}/tools/{name}` with the arguments
/// object as the JSON body.
pub struct HttpToolChannel {
    client: reqwest::Client,
    base_url: String,
}

impl HttpToolChannel {
    pub fn new(base_url: impl Into<String>) -> CoreResult<Self> {
        let timeout = env::var("ADVISOR_TOOLS_TIMEOUT_SECS")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout))
            .build()
            .map_err(|error| CoreError::Internal(format!("http client: {error}")))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

#[async_trait]
impl ToolChannel for HttpToolChannel {
    async fn call_tool(&self, name: &str, arguments: Value) -> CoreResult<ToolResponse> {
        let url = format!("{}/tools/{name}", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .json(&arguments)
            .send()
            .await
            .map_err(|error| CoreError::ToolChannel(format!("{name}: {error}")))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(CoreError::ToolChannel(format!(
                "{name}: status {status}: {text}"
            )));
        }

        response
            .json::<ToolResponse>()
            .await
            .map_err(|error| CoreError::ToolChannel(format!("{name}: bad envelope: {error}")))
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    /// In-memory channel for orchestration tests. Serves canned text per
    /// tool name and records every dispatched request.
    #[derive(Default)]
    pub struct MockToolChannel {
        responses: HashMap<String, String>,
        fail_on: Option<String>,
        pub calls: Mutex<Vec<(String, Value)>>,
    }

    impl MockToolChannel {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_response(mut self, name: &str, text: &str) -> Self {
            self.responses.insert(name.to_string(), text.to_string());
            self
        }

        /// Make a specific tool fail with a transport error.
        pub fn failing(mut self, name: &str) -> Self {
            self.fail_on = Some(name.to_string());
            self
        }

        pub fn recorded_calls(&self) -> Vec<(String, Value)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ToolChannel for MockToolChannel {
        async fn call_tool(&self, name: &str, arguments: Value) -> CoreResult<ToolResponse> {
            self.calls
                .lock()
                .unwrap()
                .push((name.to_string(), arguments));
            if self.fail_on.as_deref() == Some(name) {
                return Err(CoreError::ToolChannel(format!("{name}: connection refused")));
            }
            let text = self
                .responses
                .get(name)
                .cloned()
                .unwrap_or_else(|| "{}".to_string());
            Ok(ToolResponse::text(text))
        }
    }
}
