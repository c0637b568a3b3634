use std::time::Duration;

use async_trait::async_trait;
use cea_core::config::ToolsConfig;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ToolBackendError {
    #[error("tool call `{method}` failed: {reason}")]
    Call { method: String, reason: String },
    #[error("tool call `{method}` timed out after {secs} seconds")]
    Timeout { method: String, secs: u64 },
    #[error("tool backend returned a malformed payload for `{method}`: {reason}")]
    Malformed { method: String, reason: String },
}

/// Remote tool backend: one endpoint, method name plus structured arguments.
/// Covers customer/contract lookup, debt and consumption queries, ticket
/// listing and ticket creation.
#[async_trait]
pub trait ToolBackend: Send + Sync {
    async fn call(&self, method: &str, arguments: Value) -> Result<Value, ToolBackendError>;
}

pub struct HttpToolBackend {
    client: reqwest::Client,
    base_url: String,
    server_label: String,
    timeout: Duration,
}

impl HttpToolBackend {
    pub fn new(config: &ToolsConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.clone(),
            server_label: config.server_label.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

#[async_trait]
impl ToolBackend for HttpToolBackend {
    async fn call(&self, method: &str, arguments: Value) -> Result<Value, ToolBackendError> {
        let payload = serde_json::json!({
            "server_label": self.server_label,
            "method": method,
            "arguments": arguments,
        });

        let response = self
            .client
            .post(&self.base_url)
            .timeout(self.timeout)
            .json(&payload)
            .send()
            .await
            .map_err(|error| {
                if error.is_timeout() {
                    ToolBackendError::Timeout {
                        method: method.to_string(),
                        secs: self.timeout.as_secs(),
                    }
                } else {
                    ToolBackendError::Call { method: method.to_string(), reason: error.to_string() }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ToolBackendError::Call {
                method: method.to_string(),
                reason: format!("remote returned status {status}"),
            });
        }

        response.json::<Value>().await.map_err(|error| ToolBackendError::Malformed {
            method: method.to_string(),
            reason: error.to_string(),
        })
    }
}
