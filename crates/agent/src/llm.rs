//! HTTP adapter for the remote tool-calling model API (OpenAI-style
//! responses endpoint with hosted MCP tools).

use std::time::Duration;

use async_trait::async_trait;
use cea_core::config::{LlmConfig, ToolsConfig};
use cea_core::conversation::{ContentPart, ConversationTurn, Role};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::backend::{
    AgentBackend, AgentResult, AgentSpec, ApprovalKind, BackendError, PendingApproval,
};

pub struct HttpAgentBackend {
    client: reqwest::Client,
    base_url: String,
    api_key: SecretString,
    tool_server_url: String,
    tool_server_label: String,
    timeout: Duration,
    max_retries: u32,
}

impl HttpAgentBackend {
    pub fn new(llm: &LlmConfig, tools: &ToolsConfig, api_key: SecretString) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: llm.base_url.clone(),
            api_key,
            tool_server_url: tools.base_url.clone(),
            tool_server_label: tools.server_label.clone(),
            timeout: Duration::from_secs(llm.timeout_secs),
            max_retries: llm.max_retries,
        }
    }

    fn request_body(&self, agent: &AgentSpec, history: &[ConversationTurn]) -> Value {
        let mut body = json!({
            "model": agent.model,
            "instructions": agent.instructions,
            "input": history_to_wire(history),
        });

        if !agent.allowed_tools.is_empty() {
            body["tools"] = json!([{
                "type": "mcp",
                "server_label": self.tool_server_label,
                "server_url": self.tool_server_url,
                "allowed_tools": agent.allowed_tools,
                "require_approval": "always",
            }]);
        }

        if let Some(schema) = &agent.output_schema {
            body["text"] = json!({
                "format": {
                    "type": "json_schema",
                    "name": "agent_output",
                    "strict": true,
                    "schema": schema,
                }
            });
        }

        body
    }
}

#[async_trait]
impl AgentBackend for HttpAgentBackend {
    async fn invoke(
        &self,
        agent: &AgentSpec,
        history: &[ConversationTurn],
    ) -> Result<AgentResult, BackendError> {
        let url = format!("{}/responses", self.base_url.trim_end_matches('/'));
        debug!(
            event_name = "llm.invoke",
            agent = %agent.name,
            model = %agent.model,
            history_len = history.len(),
            "invoking agent backend"
        );
        let request = self.request_body(agent, history);

        let mut attempt = 0u32;
        loop {
            attempt += 1;
            match self.send(&url, &request).await {
                Ok(body) => return parse_response(&body, agent.output_schema.is_some()),
                Err(error) if attempt <= self.max_retries && retryable(&error) => {
                    warn!(
                        event_name = "llm.retry",
                        agent = %agent.name,
                        attempt,
                        error = %error,
                        "transient backend failure, retrying"
                    );
                }
                Err(error) => return Err(error),
            }
        }
    }
}

impl HttpAgentBackend {
    async fn send(&self, url: &str, request: &Value) -> Result<Value, BackendError> {
        let response = self
            .client
            .post(url)
            .timeout(self.timeout)
            .bearer_auth(self.api_key.expose_secret())
            .json(request)
            .send()
            .await
            .map_err(|error| {
                if error.is_timeout() {
                    BackendError::Timeout(self.timeout.as_secs())
                } else {
                    BackendError::Request(error.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(BackendError::Request(format!("status {status}: {detail}")));
        }

        response.json::<Value>().await.map_err(|error| BackendError::Malformed(error.to_string()))
    }
}

fn retryable(error: &BackendError) -> bool {
    matches!(error, BackendError::Request(_) | BackendError::Timeout(_))
}

/// Serializes a conversation history into wire input items.
pub fn history_to_wire(history: &[ConversationTurn]) -> Vec<Value> {
    let mut items = Vec::new();

    for turn in history {
        match turn.role {
            Role::User | Role::Assistant => {
                let part_type =
                    if turn.role == Role::User { "input_text" } else { "output_text" };
                let role = if turn.role == Role::User { "user" } else { "assistant" };
                let mut content = Vec::new();
                for part in &turn.content {
                    match part {
                        ContentPart::Text { text } => {
                            content.push(json!({"type": part_type, "text": text}));
                        }
                        ContentPart::ToolCall { name, arguments } => {
                            items.push(json!({
                                "type": "mcp_call",
                                "id": turn.item_id,
                                "name": name,
                                "arguments": arguments,
                            }));
                        }
                        ContentPart::ToolOutput { output } => {
                            items.push(json!({
                                "type": "mcp_call",
                                "id": turn.item_id,
                                "output": output,
                            }));
                        }
                    }
                }
                if !content.is_empty() {
                    items.push(json!({"role": role, "content": content}));
                }
            }
            Role::ToolApprovalRequest => {
                let name = turn.content.iter().find_map(|part| match part {
                    ContentPart::ToolCall { name, .. } => Some(name.clone()),
                    _ => None,
                });
                items.push(json!({
                    "type": "mcp_approval_request",
                    "id": turn.item_id,
                    "name": name,
                }));
            }
            Role::ToolResult => {
                for part in &turn.content {
                    if let ContentPart::ToolOutput { output } = part {
                        if output.get("approval_request_id").is_some() {
                            items.push(json!({
                                "type": "mcp_approval_response",
                                "approval_request_id": output["approval_request_id"],
                                "approve": output["approve"],
                            }));
                        } else {
                            items.push(json!({
                                "type": "mcp_call",
                                "id": turn.item_id,
                                "output": output,
                            }));
                        }
                    }
                }
            }
        }
    }

    items
}

/// Maps a wire response body into the typed agent result. Pending approval
/// requests turn the whole result into an interruption.
pub fn parse_response(body: &Value, has_schema: bool) -> Result<AgentResult, BackendError> {
    let output = body
        .get("output")
        .and_then(Value::as_array)
        .ok_or_else(|| BackendError::Malformed("response carries no `output` array".to_string()))?;

    let mut new_items = Vec::new();
    let mut approvals = Vec::new();
    let mut last_text: Option<String> = None;

    for item in output {
        match item.get("type").and_then(Value::as_str) {
            Some("message") => {
                let mut text = String::new();
                if let Some(parts) = item.get("content").and_then(Value::as_array) {
                    for part in parts {
                        if part.get("type").and_then(Value::as_str) == Some("output_text") {
                            if let Some(chunk) = part.get("text").and_then(Value::as_str) {
                                text.push_str(chunk);
                            }
                        }
                    }
                }
                if !text.is_empty() {
                    last_text = Some(text.clone());
                    new_items.push(ConversationTurn::assistant_text(text));
                }
            }
            Some("mcp_call") => {
                let name = item.get("name").and_then(Value::as_str).unwrap_or_default();
                let mut content = vec![ContentPart::ToolCall {
                    name: name.to_string(),
                    arguments: item.get("arguments").cloned().unwrap_or(Value::Null),
                }];
                if let Some(output_value) = item.get("output") {
                    content.push(ContentPart::ToolOutput { output: output_value.clone() });
                }
                new_items.push(ConversationTurn {
                    role: Role::ToolResult,
                    content,
                    item_id: item.get("id").and_then(Value::as_str).map(ToString::to_string),
                });
            }
            Some("mcp_approval_request") => {
                let request_id = item
                    .get("id")
                    .and_then(Value::as_str)
                    .ok_or_else(|| {
                        BackendError::Malformed("approval request without id".to_string())
                    })?
                    .to_string();
                let tool_name =
                    item.get("name").and_then(Value::as_str).unwrap_or_default().to_string();
                new_items.push(ConversationTurn::approval_request(&request_id, &tool_name));
                approvals.push(PendingApproval {
                    request_id,
                    tool_name,
                    kind: ApprovalKind::ToolCall,
                });
            }
            other => {
                debug!(item_type = other.unwrap_or("unknown"), "skipping unrecognized output item");
            }
        }
    }

    if !approvals.is_empty() {
        return Ok(AgentResult::Interrupted { approvals, new_items });
    }

    let final_output = match (&last_text, has_schema) {
        (Some(text), true) => Some(
            serde_json::from_str::<Value>(text)
                .map_err(|error| BackendError::Malformed(format!("structured output: {error}")))?,
        ),
        (Some(text), false) => Some(Value::String(text.clone())),
        (None, _) => None,
    };

    Ok(AgentResult::Completed { final_output, new_items })
}
