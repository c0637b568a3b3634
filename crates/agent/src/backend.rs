use async_trait::async_trait;
use cea_core::conversation::ConversationTurn;
use serde_json::Value;
use thiserror::Error;

/// Definition of one remote agent: identity, model, opaque instruction text,
/// the tools it may call, and an optional structured output schema.
#[derive(Clone, Debug, PartialEq)]
pub struct AgentSpec {
    pub name: String,
    pub model: String,
    pub instructions: String,
    pub allowed_tools: Vec<String>,
    pub output_schema: Option<Value>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApprovalKind {
    ToolCall,
    Other,
}

/// An interruption the agent backend raised and is waiting on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingApproval {
    pub request_id: String,
    pub tool_name: String,
    pub kind: ApprovalKind,
}

/// Outcome of a single agent invocation, consumed by exhaustive matching.
#[derive(Clone, Debug, PartialEq)]
pub enum AgentResult {
    Completed { final_output: Option<Value>, new_items: Vec<ConversationTurn> },
    Interrupted { approvals: Vec<PendingApproval>, new_items: Vec<ConversationTurn> },
}

impl AgentResult {
    pub fn new_items(&self) -> &[ConversationTurn] {
        match self {
            Self::Completed { new_items, .. } | Self::Interrupted { new_items, .. } => new_items,
        }
    }

    pub fn final_output(&self) -> Option<&Value> {
        match self {
            Self::Completed { final_output, .. } => final_output.as_ref(),
            Self::Interrupted { .. } => None,
        }
    }

    pub fn is_interrupted(&self) -> bool {
        matches!(self, Self::Interrupted { .. })
    }
}

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("agent backend request failed: {0}")]
    Request(String),
    #[error("agent backend returned a malformed payload: {0}")]
    Malformed(String),
    #[error("agent backend timed out after {0} seconds")]
    Timeout(u64),
}

/// Remote tool-calling model API, consumed as a black-box capability: an
/// invocation either completes, interrupts for approvals, or fails.
#[async_trait]
pub trait AgentBackend: Send + Sync {
    async fn invoke(
        &self,
        agent: &AgentSpec,
        history: &[ConversationTurn],
    ) -> Result<AgentResult, BackendError>;
}
