use std::collections::HashMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
    ToolResult,
    ToolApprovalRequest,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ToolCall { name: String, arguments: serde_json::Value },
    ToolOutput { output: serde_json::Value },
}

/// One message contributed by the user, an agent, or a tool within a single
/// exchange. Immutable once appended to a history.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    pub role: Role,
    pub content: Vec<ContentPart>,
    /// Correlates approval requests to their resolutions.
    pub item_id: Option<String>,
}

impl ConversationTurn {
    pub fn user_text(text: impl Into<String>) -> Self {
        Self { role: Role::User, content: vec![ContentPart::Text { text: text.into() }], item_id: None }
    }

    pub fn assistant_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: vec![ContentPart::Text { text: text.into() }],
            item_id: None,
        }
    }

    pub fn approval_request(item_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            role: Role::ToolApprovalRequest,
            content: vec![ContentPart::ToolCall {
                name: name.into(),
                arguments: serde_json::Value::Null,
            }],
            item_id: Some(item_id.into()),
        }
    }

    /// Resolution for a pending approval request, correlated by `item_id`.
    pub fn approval_resolution(item_id: impl Into<String>, approve: bool) -> Self {
        let item_id = item_id.into();
        Self {
            role: Role::ToolResult,
            content: vec![ContentPart::ToolOutput {
                output: serde_json::json!({
                    "approval_request_id": item_id,
                    "approve": approve,
                }),
            }],
            item_id: Some(item_id),
        }
    }

    /// Concatenated text of all text parts, or `None` when the turn carries
    /// no text at all.
    pub fn text(&self) -> Option<String> {
        let mut combined = String::new();
        for part in &self.content {
            if let ContentPart::Text { text } = part {
                combined.push_str(text);
            }
        }
        (!combined.is_empty()).then_some(combined)
    }

    /// True for a plain assistant reply: assistant role and text-only parts.
    pub fn is_assistant_text(&self) -> bool {
        self.role == Role::Assistant
            && !self.content.is_empty()
            && self.content.iter().all(|part| matches!(part, ContentPart::Text { .. }))
    }
}

/// Append-only transcript of one conversation.
pub type ConversationHistory = Vec<ConversationTurn>;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("conversation store lock poisoned")]
    Poisoned,
}

/// Process-memory history store keyed by caller-supplied conversation id.
///
/// Lookups for absent ids yield an empty history. Writes are last-writer-wins
/// per id; the service assumes at most one in-flight request per conversation
/// at a time. Entries live for the process lifetime, there is no expiry.
#[derive(Debug, Default)]
pub struct ConversationStore {
    entries: Mutex<HashMap<String, ConversationHistory>>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Result<ConversationHistory, StoreError> {
        let entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(entries.get(id).cloned().unwrap_or_default())
    }

    pub fn put(&self, id: &str, history: ConversationHistory) -> Result<(), StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        entries.insert(id.to_string(), history);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.lock().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
