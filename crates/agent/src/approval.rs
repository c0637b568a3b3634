use std::collections::HashSet;
use std::sync::Arc;

use cea_core::conversation::{ConversationHistory, ConversationTurn, Role};
use tracing::warn;

use crate::backend::{AgentBackend, AgentResult, AgentSpec, ApprovalKind, BackendError};

/// Safety bound against infinite interruption cycles, not a retry policy.
pub const MAX_APPROVAL_ROUNDS: u32 = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopTermination {
    /// The agent returned a non-interruption result.
    Completed,
    /// An interruption carried nothing approvable; re-invoking would spin.
    Stalled,
    /// The round cap was hit with the agent still interrupted.
    Exhausted,
}

#[derive(Clone, Debug)]
pub struct LoopRun {
    pub result: AgentResult,
    pub invocations: u32,
    pub termination: LoopTermination,
}

/// Drives one agent invocation to completion, transparently approving
/// tool-call interruptions. Auto-approval is a deliberate trust decision for
/// this deployment; there is no human-in-the-loop gate.
pub struct ApprovalLoop {
    backend: Arc<dyn AgentBackend>,
    max_rounds: u32,
}

impl ApprovalLoop {
    pub fn new(backend: Arc<dyn AgentBackend>) -> Self {
        Self { backend, max_rounds: MAX_APPROVAL_ROUNDS }
    }

    /// Runs the agent over `history`, appending each interrupted round's new
    /// items (minus the just-approved requests) and the approval resolutions
    /// before re-invoking. Callers must attempt output extraction whatever
    /// the termination state.
    pub async fn run(
        &self,
        agent: &AgentSpec,
        history: &mut ConversationHistory,
    ) -> Result<LoopRun, BackendError> {
        let mut invocations = 1u32;
        let mut result = self.backend.invoke(agent, history).await?;
        let mut rounds = 0u32;

        loop {
            let AgentResult::Interrupted { approvals, new_items } = &result else {
                return Ok(LoopRun { result, invocations, termination: LoopTermination::Completed });
            };

            if rounds >= self.max_rounds {
                warn!(
                    event_name = "approval_loop.exhausted",
                    agent = %agent.name,
                    rounds,
                    "approval loop hit its round cap while still interrupted"
                );
                return Ok(LoopRun { result, invocations, termination: LoopTermination::Exhausted });
            }

            let approved_ids: HashSet<String> = approvals
                .iter()
                .filter(|approval| approval.kind == ApprovalKind::ToolCall)
                .map(|approval| approval.request_id.clone())
                .collect();

            if approved_ids.is_empty() {
                warn!(
                    event_name = "approval_loop.stalled",
                    agent = %agent.name,
                    pending = approvals.len(),
                    "interruption carried no approvable tool calls"
                );
                return Ok(LoopRun { result, invocations, termination: LoopTermination::Stalled });
            }

            // Approved requests are resubmitted as resolutions, so appending
            // their original items as well would duplicate them.
            for item in new_items {
                let is_approved_request = item.role == Role::ToolApprovalRequest
                    && item.item_id.as_deref().is_some_and(|id| approved_ids.contains(id));
                if !is_approved_request {
                    history.push(item.clone());
                }
            }
            for approval in approvals {
                if approval.kind == ApprovalKind::ToolCall {
                    history.push(ConversationTurn::approval_resolution(&approval.request_id, true));
                }
            }

            rounds += 1;
            invocations += 1;
            result = self.backend.invoke(agent, history).await?;
        }
    }
}

/// Fallback output extraction: the canonical final output when present,
/// otherwise the text of the most recently produced item when that item is
/// an assistant message. `None` means the turn produced nothing usable.
pub fn extract_output_text(result: &AgentResult) -> Option<String> {
    if let Some(value) = result.final_output() {
        if let Some(text) = value.as_str() {
            return Some(text.to_string());
        }
    }

    let last = result.new_items().last()?;
    if last.role == Role::Assistant {
        return last.text();
    }
    None
}
