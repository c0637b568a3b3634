//! Conversation orchestration for the CEA support assistant.
//!
//! The flow is classify-then-route: every inbound message is labeled by a
//! classification agent, then handed to an intent-specialized agent whose
//! tool-call interruptions are auto-approved by a bounded loop. Ticket
//! creation is local-first: a folio is allocated before the remote backend
//! is consulted, so the user always leaves with a usable identifier.

pub mod agents;
pub mod approval;
pub mod backend;
pub mod guardrails;
pub mod llm;
pub mod mcp;
pub mod orchestrator;
pub mod tickets;

pub use approval::{ApprovalLoop, LoopRun, LoopTermination, MAX_APPROVAL_ROUNDS};
pub use backend::{AgentBackend, AgentResult, AgentSpec, ApprovalKind, BackendError, PendingApproval};
pub use guardrails::{GuardrailConfig, GuardrailEngine, GuardrailError, NoopGuardrailEngine};
pub use mcp::{HttpToolBackend, ToolBackend, ToolBackendError};
pub use orchestrator::{Orchestrator, WorkflowError, WorkflowInput, WorkflowOutput};
pub use tickets::{TicketReceipt, TicketService};
