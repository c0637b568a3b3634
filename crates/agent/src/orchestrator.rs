//! The chat workflow: guardrail screening, intent classification, routing to
//! an intent specialist (or the advisor handoff path), and history upkeep.

use std::sync::Arc;

use cea_core::classification::ClassificationLabel;
use cea_core::clock::Clock;
use cea_core::conversation::{ContentPart, ConversationHistory, ConversationStore, ConversationTurn, StoreError};
use cea_core::ticket::{NewTicket, ServiceType};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::agents::{classification_agent, specialist_for};
use crate::approval::{extract_output_text, ApprovalLoop};
use crate::backend::{AgentResult, BackendError};
use crate::guardrails::{
    has_tripwire, masked_text, GuardrailConfig, GuardrailEngine, GuardrailError, GuardrailFailure,
};
use crate::tickets::TicketService;

#[derive(Clone, Debug)]
pub struct WorkflowInput {
    pub message: String,
    pub conversation_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum WorkflowOutput {
    Reply { output_text: String, classification: ClassificationLabel },
    Rejected(GuardrailFailure),
}

#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("classification agent produced no usable label")]
    MissingClassification,
    #[error("specialist agent produced no output text")]
    EmptyAgentOutput,
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Guardrail(#[from] GuardrailError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct Orchestrator {
    loop_runner: ApprovalLoop,
    guardrails: Arc<dyn GuardrailEngine>,
    guardrail_config: GuardrailConfig,
    tickets: TicketService,
    store: Arc<ConversationStore>,
    clock: Arc<dyn Clock>,
}

impl Orchestrator {
    pub fn new(
        loop_runner: ApprovalLoop,
        guardrails: Arc<dyn GuardrailEngine>,
        guardrail_config: GuardrailConfig,
        tickets: TicketService,
        store: Arc<ConversationStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { loop_runner, guardrails, guardrail_config, tickets, store, clock }
    }

    /// Handles one inbound message end to end. Guardrail rejections are a
    /// successful outcome with a structured payload, not an error.
    pub async fn handle(&self, input: WorkflowInput) -> Result<WorkflowOutput, WorkflowError> {
        info!(
            event_name = "workflow.received",
            conversation_id = input.conversation_id.as_deref().unwrap_or("-"),
            "handling inbound message"
        );

        let mut history = match &input.conversation_id {
            Some(id) => self.store.get(id)?,
            None => ConversationHistory::new(),
        };

        let findings = self.guardrails.evaluate(&input.message, &self.guardrail_config).await?;
        if has_tripwire(&findings) {
            warn!(event_name = "workflow.guardrail_tripped", "input rejected by guardrails");
            return Ok(WorkflowOutput::Rejected(GuardrailFailure::from_findings(&findings)));
        }
        let message = masked_text(&findings).unwrap_or_else(|| input.message.clone());
        self.scrub_history(&mut history).await?;

        let timestamp = self.clock.now_local().format("%Y-%m-%d %H:%M:%S");
        history.push(ConversationTurn::user_text(format!(
            "[Fecha y hora actual: {timestamp}]\n{message}"
        )));

        let classifier = classification_agent();
        let run = self.loop_runner.run(&classifier, &mut history).await?;
        let label = extract_classification(&run.result).ok_or(WorkflowError::MissingClassification)?;
        info!(
            event_name = "workflow.classified",
            classification = label.as_str(),
            invocations = run.invocations,
            "message classified"
        );
        // The classifier's JSON answer stays out of the transcript so the
        // specialist never sees it as assistant prose.
        for item in run.result.new_items() {
            if !item.is_assistant_text() {
                history.push(item.clone());
            }
        }

        let output_text = match specialist_for(label) {
            Some(agent) => {
                debug!(event_name = "workflow.routing", agent = %agent.name, "routing to specialist");
                let run = self.loop_runner.run(&agent, &mut history).await?;
                let text =
                    extract_output_text(&run.result).ok_or(WorkflowError::EmptyAgentOutput)?;
                for item in run.result.new_items() {
                    history.push(item.clone());
                }
                text
            }
            None => {
                let text = self.advisor_handoff(&message).await;
                history.push(ConversationTurn::assistant_text(text.clone()));
                text
            }
        };

        if let Some(id) = &input.conversation_id {
            self.store.put(id, history)?;
        }

        info!(
            event_name = "workflow.responding",
            classification = label.as_str(),
            "workflow complete"
        );
        Ok(WorkflowOutput::Reply { output_text, classification: label })
    }

    /// Re-applies the mask-only checks to prior text so masked content never
    /// resurfaces from the stored history.
    async fn scrub_history(&self, history: &mut ConversationHistory) -> Result<(), WorkflowError> {
        let mask_config = self.guardrail_config.mask_only();
        if mask_config.guardrails.is_empty() {
            return Ok(());
        }

        for turn in history.iter_mut() {
            for part in turn.content.iter_mut() {
                if let ContentPart::Text { text } = part {
                    let findings = self.guardrails.evaluate(text, &mask_config).await?;
                    if let Some(masked) = masked_text(&findings) {
                        *text = masked;
                    }
                }
            }
        }
        Ok(())
    }

    /// The `hablar_asesor` path skips the model entirely: open an urgent
    /// ticket and hand the caller its folio. A failed ticket still yields a
    /// reply, with a placeholder folio for manual follow-up.
    async fn advisor_handoff(&self, message: &str) -> String {
        let ticket = NewTicket {
            service_type: ServiceType::Urgente,
            title: "Solicitud de asesor".to_string(),
            description: format!("Solicitud de asesor humano. Mensaje original: {message}"),
            contract_number: None,
            email: None,
            location: None,
        };

        let folio = match self.tickets.create_ticket(ticket).await {
            Ok(receipt) => receipt.folio,
            Err(error) => {
                warn!(
                    event_name = "workflow.advisor_ticket_failed",
                    error = %error,
                    "advisor handoff ticket could not be created"
                );
                "PENDING".to_string()
            }
        };

        format!(
            "Te conectaré con un asesor humano. Hemos registrado tu solicitud con el folio \
             {folio}. Por favor espera un momento."
        )
    }
}

#[derive(Deserialize)]
struct ClassificationDecision {
    classification: ClassificationLabel,
}

/// Pulls the label out of the classifier's structured output. Accepts either
/// a parsed object or a JSON string holding one.
pub fn extract_classification(result: &AgentResult) -> Option<ClassificationLabel> {
    let value = result.final_output()?;
    let decision: ClassificationDecision = match value {
        Value::String(text) => serde_json::from_str(text).ok()?,
        other => serde_json::from_value(other.clone()).ok()?,
    };
    Some(decision.classification)
}
