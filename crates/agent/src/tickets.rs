use std::sync::{Arc, LazyLock};

use cea_core::clock::Clock;
use cea_core::folio::{FolioError, FolioGenerator};
use cea_core::ticket::{NewTicket, TicketRecord, TicketStatus};
use regex::Regex;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::mcp::ToolBackend;

#[derive(Debug, Error)]
pub enum TicketError {
    #[error(transparent)]
    Folio(#[from] FolioError),
}

#[derive(Clone, Debug, PartialEq)]
pub struct TicketReceipt {
    pub folio: String,
    pub message: String,
    pub remote_confirmed: bool,
    /// The case as this service registered it, for audit by the caller.
    pub record: TicketRecord,
}

/// Creates tickets local-first: the folio is allocated before the remote
/// call, so even total remote failure leaves the user with a usable
/// identifier. A folio handed out is never regenerated.
pub struct TicketService {
    tools: Arc<dyn ToolBackend>,
    folios: Arc<FolioGenerator>,
    clock: Arc<dyn Clock>,
}

impl TicketService {
    pub fn new(tools: Arc<dyn ToolBackend>, folios: Arc<FolioGenerator>, clock: Arc<dyn Clock>) -> Self {
        Self { tools, folios, clock }
    }

    pub async fn create_ticket(&self, ticket: NewTicket) -> Result<TicketReceipt, TicketError> {
        let local_folio = self.folios.allocate(ticket.service_type)?;

        // The folio is deliberately left out of the outbound payload: the
        // remote system assigns its own where available.
        let payload = serde_json::json!({
            "service_type": ticket.service_type,
            "titulo": ticket.title,
            "descripcion": ticket.description,
            "numero_contrato": ticket.contract_number,
            "correo": ticket.email,
            "ubicacion": ticket.location,
        });

        let (folio, remote_confirmed) = match self.tools.call("Crear_ticket", payload).await {
            Ok(response) => match extract_folio(&response_text(&response)) {
                Some(remote_folio) => {
                    if remote_folio != local_folio {
                        info!(
                            event_name = "tickets.remote_folio_assigned",
                            local_folio = %local_folio,
                            remote_folio = %remote_folio,
                            "remote folio supersedes local allocation"
                        );
                    }
                    (remote_folio, true)
                }
                None => {
                    debug!(
                        event_name = "tickets.remote_folio_missing",
                        folio = %local_folio,
                        "remote response carried no folio, keeping local one"
                    );
                    (local_folio, false)
                }
            },
            Err(error) => {
                warn!(
                    event_name = "tickets.remote_create_failed",
                    folio = %local_folio,
                    error = %error,
                    "remote ticket creation failed, keeping local folio for reconciliation"
                );
                (local_folio, false)
            }
        };

        let record = TicketRecord {
            folio: folio.clone(),
            service_type: ticket.service_type,
            title: ticket.title,
            description: ticket.description,
            contract_number: ticket.contract_number,
            email: ticket.email,
            location: ticket.location,
            status: TicketStatus::Open,
            created_at: self.clock.now_utc(),
        };
        debug!(
            event_name = "tickets.created",
            folio = %record.folio,
            service_type = record.service_type.as_str(),
            remote_confirmed,
            "ticket registered"
        );

        Ok(TicketReceipt {
            message: format!("Ticket creado con folio {folio}"),
            folio,
            remote_confirmed,
            record,
        })
    }
}

static FOLIO_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)folio[:\s]+([A-Z0-9-]+)").unwrap());

/// Integration adapter against the remote system's free-text response shape.
pub fn extract_folio(text: &str) -> Option<String> {
    FOLIO_PATTERN.captures(text).map(|captures| captures[1].to_string())
}

fn response_text(response: &Value) -> String {
    match response.as_str() {
        Some(text) => text.to_string(),
        None => response.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use cea_core::clock::FixedClock;
    use cea_core::folio::FolioGenerator;
    use cea_core::ticket::{NewTicket, ServiceType, TicketStatus};
    use chrono::{TimeZone, Utc};
    use serde_json::{json, Value};

    use super::{extract_folio, TicketService};
    use crate::mcp::{ToolBackend, ToolBackendError};

    struct ScriptedTools(Result<Value, ()>);

    #[async_trait]
    impl ToolBackend for ScriptedTools {
        async fn call(&self, method: &str, _arguments: Value) -> Result<Value, ToolBackendError> {
            match &self.0 {
                Ok(value) => Ok(value.clone()),
                Err(()) => Err(ToolBackendError::Call {
                    method: method.to_string(),
                    reason: "connection refused".to_string(),
                }),
            }
        }
    }

    fn service(tools: ScriptedTools) -> TicketService {
        let clock =
            Arc::new(FixedClock(Utc.with_ymd_and_hms(2025, 12, 26, 18, 0, 0).single().expect("ts")));
        let folios = Arc::new(FolioGenerator::new(clock.clone()));
        TicketService::new(Arc::new(tools), folios, clock)
    }

    fn new_ticket() -> NewTicket {
        NewTicket {
            service_type: ServiceType::Fuga,
            title: "Fuga en vía pública".to_string(),
            description: "Agua brotando en la banqueta".to_string(),
            contract_number: Some("123456".to_string()),
            email: None,
            location: Some("Av. Constituyentes 20".to_string()),
        }
    }

    #[tokio::test]
    async fn remote_failure_still_yields_a_local_folio() {
        let tickets = service(ScriptedTools(Err(())));

        let receipt = tickets.create_ticket(new_ticket()).await.expect("create");
        assert_eq!(receipt.folio, "CEA-FUG-251226-0001");
        assert!(!receipt.remote_confirmed);
        assert!(receipt.message.contains(&receipt.folio));

        // The registered case carries the receipt's folio and the input
        // fields, opened in `open` state at the clock's instant.
        assert_eq!(receipt.record.folio, receipt.folio);
        assert_eq!(receipt.record.service_type, ServiceType::Fuga);
        assert_eq!(receipt.record.status, TicketStatus::Open);
        assert_eq!(receipt.record.title, "Fuga en vía pública");
        assert_eq!(
            receipt.record.created_at,
            Utc.with_ymd_and_hms(2025, 12, 26, 18, 0, 0).single().expect("ts")
        );
    }

    #[tokio::test]
    async fn remote_folio_supersedes_local_allocation() {
        let tickets = service(ScriptedTools(Ok(json!({
            "content": "Ticket registrado. Folio: CEA-FUG-251226-0099"
        }))));

        let receipt = tickets.create_ticket(new_ticket()).await.expect("create");
        assert_eq!(receipt.folio, "CEA-FUG-251226-0099");
        assert!(receipt.remote_confirmed);
    }

    #[tokio::test]
    async fn remote_success_without_folio_keeps_local_one() {
        let tickets = service(ScriptedTools(Ok(json!({"ok": true}))));

        let receipt = tickets.create_ticket(new_ticket()).await.expect("create");
        assert_eq!(receipt.folio, "CEA-FUG-251226-0001");
        assert!(!receipt.remote_confirmed);
    }

    #[test]
    fn folio_extraction_handles_presence_and_absence() {
        assert_eq!(
            extract_folio("tu folio: CEA-URG-251226-0003 quedó registrado").as_deref(),
            Some("CEA-URG-251226-0003")
        );
        assert_eq!(extract_folio("FOLIO ABC-123").as_deref(), Some("ABC-123"));
        assert!(extract_folio("no hay identificador aquí").is_none());
        assert!(extract_folio("").is_none());
    }
}
