use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Service categories a ticket can be opened under. Closed set: the folio
/// type code table covers exactly these variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    Fuga,
    Aclaraciones,
    Pagos,
    Lecturas,
    RevisionRecibo,
    ReciboDigital,
    Urgente,
}

impl ServiceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fuga => "fuga",
            Self::Aclaraciones => "aclaraciones",
            Self::Pagos => "pagos",
            Self::Lecturas => "lecturas",
            Self::RevisionRecibo => "revision_recibo",
            Self::ReciboDigital => "recibo_digital",
            Self::Urgente => "urgente",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Open,
    InProgress,
    Closed,
}

/// Fields needed to open a ticket against the remote backend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NewTicket {
    pub service_type: ServiceType,
    pub title: String,
    pub description: String,
    pub contract_number: Option<String>,
    pub email: Option<String>,
    pub location: Option<String>,
}

/// A created support case. Never mutated after creation; updates and closure
/// go through the remote system's own tooling.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TicketRecord {
    pub folio: String,
    pub service_type: ServiceType,
    pub title: String,
    pub description: String,
    pub contract_number: Option<String>,
    pub email: Option<String>,
    pub location: Option<String>,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
}
