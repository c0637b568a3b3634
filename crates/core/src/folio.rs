use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use thiserror::Error;

use crate::clock::Clock;
use crate::ticket::ServiceType;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FolioError {
    #[error("folio counter lock poisoned")]
    Poisoned,
}

/// Allocator of human-readable ticket folios, `CEA-{CODE}-{YYMMDD}-{NNNN}`.
///
/// Counters are keyed by (local date, type code) and live in process memory
/// only; a restart resets them. The read-increment-write sequence holds the
/// mutex for its whole duration, so concurrent allocations for the same key
/// can never yield duplicates.
pub struct FolioGenerator {
    clock: Arc<dyn Clock>,
    counters: Mutex<HashMap<(String, &'static str), u32>>,
}

impl FolioGenerator {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock, counters: Mutex::new(HashMap::new()) }
    }

    pub fn allocate(&self, service_type: ServiceType) -> Result<String, FolioError> {
        let code = type_code(service_type);
        let date = self.clock.now_local().format("%y%m%d").to_string();

        let mut counters = self.counters.lock().map_err(|_| FolioError::Poisoned)?;
        let counter = counters.entry((date.clone(), code)).or_insert(0);
        *counter += 1;

        Ok(format!("CEA-{code}-{date}-{:04}", *counter))
    }
}

fn type_code(service_type: ServiceType) -> &'static str {
    match service_type {
        ServiceType::Fuga => "FUG",
        ServiceType::Aclaraciones => "ACL",
        ServiceType::Pagos => "PAG",
        ServiceType::Lecturas => "LEC",
        ServiceType::RevisionRecibo => "REV",
        ServiceType::ReciboDigital => "DIG",
        ServiceType::Urgente => "URG",
    }
}
