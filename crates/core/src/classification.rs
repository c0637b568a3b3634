use std::fmt;

use serde::{Deserialize, Serialize};

/// Intent labels produced by the classification agent. Exactly one is
/// assigned per user turn and decides which specialist handles it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassificationLabel {
    Fuga,
    Pagos,
    HablarAsesor,
    Informacion,
    Consumos,
    Contrato,
    Tickets,
}

impl ClassificationLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fuga => "fuga",
            Self::Pagos => "pagos",
            Self::HablarAsesor => "hablar_asesor",
            Self::Informacion => "informacion",
            Self::Consumos => "consumos",
            Self::Contrato => "contrato",
            Self::Tickets => "tickets",
        }
    }
}

impl fmt::Display for ClassificationLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
