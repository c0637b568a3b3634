//! The agent roster. Instruction bodies are operator-authored prompt text,
//! opaque to the orchestration logic.

use cea_core::classification::ClassificationLabel;
use serde_json::json;

use crate::backend::AgentSpec;

/// Tools the specialist agents may reach on the remote backend.
pub const ALLOWED_TOOLS: &[&str] = &[
    "get_conceptos_cea",
    "get_tarifa_contrato",
    "get_deuda",
    "get_contract_details",
    "get_consumo",
    "get_client_tickets",
    "get_available_agent",
    "get_active_tickets",
    "Crear_Customer",
    "Buscar_Customer_Por_Contrato",
    "Crear_ticket",
];

fn allowed_tools() -> Vec<String> {
    ALLOWED_TOOLS.iter().map(ToString::to_string).collect()
}

const CLASSIFICATION_INSTRUCTIONS: &str = "\
Clasifica la intención del usuario en una de las siguientes categorías:
\"fuga\", \"pagos\", \"hablar_asesor\", \"informacion\", \"consumos\", \"contrato\", \"tickets\".

1. Emergencias de agua o drenaje, pérdida de servicio, fugas o inundaciones van a fuga.
2. Preguntas sobre pagos, adeudos, saldos, recibos o dónde pagar van a pagos.
3. Preguntas sobre contratos (alta, cambio de titular) van a contrato.
4. Actualizaciones a un caso existente van a tickets.
5. Cambio de recibo a digital va a pagos.
6. Si pide hablar con una persona, hablar_asesor.
7. Cualquier otro mensaje va a informacion.";

const INFORMATION_INSTRUCTIONS: &str = "\
Eres María, agente informativa de CEA Querétaro (agua y saneamiento).
Responde con claridad sobre pagos, consumo, contratos, recibos, oficinas y
horarios según la política CEA-INF-2025-01. No levantes reportes, no
confirmes emergencias, no prometas ajustes ni solicites datos sensibles.
Tono cálido y profesional, español mexicano, respuestas breves, máximo un
emoji por mensaje (💧 preferido).";

const PAGOS_INSTRUCTIONS: &str = "\
Ayudas con pagos y recibos. Si el usuario tiene dudas de su contrato pide el
número de contrato. Para pagar un recibo: consigue el número de recibo y
pregunta si pagará en línea o en módulo (Oxxo, cajeros de la CEA, sucursal).
Para cambiar el recibo a digital confirma el correo y avísale que se enviará
ahí. No busques contratos por nombre, dirección ni otros datos.";

const CONSUMOS_INSTRUCTIONS: &str = "\
Ayudas con consumos. Necesitas un número de contrato; si ya lo tienes no lo
vuelvas a pedir. Pregunta qué mes o meses quiere consultar.";

const FUGAS_INSTRUCTIONS: &str = "\
Eres un agente de la CEA especializado en fugas. Pregunta uno por uno:
1. ¿Dónde está la fuga? (sugiere compartir ubicación)
2. ¿Está en vía pública o en una casa?
3. ¿Qué tan grave es?
Si una foto ya responde algo, no lo preguntes de nuevo. Con todos los datos
crea un ticket y entrega el folio al usuario.";

const CONTRATOS_INSTRUCTIONS: &str = "\
Ayudas con contratos; si no es claro pregunta si es alta nueva o cambio.
Alta nueva: identificación oficial, documento que acredite la propiedad y
carta poder simple si no es el propietario. El trámite cuesta $175 + IVA.
Cambio: número de contrato, documento de propiedad e identificación oficial.";

const TICKETS_INSTRUCTIONS: &str = "\
Eres un agente de seguimiento de tickets: ayudas a actualizar, agregar
contexto y cerrar casos existentes. Usa get_active_tickets para listar los
casos activos del usuario.";

pub fn classification_agent() -> AgentSpec {
    AgentSpec {
        name: "Classification agent".to_string(),
        model: "gpt-4.1-mini".to_string(),
        instructions: CLASSIFICATION_INSTRUCTIONS.to_string(),
        allowed_tools: Vec::new(),
        output_schema: Some(json!({
            "type": "object",
            "properties": {
                "classification": {
                    "type": "string",
                    "enum": [
                        "fuga",
                        "pagos",
                        "hablar_asesor",
                        "informacion",
                        "consumos",
                        "contrato",
                        "tickets"
                    ]
                }
            },
            "required": ["classification"],
            "additionalProperties": false
        })),
    }
}

fn specialist(name: &str, model: &str, instructions: &str) -> AgentSpec {
    AgentSpec {
        name: name.to_string(),
        model: model.to_string(),
        instructions: instructions.to_string(),
        allowed_tools: allowed_tools(),
        output_schema: None,
    }
}

/// Specialist selection table. `hablar_asesor` has no agent: that path opens
/// an urgent ticket directly instead of invoking a model.
pub fn specialist_for(label: ClassificationLabel) -> Option<AgentSpec> {
    match label {
        ClassificationLabel::Fuga => {
            Some(specialist("Fugas Agent", "gpt-4.1", FUGAS_INSTRUCTIONS))
        }
        ClassificationLabel::Pagos => {
            Some(specialist("Pagos Agent", "gpt-4.1", PAGOS_INSTRUCTIONS))
        }
        ClassificationLabel::Consumos => {
            Some(specialist("Consumos Agent", "gpt-4.1", CONSUMOS_INSTRUCTIONS))
        }
        ClassificationLabel::Contrato => {
            Some(specialist("Contratos Agent", "gpt-4.1", CONTRATOS_INSTRUCTIONS))
        }
        ClassificationLabel::Tickets => {
            Some(specialist("Tickets Agent", "gpt-4.1", TICKETS_INSTRUCTIONS))
        }
        ClassificationLabel::Informacion => {
            Some(specialist("Information Agent", "gpt-4.1-mini", INFORMATION_INSTRUCTIONS))
        }
        ClassificationLabel::HablarAsesor => None,
    }
}
