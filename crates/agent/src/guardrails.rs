use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A single configured check. `block == false` means "mask, don't block":
/// findings rewrite the offending text instead of tripping the workflow.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GuardrailCheck {
    pub name: String,
    pub block: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GuardrailConfig {
    pub guardrails: Vec<GuardrailCheck>,
}

impl GuardrailConfig {
    /// The deployment's baseline: a blocking jailbreak check.
    pub fn standard() -> Self {
        Self { guardrails: vec![GuardrailCheck { name: "Jailbreak".to_string(), block: true }] }
    }

    /// Subset of checks configured as mask-only.
    pub fn mask_only(&self) -> Self {
        Self {
            guardrails: self
                .guardrails
                .iter()
                .filter(|check| !check.block)
                .cloned()
                .collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GuardrailFinding {
    pub guardrail: String,
    pub tripwire: bool,
    pub masked_text: Option<String>,
    pub detected_entities: Vec<String>,
    pub flagged_categories: Vec<String>,
}

#[derive(Debug, Error)]
pub enum GuardrailError {
    #[error("guardrail evaluation failed: {0}")]
    Evaluation(String),
}

/// Moderation/PII evaluation capability. The only implementation wired today
/// is the no-op; a real backend slots in behind the same trait.
#[async_trait]
pub trait GuardrailEngine: Send + Sync {
    async fn evaluate(
        &self,
        text: &str,
        config: &GuardrailConfig,
    ) -> Result<Vec<GuardrailFinding>, GuardrailError>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoopGuardrailEngine;

#[async_trait]
impl GuardrailEngine for NoopGuardrailEngine {
    async fn evaluate(
        &self,
        _text: &str,
        _config: &GuardrailConfig,
    ) -> Result<Vec<GuardrailFinding>, GuardrailError> {
        Ok(Vec::new())
    }
}

pub fn has_tripwire(findings: &[GuardrailFinding]) -> bool {
    findings.iter().any(|finding| finding.tripwire)
}

/// First masked rewrite among the findings, if any check produced one.
pub fn masked_text(findings: &[GuardrailFinding]) -> Option<String> {
    findings.iter().find_map(|finding| finding.masked_text.clone())
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PiiOutcome {
    pub failed: bool,
    pub detected_counts: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ModerationOutcome {
    pub failed: bool,
    pub flagged_categories: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FlagOutcome {
    pub failed: bool,
}

/// Structured terminal payload returned when any check trips. Categories
/// mirror the remote guardrail suite's vocabulary.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GuardrailFailure {
    pub pii: PiiOutcome,
    pub moderation: ModerationOutcome,
    pub jailbreak: FlagOutcome,
    pub hallucination: FlagOutcome,
    pub nsfw: FlagOutcome,
    pub url_filter: FlagOutcome,
    pub custom_prompt_check: FlagOutcome,
    pub prompt_injection: FlagOutcome,
}

impl GuardrailFailure {
    pub fn from_findings(findings: &[GuardrailFinding]) -> Self {
        let find = |name: &str| findings.iter().find(|finding| finding.guardrail == name);
        let tripped = |name: &str| find(name).is_some_and(|finding| finding.tripwire);

        let pii = find("Contains PII");
        let moderation = find("Moderation");

        Self {
            pii: PiiOutcome {
                failed: pii.is_some_and(|finding| {
                    finding.tripwire || !finding.detected_entities.is_empty()
                }),
                detected_counts: pii
                    .map(|finding| finding.detected_entities.clone())
                    .unwrap_or_default(),
            },
            moderation: ModerationOutcome {
                failed: moderation.is_some_and(|finding| {
                    finding.tripwire || !finding.flagged_categories.is_empty()
                }),
                flagged_categories: moderation
                    .map(|finding| finding.flagged_categories.clone())
                    .unwrap_or_default(),
            },
            jailbreak: FlagOutcome { failed: tripped("Jailbreak") },
            hallucination: FlagOutcome { failed: tripped("Hallucination Detection") },
            nsfw: FlagOutcome { failed: tripped("NSFW Text") },
            url_filter: FlagOutcome { failed: tripped("URL Filter") },
            custom_prompt_check: FlagOutcome { failed: tripped("Custom Prompt Check") },
            prompt_injection: FlagOutcome { failed: tripped("Prompt Injection Detection") },
        }
    }
}
