use std::sync::Arc;

use cea_agent::guardrails::{GuardrailConfig, NoopGuardrailEngine};
use cea_agent::llm::HttpAgentBackend;
use cea_agent::{ApprovalLoop, HttpToolBackend, Orchestrator, TicketService};
use cea_core::clock::{Clock, SystemClock};
use cea_core::config::{AppConfig, ConfigError, LoadOptions};
use cea_core::conversation::ConversationStore;
use cea_core::folio::FolioGenerator;
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub orchestrator: Arc<Orchestrator>,
    pub store: Arc<ConversationStore>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("llm.api_key is required to start the server")]
    MissingApiKey,
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(event_name = "system.bootstrap.start", "starting application bootstrap");

    let api_key = config.llm.api_key.clone().ok_or(BootstrapError::MissingApiKey)?;
    let backend = Arc::new(HttpAgentBackend::new(&config.llm, &config.tools, api_key));
    let tools = Arc::new(HttpToolBackend::new(&config.tools));

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let folios = Arc::new(FolioGenerator::new(Arc::clone(&clock)));
    let tickets = TicketService::new(tools, folios, Arc::clone(&clock));

    let store = Arc::new(ConversationStore::new());
    let orchestrator = Arc::new(Orchestrator::new(
        ApprovalLoop::new(backend),
        Arc::new(NoopGuardrailEngine),
        GuardrailConfig::standard(),
        tickets,
        Arc::clone(&store),
        clock,
    ));

    info!(
        event_name = "system.bootstrap.ready",
        tools_base_url = %config.tools.base_url,
        "application wired"
    );

    Ok(Application { config, orchestrator, store })
}

#[cfg(test)]
mod tests {
    use cea_core::config::{ConfigOverrides, LoadOptions};

    use super::{bootstrap, BootstrapError};

    #[tokio::test]
    async fn bootstrap_fails_fast_without_an_api_key() {
        let result = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                llm_api_key: Some(" ".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .await;

        assert!(result.is_err());
    }

    #[tokio::test]
    async fn bootstrap_succeeds_with_a_key_override() {
        let app = bootstrap(LoadOptions {
            overrides: ConfigOverrides {
                llm_api_key: Some("sk-test".to_string()),
                ..ConfigOverrides::default()
            },
            ..LoadOptions::default()
        })
        .await;

        match app {
            Ok(app) => assert!(app.store.is_empty()),
            // Ambient CEA_*/PORT variables can legitimately change the
            // outcome on a developer machine; only the error type is checked.
            Err(error) => assert!(matches!(error, BootstrapError::Config(_))),
        }
    }
}
