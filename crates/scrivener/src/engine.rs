//! Engine wiring against a local model server.

use crate::ScrivenerConfig;
use scrivener_error::StoryResult;
use scrivener_server::ServerClient;
use scrivener_workflow::{InMemoryWorkflowStore, ModelValidator, WorkflowEngine};
use std::sync::Arc;
use tracing::instrument;

/// Workflow engine backed by one model server and an in-memory store.
pub type LocalEngine = WorkflowEngine<ServerClient, ModelValidator<ServerClient>, InMemoryWorkflowStore>;

/// Build a [`LocalEngine`] from configuration.
///
/// Generation and scoring share one client; `validator_model` selects a
/// different scoring model when given.
#[instrument(skip(config), fields(base_url = %config.server().base_url))]
pub fn local_engine(config: &ScrivenerConfig, validator_model: Option<&str>) -> StoryResult<LocalEngine> {
    let client = Arc::new(ServerClient::new(config.server().clone())?);

    let mut validator =
        ModelValidator::new(Arc::clone(&client)).with_temperature(config.generation().validator_temperature);
    if let Some(model) = validator_model {
        validator = validator.with_model(model);
    }

    let engine = WorkflowEngine::new(
        client,
        Arc::new(validator),
        Arc::new(InMemoryWorkflowStore::new()),
        config.engine_config()?,
    )?;
    tracing::debug!("Engine ready");
    Ok(engine)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn engine_takes_policy_from_config() {
        let engine = local_engine(&ScrivenerConfig::default(), Some("judge:7b")).unwrap();
        assert_eq!(*engine.config().max_attempts(), 3);
        assert!(engine.list().await.unwrap().is_empty());
    }
}
