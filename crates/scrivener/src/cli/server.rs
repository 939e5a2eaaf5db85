//! Model server commands.

use scrivener::ScrivenerConfig;
use scrivener_interface::{Health, HealthStatus};
use scrivener_server::ServerClient;

/// Print the models installed on the server.
#[tracing::instrument(skip_all)]
pub async fn list_models(config: &ScrivenerConfig) -> anyhow::Result<()> {
    let client = ServerClient::new(config.server().clone())?;
    let models = client.list_models().await?;

    if models.is_empty() {
        println!("No models installed on {}", config.server().base_url);
        return Ok(());
    }

    println!("Models on {}:", config.server().base_url);
    for model in models {
        let marker = if model.name == config.server().model { "*" } else { " " };
        match model.size {
            Some(bytes) => println!("{} {} ({:.1} GB)", marker, model.name, bytes as f64 / 1e9),
            None => println!("{} {}", marker, model.name),
        }
    }
    Ok(())
}

/// Report whether the server can serve the configured model.
#[tracing::instrument(skip_all)]
pub async fn check_health(config: &ScrivenerConfig) -> anyhow::Result<()> {
    let client = ServerClient::new(config.server().clone())?;
    let status = client.health().await;

    match &status {
        HealthStatus::Healthy => println!(
            "healthy: {} is serving {}",
            config.server().base_url,
            config.server().model
        ),
        HealthStatus::Degraded { message } => println!("degraded: {}", message),
        HealthStatus::Unhealthy { message } => println!("unhealthy: {}", message),
    }

    if !status.is_available() {
        anyhow::bail!("model server at {} is unreachable", config.server().base_url);
    }
    Ok(())
}
