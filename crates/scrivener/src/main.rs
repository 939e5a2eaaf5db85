//! Scrivener CLI binary.
//!
//! This binary provides command-line access to Scrivener's functionality:
//! - Write a multi-chapter story through the full workflow
//! - Stream a one-shot story or continue an existing one
//! - Inspect the model server
//! - Offer story ideas to start from

use clap::Parser;
use scrivener::{ScrivenerConfig, init_logging};

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use cli::{Cli, Commands, check_health, list_models, print_suggestions, run_generate, run_write};

    // .env may carry SCRIVENER_* overrides
    let _ = dotenvy::dotenv();

    // Parse command-line arguments
    let cli = Cli::parse();

    let config = ScrivenerConfig::load_with(cli.config.as_deref())?;

    init_logging(config.logging(), cli.verbose).map_err(|e| anyhow::anyhow!(e))?;
    tracing::debug!(model = %config.server().model, "Configuration loaded");

    // Execute the requested command
    match cli.command {
        Commands::Write(args) => run_write(args, &config).await?,
        Commands::Generate(args) => run_generate(args, &config).await?,
        Commands::Models => list_models(&config).await?,
        Commands::Health => check_health(&config).await?,
        Commands::Suggestions { json } => print_suggestions(json)?,
    }

    Ok(())
}
