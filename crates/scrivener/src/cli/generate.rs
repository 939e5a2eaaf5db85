//! `scrivener generate`: one streamed story, optionally continuing a file.

use super::commands::GenerateArgs;
use scrivener::ScrivenerConfig;
use anyhow::Context;
use futures::StreamExt;
use scrivener_core::{GenerationRequest, SamplingOverride, visible_word_count};
use scrivener_interface::Streaming;
use scrivener_server::ServerClient;
use scrivener_workflow::prompts::STORY_SYSTEM;
use std::io::Write;
use std::time::Instant;

/// Stream a story to stdout as it is written.
#[tracing::instrument(skip_all)]
pub async fn run_generate(args: GenerateArgs, config: &ScrivenerConfig) -> anyhow::Result<()> {
    let sampling = config.sampling().merged(&SamplingOverride {
        model: args.model.clone(),
        temperature: args.temperature,
        top_p: args.top_p,
    });
    sampling.validate()?;

    let mut request = GenerationRequest::with_sampling(&args.prompt, &sampling)
        .system(args.system.as_deref().unwrap_or(STORY_SYSTEM));
    if let Some(path) = &args.continue_from {
        let previous = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read story from {}", path.display()))?;
        request.continuation = Some(previous);
    }

    let client = ServerClient::new(config.server().clone())?;
    let started = Instant::now();
    let mut stream = client.generate_stream(&request).await?;
    let mut story = String::new();
    let mut stdout = std::io::stdout();

    while let Some(fragment) = stream.next().await {
        let fragment = fragment?;
        stdout.write_all(fragment.content.as_bytes())?;
        stdout.flush()?;
        story.push_str(&fragment.content);
        if fragment.is_complete {
            break;
        }
    }
    println!();

    eprintln!(
        "{} words in {:.1}s",
        visible_word_count(&story),
        started.elapsed().as_secs_f64()
    );
    Ok(())
}
