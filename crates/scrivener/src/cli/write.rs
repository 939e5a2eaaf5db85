//! `scrivener write`: the full workflow from prompt to manuscript.

use super::commands::{OutputFormat, WriteArgs};
use scrivener::{ScrivenerConfig, export, local_engine};
use anyhow::{Context, bail};
use futures::StreamExt;
use scrivener_core::{BulkEvent, ProgressEvent, ProgressStatus, SamplingOverride, StageOptions, ndjson_line, sse_frame};
use scrivener_workflow::BulkOptions;

/// Run every stage and print bulk events in the requested format.
#[tracing::instrument(skip_all, fields(chapters = ?args.chapters))]
pub async fn run_write(args: WriteArgs, config: &ScrivenerConfig) -> anyhow::Result<()> {
    let engine = local_engine(config, args.model.as_deref())?;

    let sampling = config.sampling().merged(&SamplingOverride {
        model: args.model.clone(),
        temperature: args.temperature,
        top_p: args.top_p,
    });
    let stage = StageOptions {
        additional_instructions: args.instructions.clone(),
        sampling: SamplingOverride::default(),
    };
    let human = args.format == OutputFormat::Human;

    let workflow = engine.create(&args.prompt, sampling).await?;
    let id = *workflow.id();

    if human {
        eprintln!("Creating characters and settings...");
    }
    let workflow = engine.generate_characters_settings(id, stage.clone()).await?;
    if human {
        eprintln!("  {} characters", workflow.characters().len());
        eprintln!("Outlining...");
    }
    let workflow = engine.generate_outline(id, args.chapters, stage.clone()).await?;
    if human {
        eprintln!("  \"{}\", {} chapters", workflow.title(), workflow.total_chapters_planned());
    }

    let options = BulkOptions {
        validation_threshold: args.threshold,
        stage,
    };
    let mut events = engine.generate_all_chapters(id, options).await?;
    let mut failure = None;

    while let Some(event) = events.next().await {
        match args.format {
            OutputFormat::Human => eprintln!("{}", describe(&event)),
            OutputFormat::Ndjson => print!("{}", ndjson_line(&event)?),
            OutputFormat::Sse => print!("{}", sse_frame(&event)?),
        }
        if let BulkEvent::Error(error) = event {
            failure = Some(error.message);
        }
    }

    let workflow = engine.get(id).await?;
    if let Some(path) = &args.output {
        export::write_markdown(&workflow, path)
            .with_context(|| format!("Failed to write manuscript to {}", path.display()))?;
        if human {
            eprintln!("Manuscript written to {}", path.display());
        }
    } else if human && failure.is_none() {
        println!("{}", export::to_markdown(&workflow));
    }

    if let Some(message) = failure {
        bail!("Chapter generation stopped: {}", message);
    }
    Ok(())
}

/// One human-readable line per bulk event.
fn describe(event: &BulkEvent) -> String {
    match event {
        BulkEvent::Progress(progress) => describe_progress(progress),
        BulkEvent::Complete(complete) => format!(
            "Finished in {:.1}s ({:.1}s per chapter)",
            complete.total_time, complete.avg_time_per_chapter
        ),
        BulkEvent::Error(error) => match error.chapter_number {
            Some(n) => format!("Failed at chapter {}: {}", n, error.message),
            None => format!("Failed: {}", error.message),
        },
    }
}

fn describe_progress(progress: &ProgressEvent) -> String {
    let head = format!(
        "[{}/{}] Chapter {} \"{}\"",
        progress.current, progress.total, progress.chapter_number, progress.chapter_title
    );
    let attempt = progress.attempt.unwrap_or(1);
    match progress.status {
        ProgressStatus::Generating => format!("{head}: writing (attempt {attempt})"),
        ProgressStatus::Validating => format!("{head}: scoring (attempt {attempt})"),
        ProgressStatus::Regenerating => format!(
            "{head}: scored {:.2} below {:.2}, rewriting (attempt {attempt})",
            progress.validation_score.unwrap_or_default(),
            progress.validation_threshold.unwrap_or_default()
        ),
        ProgressStatus::Completed | ProgressStatus::CompletedWithWarning => {
            let mut line = format!(
                "{head}: {} words in {:.1}s",
                progress.word_count.unwrap_or_default(),
                progress.chapter_time.unwrap_or_default()
            );
            if let Some(score) = progress.validation_score {
                line.push_str(&format!(", score {:.2}", score));
            }
            if progress.status == ProgressStatus::CompletedWithWarning {
                line.push_str(" (below threshold)");
            }
            line
        }
    }
}
