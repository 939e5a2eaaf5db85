//! Bulk chapter generation with validation and retry.

use crate::{BulkEventStream, WorkflowEngine};
use scrivener_core::{
    BulkEvent, CompleteEvent, ErrorEvent, ProgressEvent, ProgressStatus, StageOptions,
    ValidationReport, Workflow, WorkflowId, WorkflowStep,
};
use scrivener_error::{StoryError, StoryResult, WorkflowError};
use scrivener_interface::{ChapterValidator, Streaming, WorkflowStore};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::instrument;

/// Options for a bulk run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BulkOptions {
    /// Minimum acceptable score; the engine default is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_threshold: Option<f32>,
    /// Options passed to every chapter
    #[serde(flatten)]
    pub stage: StageOptions,
}

impl BulkOptions {
    /// Options with an explicit threshold.
    pub fn with_threshold(threshold: f32) -> Self {
        Self {
            validation_threshold: Some(threshold),
            stage: StageOptions::default(),
        }
    }
}

fn error_event(chapter_number: Option<u32>, err: &StoryError) -> BulkEvent {
    BulkEvent::Error(ErrorEvent {
        chapter_number,
        message: err.message(),
    })
}

impl<G, V, S> WorkflowEngine<G, V, S>
where
    G: Streaming + 'static,
    V: ChapterValidator + 'static,
    S: WorkflowStore + 'static,
{
    /// Write every planned chapter that has not been committed yet.
    ///
    /// Chapters are written in ascending order. Each draft is scored, and
    /// drafts below the threshold are rewritten with the validator's
    /// feedback until `max_attempts` is reached; the last draft is then
    /// committed with a warning. A chapter whose score cannot be obtained is
    /// committed without one. A generation failure ends the run with an
    /// `error` event, keeping the chapters committed before it.
    ///
    /// The workflow, its outline and the threshold are checked before the
    /// stream is returned. The workflow stays locked until the stream ends
    /// or is dropped.
    #[instrument(skip(self, options), fields(workflow_id = %id))]
    pub async fn generate_all_chapters(
        &self,
        id: WorkflowId,
        options: BulkOptions,
    ) -> StoryResult<BulkEventStream> {
        let threshold = options
            .validation_threshold
            .unwrap_or(*self.config.default_threshold());
        if !(0.0..=1.0).contains(&threshold) {
            return Err(WorkflowError::invalid_input(format!(
                "validation_threshold must be in [0, 1], got {}",
                threshold
            ))
            .into());
        }

        let (guard, workflow) = self.lock_workflow(id).await?;
        workflow.require_step("generate chapters", WorkflowStep::Outline)?;
        workflow
            .sampling_config()
            .merged(&options.stage.sampling)
            .validate()?;

        let pending = workflow.pending_chapters();
        let max_attempts = *self.config.max_attempts();
        let engine = self.clone();
        let stage = options.stage;
        tracing::info!(pending = pending.len(), threshold, "Starting bulk chapter run");

        Ok(Box::pin(async_stream::stream! {
            let _guard = guard;
            let run_started = Instant::now();
            let total = pending.len();
            let mut chapter_times: Vec<f64> = Vec::with_capacity(total);

            for (index, plan) in pending.iter().enumerate() {
                let current = index + 1;
                let chapter_started = Instant::now();
                let mut attempt = 1u32;
                let mut revision_notes: Option<String> = None;

                yield BulkEvent::from(
                    ProgressEvent::new(ProgressStatus::Generating, plan, current, total)
                        .with_attempt(attempt),
                );

                let (mut chapter, report) = loop {
                    let snapshot = match engine.store.get(id).await {
                        Ok(snapshot) => snapshot,
                        Err(e) => {
                            yield error_event(Some(plan.chapter_number), &e);
                            return;
                        }
                    };
                    let draft = engine
                        .write_chapter(&snapshot, plan, &stage, revision_notes.as_deref())
                        .await;
                    let chapter = match draft {
                        Ok(chapter) => chapter,
                        Err(e) => {
                            tracing::error!(chapter_number = plan.chapter_number, attempt, error = %e, "Chapter generation failed");
                            yield error_event(Some(plan.chapter_number), &e);
                            return;
                        }
                    };

                    yield BulkEvent::from(
                        ProgressEvent::new(ProgressStatus::Validating, plan, current, total)
                            .with_attempt(attempt),
                    );

                    let settings = snapshot.settings().clone().unwrap_or_default();
                    match engine.validator.validate(&chapter.content, plan, &settings).await {
                        Ok(report) if report.score < threshold && attempt < max_attempts => {
                            tracing::info!(chapter_number = plan.chapter_number, attempt, score = report.score, "Chapter below threshold, regenerating");
                            attempt += 1;
                            revision_notes = report.feedback;
                            yield BulkEvent::from(
                                ProgressEvent::new(ProgressStatus::Regenerating, plan, current, total)
                                    .with_attempt(attempt)
                                    .with_validation_score(report.score)
                                    .with_validation_threshold(threshold),
                            );
                        }
                        Ok(report) => break (chapter, Some(report)),
                        Err(e) => {
                            tracing::warn!(chapter_number = plan.chapter_number, error = %e, "Validation unavailable, accepting chapter");
                            break (chapter, None);
                        }
                    }
                };

                let status = match &report {
                    Some(report) if report.score < threshold => ProgressStatus::CompletedWithWarning,
                    _ => ProgressStatus::Completed,
                };
                let chapter_time = chapter_started.elapsed().as_secs_f64();
                chapter.attempts = attempt;
                chapter.generation_time_seconds = Some(chapter_time);
                if let Some(ValidationReport { score, feedback }) = report.clone() {
                    chapter.validation_score = Some(score);
                    chapter.validation_feedback = feedback;
                }

                if let Err(e) = engine.commit(id, chapter.clone()).await {
                    yield error_event(Some(plan.chapter_number), &e);
                    return;
                }
                chapter_times.push(chapter_time);
                tracing::info!(chapter_number = plan.chapter_number, attempts = attempt, %status, "Chapter committed");

                let average = chapter_times.iter().sum::<f64>() / chapter_times.len() as f64;
                let mut event = ProgressEvent::new(status, plan, current, total)
                    .with_attempts(attempt)
                    .with_validation_threshold(threshold)
                    .with_word_count(chapter.word_count)
                    .with_chapter_time(chapter_time)
                    .with_estimated_time_remaining(average * (total - current) as f64)
                    .with_chapter(chapter);
                if let Some(report) = report {
                    event = event.with_validation_score(report.score);
                }
                yield BulkEvent::from(event);
            }

            let finished = engine
                .store
                .update(
                    id,
                    Box::new(|w: &mut Workflow| -> StoryResult<()> { Ok(w.mark_completed()?) }),
                )
                .await;
            match finished {
                Ok(workflow) => {
                    let total_time = run_started.elapsed().as_secs_f64();
                    let avg_time_per_chapter = if chapter_times.is_empty() {
                        0.0
                    } else {
                        chapter_times.iter().sum::<f64>() / chapter_times.len() as f64
                    };
                    tracing::info!(chapters = chapter_times.len(), total_time, "Bulk chapter run complete");
                    yield BulkEvent::from(CompleteEvent {
                        total_time,
                        avg_time_per_chapter,
                        workflow,
                    });
                }
                Err(e) => {
                    yield error_event(None, &e);
                }
            }
        }))
    }
}
