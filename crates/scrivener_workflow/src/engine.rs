//! The workflow engine: stage operations over a store and a model backend.

use crate::{EngineConfig, WorkflowLocks, parse_reply, prompts};
use futures::Stream;
use scrivener_core::{
    BulkEvent, Character, ChapterStreamEvent, GenerationRequest, Outline, SamplingConfig,
    StageOptions, StorySettings, Workflow, WorkflowId, WorkflowSummary,
};
use scrivener_error::{ConfigError, StoryResult, WorkflowError, WorkflowErrorKind};
use scrivener_interface::{ChapterValidator, Streaming, WorkflowStore};
use serde::Deserialize;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::OwnedMutexGuard;
use tracing::instrument;

/// Events of a bulk chapter run.
pub type BulkEventStream = Pin<Box<dyn Stream<Item = BulkEvent> + Send>>;

/// Events of a single streamed chapter.
pub type ChapterEventStream = Pin<Box<dyn Stream<Item = ChapterStreamEvent> + Send>>;

/// Drives workflows through their steps.
///
/// Mutating operations on one workflow are serialised; reads never wait for
/// them. Every stage commits all of its changes or none.
pub struct WorkflowEngine<G, V, S> {
    pub(crate) generator: Arc<G>,
    pub(crate) validator: Arc<V>,
    pub(crate) store: Arc<S>,
    pub(crate) locks: WorkflowLocks,
    pub(crate) config: EngineConfig,
}

impl<G, V, S> Clone for WorkflowEngine<G, V, S> {
    fn clone(&self) -> Self {
        Self {
            generator: Arc::clone(&self.generator),
            validator: Arc::clone(&self.validator),
            store: Arc::clone(&self.store),
            locks: self.locks.clone(),
            config: self.config.clone(),
        }
    }
}

impl<G, V, S> std::fmt::Debug for WorkflowEngine<G, V, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowEngine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Shape of the characters-and-settings reply.
#[derive(Debug, Deserialize)]
struct CharactersSettingsReply {
    #[serde(default)]
    characters: Vec<Character>,
    settings: StorySettings,
}

/// Request for one stage, with the caller's sampling override applied.
#[track_caller]
pub(crate) fn stage_request(
    workflow: &Workflow,
    options: &StageOptions,
    prompt: String,
    system: &str,
) -> Result<GenerationRequest, WorkflowError> {
    let sampling = workflow.sampling_config().merged(&options.sampling);
    sampling.validate()?;
    Ok(GenerationRequest::with_sampling(prompt, &sampling).system(system))
}

impl<G, V, S> WorkflowEngine<G, V, S>
where
    G: Streaming + 'static,
    V: ChapterValidator + 'static,
    S: WorkflowStore + 'static,
{
    /// Create an engine over the given backend, validator and store.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the config is out of range.
    pub fn new(
        generator: Arc<G>,
        validator: Arc<V>,
        store: Arc<S>,
        config: EngineConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            generator,
            validator,
            store,
            locks: WorkflowLocks::new(),
            config,
        })
    }

    /// Engine policy.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// The per-workflow lock table.
    pub fn locks(&self) -> &WorkflowLocks {
        &self.locks
    }

    /// Lock a workflow and load it. An unknown id leaves no lock entry behind.
    pub(crate) async fn lock_workflow(&self, id: WorkflowId) -> StoryResult<(OwnedMutexGuard<()>, Workflow)> {
        let guard = self.locks.acquire(id).await;
        match self.store.get(id).await {
            Ok(workflow) => Ok((guard, workflow)),
            Err(e) => {
                drop(guard);
                self.locks.release_idle(id);
                Err(e)
            }
        }
    }

    /// Start a workflow from a story prompt.
    #[instrument(skip(self, prompt), fields(prompt_len = prompt.len()))]
    pub async fn create(&self, prompt: &str, sampling: SamplingConfig) -> StoryResult<Workflow> {
        let workflow = Workflow::new(prompt, sampling)?;
        let workflow = self.store.insert(workflow).await?;
        tracing::info!(workflow_id = %workflow.id(), "Workflow created");
        Ok(workflow)
    }

    /// Ask the model for characters and settings and store them.
    ///
    /// Calling it again replaces the earlier cast and settings.
    #[instrument(skip(self, options), fields(workflow_id = %id))]
    pub async fn generate_characters_settings(
        &self,
        id: WorkflowId,
        options: StageOptions,
    ) -> StoryResult<Workflow> {
        let (_guard, workflow) = self.lock_workflow(id).await?;

        let request = stage_request(
            &workflow,
            &options,
            prompts::characters_settings(workflow.prompt(), options.instructions()),
            prompts::CHARACTERS_SETTINGS_SYSTEM,
        )?;
        let output = self.generator.generate(&request).await?;
        let reply: CharactersSettingsReply = parse_reply(&output.text)?;
        if reply.characters.is_empty() {
            return Err(WorkflowError::new(WorkflowErrorKind::GenerationParse(
                "model returned no characters".to_string(),
            ))
            .into());
        }

        let count = reply.characters.len();
        let workflow = self
            .store
            .update(
                id,
                Box::new(move |w: &mut Workflow| -> StoryResult<()> {
                    Ok(w.set_characters_settings(reply.characters, reply.settings)?)
                }),
            )
            .await?;
        tracing::info!(characters = count, "Characters and settings generated");
        Ok(workflow)
    }

    /// Replace characters and/or settings with reviewed versions.
    #[instrument(skip(self, characters, settings), fields(workflow_id = %id))]
    pub async fn edit_characters_settings(
        &self,
        id: WorkflowId,
        characters: Option<Vec<Character>>,
        settings: Option<StorySettings>,
    ) -> StoryResult<Workflow> {
        let (_guard, _) = self.lock_workflow(id).await?;
        self.store
            .update(
                id,
                Box::new(move |w: &mut Workflow| -> StoryResult<()> {
                    Ok(w.edit_characters_settings(characters, settings)?)
                }),
            )
            .await
    }

    /// Ask the model for a chapter outline and store it.
    ///
    /// `target_chapters` is a hint; the model's chapter count is kept as is.
    #[instrument(skip(self, options), fields(workflow_id = %id))]
    pub async fn generate_outline(
        &self,
        id: WorkflowId,
        target_chapters: Option<u32>,
        options: StageOptions,
    ) -> StoryResult<Workflow> {
        if target_chapters == Some(0) {
            return Err(WorkflowError::invalid_input("target_chapters must be at least 1").into());
        }
        let (_guard, workflow) = self.lock_workflow(id).await?;
        workflow.check_outline_ready()?;

        let request = stage_request(
            &workflow,
            &options,
            prompts::outline(&workflow, target_chapters, options.instructions()),
            prompts::OUTLINE_SYSTEM,
        )?;
        let output = self.generator.generate(&request).await?;
        let outline: Outline = parse_reply(&output.text)?;

        let workflow = self
            .store
            .update(
                id,
                Box::new(move |w: &mut Workflow| -> StoryResult<()> { Ok(w.set_outline(outline)?) }),
            )
            .await?;
        tracing::info!(chapters = workflow.total_chapters_planned(), "Outline generated");
        Ok(workflow)
    }

    /// Write one chapter and commit it, replacing any earlier version.
    #[instrument(skip(self, options), fields(workflow_id = %id))]
    pub async fn generate_chapter(
        &self,
        id: WorkflowId,
        chapter_number: u32,
        options: StageOptions,
    ) -> StoryResult<Workflow> {
        let (_guard, workflow) = self.lock_workflow(id).await?;
        let plan = workflow.chapter_plan(chapter_number)?.clone();

        let started = tokio::time::Instant::now();
        let mut chapter = self.write_chapter(&workflow, &plan, &options, None).await?;
        chapter.generation_time_seconds = Some(started.elapsed().as_secs_f64());

        let words = chapter.word_count;
        let workflow = self.commit(id, chapter).await?;
        tracing::info!(words, "Chapter generated");
        Ok(workflow)
    }

    /// Score a committed chapter and record the result.
    ///
    /// A validator failure is returned and the chapter is left as it was.
    #[instrument(skip(self), fields(workflow_id = %id))]
    pub async fn validate_chapter(&self, id: WorkflowId, chapter_number: u32) -> StoryResult<Workflow> {
        let (_guard, workflow) = self.lock_workflow(id).await?;
        let plan = workflow.chapter_plan(chapter_number)?;
        let chapter = workflow
            .chapters()
            .get(&chapter_number)
            .ok_or_else(|| WorkflowError::new(WorkflowErrorKind::ChapterNotFound(chapter_number)))?;
        let settings = workflow.settings().clone().unwrap_or_default();

        let report = self.validator.validate(&chapter.content, plan, &settings).await?;
        tracing::info!(score = report.score, "Chapter validated");

        self.store
            .update(
                id,
                Box::new(move |w: &mut Workflow| -> StoryResult<()> {
                    Ok(w.set_validation(chapter_number, report.score, report.feedback)?)
                }),
            )
            .await
    }

    /// Load a workflow.
    pub async fn get(&self, id: WorkflowId) -> StoryResult<Workflow> {
        self.store.get(id).await
    }

    /// Summaries of every workflow, oldest first.
    pub async fn list(&self) -> StoryResult<Vec<WorkflowSummary>> {
        self.store.list().await
    }

    /// Remove a workflow, waiting for any operation in progress on it.
    #[instrument(skip(self), fields(workflow_id = %id))]
    pub async fn delete(&self, id: WorkflowId) -> StoryResult<()> {
        let (guard, _) = self.lock_workflow(id).await?;
        self.store.delete(id).await?;
        drop(guard);
        self.locks.forget(id);
        tracing::info!("Workflow deleted");
        Ok(())
    }
}
