//! Chapter writing: prompt context, optional drafts and streamed prose.

use crate::engine::stage_request;
use crate::prompts::{self, ChapterContext, ChapterDrafts};
use crate::{ChapterEventStream, WorkflowEngine};
use futures::StreamExt;
use scrivener_core::{
    Chapter, ChapterOutcome, ChapterPlan, ChapterStreamEvent, GenerationRequest, StageOptions,
    Workflow, WorkflowId, visible_text,
};
use scrivener_error::StoryResult;
use scrivener_interface::{ChapterValidator, Streaming, WorkflowStore};
use tracing::instrument;

impl<G, V, S> WorkflowEngine<G, V, S>
where
    G: Streaming + 'static,
    V: ChapterValidator + 'static,
    S: WorkflowStore + 'static,
{
    /// Drafts (in drafted mode) and the prose request for a chapter.
    pub(crate) async fn prepare_chapter(
        &self,
        workflow: &Workflow,
        plan: &ChapterPlan,
        options: &StageOptions,
        revision_notes: Option<&str>,
    ) -> StoryResult<(GenerationRequest, ChapterDrafts)> {
        let tail = workflow
            .previous_chapter(plan.chapter_number)
            .and_then(|previous| prompts::previous_tail(previous, *self.config.continuity_chars()));
        let ctx = ChapterContext {
            workflow,
            plan,
            previous_tail: tail.as_deref(),
            instructions: options.instructions(),
            revision_notes,
        };

        let drafts = if *self.config.drafting() {
            self.draft(&ctx, options).await?
        } else {
            ChapterDrafts::default()
        };

        let request = stage_request(
            workflow,
            options,
            prompts::chapter(&ctx, &drafts),
            prompts::CHAPTER_SYSTEM,
        )?;
        Ok((request, drafts))
    }

    async fn draft(&self, ctx: &ChapterContext<'_>, options: &StageOptions) -> StoryResult<ChapterDrafts> {
        tracing::debug!(chapter_number = ctx.plan.chapter_number, "Drafting scene outline");
        let request = stage_request(
            ctx.workflow,
            options,
            prompts::scene_outline(ctx),
            prompts::SCENE_OUTLINE_SYSTEM,
        )?;
        let scene_outline = visible_text(&self.generator.generate(&request).await?.text);

        tracing::debug!(chapter_number = ctx.plan.chapter_number, "Drafting dialogue");
        let request = stage_request(
            ctx.workflow,
            options,
            prompts::dialogue(ctx, &scene_outline),
            prompts::DIALOGUE_SYSTEM,
        )?;
        let dialogue = visible_text(&self.generator.generate(&request).await?.text);

        Ok(ChapterDrafts {
            scene_outline: Some(scene_outline).filter(|s| !s.is_empty()),
            dialogue: Some(dialogue).filter(|s| !s.is_empty()),
        })
    }

    /// Writes a chapter without committing it.
    pub(crate) async fn write_chapter(
        &self,
        workflow: &Workflow,
        plan: &ChapterPlan,
        options: &StageOptions,
        revision_notes: Option<&str>,
    ) -> StoryResult<Chapter> {
        let (request, drafts) = self.prepare_chapter(workflow, plan, options, revision_notes).await?;

        let mut fragments = self.generator.generate_stream(&request).await?;
        let mut content = String::new();
        while let Some(fragment) = fragments.next().await {
            let fragment = fragment?;
            content.push_str(&fragment.content);
            if fragment.is_complete {
                break;
            }
        }

        Ok(with_drafts(Chapter::from_content(plan, content), drafts))
    }

    /// Commits a chapter and returns the updated workflow.
    pub(crate) async fn commit(&self, id: WorkflowId, chapter: Chapter) -> StoryResult<Workflow> {
        self.store
            .update(
                id,
                Box::new(move |w: &mut Workflow| -> StoryResult<()> { Ok(w.put_chapter(chapter)?) }),
            )
            .await
    }

    /// Write one chapter, streaming its text as it is produced.
    ///
    /// The workflow and chapter number are checked before the stream is
    /// returned. The stream yields every fragment, then a `chapter_complete`
    /// event after the commit or an `error` event. The workflow stays locked
    /// until the stream ends or is dropped; a dropped stream commits nothing.
    #[instrument(skip(self, options), fields(workflow_id = %id))]
    pub async fn generate_chapter_stream(
        &self,
        id: WorkflowId,
        chapter_number: u32,
        options: StageOptions,
    ) -> StoryResult<ChapterEventStream> {
        let (guard, workflow) = self.lock_workflow(id).await?;
        let plan = workflow.chapter_plan(chapter_number)?.clone();
        let engine = self.clone();

        Ok(Box::pin(async_stream::stream! {
            let _guard = guard;
            let started = tokio::time::Instant::now();

            let prepared = engine.prepare_chapter(&workflow, &plan, &options, None).await;
            let (request, drafts) = match prepared {
                Ok(prepared) => prepared,
                Err(e) => {
                    tracing::error!(error = %e, "Chapter preparation failed");
                    yield failure(e.message());
                    return;
                }
            };

            let mut fragments = match engine.generator.generate_stream(&request).await {
                Ok(fragments) => fragments,
                Err(e) => {
                    tracing::error!(error = %e, "Chapter stream failed to start");
                    yield failure(e.kind.to_string());
                    return;
                }
            };

            let mut content = String::new();
            while let Some(item) = fragments.next().await {
                match item {
                    Ok(fragment) => {
                        content.push_str(&fragment.content);
                        let done = fragment.is_complete;
                        yield ChapterStreamEvent::Fragment(fragment);
                        if done {
                            break;
                        }
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Chapter stream broke");
                        yield failure(e.kind.to_string());
                        return;
                    }
                }
            }
            drop(fragments);

            let mut chapter = with_drafts(Chapter::from_content(&plan, content), drafts);
            chapter.generation_time_seconds = Some(started.elapsed().as_secs_f64());

            match engine.commit(id, chapter.clone()).await {
                Ok(workflow) => {
                    tracing::info!(words = chapter.word_count, "Chapter streamed and committed");
                    yield ChapterStreamEvent::from(ChapterOutcome::ChapterComplete { chapter, workflow });
                }
                Err(e) => {
                    tracing::error!(error = %e, "Chapter commit failed");
                    yield failure(e.message());
                }
            }
        }))
    }
}

fn with_drafts(mut chapter: Chapter, drafts: ChapterDrafts) -> Chapter {
    chapter.scene_outline = drafts.scene_outline;
    chapter.dialogue = drafts.dialogue;
    chapter
}

fn failure(message: String) -> ChapterStreamEvent {
    ChapterStreamEvent::from(ChapterOutcome::Error { message })
}
