//! Trait definitions for model backends, validators and workflow storage.

use crate::HealthStatus;
use async_trait::async_trait;
use futures_util::stream::Stream;
use scrivener_core::{
    ChapterPlan, Fragment, GenerationOutput, GenerationRequest, StorySettings, ValidationReport,
    Workflow, WorkflowId, WorkflowSummary,
};
use scrivener_error::{GenerationError, StoryResult, ValidationError};
use std::pin::Pin;

/// Stream of generated text fragments, terminated by a complete fragment.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<Fragment, GenerationError>> + Send>>;

/// In-place change applied to a stored workflow.
///
/// Closures are expected to fail before touching the workflow; the
/// [`Workflow`] mutators all do.
pub type WorkflowMutation = Box<dyn FnOnce(&mut Workflow) -> StoryResult<()> + Send>;

/// Core trait that every text generation backend implements.
#[async_trait]
pub trait ModelDriver: Send + Sync {
    /// Generate a complete response.
    async fn generate(&self, req: &GenerationRequest) -> Result<GenerationOutput, GenerationError>;

    /// Provider name (e.g., "ollama").
    fn provider_name(&self) -> &'static str;

    /// Default model identifier (e.g., "qwen3:8b").
    fn model_name(&self) -> &str;
}

/// Trait for backends that can stream their output.
#[async_trait]
pub trait Streaming: ModelDriver {
    /// Generate a streaming response.
    ///
    /// The returned stream is lazy and yields fragments as they arrive from
    /// the server. Dropping it abandons the underlying request.
    async fn generate_stream(&self, req: &GenerationRequest) -> Result<FragmentStream, GenerationError>;
}

/// Trait for backends that support health checks.
#[async_trait]
pub trait Health: ModelDriver {
    /// Check whether the backend is reachable.
    async fn health(&self) -> HealthStatus;
}

/// Scores a chapter draft against its plan.
#[async_trait]
pub trait ChapterValidator: Send + Sync {
    /// Produce a score in [0, 1] with optional feedback.
    async fn validate(
        &self,
        content: &str,
        plan: &ChapterPlan,
        settings: &StorySettings,
    ) -> Result<ValidationReport, ValidationError>;
}

/// Owner of all workflows.
///
/// Callers only ever see clones; changes go through [`WorkflowStore::update`].
#[async_trait]
pub trait WorkflowStore: Send + Sync {
    /// Store a new workflow.
    async fn insert(&self, workflow: Workflow) -> StoryResult<Workflow>;

    /// Load a workflow by id.
    async fn get(&self, id: WorkflowId) -> StoryResult<Workflow>;

    /// Summaries of every workflow, oldest first.
    async fn list(&self) -> StoryResult<Vec<WorkflowSummary>>;

    /// Apply a mutation under the store's write lock and return the result.
    async fn update(&self, id: WorkflowId, mutation: WorkflowMutation) -> StoryResult<Workflow>;

    /// Remove a workflow.
    async fn delete(&self, id: WorkflowId) -> StoryResult<()>;
}
