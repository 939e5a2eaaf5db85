//! In-memory implementation of WorkflowStore.
//!
//! Workflows live in a HashMap behind a tokio RwLock. All data is lost when
//! the store is dropped.

use async_trait::async_trait;
use scrivener_core::{Workflow, WorkflowId, WorkflowSummary};
use scrivener_error::{StoryResult, WorkflowError, WorkflowErrorKind};
use scrivener_interface::{WorkflowMutation, WorkflowStore};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory workflow store.
///
/// # Example
/// ```
/// use scrivener_core::{SamplingConfig, Workflow};
/// use scrivener_interface::WorkflowStore;
/// use scrivener_workflow::InMemoryWorkflowStore;
///
/// # tokio_test_block(async {
/// let store = InMemoryWorkflowStore::new();
/// let workflow = Workflow::new("A lighthouse keeper", SamplingConfig::default()).unwrap();
/// let id = *workflow.id();
/// store.insert(workflow).await.unwrap();
/// assert_eq!(store.len().await, 1);
/// assert!(store.get(id).await.is_ok());
/// # });
/// # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Runtime::new().unwrap().block_on(f)
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryWorkflowStore {
    workflows: Arc<RwLock<HashMap<WorkflowId, Workflow>>>,
}

impl InMemoryWorkflowStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored workflows.
    pub async fn len(&self) -> usize {
        self.workflows.read().await.len()
    }

    /// Whether the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.workflows.read().await.is_empty()
    }
}

#[track_caller]
fn not_found(id: WorkflowId) -> WorkflowError {
    WorkflowError::new(WorkflowErrorKind::NotFound(id.to_string()))
}

#[async_trait]
impl WorkflowStore for InMemoryWorkflowStore {
    async fn insert(&self, workflow: Workflow) -> StoryResult<Workflow> {
        let mut workflows = self.workflows.write().await;
        let id = *workflow.id();
        if workflows.contains_key(&id) {
            return Err(WorkflowError::invalid_input(format!("workflow {} already exists", id)).into());
        }
        workflows.insert(id, workflow.clone());
        tracing::debug!(workflow_id = %id, "Stored workflow");
        Ok(workflow)
    }

    async fn get(&self, id: WorkflowId) -> StoryResult<Workflow> {
        let workflows = self.workflows.read().await;
        workflows.get(&id).cloned().ok_or_else(|| not_found(id).into())
    }

    async fn list(&self) -> StoryResult<Vec<WorkflowSummary>> {
        let workflows = self.workflows.read().await;
        let mut summaries: Vec<WorkflowSummary> = workflows.values().map(Workflow::summary).collect();
        summaries.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(summaries)
    }

    async fn update(&self, id: WorkflowId, mutation: WorkflowMutation) -> StoryResult<Workflow> {
        let mut workflows = self.workflows.write().await;
        let workflow = workflows.get_mut(&id).ok_or_else(|| not_found(id))?;
        mutation(workflow)?;
        Ok(workflow.clone())
    }

    async fn delete(&self, id: WorkflowId) -> StoryResult<()> {
        let mut workflows = self.workflows.write().await;
        workflows.remove(&id).map(|_| ()).ok_or_else(|| {
            tracing::debug!(workflow_id = %id, "Delete of unknown workflow");
            not_found(id).into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrivener_core::SamplingConfig;

    fn workflow() -> Workflow {
        Workflow::new("A lighthouse keeper", SamplingConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn duplicate_insert_is_rejected() {
        let store = InMemoryWorkflowStore::new();
        let wf = workflow();
        store.insert(wf.clone()).await.unwrap();
        assert!(store.insert(wf).await.is_err());
    }

    #[tokio::test]
    async fn failed_mutation_leaves_workflow_untouched() {
        let store = InMemoryWorkflowStore::new();
        let wf = store.insert(workflow()).await.unwrap();
        let err = store
            .update(
                *wf.id(),
                Box::new(|w: &mut Workflow| -> StoryResult<()> { Ok(w.mark_completed()?) }),
            )
            .await
            .unwrap_err();
        assert!(err.workflow_kind().is_some());
        assert_eq!(store.get(*wf.id()).await.unwrap(), wf);
    }

    #[tokio::test]
    async fn unknown_ids_are_not_found() {
        let store = InMemoryWorkflowStore::new();
        let err = store.delete(WorkflowId::new()).await.unwrap_err();
        assert!(matches!(err.workflow_kind(), Some(WorkflowErrorKind::NotFound(_))));
    }

    #[tokio::test]
    async fn list_is_oldest_first() {
        let store = InMemoryWorkflowStore::new();
        let first = store.insert(workflow()).await.unwrap();
        let second = store.insert(workflow()).await.unwrap();
        let ids: Vec<_> = store.list().await.unwrap().into_iter().map(|s| s.id).collect();
        assert_eq!(ids.len(), 2);
        if first.created_at() != second.created_at() {
            assert_eq!(ids, vec![*first.id(), *second.id()]);
        }
    }
}
