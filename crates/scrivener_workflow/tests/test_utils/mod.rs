//! Test utilities for workflow tests.
//!
//! This module provides mock generators, validators and engine helpers.

#![allow(dead_code)]

pub mod mock_generator;
pub mod mock_validator;

#[allow(unused_imports)]
pub use mock_generator::{ScriptedGenerator, outline_reply};
#[allow(unused_imports)]
pub use mock_validator::{FailingValidator, FixedValidator, SequenceValidator};

use scrivener_core::{SamplingConfig, StageOptions, WorkflowId};
use scrivener_interface::ChapterValidator;
use scrivener_workflow::{EngineConfig, InMemoryWorkflowStore, WorkflowEngine};
use std::sync::Arc;

/// Engine over a scripted generator and the given validator.
pub type TestEngine<V> = WorkflowEngine<ScriptedGenerator, V, InMemoryWorkflowStore>;

/// Build an engine with a fresh in-memory store.
pub fn engine_with<V: ChapterValidator + 'static>(
    generator: &Arc<ScriptedGenerator>,
    validator: &Arc<V>,
    config: EngineConfig,
) -> TestEngine<V> {
    WorkflowEngine::new(
        Arc::clone(generator),
        Arc::clone(validator),
        Arc::new(InMemoryWorkflowStore::new()),
        config,
    )
    .expect("test config is valid")
}

/// Run a workflow up to an outline with the scripted replies.
pub async fn outlined<V: ChapterValidator + 'static>(
    engine: &TestEngine<V>,
    target_chapters: u32,
) -> WorkflowId {
    let workflow = engine
        .create(
            "A lighthouse keeper discovers a mysterious map",
            SamplingConfig::default(),
        )
        .await
        .expect("create");
    let id = *workflow.id();
    engine
        .generate_characters_settings(id, StageOptions::default())
        .await
        .expect("characters and settings");
    engine
        .generate_outline(id, Some(target_chapters), StageOptions::default())
        .await
        .expect("outline");
    id
}
