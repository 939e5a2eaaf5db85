//! Trait definitions for the Scrivener story workflow library.
//!
//! This crate provides the seams between the workflow engine and its
//! collaborators: the model backend, the chapter validator and the
//! workflow store.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod traits;
mod types;

pub use traits::{
    ChapterValidator, FragmentStream, Health, ModelDriver, Streaming, WorkflowMutation,
    WorkflowStore,
};
pub use types::HealthStatus;
