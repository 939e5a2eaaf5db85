//! Story workflow engine for Scrivener.
//!
//! This crate drives a story from a one-line prompt to finished chapters:
//! characters and settings, then an outline, then chapters written one at a
//! time or in a validated bulk run.
//!
//! # Features
//!
//! - **Staged workflow**: each stage requires the previous one and commits atomically
//! - **Streaming chapters**: prose is forwarded fragment by fragment
//! - **Bulk runs**: every pending chapter is scored and rewritten below a threshold
//! - **Drafted mode**: optional scene outline and dialogue passes before the prose
//! - **Pluggable storage**: any [`WorkflowStore`](scrivener_interface::WorkflowStore)
//!
//! # Example
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use scrivener_core::{BulkEvent, SamplingConfig, StageOptions};
//! use scrivener_server::{ServerClient, ServerConfig};
//! use scrivener_workflow::{
//!     BulkOptions, EngineConfig, InMemoryWorkflowStore, ModelValidator, WorkflowEngine,
//! };
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Arc::new(ServerClient::new(ServerConfig::default())?);
//! let validator = Arc::new(ModelValidator::new(Arc::clone(&client)));
//! let store = Arc::new(InMemoryWorkflowStore::new());
//! let engine = WorkflowEngine::new(client, validator, store, EngineConfig::default())?;
//!
//! let workflow = engine.create("A lighthouse keeper finds a map", SamplingConfig::default()).await?;
//! let id = *workflow.id();
//! engine.generate_characters_settings(id, StageOptions::default()).await?;
//! engine.generate_outline(id, Some(3), StageOptions::default()).await?;
//!
//! let mut events = engine.generate_all_chapters(id, BulkOptions::default()).await?;
//! while let Some(event) = events.next().await {
//!     if let BulkEvent::Progress(progress) = event {
//!         println!("chapter {}: {}", progress.chapter_number, progress.status);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod bulk;
mod chapter;
mod config;
mod engine;
mod extraction;
mod locks;
pub mod prompts;
mod store;
mod validator;

pub use bulk::BulkOptions;
pub use config::{EngineConfig, EngineConfigBuilder, EngineConfigBuilderError};
pub use engine::{BulkEventStream, ChapterEventStream, WorkflowEngine};
pub use extraction::{extract_json, parse_json, parse_reply};
pub use locks::WorkflowLocks;
pub use store::InMemoryWorkflowStore;
pub use validator::{ModelValidator, parse_score_response};
