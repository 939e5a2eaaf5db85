//! Scrivener - story-writing workflows over a local LLM server
//!
//! Scrivener turns a one-line story idea into a multi-chapter manuscript by
//! walking a workflow through fixed stages: characters and settings, an
//! outline, then chapters that are scored and rewritten until they pass.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use scrivener::{BulkOptions, ScrivenerConfig, StageOptions, local_engine};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ScrivenerConfig::load()?;
//!     let engine = local_engine(&config, None)?;
//!
//!     let workflow = engine.create("A lighthouse keeper finds a map", config.sampling()).await?;
//!     let id = *workflow.id();
//!     engine.generate_characters_settings(id, StageOptions::default()).await?;
//!     engine.generate_outline(id, Some(3), StageOptions::default()).await?;
//!
//!     let mut events = engine.generate_all_chapters(id, BulkOptions::default()).await?;
//!     while let Some(event) = events.next().await {
//!         println!("{}", serde_json::to_string(&event)?);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! Scrivener is organized as a workspace with focused crates:
//!
//! - `scrivener_error` - Error types
//! - `scrivener_core` - Workflow aggregate, requests, reasoning parser, event protocol
//! - `scrivener_interface` - Backend, validator and store traits
//! - `scrivener_server` - Ollama-compatible model server client
//! - `scrivener_workflow` - Workflow engine, prompts, validator, in-memory store
//!
//! This crate (`scrivener`) re-exports everything for convenience and adds
//! configuration, logging setup and Markdown export.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod engine;
pub mod export;
mod telemetry;

pub use crate::config::{GenerationSettings, LoggingSettings, ScrivenerConfig};
pub use engine::{LocalEngine, local_engine};
pub use telemetry::init_logging;

// Re-export the workspace crates
pub use scrivener_core::*;
pub use scrivener_error::*;
pub use scrivener_interface::*;
pub use scrivener_server::{ModelInfo, ServerClient, ServerConfig, ServerConfigBuilder};
pub use scrivener_workflow::{
    BulkEventStream, BulkOptions, ChapterEventStream, EngineConfig, EngineConfigBuilder,
    InMemoryWorkflowStore, ModelValidator, WorkflowEngine, prompts,
};
