//! Error types for the Scrivener story workflow library.
//!
//! This crate provides the foundation error types used throughout the Scrivener workspace.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All constructors use `#[track_caller]` for automatic location capture
//!
//! # Examples
//!
//! ```
//! use scrivener_error::{StoryResult, WorkflowError, WorkflowErrorKind};
//!
//! fn load(id: &str) -> StoryResult<String> {
//!     Err(WorkflowError::new(WorkflowErrorKind::NotFound(id.to_string())))?
//! }
//!
//! match load("missing") {
//!     Ok(data) => println!("Got: {}", data),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod generation;
mod json;
mod validation;
mod workflow;

pub use config::ConfigError;
pub use error::{StoryError, StoryErrorKind, StoryResult};
pub use generation::{GenerationError, GenerationErrorKind};
pub use json::JsonError;
pub use validation::{ValidationError, ValidationErrorKind};
pub use workflow::{WorkflowError, WorkflowErrorKind};
