//! Client for Ollama-compatible model servers
//!
//! This crate implements the Scrivener generation traits against the
//! `/api/generate` and `/api/tags` endpoints of a local model server.
//!
//! # Example
//!
//! ```rust,no_run
//! use futures::StreamExt;
//! use scrivener_core::GenerationRequestBuilder;
//! use scrivener_interface::Streaming;
//! use scrivener_server::{ServerClient, ServerConfigBuilder};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfigBuilder::default()
//!         .base_url("http://localhost:11434")
//!         .model("qwen3:8b")
//!         .build()?;
//!     let client = ServerClient::new(config)?;
//!
//!     let request = GenerationRequestBuilder::default()
//!         .prompt("Write the opening line of a sea story.")
//!         .build()?;
//!     let mut stream = client.generate_stream(&request).await?;
//!     while let Some(fragment) = stream.next().await {
//!         print!("{}", fragment?.content);
//!     }
//!
//!     Ok(())
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod client;
mod config;
mod convert;
mod ndjson;
mod request;
mod response;

pub use client::ServerClient;
pub use config::{ServerConfig, ServerConfigBuilder, ServerConfigBuilderError};
pub use convert::{error_message, to_generate_body};
pub use ndjson::decode_fragments;
pub use request::{GenerateBody, GenerateOptions};
pub use response::{GenerateFrame, ModelInfo, TagsResponse};
pub use scrivener_error::{GenerationError, GenerationErrorKind};
