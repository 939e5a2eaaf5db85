//! Wire types sent to the model server.

use serde::{Deserialize, Serialize};

/// Body of `POST /api/generate`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GenerateBody {
    /// Model identifier
    pub model: String,
    /// Prompt, continuation already folded in
    pub prompt: String,
    /// System prompt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    /// Whether to stream NDJSON frames
    pub stream: bool,
    /// Sampling options
    pub options: GenerateOptions,
}

/// Sampling options of a generate call.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct GenerateOptions {
    /// Temperature for sampling (0.0 - 2.0)
    pub temperature: f32,
    /// Top-p sampling parameter
    pub top_p: f32,
    /// Tokens to generate, -1 for unlimited
    pub num_predict: i32,
}
