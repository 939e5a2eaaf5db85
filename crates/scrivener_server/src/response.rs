//! Wire types received from the model server.

use serde::{Deserialize, Serialize};

/// One NDJSON frame of a streamed generate call, or the whole body of a
/// non-streamed one.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenerateFrame {
    /// Model that produced the text
    #[serde(default)]
    pub model: Option<String>,
    /// Text produced since the previous frame
    #[serde(default)]
    pub response: String,
    /// Whether this is the last frame
    #[serde(default)]
    pub done: bool,
    /// Failure reported by the server mid-stream
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Body of `GET /api/tags`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TagsResponse {
    /// Installed models
    #[serde(default)]
    pub models: Vec<ModelInfo>,
}

/// A model installed on the server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ModelInfo {
    /// Model name including tag, e.g. `qwen3:8b`
    pub name: String,
    /// Size on disk in bytes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Last modification time as reported by the server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<String>,
}
