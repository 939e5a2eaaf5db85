//! Configuration for the model server connection

use serde::{Deserialize, Serialize};

/// Configuration for the model server connection
///
/// # Examples
///
/// ```
/// use scrivener_server::ServerConfigBuilder;
///
/// let config = ServerConfigBuilder::default()
///     .base_url("http://gpu-box:11434/")
///     .build()
///     .unwrap();
/// assert_eq!(config.model, "qwen3:8b");
/// assert_eq!(config.endpoint("/api/tags"), "http://gpu-box:11434/api/tags");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, derive_builder::Builder)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ServerConfig {
    /// Base URL of the server
    #[builder(default = "default_base_url()")]
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Model used when a request names none
    #[builder(default = "default_model()")]
    #[serde(default = "default_model")]
    pub model: String,
    /// Seconds allowed for a non-streaming request
    #[builder(default = 300)]
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Seconds allowed to establish a connection
    #[builder(default = 10)]
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "qwen3:8b".to_string()
}

fn default_timeout_secs() -> u64 {
    300
}

fn default_connect_timeout_secs() -> u64 {
    10
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

impl ServerConfig {
    /// Create a configuration for a server and model
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            model: model.into(),
            ..Self::default()
        }
    }

    /// Full URL for an API path
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

impl ServerConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if let Some(url) = &self.base_url
            && !(url.starts_with("http://") || url.starts_with("https://"))
        {
            return Err(format!("base_url must be an http(s) URL, got '{}'", url));
        }
        if let Some(model) = &self.model
            && model.trim().is_empty()
        {
            return Err("model must not be empty".to_string());
        }
        Ok(())
    }
}
