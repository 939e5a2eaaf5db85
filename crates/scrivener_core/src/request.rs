//! Request and response types for text generation.

use crate::SamplingConfig;
use serde::{Deserialize, Serialize};

/// A single text generation request.
///
/// # Examples
///
/// ```
/// use scrivener_core::GenerationRequestBuilder;
///
/// let request = GenerationRequestBuilder::default()
///     .prompt("The storm broke at dawn.")
///     .continuation("The keeper climbed the stairs.")
///     .build()
///     .unwrap();
///
/// assert_eq!(request.temperature, 0.7);
/// assert!(request.effective_prompt().starts_with("Continue this story:\n\nThe keeper"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_builder::Builder)]
#[builder(setter(into))]
pub struct GenerationRequest {
    /// Instruction or story request
    pub prompt: String,
    /// Model override; the client default is used when absent
    #[builder(default, setter(into, strip_option))]
    pub model: Option<String>,
    /// Sampling temperature
    #[builder(default = 0.7)]
    pub temperature: f32,
    /// Nucleus sampling cutoff
    #[builder(default = 0.9)]
    pub top_p: f32,
    /// System prompt
    #[builder(default, setter(into, strip_option))]
    pub system_prompt: Option<String>,
    /// Existing story text to continue from
    #[builder(default, setter(into, strip_option))]
    pub continuation: Option<String>,
}

impl GenerationRequest {
    /// A request carrying the given sampling parameters.
    pub fn with_sampling(prompt: impl Into<String>, sampling: &SamplingConfig) -> Self {
        Self {
            prompt: prompt.into(),
            model: sampling.model.clone(),
            temperature: sampling.temperature,
            top_p: sampling.top_p,
            system_prompt: None,
            continuation: None,
        }
    }

    /// Sets the system prompt.
    pub fn system(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    /// The prompt sent on the wire, folding in the continuation text.
    pub fn effective_prompt(&self) -> String {
        match self.continuation.as_deref().map(str::trim) {
            Some(previous) if !previous.is_empty() => {
                format!("Continue this story:\n\n{}\n\n{}", previous, self.prompt)
            }
            _ => self.prompt.clone(),
        }
    }
}

/// A complete generation result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationOutput {
    /// Generated text
    pub text: String,
    /// Model that produced it
    pub model_used: String,
}

/// One increment of a streamed generation.
///
/// The final fragment of a stream has `is_complete` set and may be empty.
///
/// # Examples
///
/// ```
/// use scrivener_core::Fragment;
///
/// let json = serde_json::to_string(&Fragment::last("")).unwrap();
/// assert_eq!(json, r#"{"content":"","isComplete":true}"#);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fragment {
    /// Text produced since the previous fragment
    pub content: String,
    /// Whether this is the last fragment
    #[serde(rename = "isComplete")]
    pub is_complete: bool,
}

impl Fragment {
    /// An intermediate fragment.
    pub fn partial(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_complete: false,
        }
    }

    /// The terminating fragment.
    pub fn last(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            is_complete: true,
        }
    }
}
