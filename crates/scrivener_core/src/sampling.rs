//! Sampling parameters and per-stage options.

use scrivener_error::WorkflowError;
use serde::{Deserialize, Serialize};

/// Sampling parameters recorded on a workflow at creation.
///
/// # Examples
///
/// ```
/// use scrivener_core::SamplingConfig;
///
/// let sampling = SamplingConfig::default().with_temperature(1.1);
/// assert_eq!(sampling.top_p, 0.9);
/// assert!(sampling.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, derive_setters::Setters)]
#[setters(prefix = "with_")]
pub struct SamplingConfig {
    /// Model name; the server default is used when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[setters(strip_option, into)]
    pub model: Option<String>,

    /// Sampling temperature (0.0 to 2.0)
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Nucleus sampling cutoff (0.0 to 1.0)
    #[serde(default = "default_top_p")]
    pub top_p: f32,
}

fn default_temperature() -> f32 {
    0.7
}

fn default_top_p() -> f32 {
    0.9
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            model: None,
            temperature: default_temperature(),
            top_p: default_top_p(),
        }
    }
}

impl SamplingConfig {
    /// Checks that temperature and top_p are inside their ranges.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidInput` workflow error naming the offending value.
    #[track_caller]
    pub fn validate(&self) -> Result<(), WorkflowError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(WorkflowError::invalid_input(format!(
                "temperature must be in [0, 2], got {}",
                self.temperature
            )));
        }
        if !(0.0..=1.0).contains(&self.top_p) {
            return Err(WorkflowError::invalid_input(format!(
                "top_p must be in [0, 1], got {}",
                self.top_p
            )));
        }
        Ok(())
    }

    /// Returns a copy with every field the override sets replaced.
    pub fn merged(&self, over: &SamplingOverride) -> Self {
        Self {
            model: over.model.clone().or_else(|| self.model.clone()),
            temperature: over.temperature.unwrap_or(self.temperature),
            top_p: over.top_p.unwrap_or(self.top_p),
        }
    }
}

/// Sampling values that replace the workflow's for a single call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, derive_setters::Setters)]
#[setters(prefix = "with_", strip_option)]
pub struct SamplingOverride {
    /// Model to use instead of the workflow's
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[setters(into)]
    pub model: Option<String>,
    /// Temperature to use instead of the workflow's
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    /// Top-p to use instead of the workflow's
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
}

/// Options accepted by every generation stage.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, derive_setters::Setters)]
#[setters(prefix = "with_")]
pub struct StageOptions {
    /// Free-text guidance appended to the stage prompt
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[setters(strip_option, into)]
    pub additional_instructions: Option<String>,
    /// Sampling values for this call only
    #[serde(default)]
    pub sampling: SamplingOverride,
}

impl StageOptions {
    /// The instructions, if present and not blank.
    pub fn instructions(&self) -> Option<&str> {
        self.additional_instructions
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}
