//! Engine tuning.

use scrivener_error::ConfigError;
use serde::{Deserialize, Serialize};

/// Policy knobs of the workflow engine.
///
/// # Examples
///
/// ```
/// use scrivener_workflow::EngineConfigBuilder;
///
/// let config = EngineConfigBuilder::default()
///     .max_attempts(5u32)
///     .build()
///     .unwrap();
/// assert_eq!(*config.default_threshold(), 0.7);
/// assert!(config.validate().is_ok());
/// ```
#[derive(
    Debug,
    Clone,
    PartialEq,
    Serialize,
    Deserialize,
    derive_getters::Getters,
    derive_builder::Builder,
)]
#[builder(setter(into))]
pub struct EngineConfig {
    /// Score a chapter must reach when a bulk run names no threshold
    #[builder(default = 0.7)]
    #[serde(default = "default_threshold")]
    default_threshold: f32,

    /// Generation attempts per chapter in a bulk run
    #[builder(default = 3)]
    #[serde(default = "default_max_attempts")]
    max_attempts: u32,

    /// Characters of the previous chapter's prose given as context
    #[builder(default = 4000)]
    #[serde(default = "default_continuity_chars")]
    continuity_chars: usize,

    /// Write a scene outline and dialogue before each chapter's prose
    #[builder(default)]
    #[serde(default)]
    drafting: bool,
}

fn default_threshold() -> f32 {
    0.7
}

fn default_max_attempts() -> u32 {
    3
}

fn default_continuity_chars() -> usize {
    4000
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_threshold: default_threshold(),
            max_attempts: default_max_attempts(),
            continuity_chars: default_continuity_chars(),
            drafting: false,
        }
    }
}

impl EngineConfig {
    /// Checks ranges.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] naming the first bad value.
    #[track_caller]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.default_threshold) {
            return Err(ConfigError::new(format!(
                "generation.validation_threshold must be in [0, 1], got {}",
                self.default_threshold
            )));
        }
        if self.max_attempts == 0 {
            return Err(ConfigError::new("generation.max_attempts must be at least 1"));
        }
        Ok(())
    }
}
