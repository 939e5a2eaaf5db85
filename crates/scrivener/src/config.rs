//! Layered configuration for the Scrivener binary.
//!
//! Precedence, later wins: bundled `scrivener.toml`, then
//! `~/.config/scrivener/scrivener.toml`, then `./scrivener.toml`, then an
//! explicit `--config` file, then `SCRIVENER_<SECTION>__<KEY>` variables.

use config::{Config, ConfigBuilder, Environment, File, FileFormat, builder::DefaultState};
use scrivener_core::SamplingConfig;
use scrivener_error::{ConfigError, StoryError, StoryResult};
use scrivener_server::ServerConfig;
use scrivener_workflow::{EngineConfig, EngineConfigBuilder};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, instrument};

const DEFAULT_CONFIG: &str = include_str!("../scrivener.toml");

/// Sampling and engine policy defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    /// Default sampling temperature for new workflows
    pub temperature: f32,
    /// Default nucleus cutoff for new workflows
    pub top_p: f32,
    /// Score a chapter must reach in a bulk run
    pub validation_threshold: f32,
    /// Attempts per chapter in a bulk run
    pub max_attempts: u32,
    /// Characters of the previous chapter given as context
    pub continuity_chars: usize,
    /// Draft a scene outline and dialogue before each chapter
    pub drafting: bool,
    /// Temperature of scoring requests
    pub validator_temperature: f32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 0.9,
            validation_threshold: 0.7,
            max_attempts: 3,
            continuity_chars: 4000,
            drafting: false,
            validator_temperature: 0.3,
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Filter directive used when `RUST_LOG` is unset
    pub level: String,
    /// Emit JSON lines instead of human-readable logs
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

/// Complete Scrivener configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, derive_getters::Getters)]
#[serde(default)]
pub struct ScrivenerConfig {
    /// Model server connection
    server: ServerConfig,
    /// Generation defaults
    generation: GenerationSettings,
    /// Logging
    logging: LoggingSettings,
}

impl ScrivenerConfig {
    /// Load configuration from every standard location.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use scrivener::ScrivenerConfig;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let config = ScrivenerConfig::load()?;
    /// println!("model: {}", config.server().model);
    /// # Ok(())
    /// # }
    /// ```
    pub fn load() -> StoryResult<Self> {
        Self::load_with(None)
    }

    /// Load configuration, layering `explicit` above the standard files.
    #[instrument]
    pub fn load_with(explicit: Option<&Path>) -> StoryResult<Self> {
        debug!("Loading configuration with precedence: env > explicit > current dir > home dir > bundled defaults");

        let mut builder = bundled();

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/scrivener/scrivener.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder.add_source(File::with_name("scrivener").required(false));

        if let Some(path) = explicit {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("SCRIVENER")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        finish(builder)
    }

    /// Load the bundled defaults overlaid with a single file.
    #[instrument]
    pub fn from_file(path: &Path) -> StoryResult<Self> {
        debug!(path = %path.display(), "Loading configuration from file");
        finish(bundled().add_source(File::from(path).required(true)))
    }

    /// Check ranges that serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.server.base_url.starts_with("http://") && !self.server.base_url.starts_with("https://") {
            return Err(ConfigError::new(format!(
                "server.base_url must be an http(s) URL, got '{}'",
                self.server.base_url
            )));
        }
        if self.server.model.trim().is_empty() {
            return Err(ConfigError::new("server.model must not be empty"));
        }
        self.sampling()
            .validate()
            .map_err(|e| ConfigError::new(format!("generation: {}", e.kind)))?;
        if !(0.0..=2.0).contains(&self.generation.validator_temperature) {
            return Err(ConfigError::new(format!(
                "generation.validator_temperature must be within [0, 2], got {}",
                self.generation.validator_temperature
            )));
        }
        self.engine_config().map(|_| ())
    }

    /// Sampling defaults for new workflows.
    pub fn sampling(&self) -> SamplingConfig {
        SamplingConfig {
            model: None,
            temperature: self.generation.temperature,
            top_p: self.generation.top_p,
        }
    }

    /// Engine policy drawn from the `generation` section.
    pub fn engine_config(&self) -> Result<EngineConfig, ConfigError> {
        let config = EngineConfigBuilder::default()
            .default_threshold(self.generation.validation_threshold)
            .max_attempts(self.generation.max_attempts)
            .continuity_chars(self.generation.continuity_chars)
            .drafting(self.generation.drafting)
            .build()
            .map_err(|e| ConfigError::new(format!("Failed to build engine config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }
}

fn bundled() -> ConfigBuilder<DefaultState> {
    Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
}

fn finish(builder: ConfigBuilder<DefaultState>) -> StoryResult<ScrivenerConfig> {
    let config: ScrivenerConfig = builder
        .build()
        .map_err(|e| StoryError::from(ConfigError::new(format!("Failed to build configuration: {}", e))))?
        .try_deserialize()
        .map_err(|e| StoryError::from(ConfigError::new(format!("Failed to parse configuration: {}", e))))?;
    config.validate()?;
    Ok(config)
}
