use crate::{GenerateFrame, ModelInfo, ServerConfig, TagsResponse, convert, decode_fragments};
use scrivener_core::{GenerationOutput, GenerationRequest};
use scrivener_error::{GenerationError, GenerationErrorKind};
use scrivener_interface::{FragmentStream, Health, HealthStatus, ModelDriver, Streaming};
use std::time::Duration;
use tracing::instrument;

/// Client for an Ollama-compatible model server
#[derive(Debug, Clone, derive_getters::Getters)]
pub struct ServerClient {
    /// Connection settings
    config: ServerConfig,
    #[getter(skip)]
    client: reqwest::Client,
}

impl ServerClient {
    /// Create a new server client
    ///
    /// # Errors
    ///
    /// Returns a `Configuration` error if the HTTP client cannot be built.
    #[instrument(skip(config), fields(base_url = %config.base_url, model = %config.model))]
    pub fn new(config: ServerConfig) -> Result<Self, GenerationError> {
        tracing::debug!("Creating server client");
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| {
                GenerationError::new(GenerationErrorKind::Configuration(format!(
                    "Failed to build HTTP client: {}",
                    e
                )))
            })?;
        Ok(Self { config, client })
    }

    /// Check if the server is running and responding
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), GenerationError> {
        self.list_models().await.map(|_| ())
    }

    /// List the models installed on the server
    #[instrument(skip(self))]
    pub async fn list_models(&self) -> Result<Vec<ModelInfo>, GenerationError> {
        let url = self.config.endpoint("/api/tags");
        tracing::debug!(%url, "Listing models");

        let response = self
            .client
            .get(&url)
            .timeout(self.request_timeout())
            .send()
            .await
            .map_err(http_error)?;
        let response = ensure_success(response).await?;

        let tags: TagsResponse = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to parse model list");
            GenerationError::new(GenerationErrorKind::Deserialization(format!(
                "Failed to parse model list: {}",
                e
            )))
        })?;

        tracing::debug!(count = tags.models.len(), "Listed models");
        Ok(tags.models)
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.config.timeout_secs)
    }

    async fn post_generate(
        &self,
        req: &GenerationRequest,
        stream: bool,
    ) -> Result<reqwest::Response, GenerationError> {
        let url = self.config.endpoint("/api/generate");
        let body = convert::to_generate_body(req, &self.config.model, stream);
        tracing::debug!(%url, model = %body.model, stream, "Sending generate request");

        let mut builder = self.client.post(&url).json(&body);
        if !stream {
            builder = builder.timeout(self.request_timeout());
        }
        let response = builder.send().await.map_err(http_error)?;
        ensure_success(response).await
    }
}

fn http_error(e: reqwest::Error) -> GenerationError {
    tracing::error!(error = %e, "Request failed");
    if e.is_timeout() {
        GenerationError::new(GenerationErrorKind::Http(format!("Request timed out: {}", e)))
    } else {
        GenerationError::new(GenerationErrorKind::Http(format!("Request failed: {}", e)))
    }
}

async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, GenerationError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = convert::error_message(&body);
    tracing::error!(status = status.as_u16(), %message, "Server returned error");
    Err(GenerationError::new(GenerationErrorKind::Api {
        status: status.as_u16(),
        message,
    }))
}

#[async_trait::async_trait]
impl ModelDriver for ServerClient {
    #[instrument(skip(self, req), fields(model = req.model.as_deref().unwrap_or(&self.config.model)))]
    async fn generate(&self, req: &GenerationRequest) -> Result<GenerationOutput, GenerationError> {
        let response = self.post_generate(req, false).await?;
        let frame: GenerateFrame = response.json().await.map_err(|e| {
            tracing::error!(error = %e, "Failed to parse response");
            GenerationError::new(GenerationErrorKind::Deserialization(format!(
                "Failed to parse response: {}",
                e
            )))
        })?;

        if let Some(message) = frame.error {
            return Err(GenerationError::new(GenerationErrorKind::Api {
                status: 200,
                message,
            }));
        }

        tracing::debug!(chars = frame.response.len(), "Generation successful");
        Ok(GenerationOutput {
            text: frame.response,
            model_used: frame
                .model
                .or_else(|| req.model.clone())
                .unwrap_or_else(|| self.config.model.clone()),
        })
    }

    fn provider_name(&self) -> &'static str {
        "ollama"
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

#[async_trait::async_trait]
impl Streaming for ServerClient {
    #[instrument(skip(self, req), fields(model = req.model.as_deref().unwrap_or(&self.config.model)))]
    async fn generate_stream(&self, req: &GenerationRequest) -> Result<FragmentStream, GenerationError> {
        let response = self.post_generate(req, true).await?;
        tracing::debug!("Streaming request accepted, decoding NDJSON");
        Ok(Box::pin(decode_fragments(response.bytes_stream())))
    }
}

#[async_trait::async_trait]
impl Health for ServerClient {
    #[instrument(skip(self))]
    async fn health(&self) -> HealthStatus {
        match self.list_models().await {
            Ok(models) if models.iter().any(|m| m.name == self.config.model) => HealthStatus::Healthy,
            Ok(_) => HealthStatus::Degraded {
                message: format!("model '{}' is not installed", self.config.model),
            },
            Err(e) => HealthStatus::Unhealthy {
                message: e.kind.to_string(),
            },
        }
    }
}
