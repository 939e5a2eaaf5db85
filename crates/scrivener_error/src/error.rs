//! Top-level error wrapper types.

use crate::{ConfigError, GenerationError, JsonError, ValidationError, WorkflowError};

/// Every error condition a Scrivener operation can surface.
///
/// # Examples
///
/// ```
/// use scrivener_error::{StoryError, GenerationError, GenerationErrorKind};
///
/// let err: StoryError = GenerationError::new(GenerationErrorKind::Http("refused".into())).into();
/// assert!(format!("{}", err).contains("Generation Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum StoryErrorKind {
    /// Workflow state or input error
    #[from(WorkflowError)]
    Workflow(WorkflowError),
    /// Upstream model server failure
    #[from(GenerationError)]
    Generation(GenerationError),
    /// Chapter scorer unavailable
    #[from(ValidationError)]
    Validation(ValidationError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// JSON serialization/deserialization error
    #[from(JsonError)]
    Json(JsonError),
}

/// Scrivener error with kind discrimination.
///
/// # Examples
///
/// ```
/// use scrivener_error::{ConfigError, StoryResult};
///
/// fn might_fail() -> StoryResult<()> {
///     Err(ConfigError::new("Missing field"))?
/// }
///
/// assert!(might_fail().is_err());
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Scrivener Error: {}", _0)]
pub struct StoryError(Box<StoryErrorKind>);

impl StoryError {
    /// Create a new error from a kind.
    pub fn new(kind: StoryErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &StoryErrorKind {
        &self.0
    }

    /// The workflow error kind, if this is a workflow error.
    pub fn workflow_kind(&self) -> Option<&crate::WorkflowErrorKind> {
        match self.kind() {
            StoryErrorKind::Workflow(e) => Some(&e.kind),
            _ => None,
        }
    }

    /// The error description without source location, for client-facing events.
    pub fn message(&self) -> String {
        match self.kind() {
            StoryErrorKind::Workflow(e) => e.kind.to_string(),
            StoryErrorKind::Generation(e) => e.kind.to_string(),
            StoryErrorKind::Validation(e) => e.kind.to_string(),
            StoryErrorKind::Config(e) => e.message.clone(),
            StoryErrorKind::Json(e) => e.message.clone(),
        }
    }

    /// Whether this error came from the model server transport.
    pub fn is_generation(&self) -> bool {
        matches!(self.kind(), StoryErrorKind::Generation(_))
    }
}

// Generic From implementation for any type that converts to StoryErrorKind
impl<T> From<T> for StoryError
where
    T: Into<StoryErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Scrivener operations.
pub type StoryResult<T> = std::result::Result<T, StoryError>;
