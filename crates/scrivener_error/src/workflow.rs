//! Workflow error types.

/// Specific error conditions for workflow operations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum WorkflowErrorKind {
    /// Missing or malformed caller input
    #[display("Invalid input: {}", _0)]
    InvalidInput(String),
    /// No workflow with the given id
    #[display("Workflow not found: {}", _0)]
    NotFound(String),
    /// Chapter number not present in the outline or the chapter map
    #[display("Chapter {} not found", _0)]
    ChapterNotFound(u32),
    /// Operation attempted before the workflow reached the required step
    #[display("Cannot {} while workflow is at '{}' (requires '{}')", operation, current, required)]
    StepPrecondition {
        /// Operation that was refused
        operation: String,
        /// Step the operation requires
        required: String,
        /// Step the workflow is at
        current: String,
    },
    /// Model output could not be parsed into structured data
    #[display("Failed to parse model output: {}", _0)]
    GenerationParse(String),
    /// Outline is structurally invalid
    #[display("Invalid outline: {}", _0)]
    InvalidOutline(String),
}

/// Error type for workflow operations.
///
/// # Examples
///
/// ```
/// use scrivener_error::{WorkflowError, WorkflowErrorKind};
///
/// let err = WorkflowError::new(WorkflowErrorKind::ChapterNotFound(4));
/// assert!(format!("{}", err).contains("Chapter 4"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Workflow Error: {} at line {} in {}", kind, line, file)]
pub struct WorkflowError {
    /// The specific error condition
    pub kind: WorkflowErrorKind,
    /// Line number where the error occurred
    pub line: u32,
    /// Source file where the error occurred
    pub file: &'static str,
}

impl WorkflowError {
    /// Create a new WorkflowError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: WorkflowErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Shorthand for [`WorkflowErrorKind::InvalidInput`].
    #[track_caller]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(WorkflowErrorKind::InvalidInput(message.into()))
    }
}
