//! Error types for the model server client.

/// Error kinds for generation requests.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, derive_more::Display)]
pub enum GenerationErrorKind {
    /// Could not reach the server
    #[display("HTTP request failed: {}", _0)]
    Http(String),

    /// Server answered with a failure
    #[display("API error ({}): {}", status, message)]
    Api {
        /// HTTP status code, 200 when the failure arrived inside a stream
        status: u16,
        /// Message reported by the server
        message: String,
    },

    /// Transport broke while streaming
    #[display("Stream error: {}", _0)]
    Stream(String),

    /// Response or stream frame did not decode
    #[display("Failed to deserialize response: {}", _0)]
    Deserialization(String),

    /// Client misconfigured
    #[display("Configuration error: {}", _0)]
    Configuration(String),
}

/// Error wrapper with location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Generation Error: {} at line {} in {}", kind, line, file)]
pub struct GenerationError {
    /// The error kind
    pub kind: GenerationErrorKind,
    /// Line number where error occurred
    pub line: u32,
    /// File where error occurred
    pub file: &'static str,
}

impl GenerationError {
    /// Create a new GenerationError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: GenerationErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }
}
