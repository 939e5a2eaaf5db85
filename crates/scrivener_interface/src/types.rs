//! Core type definitions for the Scrivener interface.

use serde::{Deserialize, Serialize};

/// Health status of the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum HealthStatus {
    /// Server answered
    Healthy,
    /// Server answered but is missing the configured model
    Degraded {
        /// Description of the degradation
        message: String,
    },
    /// Server could not be reached
    Unhealthy {
        /// Description of the problem
        message: String,
    },
}

impl HealthStatus {
    /// Whether generation requests can be served.
    pub fn is_available(&self) -> bool {
        !matches!(self, Self::Unhealthy { .. })
    }
}
