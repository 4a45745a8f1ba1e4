//! The `{success, data|error}` JSON wrapper used by every endpoint.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while unwrapping an [`Envelope`].
#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// The server reported an application-level failure.
    #[error("api error: {0}")]
    Api(String),
    /// The envelope claimed success but carried no data payload.
    #[error("missing data payload in successful envelope")]
    MissingData,
}

/// JSON wrapper shared by all endpoints in this system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    /// Whether the request was handled successfully.
    pub success: bool,
    /// Optional human-readable status line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Payload present on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Error description present on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> Envelope<T> {
    /// Build a success envelope around a payload.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: Some("Success".to_string()),
            data: Some(data),
            error: None,
        }
    }

    /// Build a failure envelope with an error description.
    pub fn err(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            data: None,
            error: Some(error.into()),
        }
    }

    /// Unwrap the payload, mapping `success=false` and missing data to
    /// errors.
    pub fn into_result(self) -> Result<T, EnvelopeError> {
        if !self.success {
            let detail = self
                .error
                .or(self.message)
                .unwrap_or_else(|| "request failed".to_string());
            return Err(EnvelopeError::Api(detail));
        }
        self.data.ok_or(EnvelopeError::MissingData)
    }
}
