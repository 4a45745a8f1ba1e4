//! Error types for the core widget crate.

use parlor_rs_config::ConfigError;
use parlor_rs_protocol::EnvelopeError;
use thiserror::Error;

/// Errors returned by widget operations.
#[derive(Debug, Error)]
pub enum WidgetError {
    /// Message text was empty or whitespace-only; nothing was sent.
    #[error("empty message")]
    EmptyMessage,
    /// Widget configuration failed validation.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    /// Network or protocol failure below the envelope.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// The server answered with a non-success HTTP status.
    #[error("unexpected http status: {0}")]
    Status(u16),
    /// The server reported an application-level failure.
    #[error("api error: {0}")]
    Api(String),
}

impl From<EnvelopeError> for WidgetError {
    fn from(err: EnvelopeError) -> Self {
        match err {
            EnvelopeError::Api(detail) => WidgetError::Api(detail),
            missing @ EnvelopeError::MissingData => WidgetError::Api(missing.to_string()),
        }
    }
}
