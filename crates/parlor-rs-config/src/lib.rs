//! Configuration models and loading for the widget client.
//!
//! This crate owns the widget config schema, its builder, and JSON5
//! loading. Unrecognized keys in config sources are ignored.

mod error;
mod model;

/// Public error type returned by config loading and validation APIs.
pub use error::ConfigError;
/// Configuration schema models.
pub use model::*;
