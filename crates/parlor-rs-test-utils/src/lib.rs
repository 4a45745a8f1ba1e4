//! Test helpers shared across parlor crates.

pub mod api;
pub mod server;

pub use api::{FailingChatApi, ScriptedChatApi};
pub use server::MockChatServer;
