//! Wire protocol types for the parlor chat widget: tokens, the JSON
//! envelope, request/response bodies, and widget events.

mod envelope;
mod messages;

pub use envelope::{Envelope, EnvelopeError};
pub use messages::{ResponseBatch, ResponseItem, SendMessageAck, SendMessageRequest};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque client-generated token correlating all requests for one widget
/// instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Wrap an existing token value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the raw token.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque anonymous user token attached to sends alongside the session id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WidgetUid(String);

impl WidgetUid {
    /// Wrap an existing token value.
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrow the raw token.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WidgetUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Author of a transcript message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MessageAuthor {
    /// Message typed by the end user.
    User,
    /// Message produced by the remote agent.
    Bot,
}

/// All events emitted by a widget instance toward the embedding
/// application.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case", tag = "type", content = "payload")]
pub enum WidgetEvent {
    /// The widget became open.
    Opened,
    /// The widget was closed.
    Closed,
    /// A transcript message was appended.
    Message {
        message: String,
        author: MessageAuthor,
    },
}

impl WidgetEvent {
    /// Event kind used for listener registration.
    pub fn kind(&self) -> WidgetEventKind {
        match self {
            WidgetEvent::Opened => WidgetEventKind::Open,
            WidgetEvent::Closed => WidgetEventKind::Close,
            WidgetEvent::Message { .. } => WidgetEventKind::Message,
        }
    }
}

/// Listener registration key for [`WidgetEvent`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WidgetEventKind {
    /// Open lifecycle events.
    Open,
    /// Close lifecycle events.
    Close,
    /// Transcript message events.
    Message,
}

/// Sink interface for widget events.
pub trait EventSink: Send + Sync {
    /// Emit an event to downstream listeners.
    fn emit(&self, event: WidgetEvent);
}
