//! Widget controller: one session, one dispatcher, one poller, one bus.

use crate::error::WidgetError;
use crate::events::{EventBus, ListenerId};
use crate::poller::{PollerState, ResponsePoller};
use crate::session::Session;
use crate::transport::{ChatApi, HttpChatApi};
use log::{debug, info};
use parlor_rs_config::WidgetConfig;
use parlor_rs_protocol::{
    MessageAuthor, ResponseItem, SendMessageAck, SendMessageRequest, SessionId, WidgetEvent,
    WidgetEventKind, WidgetUid,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio_stream::wrappers::BroadcastStream;

/// Broadcast buffer for stream consumers.
const EVENT_BUFFER: usize = 128;

/// Point-in-time snapshot of a widget instance.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetState {
    /// Immutable session token.
    pub session_id: SessionId,
    /// Current uid token.
    pub uid: WidgetUid,
    /// Whether the widget is open.
    pub is_open: bool,
    /// Transcript messages appended so far (user and bot).
    pub message_count: u64,
    /// Bot messages received while closed; reset on open.
    pub unread_count: u64,
    /// Poller lifecycle state.
    pub poller: PollerState,
}

/// Controller owning the session, transport, poller, and event bus for one
/// embedded widget instance. Instances share no state with each other.
pub struct ChatWidget {
    config: WidgetConfig,
    session: Arc<Session>,
    api: Arc<dyn ChatApi>,
    events: EventBus,
    poller: ResponsePoller,
    is_open: Arc<AtomicBool>,
    message_count: Arc<AtomicU64>,
    unread_count: Arc<AtomicU64>,
}

impl ChatWidget {
    /// Build a widget with an HTTP transport derived from the config.
    ///
    /// Must be called within a Tokio runtime; the poller task is spawned on
    /// open. Honors `auto_open`.
    pub fn new(config: WidgetConfig) -> Result<Self, WidgetError> {
        let api = Arc::new(HttpChatApi::from_config(&config));
        Self::with_api(config, api)
    }

    /// Build a widget around an injected transport.
    pub fn with_api(config: WidgetConfig, api: Arc<dyn ChatApi>) -> Result<Self, WidgetError> {
        config.validate()?;
        let session = Arc::new(Session::new());
        let events = EventBus::new(EVENT_BUFFER);
        let poller = ResponsePoller::new(
            api.clone(),
            session.session_id().clone(),
            events.clone(),
            config.polling.clone(),
        );

        let is_open = Arc::new(AtomicBool::new(false));
        let message_count = Arc::new(AtomicU64::new(0));
        let unread_count = Arc::new(AtomicU64::new(0));

        // Transcript bookkeeping rides the same bus as external listeners.
        {
            let is_open = is_open.clone();
            let message_count = message_count.clone();
            let unread_count = unread_count.clone();
            let notifications = config.notifications;
            events.subscribe(WidgetEventKind::Message, move |event| {
                let WidgetEvent::Message { author, .. } = event else {
                    return;
                };
                message_count.fetch_add(1, Ordering::SeqCst);
                if notifications
                    && matches!(author, MessageAuthor::Bot)
                    && !is_open.load(Ordering::SeqCst)
                {
                    unread_count.fetch_add(1, Ordering::SeqCst);
                }
            });
        }

        let widget = Self {
            config,
            session,
            api,
            events,
            poller,
            is_open,
            message_count,
            unread_count,
        };
        if widget.config.auto_open {
            widget.open();
        }
        Ok(widget)
    }

    /// Open the widget: clears unread messages, emits `Opened`, and starts
    /// the continuous poller. Idempotent.
    pub fn open(&self) {
        if self.is_open.swap(true, Ordering::SeqCst) {
            debug!("widget already open (session_id={})", self.session_id());
            return;
        }
        info!("opening widget (session_id={})", self.session_id());
        self.unread_count.store(0, Ordering::SeqCst);
        self.events.publish(&WidgetEvent::Opened);
        self.poller.start();
    }

    /// Close the widget: stops the poller and emits `Closed`. Idempotent.
    pub fn close(&self) {
        if !self.is_open.swap(false, Ordering::SeqCst) {
            debug!("widget already closed (session_id={})", self.session_id());
            return;
        }
        info!("closing widget (session_id={})", self.session_id());
        self.poller.stop();
        self.events.publish(&WidgetEvent::Closed);
    }

    /// Tear the widget down: close it and drop every listener. The session
    /// tokens remain readable but the instance is inert afterwards.
    pub fn destroy(&self) {
        info!("destroying widget (session_id={})", self.session_id());
        self.close();
        self.events.clear();
    }

    /// Dispatch one user message to the send endpoint.
    ///
    /// Empty or whitespace-only text is rejected before any network
    /// activity. A server-assigned uid in the ack replaces the stored one.
    /// Sends are never retried here; the caller decides whether to resend.
    pub async fn send_message(&self, text: &str) -> Result<SendMessageAck, WidgetError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(WidgetError::EmptyMessage);
        }
        let request = SendMessageRequest {
            session_id: self.session_id().clone(),
            message: text.to_string(),
            uid: Some(self.session.uid()),
        };
        debug!(
            "dispatching message (session_id={}, message_len={})",
            request.session_id,
            request.message.len()
        );
        let ack = self.api.send_message(&request).await?;
        if let Some(uid) = ack.uid.clone() {
            self.session.adopt_uid(uid);
        }
        self.events.publish(&WidgetEvent::Message {
            message: text.to_string(),
            author: MessageAuthor::User,
        });
        Ok(ack)
    }

    /// Bounded reply watch after a send: polls at the reply interval up to
    /// the configured attempt budget regardless of the open state, stopping
    /// at the first non-empty batch.
    pub async fn wait_for_replies(&self) -> Vec<ResponseItem> {
        self.poller.wait_for_replies(None).await
    }

    /// Bounded reply watch with a `since` cursor.
    pub async fn wait_for_replies_since(&self, since: &str) -> Vec<ResponseItem> {
        self.poller.wait_for_replies(Some(since)).await
    }

    /// Register an event listener.
    pub fn subscribe(
        &self,
        kind: WidgetEventKind,
        listener: impl Fn(&WidgetEvent) + Send + Sync + 'static,
    ) -> ListenerId {
        self.events.subscribe(kind, listener)
    }

    /// Remove an event listener by id.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Async stream over all widget events.
    pub fn events(&self) -> BroadcastStream<WidgetEvent> {
        self.events.stream()
    }

    /// The immutable session token.
    pub fn session_id(&self) -> &SessionId {
        self.session.session_id()
    }

    /// The current uid token.
    pub fn uid(&self) -> WidgetUid {
        self.session.uid()
    }

    /// Whether the widget is open.
    pub fn is_open(&self) -> bool {
        self.is_open.load(Ordering::SeqCst)
    }

    /// The active configuration.
    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    /// Point-in-time snapshot of the widget.
    pub fn state(&self) -> WidgetState {
        WidgetState {
            session_id: self.session_id().clone(),
            uid: self.session.uid(),
            is_open: self.is_open(),
            message_count: self.message_count.load(Ordering::SeqCst),
            unread_count: self.unread_count.load(Ordering::SeqCst),
            poller: self.poller.state(),
        }
    }
}
