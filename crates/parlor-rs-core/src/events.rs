//! Event bus for widget lifecycle and transcript events.
//!
//! Callback listeners run in registration order and are isolated from each
//! other: a panicking listener is caught and logged, never propagated. A
//! broadcast channel fans the same events out to async stream consumers.

use log::{debug, error};
use parking_lot::Mutex;
use parlor_rs_protocol::{EventSink, WidgetEvent, WidgetEventKind};
use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;
use uuid::Uuid;

/// Handle returned by `subscribe`, required to unsubscribe.
pub type ListenerId = Uuid;

type Listener = Arc<dyn Fn(&WidgetEvent) + Send + Sync>;

/// Broadcast-and-callback event bus shared by one widget instance.
#[derive(Clone)]
pub struct EventBus {
    listeners: Arc<Mutex<HashMap<WidgetEventKind, Vec<(ListenerId, Listener)>>>>,
    sender: broadcast::Sender<WidgetEvent>,
}

impl EventBus {
    /// Create a new event bus with the given broadcast buffer size.
    pub fn new(buffer: usize) -> Self {
        let (sender, _) = broadcast::channel(buffer);
        debug!("event bus initialized (buffer={})", buffer);
        Self {
            listeners: Arc::new(Mutex::new(HashMap::new())),
            sender,
        }
    }

    /// Register a listener for one event kind; listeners for a kind run in
    /// registration order.
    pub fn subscribe(
        &self,
        kind: WidgetEventKind,
        listener: impl Fn(&WidgetEvent) + Send + Sync + 'static,
    ) -> ListenerId {
        let id = Uuid::new_v4();
        self.listeners
            .lock()
            .entry(kind)
            .or_default()
            .push((id, Arc::new(listener)));
        debug!("listener registered (kind={:?}, listener_id={})", kind, id);
        id
    }

    /// Remove a listener by id; returns false when the id is unknown.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock();
        for entries in listeners.values_mut() {
            if let Some(index) = entries.iter().position(|(entry_id, _)| *entry_id == id) {
                entries.remove(index);
                debug!("listener removed (listener_id={})", id);
                return true;
            }
        }
        false
    }

    /// Subscribe to the event stream as an async consumer. A lagging
    /// consumer may miss events; callback listeners never do.
    pub fn stream(&self) -> BroadcastStream<WidgetEvent> {
        BroadcastStream::new(self.sender.subscribe())
    }

    /// Deliver an event to matching listeners in registration order, then
    /// fan out to stream consumers.
    pub fn publish(&self, event: &WidgetEvent) {
        let kind = event.kind();
        let matching: Vec<(ListenerId, Listener)> = self
            .listeners
            .lock()
            .get(&kind)
            .map(|entries| entries.clone())
            .unwrap_or_default();
        for (id, listener) in matching {
            if catch_unwind(AssertUnwindSafe(|| listener(event))).is_err() {
                error!(
                    "event listener panicked (kind={:?}, listener_id={})",
                    kind, id
                );
            }
        }
        let _ = self.sender.send(event.clone());
    }

    /// Drop every registered listener.
    pub(crate) fn clear(&self) {
        self.listeners.lock().clear();
    }
}

impl EventSink for EventBus {
    /// Emit an event into the bus.
    fn emit(&self, event: WidgetEvent) {
        self.publish(&event);
    }
}
