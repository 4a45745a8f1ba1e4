//! Response polling: a continuous fixed-interval loop with a bounded
//! consecutive-failure budget, plus a capped post-send reply watch.

use crate::events::EventBus;
use crate::transport::ChatApi;
use log::{debug, error, info, warn};
use parking_lot::Mutex;
use parlor_rs_config::PollingConfig;
use parlor_rs_protocol::{MessageAuthor, ResponseItem, SessionId, WidgetEvent};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::sleep;

/// Observable poller lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    /// Never started.
    Idle,
    /// The continuous loop is scheduled.
    Polling,
    /// Stopped explicitly or by exhausting the failure budget.
    Stopped,
}

/// Fixed-interval poller for one widget session.
///
/// Ticks are serialized: the next delay starts only after the in-flight
/// request resolves, so overlapping requests cannot occur. Stopping cancels
/// the pending delay immediately; an in-flight request is left to resolve
/// and its results are discarded behind the connected guard.
pub struct ResponsePoller {
    api: Arc<dyn ChatApi>,
    session_id: SessionId,
    events: EventBus,
    config: PollingConfig,
    state: Arc<Mutex<PollerState>>,
    connected: Arc<AtomicBool>,
    shutdown: Mutex<Option<Arc<Notify>>>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl ResponsePoller {
    /// Create an idle poller for a session.
    pub fn new(
        api: Arc<dyn ChatApi>,
        session_id: SessionId,
        events: EventBus,
        config: PollingConfig,
    ) -> Self {
        Self {
            api,
            session_id,
            events,
            config,
            state: Arc::new(Mutex::new(PollerState::Idle)),
            connected: Arc::new(AtomicBool::new(false)),
            shutdown: Mutex::new(None),
            handle: Mutex::new(None),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> PollerState {
        *self.state.lock()
    }

    /// Enter the continuous polling loop. Restarting resets the failure
    /// budget; calling while already polling is a no-op.
    pub fn start(&self) {
        {
            let mut state = self.state.lock();
            if *state == PollerState::Polling {
                debug!("poller already running (session_id={})", self.session_id);
                return;
            }
            *state = PollerState::Polling;
        }
        // A task from a previous run may still be draining an in-flight
        // request; it must not observe the new connected flag.
        if let Some(stale) = self.handle.lock().take() {
            stale.abort();
        }
        self.connected.store(true, Ordering::SeqCst);
        let shutdown = Arc::new(Notify::new());
        *self.shutdown.lock() = Some(shutdown.clone());

        info!(
            "starting response poller (session_id={}, interval_ms={}, max_failures={})",
            self.session_id, self.config.interval_ms, self.config.max_failures
        );
        let task = tokio::spawn(run_loop(
            self.api.clone(),
            self.session_id.clone(),
            self.events.clone(),
            self.config.clone(),
            self.state.clone(),
            self.connected.clone(),
            shutdown,
        ));
        *self.handle.lock() = Some(task);
    }

    /// Leave the polling loop: the pending delay is cancelled immediately
    /// and any in-flight request result is discarded.
    pub fn stop(&self) {
        let was_polling = {
            let mut state = self.state.lock();
            let was_polling = *state == PollerState::Polling;
            *state = PollerState::Stopped;
            was_polling
        };
        self.connected.store(false, Ordering::SeqCst);
        if let Some(shutdown) = self.shutdown.lock().take() {
            shutdown.notify_one();
        }
        if was_polling {
            info!("response poller stopped (session_id={})", self.session_id);
        }
    }

    /// Watch for replies to a just-sent message: up to
    /// `max_reply_polls` fixed-interval attempts, independent of the open
    /// state, stopping at the first non-empty batch.
    ///
    /// Poll failures are logged and consume an attempt. An exhausted budget
    /// returns an empty batch.
    pub async fn wait_for_replies(&self, since: Option<&str>) -> Vec<ResponseItem> {
        let max_polls = self.config.max_reply_polls;
        debug!(
            "watching for replies (session_id={}, max_polls={}, interval_ms={})",
            self.session_id, max_polls, self.config.reply_interval_ms
        );
        for attempt in 1..=max_polls {
            sleep(self.config.reply_interval()).await;
            match self.api.get_responses(&self.session_id, since).await {
                Ok(items) if !items.is_empty() => {
                    debug!(
                        "reply watch delivered (session_id={}, items={}, attempt={})",
                        self.session_id,
                        items.len(),
                        attempt
                    );
                    publish_batch(&self.events, &items);
                    return items;
                }
                Ok(_) => {}
                Err(err) => {
                    warn!(
                        "reply watch poll failed (session_id={}, attempt={}): {}",
                        self.session_id, attempt, err
                    );
                }
            }
        }
        info!(
            "stopped watching for replies (session_id={}, attempts={})",
            self.session_id, max_polls
        );
        Vec::new()
    }
}

/// Continuous polling loop body.
async fn run_loop(
    api: Arc<dyn ChatApi>,
    session_id: SessionId,
    events: EventBus,
    config: PollingConfig,
    state: Arc<Mutex<PollerState>>,
    connected: Arc<AtomicBool>,
    shutdown: Arc<Notify>,
) {
    let mut failures = 0u32;
    loop {
        tokio::select! {
            _ = shutdown.notified() => break,
            _ = sleep(config.interval()) => {}
        }
        if !connected.load(Ordering::SeqCst) {
            break;
        }
        match api.get_responses(&session_id, None).await {
            Ok(items) => {
                if !connected.load(Ordering::SeqCst) {
                    debug!(
                        "discarding poll results after stop (session_id={}, items={})",
                        session_id,
                        items.len()
                    );
                    break;
                }
                failures = 0;
                if !items.is_empty() {
                    debug!(
                        "poll delivered (session_id={}, items={})",
                        session_id,
                        items.len()
                    );
                    publish_batch(&events, &items);
                }
            }
            Err(err) => {
                if !connected.load(Ordering::SeqCst) {
                    break;
                }
                failures += 1;
                warn!(
                    "poll failed (session_id={}, consecutive_failures={}, max_failures={}): {}",
                    session_id, failures, config.max_failures, err
                );
                if failures >= config.max_failures {
                    error!(
                        "poll failure budget exhausted, stopping (session_id={})",
                        session_id
                    );
                    connected.store(false, Ordering::SeqCst);
                    *state.lock() = PollerState::Stopped;
                    break;
                }
            }
        }
    }
    debug!("poller loop exited (session_id={})", session_id);
}

/// Emit one bot message event per item, in server order.
fn publish_batch(events: &EventBus, items: &[ResponseItem]) {
    for item in items {
        events.publish(&WidgetEvent::Message {
            message: item.response.clone(),
            author: MessageAuthor::Bot,
        });
    }
}
