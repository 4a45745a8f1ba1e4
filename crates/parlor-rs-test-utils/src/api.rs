//! Scripted in-memory transports for exercising the dispatcher and poller.

use async_trait::async_trait;
use parking_lot::Mutex;
use parlor_rs_core::{ChatApi, WidgetError};
use parlor_rs_protocol::{
    ResponseItem, SendMessageAck, SendMessageRequest, SessionId, WidgetUid,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Outcome queued for one scripted poll.
enum PollScript {
    Batch(Vec<ResponseItem>),
    Fail(String),
}

/// Transport double with scripted poll outcomes and recorded sends.
///
/// Polls consume the queued outcomes in order; once the queue is empty
/// every further poll returns an empty batch.
#[derive(Default)]
pub struct ScriptedChatApi {
    send_uid: Mutex<Option<WidgetUid>>,
    sent: Mutex<Vec<SendMessageRequest>>,
    polls: Mutex<VecDeque<PollScript>>,
    poll_calls: AtomicUsize,
}

impl ScriptedChatApi {
    /// Create a transport double with no scripted outcomes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent send acks carry a server-assigned uid.
    pub fn set_send_uid(&self, uid: &str) {
        *self.send_uid.lock() = Some(WidgetUid::new(uid));
    }

    /// Queue one poll outcome delivering the given response texts.
    pub fn push_batch(&self, texts: &[&str]) {
        let items = texts
            .iter()
            .enumerate()
            .map(|(index, text)| ResponseItem {
                id: Some(index as i64 + 1),
                response: (*text).to_string(),
                timestamp: None,
                message_id: None,
            })
            .collect();
        self.polls.lock().push_back(PollScript::Batch(items));
    }

    /// Queue one failing poll outcome.
    pub fn push_failure(&self, message: &str) {
        self.polls
            .lock()
            .push_back(PollScript::Fail(message.to_string()));
    }

    /// All recorded send requests, in order.
    pub fn sent(&self) -> Vec<SendMessageRequest> {
        self.sent.lock().clone()
    }

    /// Number of send requests recorded.
    pub fn send_count(&self) -> usize {
        self.sent.lock().len()
    }

    /// Number of poll requests recorded.
    pub fn poll_count(&self) -> usize {
        self.poll_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatApi for ScriptedChatApi {
    async fn send_message(
        &self,
        request: &SendMessageRequest,
    ) -> Result<SendMessageAck, WidgetError> {
        let message_id = {
            let mut sent = self.sent.lock();
            sent.push(request.clone());
            sent.len() as i64
        };
        Ok(SendMessageAck {
            message_id: Some(message_id),
            session_id: Some(request.session_id.clone()),
            uid: self.send_uid.lock().clone(),
        })
    }

    async fn get_responses(
        &self,
        _session_id: &SessionId,
        _since: Option<&str>,
    ) -> Result<Vec<ResponseItem>, WidgetError> {
        self.poll_calls.fetch_add(1, Ordering::SeqCst);
        match self.polls.lock().pop_front() {
            Some(PollScript::Batch(items)) => Ok(items),
            Some(PollScript::Fail(message)) => Err(WidgetError::Api(message)),
            None => Ok(Vec::new()),
        }
    }
}

/// Transport double whose every call fails.
#[derive(Default)]
pub struct FailingChatApi {
    send_calls: AtomicUsize,
    poll_calls: AtomicUsize,
}

impl FailingChatApi {
    /// Create a failing transport double.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of send attempts recorded.
    pub fn send_count(&self) -> usize {
        self.send_calls.load(Ordering::SeqCst)
    }

    /// Number of poll attempts recorded.
    pub fn poll_count(&self) -> usize {
        self.poll_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatApi for FailingChatApi {
    async fn send_message(
        &self,
        _request: &SendMessageRequest,
    ) -> Result<SendMessageAck, WidgetError> {
        self.send_calls.fetch_add(1, Ordering::SeqCst);
        Err(WidgetError::Api("scripted send failure".to_string()))
    }

    async fn get_responses(
        &self,
        _session_id: &SessionId,
        _since: Option<&str>,
    ) -> Result<Vec<ResponseItem>, WidgetError> {
        self.poll_calls.fetch_add(1, Ordering::SeqCst);
        Err(WidgetError::Api("scripted poll failure".to_string()))
    }
}
