//! Axum-backed mock chat backend for end-to-end transport tests.

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};
use parking_lot::Mutex;
use parlor_rs_protocol::{
    Envelope, ResponseBatch, ResponseItem, SendMessageAck, SendMessageRequest, SessionId,
    WidgetUid,
};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

#[derive(Default)]
struct ServerState {
    sent: Mutex<Vec<SendMessageRequest>>,
    pending: Mutex<Vec<ResponseItem>>,
    assigned_uid: Mutex<Option<String>>,
    authorization: Mutex<Option<String>>,
    next_id: Mutex<i64>,
}

/// In-process chat backend implementing `send_message` and
/// `get_responses` with the production envelope shapes. Queued responses
/// are delivered once (undelivered semantics).
pub struct MockChatServer {
    addr: SocketAddr,
    state: Arc<ServerState>,
    handle: JoinHandle<()>,
}

impl MockChatServer {
    /// Bind to an ephemeral local port and start serving.
    pub async fn start() -> Self {
        let state = Arc::new(ServerState::default());
        let app = Router::new()
            .route("/send_message", post(send_message))
            .route("/get_responses", get(get_responses))
            .with_state(state.clone());
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        Self {
            addr,
            state,
            handle,
        }
    }

    /// Base URL clients should use as their endpoint.
    pub fn endpoint(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Make subsequent send acks carry a server-assigned uid.
    pub fn assign_uid(&self, uid: &str) {
        *self.state.assigned_uid.lock() = Some(uid.to_string());
    }

    /// Queue one agent response for the next poll.
    pub fn queue_response(&self, text: &str) {
        let mut next_id = self.state.next_id.lock();
        *next_id += 1;
        self.state.pending.lock().push(ResponseItem {
            id: Some(*next_id),
            response: text.to_string(),
            timestamp: Some(format!("2025-01-01 00:00:{:02}", *next_id % 60)),
            message_id: None,
        });
    }

    /// All messages received by the send endpoint, in order.
    pub fn sent(&self) -> Vec<SendMessageRequest> {
        self.state.sent.lock().clone()
    }

    /// The `Authorization` header captured from the most recent request.
    pub fn last_authorization(&self) -> Option<String> {
        self.state.authorization.lock().clone()
    }
}

impl Drop for MockChatServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

fn capture_authorization(state: &ServerState, headers: &HeaderMap) {
    *state.authorization.lock() = headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
}

async fn send_message(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    Json(request): Json<SendMessageRequest>,
) -> Json<Envelope<SendMessageAck>> {
    capture_authorization(&state, &headers);
    let message_id = {
        let mut sent = state.sent.lock();
        sent.push(request.clone());
        sent.len() as i64
    };
    let uid = state.assigned_uid.lock().clone().map(WidgetUid::new);
    Json(Envelope::ok(SendMessageAck {
        message_id: Some(message_id),
        session_id: Some(request.session_id),
        uid,
    }))
}

#[derive(Debug, Deserialize)]
struct ResponsesQuery {
    session_id: String,
    #[serde(default)]
    since: Option<String>,
}

async fn get_responses(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    Query(query): Query<ResponsesQuery>,
) -> Json<Envelope<ResponseBatch>> {
    capture_authorization(&state, &headers);
    let mut responses = std::mem::take(&mut *state.pending.lock());
    if let Some(since) = &query.since {
        responses.retain(|item| item.timestamp.as_deref() > Some(since.as_str()));
    }
    Json(Envelope::ok(ResponseBatch {
        session_id: Some(SessionId::new(query.session_id)),
        responses,
    }))
}
