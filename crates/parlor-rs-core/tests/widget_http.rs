//! End-to-end widget tests against the axum mock backend.

use parking_lot::Mutex;
use parlor_rs_config::{PollingConfig, WidgetConfig};
use parlor_rs_core::ChatWidget;
use parlor_rs_protocol::{MessageAuthor, WidgetEvent, WidgetEventKind, WidgetUid};
use parlor_rs_test_utils::MockChatServer;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

fn config_for(server: &MockChatServer) -> WidgetConfig {
    WidgetConfig::builder("k1")
        .endpoint(server.endpoint())
        .polling(PollingConfig {
            interval_ms: 20,
            max_failures: 3,
            reply_interval_ms: 10,
            max_reply_polls: 10,
        })
        .build()
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    for _ in 0..200 {
        if condition() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("condition not reached within timeout");
}

#[tokio::test]
async fn round_trip_against_mock_backend() {
    let server = MockChatServer::start().await;
    server.assign_uid("uid-from-server");
    let widget = ChatWidget::new(config_for(&server)).expect("widget");

    let received = Arc::new(Mutex::new(Vec::new()));
    let sink = received.clone();
    widget.subscribe(WidgetEventKind::Message, move |event| {
        if let WidgetEvent::Message { message, author } = event {
            sink.lock().push((message.clone(), *author));
        }
    });

    let ack = widget.send_message("hello").await.expect("send");
    assert_eq!(ack.message_id, Some(1));
    assert_eq!(widget.uid(), WidgetUid::new("uid-from-server"));

    let sent = server.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].message, "hello");
    assert_eq!(sent[0].session_id, *widget.session_id());
    assert_eq!(
        server.last_authorization().as_deref(),
        Some("Bearer k1"),
    );

    server.queue_response("hi there");
    widget.open();
    wait_until(|| received.lock().len() == 2).await;
    widget.close();

    assert_eq!(
        *received.lock(),
        vec![
            ("hello".to_string(), MessageAuthor::User),
            ("hi there".to_string(), MessageAuthor::Bot),
        ]
    );
}

#[tokio::test]
async fn reply_watch_collects_responses_over_http() {
    let server = MockChatServer::start().await;
    let widget = ChatWidget::new(config_for(&server)).expect("widget");

    widget.send_message("anyone there?").await.expect("send");
    server.queue_response("yes");
    let replies = widget.wait_for_replies().await;
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].response, "yes");
}

#[tokio::test]
async fn backend_failure_surfaces_as_an_api_error() {
    let server = MockChatServer::start().await;
    let widget = ChatWidget::new(config_for(&server)).expect("widget");

    // The mock accepts anything; a dead endpoint exercises the transport
    // failure path instead.
    drop(server);
    tokio::time::sleep(Duration::from_millis(20)).await;
    let err = widget.send_message("hello").await.expect_err("dead server");
    assert!(matches!(
        err,
        parlor_rs_core::WidgetError::Transport(_)
    ));
}
