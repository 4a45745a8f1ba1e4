//! End-to-end demo: a widget instance talking to the in-process mock
//! backend, printing transcript events as they arrive.

use anyhow::Result;
use log::info;
use parlor_rs::config::{PollingConfig, WidgetConfig};
use parlor_rs::core::ChatWidget;
use parlor_rs::protocol::{MessageAuthor, WidgetEvent, WidgetEventKind};
use parlor_rs_test_utils::MockChatServer;
use std::time::Duration;
use tokio_stream::StreamExt;

#[tokio::main]
async fn main() -> Result<()> {
    parlor_rs::init_logging();

    let server = MockChatServer::start().await;
    server.assign_uid("demo-uid");
    info!("mock backend listening at {}", server.endpoint());

    let config = WidgetConfig::builder("demo-key")
        .endpoint(server.endpoint())
        .title("Parlor demo")
        .polling(PollingConfig {
            interval_ms: 200,
            reply_interval_ms: 100,
            ..PollingConfig::default()
        })
        .build();
    let widget = ChatWidget::new(config)?;

    widget.subscribe(WidgetEventKind::Message, |event| {
        if let WidgetEvent::Message { message, author } = event {
            let label = match author {
                MessageAuthor::User => "you",
                MessageAuthor::Bot => "bot",
            };
            println!("[{label}] {message}");
        }
    });

    // Bounded reply watch after a send, independent of the open state.
    widget.send_message("hello").await?;
    server.queue_response("hi there");
    let replies = widget.wait_for_replies().await;
    println!("reply watch delivered {} item(s)", replies.len());

    // Continuous polling while the widget is open.
    let mut lifecycle = widget.events();
    widget.open();
    server.queue_response("anything else I can help with?");
    tokio::time::sleep(Duration::from_millis(500)).await;
    widget.close();

    while let Ok(Some(Ok(event))) =
        tokio::time::timeout(Duration::from_millis(50), lifecycle.next()).await
    {
        info!("stream observed event: {event:?}");
    }

    println!("final state: {:?}", widget.state());
    widget.destroy();
    Ok(())
}
