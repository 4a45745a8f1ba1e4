mod tests {
    use parlor_rs_core::ChatWidget;
    use parlor_rs_core::WidgetError;
    use parlor_rs_core::PollerState;
    use parking_lot::Mutex;
    use parlor_rs_config::{PollingConfig, WidgetConfig};
    use parlor_rs_protocol::{MessageAuthor, WidgetEvent, WidgetEventKind, WidgetUid};
    use parlor_rs_test_utils::ScriptedChatApi;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use std::time::Duration;

    fn test_config() -> WidgetConfig {
        WidgetConfig::builder("k1")
            .polling(PollingConfig {
                interval_ms: 10,
                max_failures: 3,
                reply_interval_ms: 5,
                max_reply_polls: 4,
            })
            .build()
    }

    fn widget_with(api: Arc<ScriptedChatApi>) -> ChatWidget {
        ChatWidget::with_api(test_config(), api).expect("widget")
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
    async fn empty_message_is_rejected_without_a_network_call() {
        let api = Arc::new(ScriptedChatApi::new());
        let widget = widget_with(api.clone());

        let err = widget.send_message("   ").await.expect_err("empty");
        assert!(matches!(err, WidgetError::EmptyMessage));
        assert_eq!(api.send_count(), 0);
    }

    #[tokio::test]
    async fn server_uid_replaces_the_client_generated_one() {
        let api = Arc::new(ScriptedChatApi::new());
        api.set_send_uid("server-uid");
        let widget = widget_with(api.clone());
        let before = widget.uid();

        widget.send_message("hello").await.expect("send");
        assert_eq!(widget.uid(), WidgetUid::new("server-uid"));
        assert_ne!(widget.uid(), before);

        let sent = api.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].message, "hello");
        assert_eq!(sent[0].uid.as_ref(), Some(&before));
    }

    #[tokio::test]
    async fn client_uid_is_retained_when_the_ack_has_none() {
        let api = Arc::new(ScriptedChatApi::new());
        let widget = widget_with(api.clone());
        let before = widget.uid();

        widget.send_message("hello").await.expect("send");
        assert_eq!(widget.uid(), before);
    }

    #[tokio::test]
    async fn message_text_is_trimmed_before_dispatch() {
        let api = Arc::new(ScriptedChatApi::new());
        let widget = widget_with(api.clone());

        widget.send_message("  hello  ").await.expect("send");
        assert_eq!(api.sent()[0].message, "hello");
    }

    #[tokio::test]
    async fn open_and_close_gate_the_poller() {
        let api = Arc::new(ScriptedChatApi::new());
        let widget = widget_with(api.clone());
        assert_eq!(widget.state().poller, PollerState::Idle);

        widget.open();
        assert!(widget.is_open());
        wait_until(|| api.poll_count() >= 2).await;

        widget.close();
        assert!(!widget.is_open());
        assert_eq!(widget.state().poller, PollerState::Stopped);
        // Settle so a tick racing the close call is counted before sampling.
        tokio::time::sleep(Duration::from_millis(30)).await;
        let counted = api.poll_count();
        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(api.poll_count(), counted);

        widget.open();
        wait_until(|| api.poll_count() > counted).await;
        widget.close();
    }

    #[tokio::test]
    async fn lifecycle_events_fire_once_per_transition() {
        let api = Arc::new(ScriptedChatApi::new());
        let widget = widget_with(api);
        let log = Arc::new(Mutex::new(Vec::new()));

        let opens = log.clone();
        widget.subscribe(WidgetEventKind::Open, move |_| opens.lock().push("open"));
        let closes = log.clone();
        widget.subscribe(WidgetEventKind::Close, move |_| closes.lock().push("close"));

        widget.open();
        widget.open();
        widget.close();
        widget.close();
        assert_eq!(*log.lock(), vec!["open", "close"]);
    }

    #[tokio::test]
    async fn transcript_counters_track_messages_and_unread() {
        let api = Arc::new(ScriptedChatApi::new());
        api.push_batch(&["hi there"]);
        let widget = widget_with(api.clone());

        widget.send_message("hello").await.expect("send");
        assert_eq!(widget.state().message_count, 1);
        assert_eq!(widget.state().unread_count, 0);

        // Replies collected while closed count as unread.
        let replies = widget.wait_for_replies().await;
        assert_eq!(replies.len(), 1);
        assert_eq!(widget.state().message_count, 2);
        assert_eq!(widget.state().unread_count, 1);

        // Opening clears the unread badge.
        widget.open();
        assert_eq!(widget.state().unread_count, 0);
        widget.close();
    }

    #[tokio::test]
    async fn destroy_silences_listeners() {
        let api = Arc::new(ScriptedChatApi::new());
        let widget = widget_with(api);
        let hits = Arc::new(Mutex::new(0u32));

        let counting = hits.clone();
        widget.subscribe(WidgetEventKind::Open, move |_| *counting.lock() += 1);
        widget.open();
        assert_eq!(*hits.lock(), 1);

        widget.destroy();
        widget.open();
        assert_eq!(*hits.lock(), 1);
    }

    #[tokio::test]
    async fn auto_open_starts_polling_at_construction() {
        let api = Arc::new(ScriptedChatApi::new());
        let mut config = test_config();
        config.auto_open = true;
        let widget = ChatWidget::with_api(config, api.clone()).expect("widget");

        assert!(widget.is_open());
        wait_until(|| api.poll_count() >= 1).await;
        widget.close();
    }
}
