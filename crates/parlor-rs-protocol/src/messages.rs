//! Request and response bodies for the send and poll endpoints.

use crate::{SessionId, WidgetUid};
use serde::{Deserialize, Serialize};

/// Body posted to the send endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendMessageRequest {
    /// Session the message belongs to.
    pub session_id: SessionId,
    /// User-authored message text.
    pub message: String,
    /// Anonymous user token, when the widget has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<WidgetUid>,
}

/// Acknowledgement payload returned by the send endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SendMessageAck {
    /// Row id assigned to the stored message.
    #[serde(default)]
    pub message_id: Option<i64>,
    /// Session id echoed back by the server.
    #[serde(default)]
    pub session_id: Option<SessionId>,
    /// Server-assigned uid; takes precedence over the client-generated one.
    #[serde(default)]
    pub uid: Option<WidgetUid>,
}

/// One agent response delivered by the poll endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseItem {
    /// Row id of the response.
    #[serde(default)]
    pub id: Option<i64>,
    /// Response text, rendered verbatim by the embedding application.
    pub response: String,
    /// Server-side timestamp, usable as a `since` cursor.
    #[serde(default)]
    pub timestamp: Option<String>,
    /// Row id of the message this responds to.
    #[serde(default)]
    pub message_id: Option<i64>,
}

/// Payload returned by the poll endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResponseBatch {
    /// Session id echoed back by the server.
    #[serde(default)]
    pub session_id: Option<SessionId>,
    /// Responses ordered by timestamp ascending.
    #[serde(default)]
    pub responses: Vec<ResponseItem>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Envelope;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn send_request_omits_missing_uid() {
        let request = SendMessageRequest {
            session_id: SessionId::new("session_1_abc"),
            message: "hello".to_string(),
            uid: None,
        };
        let encoded = serde_json::to_value(&request).expect("serialize");
        assert_eq!(
            encoded,
            json!({ "session_id": "session_1_abc", "message": "hello" })
        );
    }

    #[test]
    fn ack_decodes_from_server_shape() {
        let envelope: Envelope<SendMessageAck> = serde_json::from_value(json!({
            "success": true,
            "message": "Success",
            "data": { "message_id": 7, "session_id": "session_1_abc", "uid": "4f3a" }
        }))
        .expect("deserialize");
        let ack = envelope.into_result().expect("payload");
        assert_eq!(ack.message_id, Some(7));
        assert_eq!(ack.uid, Some(WidgetUid::new("4f3a")));
    }

    #[test]
    fn response_batch_decodes_items_in_order() {
        let envelope: Envelope<ResponseBatch> = serde_json::from_value(json!({
            "success": true,
            "data": {
                "session_id": "session_1_abc",
                "responses": [
                    { "id": 1, "response": "first", "timestamp": "2025-06-01 10:00:00", "message_id": 7 },
                    { "id": 2, "response": "second", "timestamp": "2025-06-01 10:00:05", "message_id": 7 }
                ]
            }
        }))
        .expect("deserialize");
        let batch = envelope.into_result().expect("payload");
        let texts: Vec<&str> = batch
            .responses
            .iter()
            .map(|item| item.response.as_str())
            .collect();
        assert_eq!(texts, vec!["first", "second"]);
    }

    #[test]
    fn response_batch_tolerates_missing_fields() {
        let batch: ResponseBatch =
            serde_json::from_value(json!({ "responses": [{ "response": "hi" }] }))
                .expect("deserialize");
        assert_eq!(batch.responses.len(), 1);
        assert_eq!(batch.responses[0].id, None);
    }
}
