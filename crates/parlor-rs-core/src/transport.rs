//! HTTP transport for the send and poll endpoints.

use crate::error::WidgetError;
use async_trait::async_trait;
use log::debug;
use parlor_rs_config::WidgetConfig;
use parlor_rs_protocol::{
    Envelope, ResponseBatch, ResponseItem, SendMessageAck, SendMessageRequest, SessionId,
};
use reqwest::{Client, RequestBuilder};

/// Transport interface toward the chat backend.
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Post one user message to the send endpoint.
    async fn send_message(
        &self,
        request: &SendMessageRequest,
    ) -> Result<SendMessageAck, WidgetError>;

    /// Query the poll endpoint for undelivered responses, optionally
    /// bounded by a `since` cursor.
    async fn get_responses(
        &self,
        session_id: &SessionId,
        since: Option<&str>,
    ) -> Result<Vec<ResponseItem>, WidgetError>;
}

/// Reqwest-backed transport with optional bearer auth.
pub struct HttpChatApi {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpChatApi {
    /// Create a transport against a backend base URL.
    pub fn new(endpoint: impl Into<String>, api_key: Option<String>) -> Self {
        let endpoint = endpoint.into().trim_end_matches('/').to_string();
        Self {
            client: Client::new(),
            endpoint,
            api_key,
        }
    }

    /// Create a transport from widget configuration.
    pub fn from_config(config: &WidgetConfig) -> Self {
        let api_key = (!config.api_key.trim().is_empty()).then(|| config.api_key.clone());
        Self::new(config.endpoint.clone(), api_key)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.endpoint, path)
    }

    fn authorize(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }
}

#[async_trait]
impl ChatApi for HttpChatApi {
    async fn send_message(
        &self,
        request: &SendMessageRequest,
    ) -> Result<SendMessageAck, WidgetError> {
        debug!(
            "posting message (session_id={}, message_len={})",
            request.session_id,
            request.message.len()
        );
        let response = self
            .authorize(self.client.post(self.url("send_message")))
            .json(request)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(WidgetError::Status(status.as_u16()));
        }
        let envelope: Envelope<SendMessageAck> = response.json().await?;
        Ok(envelope.into_result()?)
    }

    async fn get_responses(
        &self,
        session_id: &SessionId,
        since: Option<&str>,
    ) -> Result<Vec<ResponseItem>, WidgetError> {
        let mut query: Vec<(&str, &str)> = vec![("session_id", session_id.as_str())];
        if let Some(since) = since {
            query.push(("since", since));
        }
        let response = self
            .authorize(self.client.get(self.url("get_responses")))
            .query(&query)
            .send()
            .await?;
        let status = response.status();
        if !status.is_success() {
            return Err(WidgetError::Status(status.as_u16()));
        }
        let envelope: Envelope<ResponseBatch> = response.json().await?;
        Ok(envelope.into_result()?.responses)
    }
}

#[cfg(test)]
mod tests {
    use super::HttpChatApi;
    use parlor_rs_config::WidgetConfig;

    #[test]
    fn endpoint_trailing_slash_is_normalized() {
        let api = HttpChatApi::new("http://127.0.0.1:9/chat/api/", None);
        assert_eq!(api.url("send_message"), "http://127.0.0.1:9/chat/api/send_message");
    }

    #[test]
    fn from_config_skips_blank_api_key() {
        let mut config = WidgetConfig::builder("k1").build();
        config.api_key = "  ".to_string();
        let api = HttpChatApi::from_config(&config);
        assert!(api.api_key.is_none());
    }
}
