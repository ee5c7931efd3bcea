//! Production transport: REST over HTTP, live events over WebSocket.

use async_trait::async_trait;
use futures::StreamExt;
use serde::Deserialize;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tradepost_core::types::DbId;
use tradepost_db::models::message::Message;
use tradepost_events::ChatEvent;

use crate::error::ClientError;
use crate::transport::{ChatTransport, EventStream};

/// `{ "data": ... }` envelope used by list endpoints.
#[derive(Debug, Deserialize)]
struct DataEnvelope<T> {
    data: T,
}

/// HTTP + WebSocket transport against a tradepost API server.
pub struct HttpTransport {
    http: reqwest::Client,
    /// REST base, e.g. `http://localhost:3000/api/v1`.
    base_url: String,
    /// WebSocket base, e.g. `ws://localhost:3000/api/v1`.
    ws_base_url: String,
    /// Bearer token identifying the principal.
    token: String,
}

impl HttpTransport {
    /// Build a transport for the API served at `base_url` (scheme +
    /// authority + `/api/v1`), authenticating with `token`.
    ///
    /// The WebSocket base is derived by swapping the URL scheme
    /// (`http` -> `ws`, `https` -> `wss`).
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        let base_url = base_url.into();
        let ws_base_url = if let Some(rest) = base_url.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = base_url.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            base_url.clone()
        };

        Self {
            http: reqwest::Client::new(),
            base_url,
            ws_base_url,
            token: token.into(),
        }
    }

    /// Map a non-success response to [`ClientError::Api`].
    async fn check(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(ClientError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn fetch_history(&self, conversation_id: DbId) -> Result<Vec<Message>, ClientError> {
        let url = format!("{}/conversations/{conversation_id}/messages", self.base_url);
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await?;
        let envelope: DataEnvelope<Vec<Message>> = Self::check(response).await?.json().await?;
        Ok(envelope.data)
    }

    async fn send_message(
        &self,
        conversation_id: DbId,
        content: &str,
    ) -> Result<Message, ClientError> {
        let url = format!("{}/conversations/{conversation_id}/messages", self.base_url);
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.token)
            .json(&serde_json::json!({ "content": content }))
            .send()
            .await?;
        let message = Self::check(response).await?.json().await?;
        Ok(message)
    }

    async fn send_presence(
        &self,
        conversation_id: DbId,
        user_id: DbId,
    ) -> Result<(), ClientError> {
        let url = format!("{}/presence", self.base_url);
        let response = self
            .http
            .post(url)
            .json(&serde_json::json!({
                "conversationId": conversation_id,
                "userId": user_id,
            }))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn subscribe(&self, conversation_id: DbId) -> Result<EventStream, ClientError> {
        let url = format!("{}/ws/conversations/{conversation_id}", self.ws_base_url);
        let (socket, _response) = connect_async(url).await?;

        // Frames that are not valid chat events (pings, malformed text)
        // are skipped; the stream ends when the socket closes.
        let events = socket.filter_map(|frame| async move {
            match frame {
                Ok(WsMessage::Text(text)) => match serde_json::from_str::<ChatEvent>(&text) {
                    Ok(event) => Some(event),
                    Err(e) => {
                        tracing::debug!(error = %e, "Skipping undecodable frame");
                        None
                    }
                },
                Ok(_) => None,
                Err(e) => {
                    tracing::debug!(error = %e, "WebSocket receive error");
                    None
                }
            }
        });

        Ok(Box::pin(events))
    }
}
