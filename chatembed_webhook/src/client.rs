use async_trait::async_trait;
use chatembed_core::{EndpointConfig, Message, MessageExchange};
use chatembed_session::SessionManager;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::error::ExchangeError;
use crate::reply::ReplyShape;

/// Reply used whenever the exchange fails outright.
pub const CONNECTION_FALLBACK_TEXT: &str =
    "Sorry, I'm having trouble connecting right now. Please try again.";

/// `message` reported by the workflow engine when the flow itself is misconfigured.
pub const WORKFLOW_ERROR_MESSAGE: &str = "Error in workflow";

/// Embedded-mode payload. History is not sent: the workflow keeps its own
/// memory keyed by session id.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExchangeRequest<'a> {
    chat_input: &'a str,
    session_id: &'a str,
}

pub struct WebhookClient {
    client: Client,
    endpoint: String,
    sessions: Arc<SessionManager>,
}

impl WebhookClient {
    pub fn new(client: Client, config: &EndpointConfig, sessions: Arc<SessionManager>) -> Self {
        info!("Creating WebhookClient for {}", config.remote_endpoint_url);
        Self {
            client,
            endpoint: config.remote_endpoint_url.clone(),
            sessions,
        }
    }

    /// Send one request and interpret the answer.
    async fn try_send(&self, text: &str, session_id: &str) -> Result<Message, ExchangeError> {
        let request = ExchangeRequest {
            chat_input: text,
            session_id,
        };
        debug!("Sending payload to webhook: {request:?}");

        let response = self.client.post(&self.endpoint).json(&request).send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            let body: Value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
            debug!("Webhook responded {status}: {body}");
            let message = body.get("message").and_then(Value::as_str);
            if status == StatusCode::INTERNAL_SERVER_ERROR && message == Some(WORKFLOW_ERROR_MESSAGE)
            {
                warn!("Workflow reported an internal error, answering with a degraded reply");
                return Ok(Self::degraded_reply(text, session_id));
            }
            return Err(ExchangeError::Status {
                status: status.as_u16(),
                message: message.unwrap_or("Unknown error").to_string(),
            });
        }

        let body: Value = serde_json::from_slice(&bytes)?;
        debug!("Webhook responded {status}: {body}");
        let text = ReplyShape::resolve(&body).into_text();
        Ok(Message::bot(text, Some(session_id.to_string())))
    }

    fn degraded_reply(text: &str, session_id: &str) -> Message {
        Message::bot(
            format!(
                "I received your message \"{text}\". The workflow is active but there may be an \
                 issue with the AI configuration or response format."
            ),
            Some(session_id.to_string()),
        )
        .flagged()
    }
}

#[async_trait]
impl MessageExchange for WebhookClient {
    async fn send(&self, message: &Message, _history: &[Message]) -> Message {
        let session = self.sessions.ensure_session().await;

        match self.try_send(&message.text, &session.id).await {
            Ok(reply) => reply,
            Err(e) => {
                if e.is_timeout() {
                    error!("Webhook did not answer in time: {e}");
                } else {
                    error!("Failed to send message: {e}");
                }
                Message::bot(CONNECTION_FALLBACK_TEXT, Some(session.id)).flagged()
            }
        }
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}
