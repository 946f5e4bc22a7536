#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

//! Shared model for the embeddable chat client.
//!
//! Every other crate in the workspace speaks in these types: the message
//! shape exchanged with the UI and the history backend, the session
//! identity, the endpoint configuration, and the two seams the
//! conversation controller is generic over.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

pub mod ids;
mod message;

pub use message::{Message, MessageId, Sender};

/// Logical conversation identity shared between client and backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub origin: String,
}

/// Read-only view of the current session, for diagnostics and persistence.
///
/// Both fields are `None` before the first session is established and
/// after a reset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInfo {
    pub session_id: Option<String>,
    pub origin: Option<String>,
}

impl From<&Session> for SessionInfo {
    fn from(session: &Session) -> Self {
        Self {
            session_id: Some(session.id.clone()),
            origin: Some(session.origin.clone()),
        }
    }
}

/// Network configuration, fixed for the lifetime of a client instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    /// History/session backend. `None` disables registration and persistence.
    pub base_url: Option<String>,
    /// Workflow webhook that produces bot replies.
    pub remote_endpoint_url: String,
    /// Bearer token for the history/session backend.
    pub api_key: Option<String>,
    /// Origin reported to the backend when a session is created.
    pub origin: String,
    /// Upper bound for any single outbound request. `None` waits forever.
    pub request_timeout: Option<Duration>,
}

impl EndpointConfig {
    pub const DEFAULT_ORIGIN: &'static str = "http://localhost";
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

    #[must_use]
    pub fn new(remote_endpoint_url: impl Into<String>) -> Self {
        Self {
            base_url: None,
            remote_endpoint_url: remote_endpoint_url.into(),
            api_key: None,
            origin: Self::DEFAULT_ORIGIN.to_string(),
            request_timeout: Some(Self::DEFAULT_TIMEOUT),
        }
    }

    /// Set the history backend. Blank values leave persistence disabled.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = non_blank(base_url.into()).map(|url| url.trim_end_matches('/').to_string());
        self
    }

    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = non_blank(api_key.into());
        self
    }

    #[must_use]
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Whether registration and transcript persistence are enabled.
    #[must_use]
    pub const fn persistence_enabled(&self) -> bool {
        self.base_url.is_some()
    }
}

fn non_blank(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Remote copy of the transcript.
///
/// Implementations fail soft: nothing here can interrupt a conversation.
#[async_trait]
pub trait TranscriptStore: Send + Sync {
    /// Messages previously saved for `session_id`, oldest first.
    async fn load(&self, session_id: Option<&str>) -> Vec<Message>;

    /// Append `message` to the remote log of `session`.
    async fn save(&self, message: &Message, session: &SessionInfo);

    /// Whether calls reach a backend at all.
    fn is_enabled(&self) -> bool;
}

/// One request/response cycle with the bot backend.
#[async_trait]
pub trait MessageExchange: Send + Sync {
    /// Exchange `message` for a bot reply.
    ///
    /// Never fails: every failure is folded into a bot message with
    /// `error` set.
    async fn send(&self, message: &Message, history: &[Message]) -> Message;

    /// Where replies come from, for diagnostics.
    fn endpoint(&self) -> &str;
}

#[async_trait]
impl<T: TranscriptStore + ?Sized> TranscriptStore for Arc<T> {
    async fn load(&self, session_id: Option<&str>) -> Vec<Message> {
        (**self).load(session_id).await
    }

    async fn save(&self, message: &Message, session: &SessionInfo) {
        (**self).save(message, session).await;
    }

    fn is_enabled(&self) -> bool {
        (**self).is_enabled()
    }
}

#[async_trait]
impl<T: MessageExchange + ?Sized> MessageExchange for Arc<T> {
    async fn send(&self, message: &Message, history: &[Message]) -> Message {
        (**self).send(message, history).await
    }

    fn endpoint(&self) -> &str {
        (**self).endpoint()
    }
}
