use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::ids;

/// Who authored a message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Bot,
}

/// Opaque message identifier.
///
/// Older history records carry numeric ids, so both JSON strings and
/// numbers are accepted when reading.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct MessageId(String);

impl MessageId {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for MessageId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(serde_json::Number),
        }

        Ok(match Raw::deserialize(deserializer)? {
            Raw::Text(text) => Self(text),
            Raw::Number(number) => Self(number.to_string()),
        })
    }
}

/// One entry of the transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: MessageId,
    pub text: String,
    pub sender: Sender,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    /// Set when the message is a degraded or fallback reply.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub error: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

impl Message {
    /// A fresh message typed by the user.
    #[must_use]
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: ids::message_id("user"),
            text: text.into(),
            sender: Sender::User,
            timestamp: Utc::now(),
            error: false,
            session_id: None,
        }
    }

    /// A fresh bot reply belonging to `session_id`.
    #[must_use]
    pub fn bot(text: impl Into<String>, session_id: Option<String>) -> Self {
        Self {
            id: ids::message_id("bot"),
            text: text.into(),
            sender: Sender::Bot,
            timestamp: Utc::now(),
            error: false,
            session_id,
        }
    }

    /// Mark the message as a degraded reply.
    #[must_use]
    pub const fn flagged(mut self) -> Self {
        self.error = true;
        self
    }

    #[must_use]
    pub fn is_from(&self, sender: Sender) -> bool {
        self.sender == sender
    }
}
