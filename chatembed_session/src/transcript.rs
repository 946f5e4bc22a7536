use async_trait::async_trait;
use chatembed_core::{EndpointConfig, Message, Sender, SessionInfo, TranscriptStore};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, warn};

use crate::http::authorize;

/// Records are decoded one by one so a malformed entry only drops itself.
#[derive(Debug, Deserialize)]
struct HistoryPage {
    #[serde(default)]
    messages: Vec<Value>,
}

impl HistoryPage {
    fn into_messages(self) -> Vec<Message> {
        self.messages
            .into_iter()
            .enumerate()
            .filter_map(|(index, record)| match serde_json::from_value(record) {
                Ok(message) => Some(message),
                Err(e) => {
                    warn!("Skipping stored message #{index}: {e}");
                    None
                }
            })
            .collect()
    }
}

/// Body of a save request: the message plus its session and origin.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MessageRecord<'a> {
    id: &'a str,
    text: &'a str,
    sender: Sender,
    timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    error: bool,
    session_id: &'a str,
    origin: Option<&'a str>,
}

/// Transcript log kept by the history backend.
///
/// Without a `base_url` every call is a no-op.
pub struct HttpTranscriptStore {
    client: Client,
    base_url: Option<String>,
    api_key: Option<String>,
}

impl HttpTranscriptStore {
    #[must_use]
    pub fn new(client: Client, config: &EndpointConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
        }
    }

    async fn fetch(&self, base_url: &str, session_id: &str) -> reqwest::Result<Vec<Message>> {
        let response = authorize(
            self.client
                .get(format!("{base_url}/sessions/{session_id}/messages")),
            self.api_key.as_deref(),
        )
        .send()
        .await?;

        if !response.status().is_success() {
            warn!("History request returned {}", response.status());
            return Ok(Vec::new());
        }

        Ok(response.json::<HistoryPage>().await?.into_messages())
    }

    async fn post(&self, base_url: &str, record: &MessageRecord<'_>) -> reqwest::Result<()> {
        authorize(
            self.client
                .post(format!("{base_url}/sessions/{}/messages", record.session_id)),
            self.api_key.as_deref(),
        )
        .json(record)
        .send()
        .await?
        .error_for_status()?;
        Ok(())
    }
}

#[async_trait]
impl TranscriptStore for HttpTranscriptStore {
    async fn load(&self, session_id: Option<&str>) -> Vec<Message> {
        let (Some(base_url), Some(session_id)) = (self.base_url.as_deref(), session_id) else {
            return Vec::new();
        };

        match self.fetch(base_url, session_id).await {
            Ok(messages) => {
                debug!("Loaded {} messages for session {session_id}", messages.len());
                messages
            }
            Err(e) => {
                error!("Failed to get chat history: {e}");
                Vec::new()
            }
        }
    }

    async fn save(&self, message: &Message, session: &SessionInfo) {
        let (Some(base_url), Some(session_id)) =
            (self.base_url.as_deref(), session.session_id.as_deref())
        else {
            return;
        };

        let record = MessageRecord {
            id: message.id.as_str(),
            text: &message.text,
            sender: message.sender,
            timestamp: message.timestamp,
            error: message.error,
            session_id,
            origin: session.origin.as_deref(),
        };

        if let Err(e) = self.post(base_url, &record).await {
            error!("Failed to save message {}: {e}", message.id);
        }
    }

    fn is_enabled(&self) -> bool {
        self.base_url.is_some()
    }
}
