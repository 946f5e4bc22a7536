use chatembed_core::{EndpointConfig, Session, SessionInfo, ids};
use chrono::{SecondsFormat, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::http::authorize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RegisterRequest<'a> {
    session_id: &'a str,
    origin: &'a str,
    timestamp: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RegisterResponse {
    #[serde(default)]
    session_id: Option<String>,
}

/// Owns the session identity of one chat instance.
///
/// The session is created lazily by [`SessionManager::ensure_session`] and
/// stays fixed until [`SessionManager::reset`].
pub struct SessionManager {
    client: Client,
    base_url: Option<String>,
    api_key: Option<String>,
    origin: String,
    current: Mutex<Option<Session>>,
}

impl SessionManager {
    #[must_use]
    pub fn new(client: Client, config: &EndpointConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.clone(),
            api_key: config.api_key.clone(),
            origin: config.origin.clone(),
            current: Mutex::new(None),
        }
    }

    /// Return the current session, creating it on first use.
    ///
    /// A new session gets a local id and, when a backend is configured, is
    /// registered there. A backend-assigned id replaces the local one;
    /// registration failures keep the local id.
    pub async fn ensure_session(&self) -> Session {
        let mut current = self.current.lock().await;
        if let Some(session) = current.as_ref() {
            return session.clone();
        }

        let mut session = Session {
            id: ids::session_id(),
            origin: self.origin.clone(),
        };

        if let Some(base_url) = &self.base_url {
            match self.register(base_url, &session).await {
                Ok(Some(assigned)) => {
                    debug!("Backend assigned session id {assigned} (local {})", session.id);
                    session.id = assigned;
                }
                Ok(None) => {}
                Err(e) => warn!("Failed to register session, keeping local id: {e}"),
            }
        }

        info!("Session established: {}", session.id);
        *current = Some(session.clone());
        session
    }

    /// Forget the current session. The next use creates a new one.
    pub async fn reset(&self) {
        if let Some(previous) = self.current.lock().await.take() {
            info!("Reset session: {}", previous.id);
        }
    }

    /// Snapshot of the current session without creating one.
    pub async fn info(&self) -> SessionInfo {
        self.current
            .lock()
            .await
            .as_ref()
            .map(SessionInfo::from)
            .unwrap_or_default()
    }

    async fn register(&self, base_url: &str, session: &Session) -> reqwest::Result<Option<String>> {
        let request = RegisterRequest {
            session_id: &session.id,
            origin: &session.origin,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        };

        let response = authorize(
            self.client.post(format!("{base_url}/sessions")),
            self.api_key.as_deref(),
        )
        .json(&request)
        .send()
        .await?;

        if !response.status().is_success() {
            warn!(
                "Session registration returned {}, keeping local id",
                response.status()
            );
            return Ok(None);
        }

        let body: RegisterResponse = response.json().await?;
        Ok(body.session_id.filter(|id| !id.trim().is_empty()))
    }
}
