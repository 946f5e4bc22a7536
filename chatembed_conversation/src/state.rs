use chatembed_core::{Message, SessionInfo};
use serde::Serialize;

/// Where the controller is within a user turn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnState {
    #[default]
    Idle,
    AwaitingResponse,
}

impl TurnState {
    #[must_use]
    pub const fn is_loading(self) -> bool {
        matches!(self, Self::AwaitingResponse)
    }
}

/// What the UI renders: published on every transcript or state change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConversationSnapshot {
    pub transcript: Vec<Message>,
    pub state: TurnState,
}

impl ConversationSnapshot {
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.state.is_loading()
    }
}

/// Internal state for inspection. Never carries credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugSnapshot {
    pub session: SessionInfo,
    pub state: TurnState,
    pub message_count: usize,
    pub initialized: bool,
    pub persistence_enabled: bool,
    pub endpoint: String,
}
