//! Static strategy pattern for CLI commands.
//!
//! Each command is a separate strategy with its own input type, dispatched
//! statically from `main`.

use chatembed_config::Config;
use chatembed_conversation::ConversationController;
use chatembed_core::{MessageExchange, TranscriptStore};
use chatembed_session::{HttpTranscriptStore, SessionManager, build_client};
use chatembed_webhook::WebhookClient;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

mod chat;
mod info;
mod init;
mod version;

pub use chat::{ChatInput, ChatStrategy};
pub use info::InfoStrategy;
pub use init::InitStrategy;
pub use version::VersionStrategy;

/// Load the config from an explicit path or the default location.
fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

/// Wire the session manager, webhook client and transcript store into a
/// controller. All three share one HTTP client.
fn build_controller(config: &Config) -> anyhow::Result<ConversationController> {
    let endpoint = config.endpoint_config();
    let http = build_client(&endpoint)?;

    let sessions = Arc::new(SessionManager::new(http.clone(), &endpoint));
    let exchange: Arc<dyn MessageExchange> =
        Arc::new(WebhookClient::new(http.clone(), &endpoint, sessions.clone()));
    let store: Arc<dyn TranscriptStore> = Arc::new(HttpTranscriptStore::new(http, &endpoint));

    if endpoint.persistence_enabled() {
        info!("Transcript persistence enabled");
    } else {
        info!("No base_url configured, transcript stays in memory");
    }

    Ok(ConversationController::new(exchange, store, sessions))
}

/// Core trait defining the contract for all command strategies.
pub trait CommandStrategy: Send + Sync + 'static {
    /// The input type this strategy accepts.
    type Input;

    /// Execute the command with the given input.
    ///
    /// # Errors
    /// Returns an error if command execution fails.
    async fn execute(&self, input: Self::Input) -> anyhow::Result<()>;
}
