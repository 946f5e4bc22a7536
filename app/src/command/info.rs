use std::path::PathBuf;
use tracing::info;

use super::{build_controller, load_config};

/// Strategy for displaying configuration and live client state.
///
/// Establishes a session (registering it with the backend when one is
/// configured) and prints the controller's debug snapshot.
#[derive(Debug, Clone, Copy)]
pub struct InfoStrategy;

impl super::CommandStrategy for InfoStrategy {
    type Input = Option<PathBuf>;

    async fn execute(&self, config_path: Self::Input) -> anyhow::Result<()> {
        let config = load_config(config_path.as_deref())?;

        println!("=== chatembed Configuration ===\n");

        println!("Backend:");
        println!("  Webhook: {}", or_unset(&config.backend.remote_endpoint_url));
        println!("  Base URL: {}", or_unset(&config.backend.base_url));
        println!("  API Key: {}", mask_secret(&config.backend.api_key));
        println!("  Origin: {}", config.backend.origin);
        println!(
            "  Request Timeout: {}",
            match config.backend.request_timeout_secs {
                0 => "none".to_string(),
                secs => format!("{secs}s"),
            }
        );
        println!();

        println!("Widget:");
        println!("  Title: {}", config.widget.title);
        println!("  Placeholder: {}", config.widget.placeholder);
        println!();

        info!("Establishing session for diagnostics");
        let controller = build_controller(&config)?;
        controller.initialize().await;

        println!("Debug Snapshot:");
        println!(
            "{}",
            serde_json::to_string_pretty(&controller.debug_snapshot().await)?
        );

        Ok(())
    }
}

fn or_unset(value: &str) -> &str {
    if value.is_empty() { "(not set)" } else { value }
}

fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    match chars.len() {
        0 => "(not set)".to_string(),
        1..=8 => "***".to_string(),
        n => format!(
            "{}...{}",
            chars[..4].iter().collect::<String>(),
            chars[n - 4..].iter().collect::<String>()
        ),
    }
}
