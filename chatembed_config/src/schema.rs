use chatembed_core::EndpointConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

const CONFIG_DIR: &str = "chatembed";
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub widget: WidgetConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct BackendConfig {
    /// History/session backend; empty disables persistence.
    #[serde(default)]
    pub base_url: String,
    /// Workflow webhook that answers chat messages.
    #[serde(default)]
    pub remote_endpoint_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "BackendConfig::default_origin")]
    pub origin: String,
    /// 0 disables the timeout.
    #[serde(default = "BackendConfig::default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            remote_endpoint_url: String::new(),
            api_key: String::new(),
            origin: Self::default_origin(),
            request_timeout_secs: Self::default_request_timeout_secs(),
        }
    }
}

impl BackendConfig {
    fn default_origin() -> String {
        EndpointConfig::DEFAULT_ORIGIN.to_string()
    }

    const fn default_request_timeout_secs() -> u64 {
        EndpointConfig::DEFAULT_TIMEOUT.as_secs()
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WidgetConfig {
    #[serde(default = "WidgetConfig::default_title")]
    pub title: String,
    #[serde(default = "WidgetConfig::default_placeholder")]
    pub placeholder: String,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        Self {
            title: Self::default_title(),
            placeholder: Self::default_placeholder(),
        }
    }
}

impl WidgetConfig {
    fn default_title() -> String {
        "Chat".to_string()
    }

    fn default_placeholder() -> String {
        "Type your message...".to_string()
    }
}

impl Config {
    pub const ENV_BASE_URL: &'static str = "CHATEMBED_BASE_URL";
    pub const ENV_WEBHOOK_URL: &'static str = "CHATEMBED_WEBHOOK_URL";
    pub const ENV_API_KEY: &'static str = "CHATEMBED_API_KEY";
    pub const ENV_ORIGIN: &'static str = "CHATEMBED_ORIGIN";

    pub fn default_path() -> anyhow::Result<PathBuf> {
        Ok(dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Cannot find home directory"))?
            .join(CONFIG_DIR)
            .join(CONFIG_FILE))
    }

    /// Load `~/chatembed/config.json` and apply environment overrides.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::default_path()?)
    }

    /// Load a config file and apply environment overrides.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            anyhow::bail!(
                "Config file not found at: {}. Please run 'chatembed init' to create config.",
                path.display()
            );
        }

        let content = std::fs::read_to_string(path)?;
        let mut config: Self = serde_json::from_str(&content)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        info!("Loaded config from {}", path.display());

        Ok(config)
    }

    /// Replace file values with non-empty values returned by `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let targets = [
            (Self::ENV_BASE_URL, &mut self.backend.base_url),
            (Self::ENV_WEBHOOK_URL, &mut self.backend.remote_endpoint_url),
            (Self::ENV_API_KEY, &mut self.backend.api_key),
            (Self::ENV_ORIGIN, &mut self.backend.origin),
        ];

        for (key, target) in targets {
            if let Some(value) = lookup(key).filter(|v| !v.trim().is_empty()) {
                debug!("Config override from {key}");
                *target = value;
            }
        }
    }

    /// Network settings for the chat client.
    #[must_use]
    pub fn endpoint_config(&self) -> EndpointConfig {
        let timeout = match self.backend.request_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        EndpointConfig::new(self.backend.remote_endpoint_url.trim())
            .with_base_url(self.backend.base_url.clone())
            .with_api_key(self.backend.api_key.clone())
            .with_origin(self.backend.origin.clone())
            .with_request_timeout(timeout)
    }

    /// Write the config template to `path`, refusing to overwrite.
    pub fn create_config_at(path: &Path) -> anyhow::Result<()> {
        if path.exists() {
            anyhow::bail!(
                "Config file already exists at: {}. Please edit it directly.",
                path.display()
            );
        }
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }

        let config_template = r#"{
  "backend": {
    "base_url": "",
    "remote_endpoint_url": "https://your-workflow-host/webhook/your-webhook-id/chat",
    "api_key": "",
    "origin": "http://localhost",
    "request_timeout_secs": 30
  },
  "widget": {
    "title": "Support Chat",
    "placeholder": "How can we help you?"
  }
}"#;

        std::fs::write(path, config_template)?;
        Ok(())
    }

    pub fn create_config() -> anyhow::Result<()> {
        let config_path = Self::default_path()?;
        Self::create_config_at(&config_path)?;

        println!("✅ Created config file at: {}", config_path.display());
        println!();
        println!("📝 Next steps:");
        println!("   1. Set backend.remote_endpoint_url to your workflow chat webhook");
        println!("   2. Optionally set backend.base_url and api_key to persist transcripts");
        println!("   3. Run 'chatembed chat' to start a conversation");
        println!();
        println!("🔧 Environment overrides:");
        println!(
            "   {}, {}, {}, {}",
            Self::ENV_BASE_URL,
            Self::ENV_WEBHOOK_URL,
            Self::ENV_API_KEY,
            Self::ENV_ORIGIN
        );
        println!();
        Ok(())
    }
}
