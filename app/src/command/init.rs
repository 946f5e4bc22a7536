use chatembed_config::Config;
use std::path::PathBuf;

/// Strategy for initializing the configuration.
///
/// Writes the config template to the given path, or to
/// `~/chatembed/config.json` when none is given.
#[derive(Debug, Clone, Copy)]
pub struct InitStrategy;

impl super::CommandStrategy for InitStrategy {
    type Input = Option<PathBuf>;

    async fn execute(&self, config_path: Self::Input) -> anyhow::Result<()> {
        match config_path {
            Some(path) => {
                Config::create_config_at(&path)?;
                println!("✅ Created config file at: {}", path.display());
                Ok(())
            }
            None => Config::create_config(),
        }
    }
}
