mod defaults;
mod io;
mod types;
mod validation;

pub use defaults::*;
pub use io::*;
pub use types::*;
pub use validation::*;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;

/// Top-level Acrobot configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub search: SearchConfig,
    pub list: ListConfig,
    pub telegram: TelegramConfig,
    pub retry: RetryConfig,

    /// State directory for persistent data.
    #[serde(skip)]
    pub state_dir: PathBuf,
}

impl Config {
    /// Load configuration from file, environment, and defaults.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let config_path = path.map(PathBuf::from).or_else(find_config_file);

        let mut config = match config_path {
            Some(config_path) => {
                info!("Loading config from {}", config_path.display());
                load_config_file(&config_path)?
            }
            None => {
                info!("No config file found, using defaults");
                Config::default()
            }
        };

        config.apply_env_overrides(|name| std::env::var(name).ok())?;
        config.state_dir = resolve_state_dir();

        Ok(config)
    }

    /// Write default configuration to a file.
    pub fn write_default(path: &str) -> Result<()> {
        write_config_file(std::path::Path::new(path), &Config::default())
    }

    /// Resolved database file.
    pub fn database_path(&self) -> PathBuf {
        self.database
            .path
            .clone()
            .unwrap_or_else(|| self.state_dir.join(DEFAULT_DATABASE_FILE))
    }

    /// Copy of the configuration with credentials masked, for display.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if let Some(token) = copy.telegram.bot_token.as_mut() {
            let tail = token
                .char_indices()
                .rev()
                .nth(3)
                .map(|(i, _)| token[i..].to_string())
                .unwrap_or_default();
            *token = format!("...{tail}");
        }
        copy
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Unscoped variables apply first; `<ENV>_`-prefixed ones, selected by
    /// `ACROBOT_ENV`, override them.
    pub fn apply_env_overrides<F>(&mut self, var: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = var("ACROBOT_DATABASE_PATH") {
            self.database.path = Some(PathBuf::from(path));
        }

        if let Some(token) = var("TELEGRAM_BOT_TOKEN") {
            self.telegram.apply_token(&token);
        }

        let environment = match var("ACROBOT_ENV") {
            Some(value) => value.parse::<Environment>()?,
            None => Environment::default(),
        };
        let prefix = environment.env_prefix();

        if let Some(path) = var(&format!("{prefix}DATABASE_PATH")) {
            self.database.path = Some(PathBuf::from(path));
        }

        if let Some(token) = var(&format!("{prefix}TELEGRAM_BOT_TOKEN")) {
            self.telegram.apply_token(&token);
        }

        Ok(())
    }
}

/// Find the configuration file in standard locations.
fn find_config_file() -> Option<PathBuf> {
    let candidates = [
        PathBuf::from("acrobot.json"),
        PathBuf::from("acrobot.yaml"),
        PathBuf::from("acrobot.yml"),
        PathBuf::from("acrobot.toml"),
    ];

    for path in &candidates {
        if path.exists() {
            return Some(path.clone());
        }
    }

    // Check home directory
    if let Some(home) = dirs::home_dir() {
        let home_config = home.join(".acrobot").join("config.json");
        if home_config.exists() {
            return Some(home_config);
        }
    }

    None
}

/// Resolve the state directory for persistent data.
fn resolve_state_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("ACROBOT_STATE_DIR") {
        return PathBuf::from(dir);
    }

    dirs::home_dir()
        .map(|h| h.join(".acrobot"))
        .unwrap_or_else(|| PathBuf::from(".acrobot"))
}
