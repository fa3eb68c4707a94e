use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Prefix of the environment variables layered over the config files
pub const ENV_PREFIX: &str = "DEMO_WALLET";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    pub wallet: WalletConfig,
    #[serde(default)]
    pub runner: RunnerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Settings the wallet flows read at runtime.
///
/// Field names map to the setting keys exposed by `settings::Setting`
/// (`auto_advance` is `AUTO_ADVANCE`, `secret_key` is `USER_SK`, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletConfig {
    /// Run each step as soon as it is presented instead of waiting for Enter
    #[serde(default)]
    pub auto_advance: bool,
    /// Use the public network instead of testnet
    #[serde(default)]
    pub mainnet: bool,
    /// Anchor home domain hosting stellar.toml (e.g., "testanchor.stellar.org")
    #[serde(default)]
    pub home_domain: String,
    /// Asset code to deposit or withdraw (e.g., "SRT")
    #[serde(default)]
    pub asset_code: String,
    /// Secret key of the wallet account (S...)
    #[serde(default)]
    pub secret_key: String,
    /// Horizon server override; empty means the network default
    #[serde(default)]
    pub horizon_url: String,
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            auto_advance: false,
            mainnet: false,
            home_domain: "testanchor.stellar.org".to_string(),
            asset_code: "SRT".to_string(),
            secret_key: String::new(), // Populated by the user
            horizon_url: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// Minimum time in milliseconds each executed step stays on screen (default: 1000)
    #[serde(default = "default_min_step_ms")]
    pub min_step_ms: u64,
}

fn default_min_step_ms() -> u64 {
    1000 // 1 second
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            min_step_ms: default_min_step_ms(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to log to a file instead of stderr
    #[serde(default)]
    pub to_file: bool,

    /// Directory for log files when `to_file` is set
    #[serde(default = "default_log_dir")]
    pub dir: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_dir() -> String {
    ".demo-wallet/logs".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            to_file: false,
            dir: default_log_dir(),
        }
    }
}

impl Config {
    /// Path to the project-local config file
    pub fn local_config_path() -> PathBuf {
        PathBuf::from("demo-wallet.toml")
    }

    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut files = Vec::new();

        let local_config = Self::local_config_path();
        if local_config.exists() {
            files.push(local_config);
        }

        // User config in ~/.config/demo-wallet/ (optional global overrides)
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("demo-wallet").join("config.toml");
            if user_config.exists() {
                files.push(user_config);
            }
        }

        // Explicit config file (CLI override)
        if let Some(path) = config_path {
            files.push(PathBuf::from(path));
        }

        Self::load_from(&files, Some(ENV_PREFIX))
    }

    /// Layer `files` over the embedded defaults, later files winning, then
    /// `{env_prefix}__SECTION__KEY` environment variables when a prefix is given.
    pub fn load_from(files: &[PathBuf], env_prefix: Option<&str>) -> Result<Self> {
        // Start with embedded defaults so the wallet works without config files
        let defaults_json =
            serde_json::to_string(&Config::default()).context("Failed to serialize default config")?;

        let mut builder = config::Config::builder().add_source(config::File::from_str(
            &defaults_json,
            config::FileFormat::Json,
        ));

        for file in files {
            builder = builder.add_source(config::File::with_name(&file.to_string_lossy()));
        }

        if let Some(prefix) = env_prefix {
            builder = builder.add_source(
                config::Environment::with_prefix(prefix)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );
        }

        let config = builder.build().context("Failed to load configuration")?;
        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Save config to ./demo-wallet.toml
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::local_config_path())
    }

    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .context("Failed to create config directory")?;
            }
        }

        let toml_str =
            toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        std::fs::write(path, toml_str).context("Failed to write config file")?;

        Ok(())
    }

    /// Get absolute path to logs directory
    pub fn logs_path(&self) -> PathBuf {
        let path = PathBuf::from(&self.logging.dir);
        if path.is_absolute() {
            path
        } else {
            std::env::current_dir().unwrap_or_default().join(path)
        }
    }

    pub fn min_step_duration(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.runner.min_step_ms)
    }
}
