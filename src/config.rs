//! Application configuration.
//!
//! Loaded from `config.toml` in the application data directory. Every section
//! falls back to defaults, so a partial file is valid.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::gamification::LevelConfig;
use crate::ledger::{Network, RetryPolicy};
use crate::merchant::MerchantSettings;

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Application version
    pub version: String,
    /// Data directory path
    #[serde(skip)]
    pub data_dir: PathBuf,
    /// Ledger network
    pub network: Network,
    /// Level curve and store behaviour
    pub gamification: GamificationSettings,
    /// Transaction confirmation polling
    pub ledger: LedgerSettings,
    /// Merchant point rules
    pub merchant: MerchantSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            data_dir: PathBuf::new(),
            network: Network::default(),
            gamification: GamificationSettings::default(),
            ledger: LedgerSettings::default(),
            merchant: MerchantSettings::default(),
        }
    }
}

impl AppConfig {
    /// Path of the SQLite database holding persisted records.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("loyaltymax.db")
    }
}

/// Gamification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GamificationSettings {
    /// Highest reachable level
    pub max_level: u32,
    /// XP from level 1 to level 2
    pub base_xp: u64,
    /// Growth factor between level costs
    pub xp_multiplier: f64,
    /// Persist after every state change
    pub autosave: bool,
}

impl Default for GamificationSettings {
    fn default() -> Self {
        let levels = LevelConfig::default();
        Self {
            max_level: levels.max_level,
            base_xp: levels.base_xp,
            xp_multiplier: levels.xp_multiplier,
            autosave: true,
        }
    }
}

impl GamificationSettings {
    /// Level curve with the default titles and badges.
    pub fn level_config(&self) -> LevelConfig {
        LevelConfig {
            max_level: self.max_level.max(1),
            base_xp: self.base_xp,
            xp_multiplier: self.xp_multiplier,
            ..Default::default()
        }
    }
}

/// Ledger settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerSettings {
    /// Maximum confirmation polls
    pub max_attempts: u32,
    /// First poll delay in milliseconds
    pub initial_delay_ms: u64,
    /// Delay cap in milliseconds
    pub max_delay_ms: u64,
    /// Delay growth factor
    pub backoff_multiplier: f64,
    /// Overall confirmation deadline in seconds
    pub timeout_secs: u64,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_attempts: policy.max_attempts,
            initial_delay_ms: policy.initial_delay.as_millis() as u64,
            max_delay_ms: policy.max_delay.as_millis() as u64,
            backoff_multiplier: policy.multiplier,
            timeout_secs: policy.timeout.as_secs(),
        }
    }
}

impl LedgerSettings {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_attempts)
            .with_initial_delay(Duration::from_millis(self.initial_delay_ms))
            .with_max_delay(Duration::from_millis(self.max_delay_ms))
            .with_multiplier(self.backoff_multiplier)
            .with_timeout(Duration::from_secs(self.timeout_secs))
    }
}

/// Get the application data directory.
pub fn get_data_dir() -> PathBuf {
    directories::ProjectDirs::from("com", "loyaltymax", "LoyaltyMax")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Get the configuration file path.
pub fn get_config_path() -> PathBuf {
    get_data_dir().join("config.toml")
}

/// Load application configuration from the default location.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let mut config = load_config_from(&get_config_path())?;
    config.data_dir = get_data_dir();
    Ok(config)
}

/// Load configuration from a file. A missing file yields defaults.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    let data_dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));

    if !path.exists() {
        return Ok(AppConfig {
            data_dir,
            ..Default::default()
        });
    }

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;

    let mut config: AppConfig =
        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;

    config.data_dir = data_dir;

    Ok(config)
}

/// Save application configuration to the default location.
pub fn save_config(config: &AppConfig) -> Result<(), ConfigError> {
    save_config_to(config, &get_config_path())
}

/// Save application configuration to a file.
pub fn save_config_to(config: &AppConfig, path: &Path) -> Result<(), ConfigError> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
    }

    let content =
        toml::to_string_pretty(config).map_err(|e| ConfigError::SerializeError(e.to_string()))?;

    std::fs::write(path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

    Ok(())
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),
}
