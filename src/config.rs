//! Configuration management
//!
//! Carvex stores configuration in ~/.carvex/config.toml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub backup: BackupConfig,

    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackupConfig {
    /// Custom snapshot directory; defaults to ~/.carvex/backups
    #[serde(default)]
    pub backup_dir: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Write run logs to ~/.carvex/carvex.log
    #[serde(default = "default_log_enabled")]
    pub enabled: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: default_log_enabled(),
        }
    }
}

fn default_log_enabled() -> bool {
    false
}

pub fn config_file_path() -> Result<PathBuf> {
    let home_dir = dirs::home_dir()
        .ok_or_else(|| anyhow::anyhow!("Cannot determine home directory"))?;

    let config_dir = home_dir.join(".carvex");
    fs::create_dir_all(&config_dir)
        .with_context(|| format!("Failed to create config directory: {}", config_dir.display()))?;

    Ok(config_dir.join("config.toml"))
}

fn default_config_content() -> &'static str {
    r#"# Carvex Configuration File
#
# Values set here can be overridden by command-line flags.

[backup]
# Custom snapshot directory (optional)
# Uncomment to store snapshots somewhere other than ~/.carvex/backups/
#backup_dir = "/mnt/backups/carvex"

[log]
# Write run logs to ~/.carvex/carvex.log (default: false)
enabled = false
"#
}

pub fn save_default_config() -> Result<()> {
    let config_path = config_file_path()?;

    fs::write(&config_path, default_config_content()).with_context(|| {
        format!(
            "Failed to write default config file: {}",
            config_path.display()
        )
    })?;

    Ok(())
}

/// Load configuration, writing the commented default file on first use.
/// A malformed file is replaced with the defaults rather than aborting.
pub fn load_config() -> Result<Config> {
    let config_path = config_file_path()?;

    if !config_path.exists() {
        save_default_config()?;
    }

    let config_str = fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

    match toml::from_str(&config_str) {
        Ok(config) => Ok(config),
        Err(_) => {
            save_default_config()?;
            Ok(Config::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_content_parses() {
        let config: Config = toml::from_str(default_config_content()).unwrap();
        assert!(config.backup.backup_dir.is_none());
        assert!(!config.log.enabled);
    }

    #[test]
    fn test_empty_file_parses_to_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.backup.backup_dir.is_none());
    }

    #[test]
    fn test_backup_dir_override() {
        let config: Config = toml::from_str(
            r#"
[backup]
backup_dir = "/mnt/backups"
"#,
        )
        .unwrap();
        assert_eq!(config.backup.backup_dir.as_deref(), Some("/mnt/backups"));
    }
}
