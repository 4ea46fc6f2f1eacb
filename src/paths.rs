//! Where settings and logs live.
//!
//! Priority:
//! 1. CLI `--config-dir`
//! 2. `TIMESLIDER_CONFIG_DIR` environment variable
//! 3. Current directory, if it already holds a settings or log file
//! 4. Platform directory from dirs-next (config for settings, data for logs)
//!
//! Platform paths:
//! - Linux: ~/.config/timeslider, ~/.local/share/timeslider
//! - macOS: ~/Library/Application Support/timeslider
//! - Windows: %APPDATA%\timeslider

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

pub const CONFIG_DIR_ENV: &str = "TIMESLIDER_CONFIG_DIR";
pub const SETTINGS_FILE: &str = "timeslider.json";
pub const LOG_FILE: &str = "timeslider.log";

const APP_DIR: &str = "timeslider";

/// Overrides for the default application paths
#[derive(Debug, Clone, Default)]
pub struct PathConfig {
    /// Custom config directory (from CLI or ENV)
    pub config_dir: Option<PathBuf>,
}

impl PathConfig {
    /// Priority: CLI arg → ENV var → None (use defaults)
    pub fn from_env_and_cli(cli_dir: Option<PathBuf>) -> Self {
        let config_dir = cli_dir.or_else(|| std::env::var(CONFIG_DIR_ENV).ok().map(PathBuf::from));
        Self { config_dir }
    }

    pub fn settings_file(&self) -> PathBuf {
        config_file(SETTINGS_FILE, self)
    }

    pub fn log_file(&self) -> PathBuf {
        data_file(LOG_FILE, self)
    }
}

pub fn config_file(name: &str, config: &PathConfig) -> PathBuf {
    resolve_dir(config, dirs_next::config_dir).join(name)
}

pub fn data_file(name: &str, config: &PathConfig) -> PathBuf {
    resolve_dir(config, dirs_next::data_dir).join(name)
}

/// Create the config and data directories if missing.
pub fn ensure_dirs(config: &PathConfig) -> Result<()> {
    let config_dir = resolve_dir(config, dirs_next::config_dir);
    let data_dir = resolve_dir(config, dirs_next::data_dir);

    for dir in [&config_dir, &data_dir] {
        if !dir.exists() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        }
    }
    Ok(())
}

fn has_local_config_files(dir: &Path) -> bool {
    [SETTINGS_FILE, LOG_FILE].iter().any(|f| dir.join(f).exists())
}

fn resolve_dir(config: &PathConfig, platform_dir: fn() -> Option<PathBuf>) -> PathBuf {
    if let Some(dir) = &config.config_dir {
        return dir.clone();
    }

    if let Ok(current_dir) = std::env::current_dir()
        && has_local_config_files(&current_dir)
    {
        return current_dir;
    }

    if let Some(dir) = platform_dir() {
        return dir.join(APP_DIR);
    }

    // Fallback: "." if everything else fails
    PathBuf::from(".")
}
