//! Settings file and application paths.
//!
//! Settings live in `painter.json` (serde JSON, every field optional).
//! Directory priority:
//! 1. CLI `--config-dir`
//! 2. `PAINTER_CONFIG_DIR` environment variable
//! 3. Current directory IF `painter.json` or `painter.log` exists there
//! 4. Platform directory from dirs-next
//!
//! Platform paths:
//! - Linux: ~/.config/painter/{name}, ~/.local/share/painter/{name}
//! - macOS: ~/Library/Application Support/painter/{name}
//! - Windows: %APPDATA%\painter\{name}

use anyhow::{Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::core::ops::Rgb;

pub const SETTINGS_FILE: &str = "painter.json";
pub const LOG_FILE: &str = "painter.log";

/// Overrides for default application paths
#[derive(Debug, Clone)]
pub struct PathConfig {
    /// Custom config directory (from CLI or ENV)
    pub config_dir: Option<PathBuf>,
}

impl PathConfig {
    /// Priority: CLI args → ENV var (PAINTER_CONFIG_DIR) → None (use defaults)
    pub fn from_env_and_cli(cli_dir: Option<PathBuf>) -> Self {
        let config_dir = cli_dir.or_else(|| std::env::var("PAINTER_CONFIG_DIR").ok().map(PathBuf::from));

        Self { config_dir }
    }
}

/// Path to a configuration file
pub fn config_file(name: &str, config: &PathConfig) -> PathBuf {
    resolve_dir(config, dirs_next::config_dir()).join(name)
}

/// Path to a data file (logs)
pub fn data_file(name: &str, config: &PathConfig) -> PathBuf {
    resolve_dir(config, dirs_next::data_dir()).join(name)
}

/// Create config and data directories if missing.
pub fn ensure_dirs(config: &PathConfig) -> Result<()> {
    let config_dir = resolve_dir(config, dirs_next::config_dir());
    let data_dir = resolve_dir(config, dirs_next::data_dir());

    for dir in [&config_dir, &data_dir] {
        if !dir.exists() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        }
    }
    Ok(())
}

fn has_local_files(dir: &Path) -> bool {
    [SETTINGS_FILE, LOG_FILE].iter().any(|f| dir.join(f).exists())
}

fn resolve_dir(config: &PathConfig, platform_dir: Option<PathBuf>) -> PathBuf {
    if let Some(dir) = &config.config_dir {
        return dir.clone();
    }

    if let Ok(current_dir) = std::env::current_dir() {
        if has_local_files(&current_dir) {
            return current_dir;
        }
    }

    if let Some(dir) = platform_dir {
        return dir.join("painter");
    }

    PathBuf::from(".")
}

/// Application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Ingest server
    pub bind: String,
    pub port: u16,
    pub max_script_bytes: u64,

    // Window
    pub title: String,
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub base_color: Rgb,   // Fill behind the background rect
    pub border_color: Rgb,
    pub border_width: u32, // 0 = no border
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 17000,
            max_script_bytes: 1024 * 1024,
            title: "Simple painter".to_string(),
            canvas_width: 800,
            canvas_height: 800,
            base_color: Rgb::new(0, 255, 0),
            border_color: Rgb::WHITE,
            border_width: 10,
        }
    }
}

impl Settings {
    /// Load from `path`. A missing file gives defaults; a malformed one is
    /// logged and also gives defaults.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str(&json) {
                Ok(settings) => {
                    info!("Loaded settings from {}", path.display());
                    settings
                }
                Err(e) => {
                    warn!("Ignoring malformed settings {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No settings at {}, using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                warn!("Failed to read settings {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        std::fs::write(path, json).with_context(|| format!("Failed to write settings: {}", path.display()))
    }

    /// `bind:port` for the ingest server
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}
