//! Configuration for the Timelane engine.
//!
//! Configuration is loaded from TOML files in the following locations (in order):
//! 1. the platform config dir (`~/.config/timelane/config.toml` on Linux,
//!    `%APPDATA%/timelane/config.toml` on Windows)
//! 2. `~/.config/timelane/config.toml` (Unix-style fallback)
//! 3. `./config.toml` (current directory, for development)

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use timelane_core_layout::{ModePreset, ViewPreset};

/// Main configuration structure for Timelane.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Timeline state configuration.
    pub timeline: TimelineConfig,
    /// Viewport configuration for headless rendering.
    pub viewport: ViewportConfig,
    /// Behavior configuration.
    pub behavior: BehaviorConfig,
}

/// Timeline-related configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineConfig {
    /// View preset: week, month or year. Unknown names fail the parse.
    #[serde(default)]
    pub view: ViewPreset,

    /// Mode preset: regular or collapsed.
    #[serde(default)]
    pub mode: ModePreset,

    /// Anchor date (RFC 3339 or YYYY-MM-DD). Defaults to now.
    #[serde(default)]
    pub anchor_date: Option<String>,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            view: ViewPreset::default(),
            mode: ModePreset::default(),
            anchor_date: None,
        }
    }
}

/// Viewport-related configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    /// Container width in pixels.
    #[serde(default = "default_viewport_width")]
    pub width: f64,

    /// Container height in pixels.
    #[serde(default = "default_viewport_height")]
    pub height: f64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            width: default_viewport_width(),
            height: default_viewport_height(),
        }
    }
}

/// Behavior-related configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

// Default value functions for serde
fn default_viewport_width() -> f64 {
    1280.0
}

fn default_viewport_height() -> f64 {
    720.0
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from standard locations.
    ///
    /// Returns default config if no file is found.
    pub fn load() -> Result<Self> {
        let paths = config_paths();

        for path in &paths {
            if path.exists() {
                tracing::info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific path.
    pub fn load_from_path(path: &PathBuf) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }
}

/// Get all possible config file paths in priority order.
pub fn config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    if let Some(proj_dirs) = ProjectDirs::from("com", "timelane", "timelane") {
        paths.push(proj_dirs.config_dir().join("config.toml"));
    }

    if let Some(home) = dirs_home() {
        paths.push(home.join(".config").join("timelane").join("config.toml"));
    }

    paths.push(PathBuf::from("config.toml"));

    paths
}

/// Get the user's home directory.
fn dirs_home() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf())
}
