//! Configuration loading and management.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use ws_core::Theme;

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Planned session length used when a script does not set one.
    pub planned_duration_secs: i64,

    /// Which variant of themed activity colours to report.
    pub theme: Theme,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            planned_duration_secs: 3600,
            theme: Theme::Light,
        }
    }
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        // Load from default config location
        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        // Load from specified config file
        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        // Load from environment variables (WS_*)
        figment = figment.merge(Env::prefixed("WS_"));

        figment.extract()
    }
}

/// Returns the platform-specific config directory for ws.
///
/// On Linux: `~/.config/ws`
pub fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("ws"))
}
