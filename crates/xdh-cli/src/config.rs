//! CLI configuration.
//!
//! Optional settings in `~/.xdh/config.json`. Flags on the command line take
//! precedence over anything set here.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::keyfile::KeyEncoding;

/// Default log filter when neither `RUST_LOG` nor the config sets one.
pub const DEFAULT_LOG_FILTER: &str = "xdh=warn,xdh_cli=warn,xdh_crypto=warn";

/// Persistent CLI configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct CliConfig {
    /// Encoding for newly written key files.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_encoding: Option<KeyEncoding>,
    /// Emit JSON log lines.
    #[serde(default)]
    pub log_json: bool,
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_filter: Option<String>,
}

impl CliConfig {
    /// Path to the config directory: `~/.xdh/`.
    pub fn config_dir() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".xdh"))
    }

    /// Path to the config file: `~/.xdh/config.json`.
    pub fn config_path() -> Option<PathBuf> {
        Self::config_dir().map(|d| d.join("config.json"))
    }

    /// Load config from the default location, or defaults.
    pub fn load() -> Self {
        Self::config_path()
            .map(|p| Self::load_from(&p))
            .unwrap_or_default()
    }

    /// Load config from `path`. Returns default if the file doesn't exist or is invalid.
    pub fn load_from(path: &Path) -> Self {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default()
    }

    /// Encoding to use when the command line does not name one.
    pub fn encoding_or(&self, flag: Option<KeyEncoding>) -> KeyEncoding {
        flag.or(self.default_encoding).unwrap_or(KeyEncoding::Pem)
    }

    pub fn log_filter(&self) -> &str {
        self.log_filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER)
    }
}
