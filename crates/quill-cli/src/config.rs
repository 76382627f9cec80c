//! Configuration file support

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Configuration for quill
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend base URL
    pub endpoint: Option<String>,
    /// RFQ the proposals answer
    pub rfq: Option<String>,
    /// Retrieval sub-mode (local, hybrid)
    pub mode: Option<String>,
    /// User identifier sent with fresh queries
    pub user: Option<String>,
    /// Request timeout in seconds
    pub timeout_secs: Option<u64>,
    /// Whether to fetch RFQ-specific prompt suggestions at startup
    pub remote_suggestions: Option<bool>,
}

impl Config {
    /// Get the config directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("quill")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("QUILL_CONFIG_PATH") {
            return PathBuf::from(path);
        }
        Self::config_dir().join("config.toml")
    }

    /// Load config from file
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    fn load_from(path: &std::path::Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("Warning: Failed to parse config file: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("Warning: Failed to read config file: {}", e);
                Self::default()
            }
        }
    }

    /// Save config to file
    pub fn save(&self) -> std::io::Result<()> {
        let path = Self::config_path();
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        let content = toml::to_string_pretty(self).map_err(std::io::Error::other)?;
        fs::write(path, content)
    }

    /// Create a default config file if it doesn't exist
    pub fn init() -> std::io::Result<PathBuf> {
        let path = Self::config_path();
        if path.exists() {
            return Ok(path);
        }

        let default_config = Config {
            endpoint: Some("http://localhost:8000".to_string()),
            rfq: None,
            mode: Some("local".to_string()),
            user: None,
            timeout_secs: Some(30),
            remote_suggestions: Some(true),
        };

        default_config.save()?;
        Ok(path)
    }
}

/// Generate example config content
pub fn example_config() -> &'static str {
    r#"# quill configuration file
# Place at ~/.config/quill/config.toml (Linux/Mac) or %APPDATA%\quill\config.toml (Windows)

# Backend base URL (QUILL_API_URL overrides when unset here and on the command line)
endpoint = "http://localhost:8000"

# RFQ the proposals answer (optional)
# rfq = "rfq-2024-017"

# Retrieval sub-mode (local, hybrid)
mode = "local"

# User identifier sent with fresh queries (optional)
# user = "ana@example.com"

# Seconds to wait for one exchange before giving up
timeout_secs = 30

# Fetch RFQ-specific prompt suggestions at startup
remote_suggestions = true
"#
}
