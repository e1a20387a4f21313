// File: src/config.rs
// Purpose: Configuration parsing from trellis.toml

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Environment variable naming an alternate config file
pub const CONFIG_ENV: &str = "TRELLIS_CONFIG";

/// Environment variable overriding `server.port`
pub const PORT_ENV: &str = "PORT";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub routing: RoutingConfig,

    #[serde(default)]
    pub preload: PreloadConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

/// Routing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Directory scanned for pages (default: "routes")
    #[serde(default = "default_routes_dir")]
    pub routes_dir: String,

    /// Whether static literals compare case-insensitively (default: false)
    #[serde(default)]
    pub case_insensitive: bool,

    /// Mount prefix stripped before matching (e.g. "/app")
    #[serde(default)]
    pub base_path: Option<String>,

    /// Requests under these prefixes go to server routes
    #[serde(default = "default_api_prefixes")]
    pub api_prefixes: Vec<String>,

    /// Requests whose last segment ends with one of these go to server routes
    #[serde(default = "default_api_suffixes")]
    pub api_suffixes: Vec<String>,
}

/// Preload configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreloadConfig {
    /// Timeout for fetches that leave the process
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
}

// Default values
fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_routes_dir() -> String {
    "routes".to_string()
}

fn default_api_prefixes() -> Vec<String> {
    vec!["/api".to_string()]
}

fn default_api_suffixes() -> Vec<String> {
    vec![".json".to_string()]
}

fn default_fetch_timeout_secs() -> u64 {
    10
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            routes_dir: default_routes_dir(),
            case_insensitive: false,
            base_path: None,
            api_prefixes: default_api_prefixes(),
            api_suffixes: default_api_suffixes(),
        }
    }
}

impl Default for PreloadConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_secs: default_fetch_timeout_secs(),
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// A missing or empty file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        Ok(config)
    }

    /// Load from `$TRELLIS_CONFIG` (or ./trellis.toml), then apply `$PORT`
    pub fn load_default() -> Result<Self> {
        let path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| "trellis.toml".to_string());
        Self::load(path)?.with_port_override(std::env::var(PORT_ENV).ok().as_deref())
    }

    /// Overrides the port when `port` is given
    pub fn with_port_override(mut self, port: Option<&str>) -> Result<Self> {
        if let Some(port) = port {
            self.server.port = port
                .trim()
                .parse()
                .with_context(|| format!("Invalid {} value: {:?}", PORT_ENV, port))?;
        }
        Ok(self)
    }

    /// `host:port` for binding the listener
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
