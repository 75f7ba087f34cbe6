use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::PathBuf};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub extractor: ExtractorConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,
    /// Directory holding the browser UI
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
    #[serde(default = "default_true")]
    pub cors_enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            static_dir: default_static_dir(),
            cors_enabled: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Where the locally provisioned yt-dlp lives
    #[serde(default = "default_bin_dir")]
    pub bin_dir: PathBuf,
    /// Explicit binary; skips the local lookup and provisioning
    #[serde(default)]
    pub binary: Option<PathBuf>,
    /// Looked up on PATH when nothing local works
    #[serde(default = "default_system_binary")]
    pub system_binary: String,
    #[serde(default = "default_true")]
    pub auto_provision: bool,
    #[serde(default = "default_release_base_url")]
    pub release_base_url: String,
    /// Upper bound for a metadata probe (None = wait indefinitely)
    #[serde(default)]
    pub probe_timeout_secs: Option<u64>,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            bin_dir: default_bin_dir(),
            binary: None,
            system_binary: default_system_binary(),
            auto_provision: true,
            release_base_url: default_release_base_url(),
            probe_timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: default_log_format(),
        }
    }
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 3000))
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("public")
}

fn default_bin_dir() -> PathBuf {
    PathBuf::from("bin")
}

fn default_system_binary() -> String {
    "yt-dlp".to_string()
}

fn default_release_base_url() -> String {
    "https://github.com/yt-dlp/yt-dlp/releases/latest/download/".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

fn default_true() -> bool {
    true
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path))?;
        Self::from_toml_str(&content).with_context(|| format!("Failed to parse {}", path))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Invalid config")
    }

    pub fn get_logging_format(&self) -> &str {
        &self.logging.format
    }

    pub fn apply_port_override(&mut self, port: u16) {
        self.server.bind_address.set_port(port);
    }
}
