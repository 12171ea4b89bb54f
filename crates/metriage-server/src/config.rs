use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// `host:port`; a bare `:port` binds all interfaces
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// Upload size limit in bytes
    #[serde(default = "default_max_file_size")]
    pub max_file_size: usize,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_rules_dir")]
    pub rules_dir: String,
    /// Defaults to `<rules_dir>/load-level` when unset
    #[serde(default)]
    pub load_level_dir: Option<String>,
}

fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_max_file_size() -> usize {
    50 * 1024 * 1024
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_rules_dir() -> String {
    "./automated-rules".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            max_file_size: default_max_file_size(),
            request_timeout_secs: default_request_timeout_secs(),
            rules_dir: default_rules_dir(),
            load_level_dir: None,
        }
    }
}

/// Accepts plain seconds or a `s`/`m` suffixed duration (`90`, `90s`, `2m`).
fn parse_timeout_secs(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    if let Some(minutes) = raw.strip_suffix('m') {
        return minutes.parse::<u64>().ok().map(|m| m * 60);
    }
    raw.strip_suffix('s').unwrap_or(raw).parse().ok()
}

impl ServerConfig {
    /// Reads `path` when it exists, otherwise starts from defaults. Environment
    /// overrides are applied on top in both cases.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let mut config = if Path::new(path).exists() {
            let content = std::fs::read_to_string(path)
                .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path, e))?;
            toml::from_str(&content)
                .map_err(|e| anyhow::anyhow!("Failed to parse config file '{}': {}", path, e))?
        } else {
            tracing::info!(path, "Config file not found, using defaults");
            Self::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Applies `LISTEN_ADDR`, `MAX_FILE_SIZE`, `RULES_DIR`, `LOAD_LEVEL_DIR` and
    /// `REQUEST_TIMEOUT`. Empty or unparseable values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let lookup = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(addr) = lookup("LISTEN_ADDR") {
            self.listen_addr = addr;
        }
        if let Some(size) = lookup("MAX_FILE_SIZE") {
            match size.parse() {
                Ok(size) => self.max_file_size = size,
                Err(_) => tracing::warn!(value = %size, "Ignoring invalid MAX_FILE_SIZE"),
            }
        }
        if let Some(dir) = lookup("RULES_DIR") {
            self.rules_dir = dir;
        }
        if let Some(dir) = lookup("LOAD_LEVEL_DIR") {
            self.load_level_dir = Some(dir);
        }
        if let Some(timeout) = lookup("REQUEST_TIMEOUT") {
            match parse_timeout_secs(&timeout) {
                Some(secs) => self.request_timeout_secs = secs,
                None => tracing::warn!(value = %timeout, "Ignoring invalid REQUEST_TIMEOUT"),
            }
        }
    }

    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let addr = if self.listen_addr.starts_with(':') {
            format!("0.0.0.0{}", self.listen_addr)
        } else {
            self.listen_addr.clone()
        };
        addr.parse()
            .map_err(|e| anyhow::anyhow!("Invalid listen address '{}': {}", self.listen_addr, e))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn load_level_dir(&self) -> Option<PathBuf> {
        self.load_level_dir.as_ref().map(PathBuf::from)
    }
}
