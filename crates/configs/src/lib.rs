use std::{fmt, path::PathBuf, str::FromStr, time::Duration};

use anyhow::{anyhow, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: default_host(), port: default_port(), worker_threads: Some(4) }
    }
}

/// Which backend holds the assets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    #[default]
    Volatile,
    Json,
    Sqlite,
}

impl StorageKind {
    /// File used when none is configured.
    pub fn default_file(self) -> &'static str {
        match self {
            StorageKind::Volatile => "",
            StorageKind::Json => "default.json",
            StorageKind::Sqlite => "default.sqlite",
        }
    }

    pub fn is_persistent(self) -> bool {
        !matches!(self, StorageKind::Volatile)
    }
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StorageKind::Volatile => "volatile",
            StorageKind::Json => "json",
            StorageKind::Sqlite => "sqlite",
        })
    }
}

impl FromStr for StorageKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "volatile" => Ok(StorageKind::Volatile),
            "json" => Ok(StorageKind::Json),
            "sqlite" => Ok(StorageKind::Sqlite),
            other => Err(anyhow!("unknown storage kind `{other}` (expected volatile, json or sqlite)")),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct StorageConfig {
    #[serde(default)]
    pub kind: StorageKind,
    /// Backing file; empty means the kind's default.
    #[serde(default)]
    pub file: String,
}

impl StorageConfig {
    pub fn path(&self) -> PathBuf {
        PathBuf::from(&self.file)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotifyConfig {
    #[serde(default = "default_notify_url")]
    pub url: String,
    #[serde(default = "default_threshold")]
    pub threshold: usize,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self { url: default_notify_url(), threshold: default_threshold(), timeout_secs: default_timeout() }
    }
}

impl NotifyConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_host() -> String { "127.0.0.1".into() }
fn default_port() -> u16 { 55555 }
fn default_notify_url() -> String { "http://localhost:8080/api/notify".into() }
fn default_threshold() -> usize { 3 }
fn default_timeout() -> u64 { 5 }

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

/// Parse `path`; a missing file yields the defaults.
pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(AppConfig::default()),
        Err(e) => return Err(anyhow!("reading {path}: {e}")),
    };
    let cfg: AppConfig = toml::from_str(&content)?;
    Ok(cfg)
}

impl AppConfig {
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default()?;
        cfg.apply_env(|key| std::env::var(key).ok())?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    /// Override fields from `SERVER_HOST`, `SERVER_PORT`, `STORAGE_TYPE`,
    /// `STORAGE_FILE` and `NOTIFY_URL` as returned by `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("SERVER_HOST") {
            self.server.host = host;
        }
        if let Some(port) = lookup("SERVER_PORT") {
            self.server.port = port.trim().parse().map_err(|e| anyhow!("SERVER_PORT `{port}`: {e}"))?;
        }
        if let Some(kind) = lookup("STORAGE_TYPE") {
            self.storage.kind = kind.parse()?;
        }
        if let Some(file) = lookup("STORAGE_FILE") {
            self.storage.file = file;
        }
        if let Some(url) = lookup("NOTIFY_URL") {
            self.notify.url = url;
        }
        Ok(())
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.storage.normalize()?;
        self.notify.validate()?;
        Ok(())
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = default_host();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be in 1..=65535"));
        }
        if self.worker_threads.unwrap_or(0) == 0 {
            self.worker_threads = Some(4);
        }
        Ok(())
    }
}

impl StorageConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.file.trim().is_empty() {
            self.file = self.kind.default_file().to_string();
        }
        if self.kind.is_persistent() && self.file.trim().is_empty() {
            return Err(anyhow!("storage.file is required for {} storage", self.kind));
        }
        Ok(())
    }
}

impl NotifyConfig {
    fn validate(&self) -> Result<()> {
        let lower = self.url.to_lowercase();
        if !(lower.starts_with("http://") || lower.starts_with("https://")) {
            return Err(anyhow!("notify.url must start with http:// or https://"));
        }
        if self.timeout_secs == 0 {
            return Err(anyhow!("notify.timeout_secs must be positive"));
        }
        Ok(())
    }
}
