//! Configuration handling for the ragspace binary.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Storage configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Ingestion configuration
    #[serde(default)]
    pub ingest: IngestSettings,

    /// Request limits
    #[serde(default)]
    pub limits: LimitsConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address for `ragspace serve`
    #[serde(default = "default_bind")]
    pub bind: String,
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    /// SQLite database path; defaults to the XDG data directory
    pub path: Option<PathBuf>,
}

impl StorageConfig {
    /// Resolve the database path, falling back to the XDG data directory.
    pub fn database_path(&self) -> Option<PathBuf> {
        if let Some(ref path) = self.path {
            return Some(path.clone());
        }
        data_dir().map(|dir| dir.join("ragspace.db"))
    }
}

/// Ingestion configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestSettings {
    /// Chunk size in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Cap on files per batch ingestion trigger
    #[serde(default = "default_max_files")]
    pub max_files: usize,

    /// Concurrent embedding calls per document
    #[serde(default = "default_embed_concurrency")]
    pub embed_concurrency: usize,
}

fn default_chunk_size() -> usize {
    1000
}

fn default_max_files() -> usize {
    5
}

fn default_embed_concurrency() -> usize {
    4
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            max_files: default_max_files(),
            embed_concurrency: default_embed_concurrency(),
        }
    }
}

/// Request limit configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Query requests allowed per window, per client
    #[serde(default = "default_max_requests")]
    pub max_requests: u32,

    /// Window length in seconds
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,
}

fn default_max_requests() -> u32 {
    30
}

fn default_window_secs() -> u64 {
    60
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_requests: default_max_requests(),
            window_secs: default_window_secs(),
        }
    }
}

impl Config {
    /// Load from the default config path, or defaults when no file exists.
    pub fn load() -> Result<Self, String> {
        Self::load_from(Self::config_path())
    }

    /// Load from an explicit path, or defaults when `path` is `None` or the
    /// file does not exist.
    pub fn load_from(path: Option<PathBuf>) -> Result<Self, String> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .map_err(|e| format!("read {}: {e}", path.display()))?;
        toml::from_str(&content).map_err(|e| format!("parse {}: {e}", path.display()))
    }

    /// Default config file location.
    pub fn config_path() -> Option<PathBuf> {
        if let Ok(dir) = std::env::var("RAGSPACE_CONFIG_DIR") {
            return Some(PathBuf::from(dir).join("config.toml"));
        }
        ProjectDirs::from("", "", "ragspace").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// A commented sample config.
    pub fn sample_toml() -> String {
        r#"# ragspace configuration

[server]
bind = "127.0.0.1:8080"

[storage]
# path = "/var/lib/ragspace/ragspace.db"

[ingest]
chunk_size = 1000
max_files = 5
embed_concurrency = 4

[limits]
max_requests = 30
window_secs = 60
"#
        .to_string()
    }
}

/// XDG data directory for ragspace.
pub fn data_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("RAGSPACE_DATA_DIR") {
        return Some(PathBuf::from(dir));
    }
    ProjectDirs::from("", "", "ragspace").map(|dirs| dirs.data_dir().to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.bind, "127.0.0.1:8080");
        assert_eq!(config.ingest.chunk_size, 1000);
        assert_eq!(config.ingest.max_files, 5);
        assert_eq!(config.limits.max_requests, 30);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let parsed: Config = toml::from_str("[ingest]\nchunk_size = 512\n").unwrap();
        assert_eq!(parsed.ingest.chunk_size, 512);
        assert_eq!(parsed.ingest.max_files, 5);
        assert_eq!(parsed.server.bind, "127.0.0.1:8080");
    }

    #[test]
    fn test_sample_parses() {
        let parsed: Result<Config, _> = toml::from_str(&Config::sample_toml());
        assert!(parsed.is_ok());
    }

    #[test]
    fn test_load_from_missing_file_is_default() {
        let config = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml"))).unwrap();
        assert_eq!(config.ingest.chunk_size, 1000);
    }
}
