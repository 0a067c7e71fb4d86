//! Configuration module for homedrive.

use serde::Deserialize;
use std::path::Path;

use crate::store::DEFAULT_QUOTA_BYTES;
use crate::{DriveError, Result};

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// CORS allowed origins.
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// Whether to serve the browser client from `static_path`.
    #[serde(default)]
    pub serve_static: bool,
    /// Path to static files directory.
    #[serde(default = "default_static_path")]
    pub static_path: String,
    /// Whether to expose the storage root read-only under `/raw`.
    #[serde(default = "default_serve_root")]
    pub serve_root: bool,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_static_path() -> String {
    "web/dist".to_string()
}

fn default_serve_root() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: vec![],
            serve_static: false,
            static_path: default_static_path(),
            serve_root: default_serve_root(),
        }
    }
}

/// File storage configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Root directory all files live under.
    #[serde(default = "default_root")]
    pub root: String,
    /// Storage quota in bytes.
    #[serde(default = "default_quota_bytes")]
    pub quota_bytes: u64,
    /// Reject uploads that would exceed the quota (advisory only when false).
    #[serde(default)]
    pub enforce_quota: bool,
    /// Maximum size of a single uploaded file in megabytes.
    #[serde(default = "default_max_upload_size")]
    pub max_upload_size_mb: u64,
    /// Maximum number of files accepted by one upload request.
    #[serde(default = "default_max_files_per_upload")]
    pub max_files_per_upload: usize,
}

fn default_root() -> String {
    "data/files".to_string()
}

fn default_quota_bytes() -> u64 {
    DEFAULT_QUOTA_BYTES
}

fn default_max_upload_size() -> u64 {
    2048
}

fn default_max_files_per_upload() -> usize {
    100
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            quota_bytes: default_quota_bytes(),
            enforce_quota: false,
            max_upload_size_mb: default_max_upload_size(),
            max_files_per_upload: default_max_files_per_upload(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/homedrive.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// File storage configuration.
    #[serde(default)]
    pub storage: StorageConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| DriveError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `HOMEDRIVE_ROOT`: Override the storage root directory
    /// - `HOMEDRIVE_PORT`: Override the listen port
    pub fn apply_env_overrides(&mut self) {
        if let Ok(root) = std::env::var("HOMEDRIVE_ROOT") {
            if !root.is_empty() {
                self.storage.root = root;
            }
        }

        if let Ok(port) = std::env::var("HOMEDRIVE_PORT") {
            match port.parse() {
                Ok(port) => self.server.port = port,
                Err(_) => eprintln!("Ignoring invalid HOMEDRIVE_PORT value: {port}"),
            }
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.storage.root.trim().is_empty() {
            return Err(DriveError::Config("storage.root must not be empty".to_string()));
        }
        if self.storage.quota_bytes == 0 {
            return Err(DriveError::Config(
                "storage.quota_bytes must be greater than zero".to_string(),
            ));
        }
        if self.storage.max_files_per_upload == 0 {
            return Err(DriveError::Config(
                "storage.max_files_per_upload must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Maximum single upload size in bytes.
    pub fn max_upload_size_bytes(&self) -> u64 {
        self.storage.max_upload_size_mb.saturating_mul(1024 * 1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 5000);
        assert!(config.server.cors_origins.is_empty());
        assert!(!config.server.serve_static);
        assert_eq!(config.server.static_path, "web/dist");
        assert!(config.server.serve_root);

        assert_eq!(config.storage.root, "data/files");
        assert_eq!(config.storage.quota_bytes, 100 * 1024 * 1024 * 1024);
        assert!(!config.storage.enforce_quota);
        assert_eq!(config.storage.max_upload_size_mb, 2048);
        assert_eq!(config.storage.max_files_per_upload, 100);

        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.file, "logs/homedrive.log");
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[server]
host = "127.0.0.1"
port = 8080
cors_origins = ["http://localhost:5173"]
serve_static = true
static_path = "public"
serve_root = false

[storage]
root = "/srv/drive"
quota_bytes = 1073741824
enforce_quota = true
max_upload_size_mb = 64
max_files_per_upload = 10

[logging]
level = "debug"
file = "custom/logs/app.log"
"#;

        let config = Config::parse(toml).unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.cors_origins, vec!["http://localhost:5173"]);
        assert!(config.server.serve_static);
        assert_eq!(config.server.static_path, "public");
        assert!(!config.server.serve_root);

        assert_eq!(config.storage.root, "/srv/drive");
        assert_eq!(config.storage.quota_bytes, 1024 * 1024 * 1024);
        assert!(config.storage.enforce_quota);
        assert_eq!(config.storage.max_upload_size_mb, 64);
        assert_eq!(config.storage.max_files_per_upload, 10);
        assert_eq!(config.max_upload_size_bytes(), 64 * 1024 * 1024);

        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.file, "custom/logs/app.log");
    }

    #[test]
    fn test_parse_partial_config() {
        let toml = r#"
[storage]
root = "drive"
"#;

        let config = Config::parse(toml).unwrap();

        assert_eq!(config.storage.root, "drive");
        assert_eq!(config.storage.max_files_per_upload, 100);
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_parse_empty_config() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.storage.root, "data/files");
    }

    #[test]
    fn test_parse_invalid_config() {
        let result = Config::parse("this is not valid toml [[[");

        assert!(result.is_err());
        if let Err(DriveError::Config(msg)) = result {
            assert!(msg.contains("config parse error"));
        } else {
            panic!("Expected Config error");
        }
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = Config::load("nonexistent.toml");
        assert!(matches!(result, Err(DriveError::OperationFailed(_))));
    }

    #[test]
    fn test_apply_env_overrides() {
        let original_root = std::env::var("HOMEDRIVE_ROOT").ok();
        let original_port = std::env::var("HOMEDRIVE_PORT").ok();

        std::env::set_var("HOMEDRIVE_ROOT", "/tmp/env-drive");
        std::env::set_var("HOMEDRIVE_PORT", "9090");

        let mut config = Config::default();
        config.apply_env_overrides();

        assert_eq!(config.storage.root, "/tmp/env-drive");
        assert_eq!(config.server.port, 9090);

        std::env::set_var("HOMEDRIVE_PORT", "not-a-port");
        let mut config = Config::default();
        config.apply_env_overrides();
        assert_eq!(config.server.port, 5000);

        match original_root {
            Some(val) => std::env::set_var("HOMEDRIVE_ROOT", val),
            None => std::env::remove_var("HOMEDRIVE_ROOT"),
        }
        match original_port {
            Some(val) => std::env::set_var("HOMEDRIVE_PORT", val),
            None => std::env::remove_var("HOMEDRIVE_PORT"),
        }
    }

    #[test]
    fn test_validate_defaults() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_empty_root() {
        let mut config = Config::default();
        config.storage.root = "  ".to_string();

        let result = config.validate();
        assert!(matches!(result, Err(DriveError::Config(msg)) if msg.contains("storage.root")));
    }

    #[test]
    fn test_validate_zero_quota() {
        let mut config = Config::default();
        config.storage.quota_bytes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_zero_files_per_upload() {
        let mut config = Config::default();
        config.storage.max_files_per_upload = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_example_config_parses() {
        let config = Config::parse(include_str!("../config.example.toml")).unwrap();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.storage.quota_bytes, DEFAULT_QUOTA_BYTES);
        assert!(!config.storage.enforce_quota);
        assert!(config.validate().is_ok());
    }
}
