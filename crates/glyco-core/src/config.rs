//! Configuration for glyco
//!
//! Centralized configuration for the server bind address, CORS origin and
//! model artifact locations.
//!
//! Values are resolved in three layers: built-in defaults, an optional TOML
//! file, then environment variables.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "GLYCO_CONFIG";
/// Environment variable overriding the bind address
pub const ADDR_ENV: &str = "GLYCO_ADDR";
/// Environment variable naming the single allowed CORS origin
pub const ORIGIN_ENV: &str = "FRONTEND_URL";
/// Environment variable overriding the classifier artifact path
pub const MODEL_PATH_ENV: &str = "GLYCO_MODEL_PATH";
/// Environment variable overriding the scaler artifact path
pub const SCALER_PATH_ENV: &str = "GLYCO_SCALER_PATH";

/// Config file looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "glyco.toml";

/// System-wide configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlycoConfig {
    /// HTTP server settings
    pub server: ServerConfig,
    /// Model artifact settings
    pub model: ModelConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to listen on
    pub bind_addr: String,
    /// Single origin allowed by CORS; any origin when unset
    pub allowed_origin: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8000".to_string(),
            allowed_origin: None,
        }
    }
}

/// Model artifact configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Path to the classifier artifact
    pub classifier_path: PathBuf,
    /// Path to the scaler artifact
    pub scaler_path: PathBuf,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            classifier_path: PathBuf::from("ml_model/diabetes_model.json"),
            scaler_path: PathBuf::from("ml_model/scaler.json"),
        }
    }
}

impl GlycoConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Serialize configuration to TOML
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Resolve the full configuration from the process environment.
    ///
    /// Returns the config and the file it was read from, if any.
    pub fn load() -> Result<(Self, Option<PathBuf>), ConfigError> {
        let env = |key: &str| std::env::var(key).ok();
        let file = Self::locate(env);

        let mut config = match &file {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env(env);
        config.validate()?;

        Ok((config, file))
    }

    /// Find the config file: `$GLYCO_CONFIG`, `./glyco.toml`, then the user config dir
    pub fn locate(env: impl Fn(&str) -> Option<String>) -> Option<PathBuf> {
        if let Some(explicit) = non_empty(env(CONFIG_ENV)) {
            return Some(PathBuf::from(explicit));
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.is_file() {
            return Some(local);
        }

        dirs::config_dir()
            .map(|dir| dir.join("glyco").join("config.toml"))
            .filter(|path| path.is_file())
    }

    /// Apply environment overrides; empty values are ignored.
    pub fn apply_env(&mut self, env: impl Fn(&str) -> Option<String>) {
        if let Some(addr) = non_empty(env(ADDR_ENV)) {
            self.server.bind_addr = addr;
        }
        if let Some(origin) = non_empty(env(ORIGIN_ENV)) {
            self.server.allowed_origin = Some(origin);
        }
        if let Some(path) = non_empty(env(MODEL_PATH_ENV)) {
            self.model.classifier_path = PathBuf::from(path);
        }
        if let Some(path) = non_empty(env(SCALER_PATH_ENV)) {
            self.model.scaler_path = PathBuf::from(path);
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.bind_addr()?;

        if let Some(origin) = &self.server.allowed_origin {
            let valid = !origin.is_empty()
                && origin
                    .bytes()
                    .all(|b| b.is_ascii_graphic() && b != b',');
            if !valid {
                return Err(ConfigError::Invalid {
                    key: "server.allowed_origin",
                    reason: format!("{:?} is not a single origin", origin),
                });
            }
        }

        if self.model.classifier_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid {
                key: "model.classifier_path",
                reason: "path is empty".to_string(),
            });
        }

        if self.model.scaler_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid {
                key: "model.scaler_path",
                reason: "path is empty".to_string(),
            });
        }

        Ok(())
    }

    /// Parsed bind address
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.server
            .bind_addr
            .parse()
            .map_err(|e: std::net::AddrParseError| ConfigError::Invalid {
                key: "server.bind_addr",
                reason: e.to_string(),
            })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
