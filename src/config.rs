//! Configuration management for RAX File Server
//!
//! All values are startup configuration: they are read once, validated, and
//! then shared read-only with every request handler.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 5000;
const DEFAULT_SERVER_ROOT: &str = "./server_root";
const DEFAULT_MAX_UPLOAD_SIZE_MB: u64 = 16;

/// Name of the optional configuration file (without extension)
const CONFIG_FILE: &str = "config";

/// Prefix for environment overrides, e.g. `RAX_FS_PORT`
const ENV_PREFIX: &str = "RAX_FS";

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    // ═══ NETWORK (Environment Override Supported) ═══
    /// IP address the HTTP listener binds to
    pub bind_address: String,

    /// Port for the HTTP listener
    pub port: u16,

    // ═══ STORAGE ═══
    /// Root directory exposed by the API
    pub server_root: String,

    /// Maximum upload size in MiB
    pub max_upload_size_mb: u64,
}

impl ServerConfig {
    /// Load configuration from defaults, `config.toml` (if present) and
    /// `RAX_FS_*` environment variables, in increasing precedence.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    /// Same as [`ServerConfig::load`] but with an explicit config file path.
    pub fn load_from(config_path: &Path) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .set_default("bind_address", DEFAULT_BIND_ADDRESS)?
            .set_default("port", i64::from(DEFAULT_PORT))?
            .set_default("server_root", DEFAULT_SERVER_ROOT)?
            .set_default("max_upload_size_mb", DEFAULT_MAX_UPLOAD_SIZE_MB as i64)?
            .add_source(File::from(config_path).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()?;

        let config: ServerConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validation for all configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::Message("port cannot be 0".into()));
        }

        if self.bind_address.trim().is_empty() {
            return Err(ConfigError::Message("bind_address cannot be empty".into()));
        }

        if self.server_root.trim().is_empty() {
            return Err(ConfigError::Message("server_root cannot be empty".into()));
        }

        if self.max_upload_size_mb == 0 {
            return Err(ConfigError::Message(
                "max_upload_size_mb must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Bind address and port as a socket address string
    pub fn socket_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    /// Server root as PathBuf
    pub fn server_root_path(&self) -> PathBuf {
        PathBuf::from(&self.server_root)
    }

    /// Maximum upload size in bytes
    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_size_mb * 1024 * 1024
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            port: DEFAULT_PORT,
            server_root: DEFAULT_SERVER_ROOT.to_string(),
            max_upload_size_mb: DEFAULT_MAX_UPLOAD_SIZE_MB,
        }
    }
}
