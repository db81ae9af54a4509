//! Runner configuration types and defaults.
//!
//! This module defines the configuration options for a run, including the
//! script variant, engine memory and stack limits, and the key store used
//! when a script asks for existing key material.

use crate::runner::Variant;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming a JSON configuration file
pub const CONFIG_ENV_VAR: &str = "CK_RUNNER_CONFIG";

/// Default engine memory limit (32 MB)
pub const DEFAULT_MEMORY_LIMIT_BYTES: u64 = 32 * 1024 * 1024;

/// Default engine stack size (1 MB)
pub const DEFAULT_STACK_SIZE_BYTES: u64 = 1024 * 1024;

/// Default maximum native method calls per run
pub const DEFAULT_MAX_HOST_CALLS: u32 = 10000;

/// Configuration for a single run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunnerConfig {
    /// Which fixed script to run (default: arithmetic)
    #[serde(default)]
    pub variant: Variant,

    /// Engine heap limit in bytes (default: 32MB)
    #[serde(default = "default_memory_limit")]
    pub memory_limit_bytes: u64,

    /// Engine stack size in bytes (default: 1MB)
    #[serde(default = "default_stack_size")]
    pub stack_size_bytes: u64,

    /// GC threshold in bytes (engine default if unset)
    #[serde(default)]
    pub gc_threshold_bytes: Option<u64>,

    /// Maximum native method calls per run
    #[serde(default = "default_max_host_calls")]
    pub max_host_calls: u32,

    /// Hex-encoded secret key file read when a script loads existing keys
    #[serde(default)]
    pub key_path: Option<PathBuf>,

    /// Enable debug mode (default: false)
    #[serde(default)]
    pub debug: bool,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            variant: Variant::default(),
            memory_limit_bytes: DEFAULT_MEMORY_LIMIT_BYTES,
            stack_size_bytes: DEFAULT_STACK_SIZE_BYTES,
            gc_threshold_bytes: None,
            max_host_calls: DEFAULT_MAX_HOST_CALLS,
            key_path: None,
            debug: false,
        }
    }
}

impl RunnerConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the configuration named by `CK_RUNNER_CONFIG`, or the defaults
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var_os(CONFIG_ENV_VAR) {
            Some(path) => Self::from_file(PathBuf::from(path)),
            None => Ok(Self::default()),
        }
    }

    /// Set the script variant
    pub fn with_variant(mut self, variant: Variant) -> Self {
        self.variant = variant;
        self
    }

    /// Set the engine memory limit
    pub fn with_memory_limit(mut self, bytes: u64) -> Self {
        self.memory_limit_bytes = bytes;
        self
    }

    /// Set the engine stack size
    pub fn with_stack_size(mut self, bytes: u64) -> Self {
        self.stack_size_bytes = bytes;
        self
    }

    /// Set the GC threshold
    pub fn with_gc_threshold(mut self, bytes: u64) -> Self {
        self.gc_threshold_bytes = Some(bytes);
        self
    }

    /// Set the native method call limit
    pub fn with_max_host_calls(mut self, max: u32) -> Self {
        self.max_host_calls = max;
        self
    }

    /// Set the key store path
    pub fn with_key_path(mut self, path: PathBuf) -> Self {
        self.key_path = Some(path);
        self
    }

    /// Enable debug mode
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.memory_limit_bytes < 1024 * 1024 {
            return Err(ConfigError::InvalidValue {
                field: "memory_limit_bytes".into(),
                reason: "must be at least 1MB".into(),
            });
        }

        if self.stack_size_bytes < 64 * 1024 {
            return Err(ConfigError::InvalidValue {
                field: "stack_size_bytes".into(),
                reason: "must be at least 64KB".into(),
            });
        }

        if self.max_host_calls == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_host_calls".into(),
                reason: "must be greater than 0".into(),
            });
        }

        if let Some(path) = &self.key_path {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::MissingField {
                    field: "key_path".into(),
                });
            }
        }

        Ok(())
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {reason}")]
    InvalidValue {
        /// The field name
        field: String,
        /// The reason it's invalid
        reason: String,
    },

    /// Missing required field
    #[error("Missing required configuration field: {field}")]
    MissingField {
        /// The field name
        field: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// Default value functions for serde
fn default_memory_limit() -> u64 {
    DEFAULT_MEMORY_LIMIT_BYTES
}

fn default_stack_size() -> u64 {
    DEFAULT_STACK_SIZE_BYTES
}

fn default_max_host_calls() -> u32 {
    DEFAULT_MAX_HOST_CALLS
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = RunnerConfig::default();
        assert_eq!(config.variant, Variant::Arithmetic);
        assert_eq!(config.memory_limit_bytes, DEFAULT_MEMORY_LIMIT_BYTES);
        assert_eq!(config.stack_size_bytes, DEFAULT_STACK_SIZE_BYTES);
        assert!(config.key_path.is_none());
        assert!(!config.debug);
    }

    #[test]
    fn test_config_builder() {
        let config = RunnerConfig::new()
            .with_variant(Variant::KeyPair)
            .with_memory_limit(64 * 1024 * 1024)
            .with_max_host_calls(8)
            .with_key_path(PathBuf::from("keys/ck.key"));

        assert_eq!(config.variant, Variant::KeyPair);
        assert_eq!(config.memory_limit_bytes, 64 * 1024 * 1024);
        assert_eq!(config.max_host_calls, 8);
        assert_eq!(config.key_path, Some(PathBuf::from("keys/ck.key")));
    }

    #[test]
    fn test_config_validation() {
        assert!(RunnerConfig::default().validate().is_ok());
        assert!(RunnerConfig::new().with_memory_limit(1024).validate().is_err());
        assert!(RunnerConfig::new().with_stack_size(4096).validate().is_err());
        assert!(RunnerConfig::new().with_max_host_calls(0).validate().is_err());
        assert!(RunnerConfig::new()
            .with_key_path(PathBuf::new())
            .validate()
            .is_err());
    }

    #[test]
    fn test_config_serialization() {
        let config = RunnerConfig::new().with_variant(Variant::PublicKey);
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"variant\":\"public-key\""));

        let parsed: RunnerConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.variant, Variant::PublicKey);
        assert_eq!(parsed.stack_size_bytes, config.stack_size_bytes);
    }

    #[test]
    fn test_config_from_file_applies_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"variant": "key-pair", "debug": true}}"#).unwrap();

        let config = RunnerConfig::from_file(file.path()).unwrap();
        assert_eq!(config.variant, Variant::KeyPair);
        assert!(config.debug);
        assert_eq!(config.memory_limit_bytes, DEFAULT_MEMORY_LIMIT_BYTES);
    }

    #[test]
    fn test_config_from_file_rejects_invalid() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"stackSizeBytes": 16}}"#).unwrap();

        let err = RunnerConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }
}
