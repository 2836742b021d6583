//! # Router Configuration
//!
//! Startup configuration for transwarp, loaded from a TOML file and/or
//! environment variables.
//!
//! ## File format
//!
//! ```toml
//! engine = "mock"
//! slow_match_threshold_us = 1000
//! ```
//!
//! ## Environment Variables
//!
//! ### `TRANSWARP_ENGINE`
//!
//! Name of the engine to look up in the [`EngineRegistry`](crate::registry::EngineRegistry).
//! An unknown name is a startup error, never a silent fallback.
//!
//! Default: `mock`
//!
//! ### `TRANSWARP_SLOW_MATCH_US`
//!
//! Route matches slower than this many microseconds are logged at `warn`.
//!
//! Default: `1000`

use serde::Deserialize;
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default engine name
pub const DEFAULT_ENGINE: &str = "mock";

const DEFAULT_SLOW_MATCH_US: u64 = 1000;

/// Errors raised while loading configuration or selecting an engine.
#[derive(Debug)]
pub enum ConfigError {
    /// The configured engine name is not registered
    UnknownEngine {
        requested: String,
        available: Vec<String>,
    },
    /// The config file could not be read
    Io { path: PathBuf, source: std::io::Error },
    /// The config text is not valid TOML for [`RouterConfig`]
    Parse(toml::de::Error),
    /// An environment variable holds an unusable value
    InvalidEnv { key: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::UnknownEngine {
                requested,
                available,
            } => write!(
                f,
                "unknown engine '{requested}' (available: {})",
                available.join(", ")
            ),
            ConfigError::Io { path, source } => {
                write!(f, "failed to read config '{}': {source}", path.display())
            }
            ConfigError::Parse(err) => write!(f, "invalid config: {err}"),
            ConfigError::InvalidEnv { key, value } => {
                write!(f, "invalid value '{value}' for {key}")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Parse(err) => Some(err),
            _ => None,
        }
    }
}

/// Router startup configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RouterConfig {
    /// Engine name, resolved through the engine registry
    pub engine: String,
    /// Threshold for the slow route match warning, in microseconds
    pub slow_match_threshold_us: u64,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            engine: DEFAULT_ENGINE.to_string(),
            slow_match_threshold_us: DEFAULT_SLOW_MATCH_US,
        }
    }
}

impl RouterConfig {
    /// Parse a TOML document; missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] for malformed TOML or unknown keys.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(ConfigError::Parse)
    }

    /// Read and parse a TOML config file.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`from_toml_str`](RouterConfig::from_toml_str).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Defaults overridden by environment variables.
    ///
    /// # Errors
    ///
    /// [`ConfigError::InvalidEnv`] when `TRANSWARP_SLOW_MATCH_US` is not a number.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env_overrides()
    }

    /// Apply `TRANSWARP_ENGINE` / `TRANSWARP_SLOW_MATCH_US` on top of `self`.
    ///
    /// # Errors
    ///
    /// See [`from_env`](RouterConfig::from_env).
    pub fn with_env_overrides(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| env::var(key).ok())
    }

    fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(engine) = lookup("TRANSWARP_ENGINE") {
            let engine = engine.trim();
            if !engine.is_empty() {
                self.engine = engine.to_string();
            }
        }
        if let Some(value) = lookup("TRANSWARP_SLOW_MATCH_US") {
            self.slow_match_threshold_us =
                value
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidEnv {
                        key: "TRANSWARP_SLOW_MATCH_US",
                        value,
                    })?;
        }
        Ok(self)
    }

    #[must_use]
    pub fn slow_match_threshold(&self) -> Duration {
        Duration::from_micros(self.slow_match_threshold_us)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = RouterConfig::default();
        assert_eq!(config.engine, "mock");
        assert_eq!(config.slow_match_threshold(), Duration::from_millis(1));
    }

    #[test]
    fn test_from_toml_partial() {
        let config = RouterConfig::from_toml_str("engine = \"hyper\"").unwrap();
        assert_eq!(config.engine, "hyper");
        assert_eq!(config.slow_match_threshold_us, 1000);
    }

    #[test]
    fn test_from_toml_rejects_unknown_keys() {
        let err = RouterConfig::from_toml_str("engnie = \"mock\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "engine = \"mock\"\nslow_match_threshold_us = 250").unwrap();
        let config = RouterConfig::load(file.path()).unwrap();
        assert_eq!(config.slow_match_threshold(), Duration::from_micros(250));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = RouterConfig::load(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert!(err.to_string().contains("absent.toml"));
    }

    #[test]
    fn test_overrides() {
        let config = RouterConfig::default()
            .with_overrides(|k| match k {
                "TRANSWARP_ENGINE" => Some(" gin ".to_string()),
                "TRANSWARP_SLOW_MATCH_US" => Some("50".to_string()),
                _ => None,
            })
            .unwrap();
        assert_eq!(config.engine, "gin");
        assert_eq!(config.slow_match_threshold_us, 50);

        let err = RouterConfig::default()
            .with_overrides(|k| (k == "TRANSWARP_SLOW_MATCH_US").then(|| "fast".to_string()))
            .unwrap_err();
        assert_eq!(err.to_string(), "invalid value 'fast' for TRANSWARP_SLOW_MATCH_US");
    }
}
