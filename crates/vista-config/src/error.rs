//! Error types for configuration loading
//!
//! None of these halt operation: the config service logs them and keeps the
//! prior value. They are returned only from explicit file loading.

use std::path::PathBuf;

/// Errors raised while reading configuration overrides
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Override value could not be parsed for its key
    #[error("malformed value for {key}: '{value}'")]
    Parse {
        /// Override key (environment variable or field name)
        key: String,
        /// Raw value that failed to parse
        value: String,
    },

    /// Override value parsed but is out of range
    #[error("invalid value for {key}: {reason}")]
    Invalid {
        /// Field name
        key: &'static str,
        /// Why the value was rejected
        reason: &'static str,
    },

    /// IO error reading an override file
    #[error("io error reading {path}: {source}")]
    Io {
        /// File that failed to read
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Override file is not valid TOML for a config update
    #[error("invalid config file: {0}")]
    Toml(#[from] toml::de::Error),
}

impl ConfigError {
    /// Create parse error for key
    pub fn parse(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Parse {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
