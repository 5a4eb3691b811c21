use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("Failed to read config file '{}': {source}", path.display())]
    Io {
        /// The file that was requested.
        path:   PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
    /// The file is not valid TOML for the configuration schema.
    #[error("Invalid config file '{}': {source}", path.display())]
    Toml {
        /// The file that was parsed.
        path:   PathBuf,
        /// The decoding error.
        source: toml::de::Error,
    },
}
