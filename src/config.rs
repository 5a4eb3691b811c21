use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Configuration file looked up in the working directory.
pub const CONFIG_FILE: &str = "solar.toml";

/// Complete configuration, loaded from TOML.
///
/// Every section and field is optional; missing ones take their defaults.
///
/// # Example
/// ```
/// use solar::config::Config;
///
/// let config: Config = toml::from_str("[parser]\nstrict = true").unwrap();
/// assert!(config.parser.strict);
/// assert_eq!(config.runtime.max_call_depth, 64);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Line parser settings.
    pub parser:  ParserConfig,
    /// Program execution settings.
    pub runtime: RuntimeConfig,
    /// Expression sandbox limits.
    pub sandbox: SandboxConfig,
}

/// Line parser settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ParserConfig {
    /// Fail on lines that would otherwise be kept as passthrough.
    pub strict: bool,
}

/// Program execution settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Most passes a `loop` block may run.
    pub max_frames:     usize,
    /// Deepest nesting of user function calls.
    pub max_call_depth: usize,
    /// Whether the bundled host prints program output to stdout.
    pub echo_output:    bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self { max_frames:     10_000,
               max_call_depth: 64,
               echo_output:    true, }
    }
}

/// Expression sandbox limits.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SandboxConfig {
    /// Longest expression source accepted, in bytes.
    pub max_source_len:     usize,
    /// Deepest expression nesting accepted.
    pub max_depth:          usize,
    /// Longest string, list, tuple or map an expression may produce.
    pub max_collection_len: usize,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self { max_source_len:     4096,
               max_depth:          64,
               max_collection_len: 100_000, }
    }
}

impl Config {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    /// `ConfigError::Io` if the file cannot be read, `ConfigError::Toml` if it
    /// does not match the schema.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let data = fs::read_to_string(path).map_err(|source| ConfigError::Io { path: path.to_path_buf(),
                                                                               source })?;
        toml::from_str(&data).map_err(|source| ConfigError::Toml { path: path.to_path_buf(),
                                                                   source })
    }

    /// Resolves the configuration for a run.
    ///
    /// An explicit path must load. Otherwise `solar.toml` in the working
    /// directory is used when present, and defaults when not.
    ///
    /// # Errors
    /// Any error from [`Config::load`].
    pub fn discover(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let local = PathBuf::from(CONFIG_FILE);
        if local.is_file() { Self::load(&local) } else { Ok(Self::default()) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.sandbox.max_source_len, 4096);
        assert_eq!(config.runtime.max_frames, 10_000);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config: Config = toml::from_str("[sandbox]\nmax_depth = 8").unwrap();
        assert_eq!(config.sandbox.max_depth, 8);
        assert_eq!(config.sandbox.max_collection_len, 100_000);
        assert!(config.runtime.echo_output);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let err = Config::discover(Some(Path::new("does/not/exist.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn unknown_types_are_rejected() {
        assert!(toml::from_str::<Config>("[parser]\nstrict = \"yes\"").is_err());
    }
}
