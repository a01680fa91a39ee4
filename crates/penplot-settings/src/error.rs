//! Error types for the settings crate.

use penplot_camtools::ParameterError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while locating, reading, writing or checking a config file.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("cannot read config '{}': {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("cannot write config '{}': {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },

    /// The file exists but is not valid JSON/TOML for [`crate::Config`].
    #[error("malformed config '{}': {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("cannot serialize config: {0}")]
    Serialize(String),

    /// A value parsed but makes no sense, e.g. a NaN rotation.
    #[error("invalid setting '{key}': {reason}")]
    InvalidSetting { key: String, reason: String },

    #[error("config directory: {0}")]
    ConfigDirectory(String),

    #[error(transparent)]
    Parameter(#[from] ParameterError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl SettingsError {
    pub(crate) fn parse(path: &std::path::Path, err: impl std::fmt::Display) -> Self {
        Self::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        }
    }
}

/// Structural problems with a config file or its values.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("unsupported config format '{0}' (expected .toml or .json)")]
    UnsupportedFormat(String),

    #[error("value out of range for '{key}': {value}")]
    ValueOutOfRange { key: String, value: String },
}

pub type SettingsResult<T> = Result<T, SettingsError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_messages_name_the_file() {
        let err = SettingsError::Read {
            path: PathBuf::from("/etc/penplot.toml"),
            source: io::Error::new(io::ErrorKind::NotFound, "not found"),
        };
        assert_eq!(
            err.to_string(),
            "cannot read config '/etc/penplot.toml': not found"
        );

        let err = SettingsError::parse(Path::new("a.json"), "expected value at line 1");
        assert_eq!(
            err.to_string(),
            "malformed config 'a.json': expected value at line 1"
        );
    }

    #[test]
    fn test_config_error_is_transparent() {
        let err: SettingsError = ConfigError::UnsupportedFormat("yaml".to_string()).into();
        assert!(matches!(err, SettingsError::Config(_)));
        assert_eq!(
            err.to_string(),
            "unsupported config format 'yaml' (expected .toml or .json)"
        );

        let err: SettingsError = ConfigError::ValueOutOfRange {
            key: "planner.draw_speed".to_string(),
            value: "-1".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "value out of range for 'planner.draw_speed': -1");
    }
}
