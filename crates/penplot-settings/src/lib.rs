//! penplot Settings Crate
//!
//! Handles the configuration file: stage parameters, output preferences,
//! JSON/TOML persistence and the platform config location.

pub mod config;
pub mod error;

pub use config::{
    config_dir, default_config_path, ensure_config_dir, Config, OutputSettings, APP_DIR_NAME,
    CONFIG_FILE_NAME,
};
pub use error::{ConfigError, SettingsError, SettingsResult};
