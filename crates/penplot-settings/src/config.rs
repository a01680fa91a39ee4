//! Configuration file handling for penplot
//!
//! Holds the parameters of every pipeline stage plus output preferences.
//! Supports JSON and TOML files, chosen by extension; the default file lives in
//! the platform configuration directory.
//!
//! Configuration is organized into sections:
//! - Preprocessing (blur, morphology, thinning)
//! - Vectorization (simplification)
//! - Planning (feed rates, pen heights, filtering, ordering, units)
//! - Output (artifact directory, annotation, default placement)

use crate::error::{ConfigError, SettingsError, SettingsResult};
use penplot_camtools::{
    PlannerParameters, PreprocessParameters, ToolpathPipeline, VectorizeParameters,
};
use penplot_core::Placement;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name of the application directory under the platform config dir
pub const APP_DIR_NAME: &str = "penplot";
/// File name of the default configuration
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Output preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Directory for artifacts; next to the input image when unset
    pub output_directory: Option<PathBuf>,
    /// Prefix G-code with a comment header
    pub annotate_gcode: bool,
    /// Write the processed mask image
    pub write_mask: bool,
    /// Write the SVG path document
    pub write_svg: bool,
    /// Placement used when none is given on the command line
    pub default_placement: Placement,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            output_directory: None,
            annotate_gcode: true,
            write_mask: true,
            write_svg: true,
            default_placement: Placement::new(0.0, 0.0, 100.0, 100.0),
        }
    }
}

/// Complete application configuration
///
/// Aggregates all settings sections and provides file I/O operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Raster preprocessing
    pub preprocess: PreprocessParameters,
    /// Path extraction
    pub vectorize: VectorizeParameters,
    /// Toolpath planning
    pub planner: PlannerParameters,
    /// Output preferences
    pub output: OutputSettings,
}

enum FileFormat {
    Json,
    Toml,
}

fn file_format(path: &Path) -> SettingsResult<FileFormat> {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => Ok(FileFormat::Json),
        Some("toml") => Ok(FileFormat::Toml),
        other => Err(ConfigError::UnsupportedFormat(
            other.unwrap_or("<none>").to_string(),
        )
        .into()),
    }
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load config from file (JSON or TOML)
    pub fn load_from_file(path: &Path) -> SettingsResult<Self> {
        let format = file_format(path)?;
        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: Self = match format {
            FileFormat::Json => {
                serde_json::from_str(&content).map_err(|e| SettingsError::parse(path, e))?
            }
            FileFormat::Toml => {
                toml::from_str(&content).map_err(|e| SettingsError::parse(path, e))?
            }
        };

        config.validate()?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Save config to file (JSON or TOML)
    pub fn save_to_file(&self, path: &Path) -> SettingsResult<()> {
        self.validate()?;

        let content = match file_format(path)? {
            FileFormat::Json => serde_json::to_string_pretty(self)
                .map_err(|e| SettingsError::Serialize(e.to_string()))?,
            FileFormat::Toml => {
                toml::to_string_pretty(self).map_err(|e| SettingsError::Serialize(e.to_string()))?
            }
        };

        std::fs::write(path, content).map_err(|source| SettingsError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        debug!("Saved config to {}", path.display());
        Ok(())
    }

    /// Load `path` when given, else the default file if it exists, else defaults
    pub fn load_or_default(path: Option<&Path>) -> SettingsResult<Self> {
        if let Some(path) = path {
            return Self::load_from_file(path);
        }
        match default_config_path() {
            Ok(default) if default.is_file() => Self::load_from_file(&default),
            _ => Ok(Self::default()),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> SettingsResult<()> {
        self.preprocess.validate()?;
        self.vectorize.validate()?;
        self.planner.validate()?;

        let placement = &self.output.default_placement;
        placement
            .validate()
            .map_err(|e| SettingsError::InvalidSetting {
                key: "output.default_placement".to_string(),
                reason: e.to_string(),
            })?;
        if placement.width_mm <= 0.0 || placement.height_mm <= 0.0 {
            return Err(ConfigError::ValueOutOfRange {
                key: "output.default_placement".to_string(),
                value: format!("{} x {}", placement.width_mm, placement.height_mm),
            }
            .into());
        }

        Ok(())
    }

    /// Pipeline configured with these stage parameters
    pub fn pipeline(&self) -> ToolpathPipeline {
        ToolpathPipeline::new(
            self.preprocess.clone(),
            self.vectorize.clone(),
            self.planner.clone(),
        )
    }
}

/// Platform config directory for penplot
pub fn config_dir() -> SettingsResult<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .ok_or_else(|| {
            SettingsError::ConfigDirectory(
                "no configuration directory on this platform".to_string(),
            )
        })
}

/// Path of the default configuration file
pub fn default_config_path() -> SettingsResult<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Create the config directory if needed
pub fn ensure_config_dir() -> SettingsResult<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir)
        .map_err(|e| SettingsError::ConfigDirectory(format!("{}: {}", dir.display(), e)))?;
    Ok(dir)
}
