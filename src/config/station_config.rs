//! Station configuration sections - every tunable of the handheld as an
//! operator-editable TOML value.
//!
//! Each struct implements `Default` so a missing file or a partial file is
//! always usable: unset sections fall back to the built-in values.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::catalog::ColumnKeywords;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for one handheld inspection station.
///
/// Load with `StationConfig::load()` which searches:
/// 1. `$INSPECTA_CONFIG` env var
/// 2. `./station_config.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StationConfig {
    /// Station identification
    #[serde(default)]
    pub station: StationInfo,

    /// HTTP server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Criteria catalog location and column keywords
    #[serde(default)]
    pub catalog: CatalogSettings,

    /// Camera frame geometry and streaming pace
    #[serde(default)]
    pub camera: CameraSettings,

    /// Overlay guideline policy
    #[serde(default)]
    pub guidelines: GuidelineSettings,

    /// Capture archive location
    #[serde(default)]
    pub output: OutputSettings,
}

impl StationConfig {
    /// Load configuration using the standard search order:
    /// 1. `$INSPECTA_CONFIG` environment variable
    /// 2. `./station_config.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        // 1. Check env var
        if let Ok(path) = std::env::var("INSPECTA_CONFIG") {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), station = %config.station.name, "Loaded station config from INSPECTA_CONFIG");
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from INSPECTA_CONFIG, falling back");
                    }
                }
            } else {
                warn!(path = %path, "INSPECTA_CONFIG points to non-existent file, falling back");
            }
        }

        // 2. Check ./station_config.toml
        let local = PathBuf::from("station_config.toml");
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!(station = %config.station.name, "Loaded station config from ./station_config.toml");
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./station_config.toml, using defaults");
                }
            }
        }

        // 3. Defaults
        info!("No station_config.toml found - using built-in defaults");
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }
}

// ============================================================================
// Sections
// ============================================================================

/// Station identification, used in logs and report metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationInfo {
    /// Station name (shows up in the startup banner)
    #[serde(default = "defaults::station_name")]
    pub name: String,
    /// Site / plant identifier
    #[serde(default)]
    pub site: String,
}

impl Default for StationInfo {
    fn default() -> Self {
        Self {
            name: defaults::station_name(),
            site: String::new(),
        }
    }
}

/// HTTP server binding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "defaults::server_host")]
    pub host: String,
    #[serde(default = "defaults::server_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: defaults::server_host(),
            port: defaults::server_port(),
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Criteria catalog storage and the header keywords that identify the four
/// column roles.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogSettings {
    /// Directory scanned for `<project>_*` catalog files
    #[serde(default = "defaults::catalog_dir")]
    pub dir: String,
    #[serde(default = "defaults::defect_keyword")]
    pub defect_keyword: String,
    #[serde(default = "defaults::quality_keyword")]
    pub quality_keyword: String,
    #[serde(default = "defaults::finish_keyword")]
    pub finish_keyword: String,
    #[serde(default = "defaults::criteria_keyword")]
    pub criteria_keyword: String,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            dir: defaults::catalog_dir(),
            defect_keyword: defaults::defect_keyword(),
            quality_keyword: defaults::quality_keyword(),
            finish_keyword: defaults::finish_keyword(),
            criteria_keyword: defaults::criteria_keyword(),
        }
    }
}

impl CatalogSettings {
    /// Column keywords in the form the catalog loader consumes.
    pub fn keywords(&self) -> ColumnKeywords {
        ColumnKeywords {
            defect: self.defect_keyword.clone(),
            quality: self.quality_keyword.clone(),
            finish: self.finish_keyword.clone(),
            criteria: self.criteria_keyword.clone(),
        }
    }
}

/// Camera frame geometry and streaming pace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraSettings {
    #[serde(default = "defaults::camera_width")]
    pub width: u32,
    #[serde(default = "defaults::camera_height")]
    pub height: u32,
    /// Upper bound on viewfinder stream rate
    #[serde(default = "defaults::stream_max_fps")]
    pub stream_max_fps: u32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            width: defaults::camera_width(),
            height: defaults::camera_height(),
            stream_max_fps: defaults::stream_max_fps(),
        }
    }
}

/// Overlay guideline policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuidelineSettings {
    /// Defect types whose guideline renders on the light side of the frame
    #[serde(default = "defaults::light_side_defects")]
    pub light_side_defects: Vec<String>,
}

impl Default for GuidelineSettings {
    fn default() -> Self {
        Self {
            light_side_defects: defaults::light_side_defects(),
        }
    }
}

/// Capture archive location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    /// Directory where End-state frames are archived
    #[serde(default = "defaults::save_dir")]
    pub save_dir: String,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            save_dir: defaults::save_dir(),
        }
    }
}

/// Built-in default values, one function per `#[serde(default = ...)]`.
mod defaults {
    pub fn station_name() -> String {
        "HANDHELD-01".to_string()
    }
    pub fn server_host() -> String {
        "0.0.0.0".to_string()
    }
    pub fn server_port() -> u16 {
        8080
    }
    pub fn catalog_dir() -> String {
        "catalogs".to_string()
    }
    pub fn defect_keyword() -> String {
        "Defect".to_string()
    }
    pub fn quality_keyword() -> String {
        "Surface Quality".to_string()
    }
    pub fn finish_keyword() -> String {
        "Finish".to_string()
    }
    pub fn criteria_keyword() -> String {
        "Criteria".to_string()
    }
    pub fn camera_width() -> u32 {
        1280
    }
    pub fn camera_height() -> u32 {
        720
    }
    pub fn stream_max_fps() -> u32 {
        15
    }
    pub fn light_side_defects() -> Vec<String> {
        vec!["Chip".to_string(), "Scratch".to_string()]
    }
    pub fn save_dir() -> String {
        "captures".to_string()
    }
}
