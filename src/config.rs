//! Configuration loader - YAML viewer settings + .env overrides

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::camera::DEFAULT_CAMERA_DISTANCE;
use crate::ingest::MalformedRows;

/// Main configuration loaded from viewer.yaml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub viewer: ViewerConfig,
    pub ingest: IngestConfig,
}

/// Rendering and interaction settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub window_size: [f32; 2],
    /// Marker radius in screen pixels
    pub point_radius: f32,
    /// Halo radius relative to the marker
    pub halo_scale: f32,
    /// Hover hit radius in screen pixels
    pub pick_radius: f32,
    /// `#rrggbb`
    pub background: String,
    pub camera_distance: f64,
    pub fov_degrees: f64,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            window_size: [1200.0, 800.0],
            point_radius: 4.0,
            halo_scale: 1.65,
            pick_radius: 6.0,
            background: "#000000".to_string(),
            camera_distance: DEFAULT_CAMERA_DISTANCE,
            fov_degrees: 75.0,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub malformed_rows: MalformedRows,
}

/// Settings loaded from the environment / .env
#[derive(Debug, Clone)]
pub struct Env {
    pub log_dir: PathBuf,
    /// File preloaded by the viewer when none is given on the command line
    pub data_file: Option<PathBuf>,
}

impl Config {
    /// Load configuration from YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(content)?;
        Ok(config)
    }

    /// Load from `path` if it exists, defaults otherwise
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            tracing::info!("Loading config from {:?}", path);
            Self::load(path)
        } else {
            tracing::warn!("Config file not found: {:?}, using defaults", path);
            Ok(Self::default())
        }
    }
}

impl Env {
    /// Load settings from .env file and process environment
    pub fn load() -> Self {
        dotenvy::dotenv().ok();

        Env {
            log_dir: std::env::var("GEOSCATTER_LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("logs")),
            data_file: std::env::var("GEOSCATTER_DATA")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
        }
    }
}
