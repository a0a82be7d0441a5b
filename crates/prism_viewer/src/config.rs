//! Viewer configuration file.
//!
//! Every field has a default, so a config file only needs the keys it
//! changes. Command-line flags are applied on top afterwards.

use std::fs;
use std::path::{Path, PathBuf};

use prism_math::{Camera, Vec3};
use prism_raster::RenderOptions;
use prism_tracer::TraceSettings;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while reading a config file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Initial camera placement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraConfig {
    pub position: Vec3,
    pub direction: Vec3,
    /// Degrees.
    #[serde(default = "default_field_of_view")]
    pub field_of_view: f32,
}

fn default_field_of_view() -> f32 {
    90.0
}

impl CameraConfig {
    pub fn new(position: Vec3, direction: Vec3) -> Self {
        Self {
            position,
            direction,
            field_of_view: default_field_of_view(),
        }
    }

    /// Build the camera for a `width` x `height` window.
    pub fn build(&self, width: u32, height: u32) -> Camera {
        Camera::new(self.position, self.direction)
            .with_field_of_view(self.field_of_view.to_radians())
            .with_screen_size(width, height)
    }
}

/// Settings shared by both viewers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub width: u32,
    pub height: u32,
    /// Directory meshes and textures are loaded from.
    pub assets: PathBuf,
    /// Overrides the scene's own camera when set.
    pub camera: Option<CameraConfig>,
    pub render: RenderOptions,
    pub trace: TraceSettings,
    /// Ray tracer scene index.
    pub scene: usize,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            assets: PathBuf::from("assets"),
            camera: None,
            render: RenderOptions::default(),
            trace: TraceSettings::default(),
            scene: 0,
        }
    }
}

impl ViewerConfig {
    /// Read a JSON config file.
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_json::from_str(&content).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })?;

        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load `path` if given, otherwise start from the defaults.
    pub fn load_or_default(path: Option<&Path>) -> ConfigResult<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// The configured camera, or `fallback` (position, direction) at 90 degrees.
    pub fn camera_or(&self, fallback: (Vec3, Vec3)) -> Camera {
        self.camera
            .unwrap_or_else(|| CameraConfig::new(fallback.0, fallback.1))
            .build(self.width, self.height)
    }
}
