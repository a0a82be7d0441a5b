//! Command-line flags for both viewers.

use std::path::PathBuf;

use clap::{Args, Parser};
use prism_raster::RenderMode;

use crate::config::{ConfigResult, ViewerConfig};

/// Flags both viewers accept.
#[derive(Debug, Clone, Default, Args)]
pub struct CommonArgs {
    /// JSON config file; flags override its values
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Window width in pixels
    #[arg(long)]
    pub width: Option<u32>,
    /// Window height in pixels
    #[arg(long)]
    pub height: Option<u32>,
    /// Directory meshes and textures are loaded from
    #[arg(long)]
    pub assets: Option<PathBuf>,
    /// Render a single frame to this image file instead of opening a window
    #[arg(long)]
    pub headless: Option<PathBuf>,
}

impl CommonArgs {
    /// Load the config file (or defaults) and apply the flags on top.
    pub fn load_config(&self) -> ConfigResult<ViewerConfig> {
        let mut config = ViewerConfig::load_or_default(self.config.as_deref())?;
        self.apply(&mut config);
        Ok(config)
    }

    fn apply(&self, config: &mut ViewerConfig) {
        if let Some(width) = self.width {
            config.width = width;
        }
        if let Some(height) = self.height {
            config.height = height;
        }
        if let Some(assets) = &self.assets {
            config.assets = assets.clone();
        }
    }
}

/// Software/hardware rasterizer viewer
#[derive(Debug, Clone, Parser)]
#[command(version, about, long_about = None)]
pub struct RasterArgs {
    #[command(flatten)]
    pub common: CommonArgs,
    /// Start in software rendering mode
    #[arg(long)]
    pub software: bool,
    /// Show the built-in primitives scene instead of the vehicle
    #[arg(long)]
    pub primitives: bool,
}

impl RasterArgs {
    pub fn load_config(&self) -> ConfigResult<ViewerConfig> {
        let mut config = self.common.load_config()?;
        if self.software {
            config.render.mode = RenderMode::Software;
        }
        Ok(config)
    }
}

/// CPU ray tracer viewer
#[derive(Debug, Clone, Parser)]
#[command(version, about, long_about = None)]
pub struct TraceArgs {
    #[command(flatten)]
    pub common: CommonArgs,
    /// Demo scene to start with (0 box, 1 open, 2 bunny)
    #[arg(short, long)]
    pub scene: Option<usize>,
    /// Render on a single thread
    #[arg(long)]
    pub serial: bool,
}

impl TraceArgs {
    pub fn load_config(&self) -> ConfigResult<ViewerConfig> {
        let mut config = self.common.load_config()?;
        if let Some(scene) = self.scene {
            config.scene = scene;
        }
        if self.serial {
            config.trace.parallel = false;
        }
        Ok(config)
    }
}
