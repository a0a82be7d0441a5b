//! Shared pieces of the rasterizer and ray tracer viewers.

pub mod camera_control;
pub mod cli;
pub mod config;
pub mod input;

use std::path::Path;

use anyhow::{Context, Result};
use prism_core::ImageBuffer;

/// File the screenshot key writes to.
pub const SCREENSHOT_FILE: &str = "BackbufferRender.bmp";

/// Log to stderr at info level unless `RUST_LOG` says otherwise.
pub fn init_logging() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();
}

/// Write a frame to disk; the format follows the extension.
pub fn save_frame(image: &ImageBuffer, path: &Path) -> Result<()> {
    image
        .save(path)
        .with_context(|| format!("Failed to save frame to {}", path.display()))
}

/// Frames-per-second counter reporting once a second.
#[derive(Debug, Default)]
pub struct FrameTimer {
    frame_count: u32,
    elapsed: f32,
}

impl FrameTimer {
    /// Count a frame lasting `delta_time` seconds. Returns the FPS when a
    /// second has passed since the last report.
    pub fn tick(&mut self, delta_time: f32) -> Option<f32> {
        self.frame_count += 1;
        self.elapsed += delta_time;

        if self.elapsed < 1.0 {
            return None;
        }
        let fps = self.frame_count as f32 / self.elapsed;
        self.frame_count = 0;
        self.elapsed = 0.0;
        Some(fps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_timer_reports_once_a_second() {
        let mut timer = FrameTimer::default();
        for _ in 0..3 {
            assert!(timer.tick(0.25).is_none());
        }
        let fps = timer.tick(0.25).unwrap();
        assert!((fps - 4.0).abs() < 1e-3);
        assert!(timer.tick(0.25).is_none());
    }
}
