//! Conversions between normalized device coordinates and raster pixels.
//!
//! Raster space has its origin at the top-left pixel centre and y pointing
//! down. NDC has y pointing up and spans `[-1, 1]` on both axes.

use crate::Vec2;

/// Map an NDC position to raster coordinates for a `width` x `height` target.
pub fn ndc_to_raster(ndc: Vec2, width: u32, height: u32) -> Vec2 {
    let w = width as f32;
    let h = height as f32;
    Vec2::new(w / 2.0 * (1.0 + ndc.x) - 0.5, h / 2.0 * (1.0 - ndc.y) - 0.5)
}

/// Inverse of [`ndc_to_raster`]: raster pixel `(x, y)` to NDC.
pub fn raster_to_screen(x: f32, y: f32, width: u32, height: u32) -> Vec2 {
    let w = width as f32;
    let h = height as f32;
    Vec2::new((x + 0.5) * 2.0 / w - 1.0, 1.0 - (y + 0.5) * 2.0 / h)
}

/// Linear map of `value` from `[lo, hi]` onto `[0, 1]` (not clamped).
pub fn remap(value: f32, lo: f32, hi: f32) -> f32 {
    (value - lo) / (hi - lo)
}
