//! Math substrate shared by the rasterizer and the ray tracer.
//!
//! Re-exports glam and adds the camera model, rays, intervals and the
//! raster/screen mappings both pipelines agree on.

// Re-export glam for convenience
pub use glam::*;

mod aabb;
mod camera;
mod frustum;
mod interval;
mod raster;
mod ray;
mod transform;

pub use aabb::Aabb;
pub use camera::{Camera, FRUSTUM_FAR, FRUSTUM_NEAR, VIEW_FAR, VIEW_NEAR};
pub use frustum::ClipRange;
pub use interval::Interval;
pub use raster::{ndc_to_raster, raster_to_screen, remap};
pub use ray::{Ray, T_MAX, T_MIN};
pub use transform::{Mat4Ext, Vec3Ext};
