//! Scene assets shared by the rasterizer and the ray tracer.
//!
//! This crate provides:
//!
//! - **Meshes**: `Vertex`, `Mesh` and a deduplicating `MeshBuilder`
//! - **OBJ loading**: checked conversion from `tobj` models
//! - **Surfaces**: `Texture`, `SurfaceId` and the owning `SurfaceTable`
//! - **Pixels**: the `ImageBuffer` both pipelines render into

pub mod framebuffer;
pub mod mesh;
pub mod obj;
pub mod texture;

// Re-export commonly used types
pub use framebuffer::{clamp_01, color_to_rgba, Color, ImageBuffer};
pub use mesh::{Face, Mesh, MeshBuilder, Vertex};
pub use obj::{load_obj, load_obj_positions, MeshError, MeshResult};
pub use texture::{SurfaceId, SurfaceTable, Texture, TextureError, TextureResult};
