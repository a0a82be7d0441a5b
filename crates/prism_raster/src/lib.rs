//! CPU triangle rasterizer.
//!
//! Scenes are lists of triangles, indexed meshes and strips, each bound to
//! diffuse, specular, gloss and normal surfaces. [`Rasterizer::render`]
//! projects them through a [`prism_math::Camera`] into a colour buffer.

pub mod coverage;
pub mod options;
pub mod rasterizer;
pub mod scene;
pub mod shading;

pub use options::{CullMode, DirectionalLight, RenderMode, RenderOptions, SamplerMode};
pub use rasterizer::{FrameStats, Rasterizer};
pub use scene::{Geometry, RasterObject, RasterScene, SceneError, Strip, SurfaceRefs};
