//! CPU ray tracer with direct lighting.
//!
//! Planes, spheres and triangle meshes lit by point and directional
//! lights, shaded with a Lambert/Phong blend or Cook-Torrance, with
//! optional hard shadows. Frames are rendered in buckets, in parallel
//! with rayon.

pub mod brdf;
mod bucket;
mod hittable;
mod light;
mod material;
mod plane;
mod renderer;
mod scene;
pub mod scenes;
mod sphere;
mod triangle;

pub use bucket::{generate_buckets, render_bucket, Bucket, BucketResult, DEFAULT_BUCKET_SIZE};
pub use hittable::{CullMode, Hittable, Intersection, RaySide, Shape};
pub use light::{DirectionalLight, Incident, Light, PointLight};
pub use material::Material;
pub use plane::Plane;
pub use renderer::{apply_tone_mapping, shade_hit, trace_ray, PrimaryRays, ToneMapping, TraceSettings, Tracer};
pub use scene::{Hit, TraceObject, TraceScene};
pub use sphere::Sphere;
pub use triangle::{intersect_triangle, TraceMesh};
