//! The intersection seam shared by every tracer primitive.

use prism_math::{Interval, Ray, Vec3};
use serde::{Deserialize, Serialize};

use crate::{Plane, Sphere, TraceMesh};

/// Which side of a surface a ray may hit.
///
/// `None` hides an object from every ray without removing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CullMode {
    /// Only hits against the surface normal.
    #[default]
    Front,
    /// Only hits along the surface normal.
    Back,
    Both,
    None,
}

/// Which part of the ray line a hit must fall on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RaySide {
    /// `T_MIN <= t < T_MAX`.
    Forward,
    /// `-T_MAX < t <= -T_MIN`.
    Behind,
}

impl RaySide {
    pub fn accepts(self, range: Interval, t: f32) -> bool {
        match self {
            RaySide::Forward => range.accepts_forward(t),
            RaySide::Behind => range.accepts_behind(t),
        }
    }
}

/// Result of a ray-primitive test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection {
    /// Ray parameter of the hit.
    pub t: f32,
    /// Index of the face that was hit, for meshes.
    pub face: Option<usize>,
}

impl Intersection {
    pub fn at(t: f32) -> Self {
        Self { t, face: None }
    }
}

/// Objects that can be intersected by rays.
///
/// `intersect_line` reports the hit on the infinite line through the ray
/// honouring `cull`; range checks are left to [`Hittable::intersect`].
pub trait Hittable {
    fn intersect_line(&self, ray: &Ray, cull: CullMode) -> Option<Intersection>;

    /// Surface normal at `point`, not necessarily normalised.
    fn normal_at(&self, point: Vec3, hit: &Intersection, view: Vec3) -> Vec3;

    /// Hit within `range` on the requested `side` of the ray.
    fn intersect(&self, ray: &Ray, cull: CullMode, range: Interval, side: RaySide) -> Option<Intersection> {
        if cull == CullMode::None {
            return None;
        }
        self.intersect_line(ray, cull)
            .filter(|hit| side.accepts(range, hit.t))
    }
}

/// The geometric primitives a tracer object can be made of.
#[derive(Debug, Clone)]
pub enum Shape {
    Plane(Plane),
    Sphere(Sphere),
    Mesh(TraceMesh),
}

impl Hittable for Shape {
    fn intersect_line(&self, ray: &Ray, cull: CullMode) -> Option<Intersection> {
        match self {
            Shape::Plane(plane) => plane.intersect_line(ray, cull),
            Shape::Sphere(sphere) => sphere.intersect_line(ray, cull),
            Shape::Mesh(mesh) => mesh.intersect_line(ray, cull),
        }
    }

    fn normal_at(&self, point: Vec3, hit: &Intersection, view: Vec3) -> Vec3 {
        match self {
            Shape::Plane(plane) => plane.normal_at(point, hit, view),
            Shape::Sphere(sphere) => sphere.normal_at(point, hit, view),
            Shape::Mesh(mesh) => mesh.normal_at(point, hit, view),
        }
    }

    fn intersect(&self, ray: &Ray, cull: CullMode, range: Interval, side: RaySide) -> Option<Intersection> {
        match self {
            Shape::Plane(plane) => plane.intersect(ray, cull, range, side),
            Shape::Sphere(sphere) => sphere.intersect(ray, cull, range, side),
            Shape::Mesh(mesh) => mesh.intersect(ray, cull, range, side),
        }
    }
}
