//! Sphere primitive for ray tracing.

use prism_math::{Ray, Vec3};

use crate::hittable::{CullMode, Hittable, Intersection};

/// A sphere given by centre and radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f32,
}

impl Sphere {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Both roots of the ray/sphere quadratic, near first, or `None` on a miss.
    pub fn roots(&self, ray: &Ray) -> Option<(f32, f32)> {
        let offset = ray.origin - self.center;
        let a = ray.direction.dot(ray.direction);
        let b = 2.0 * ray.direction.dot(offset);
        let c = offset.dot(offset) - self.radius * self.radius;

        let discriminant = b * b - 4.0 * a * c;
        if discriminant < 0.0 {
            return None;
        }

        let sqrtd = discriminant.sqrt();
        Some(((-b - sqrtd) / (2.0 * a), (-b + sqrtd) / (2.0 * a)))
    }
}

impl Hittable for Sphere {
    fn intersect_line(&self, ray: &Ray, cull: CullMode) -> Option<Intersection> {
        let (near, far) = self.roots(ray)?;
        let t = match cull {
            CullMode::Front => near,
            CullMode::Back => far,
            // Wrong when the ray starts inside the sphere; kept as is.
            CullMode::Both => near.min(far),
            CullMode::None => return None,
        };
        Some(Intersection::at(t))
    }

    fn normal_at(&self, point: Vec3, _hit: &Intersection, _view: Vec3) -> Vec3 {
        point - self.center
    }
}
