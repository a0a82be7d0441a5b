use crate::{Interval, Vec3};

/// Smallest accepted ray parameter; keeps shadow rays off their own surface.
pub const T_MIN: f32 = 1e-3;

/// Largest accepted ray parameter.
pub const T_MAX: f32 = f32::MAX;

/// A ray in 3D space with an origin and an (unnormalized) direction.
///
/// Directions are not normalized on construction: the ray tracer steps
/// primary ray directions incrementally and shadow rays span exactly
/// from the light to the hit point, so `t` is measured in units of
/// `direction`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// Create a new ray.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self { origin, direction }
    }

    /// Ray starting at `from` whose parameter 1 lands on `to`.
    pub fn between(from: Vec3, to: Vec3) -> Self {
        Self::new(from, to - from)
    }

    /// Get the point along the ray at parameter t.
    ///
    /// Returns: origin + t * direction
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// The default accepted parameter range `[T_MIN, T_MAX)`.
    pub fn range() -> Interval {
        Interval::new(T_MIN, T_MAX)
    }
}
