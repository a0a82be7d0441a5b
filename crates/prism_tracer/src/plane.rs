//! Infinite plane primitive.

use prism_math::{Ray, Vec3};

use crate::hittable::{CullMode, Hittable, Intersection};

/// A plane through `origin` facing `normal`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    pub origin: Vec3,
    pub normal: Vec3,
}

impl Plane {
    /// Plane through `origin`; `normal` is normalised.
    pub fn new(origin: Vec3, normal: Vec3) -> Self {
        Self {
            origin,
            normal: normal.normalize(),
        }
    }

    /// Plane through three points, facing `(b - a) x (c - a)`.
    ///
    /// The normal keeps the cross product's length.
    pub fn through(a: Vec3, b: Vec3, c: Vec3) -> Self {
        Self {
            origin: a,
            normal: (b - a).cross(c - a),
        }
    }
}

impl Hittable for Plane {
    fn intersect_line(&self, ray: &Ray, cull: CullMode) -> Option<Intersection> {
        let divisor = ray.direction.dot(self.normal);
        let rejected = match cull {
            CullMode::Front => divisor >= 0.0,
            CullMode::Back => divisor <= 0.0,
            CullMode::Both => divisor == 0.0,
            CullMode::None => true,
        };
        if rejected {
            return None;
        }

        let t = (self.origin - ray.origin).dot(self.normal) / divisor;
        Some(Intersection::at(t))
    }

    fn normal_at(&self, _point: Vec3, _hit: &Intersection, _view: Vec3) -> Vec3 {
        self.normal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hittable::RaySide;

    fn floor() -> Plane {
        Plane::new(Vec3::new(0.0, -2.0, 0.0), Vec3::Y)
    }

    #[test]
    fn test_front_hit_distance() {
        let ray = Ray::new(Vec3::new(0.0, 3.0, 0.0), Vec3::NEG_Y);
        let hit = floor().intersect_line(&ray, CullMode::Front).unwrap();

        assert!((hit.t - 5.0).abs() < 1e-5);
        assert!((ray.at(hit.t) - Vec3::new(0.0, -2.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_front_rejects_back_facing_and_grazing() {
        let from_below = Ray::new(Vec3::new(0.0, -5.0, 0.0), Vec3::Y);
        let grazing = Ray::new(Vec3::new(0.0, 3.0, 0.0), Vec3::X);

        assert!(floor().intersect_line(&from_below, CullMode::Front).is_none());
        assert!(floor().intersect_line(&grazing, CullMode::Front).is_none());
        assert!(floor().intersect_line(&from_below, CullMode::Back).is_some());
        assert!(floor().intersect_line(&grazing, CullMode::Both).is_none());
    }

    #[test]
    fn test_signed_distance_behind() {
        // Plane behind the origin: the line hit has negative t.
        let ray = Ray::new(Vec3::new(0.0, 3.0, 0.0), Vec3::Y);
        let hit = floor().intersect_line(&ray, CullMode::Both).unwrap();

        assert!((hit.t + 5.0).abs() < 1e-5);
        assert!(floor().intersect(&ray, CullMode::Both, Ray::range(), RaySide::Forward).is_none());
        assert!(floor().intersect(&ray, CullMode::Both, Ray::range(), RaySide::Behind).is_some());
    }

    #[test]
    fn test_through_points() {
        let plane = Plane::through(Vec3::ZERO, Vec3::X, Vec3::Y);
        assert_eq!(plane.normal, Vec3::Z);
    }
}
