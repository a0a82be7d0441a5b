// Small extensions on top of glam used by both pipelines.
//
// Note: glam::Mat4 already provides transform_point3() and transform_vector3()

use glam::{Mat3, Mat4, Vec3};
use crate::Aabb;

/// Extension trait for Mat4.
pub trait Mat4Ext {
    /// Rotation by `rotation` about `center` rather than the origin.
    fn rotation_about(center: Vec3, rotation: Mat3) -> Mat4;

    /// Transform an axis-aligned bounding box.
    /// Computes the bounding box of all 8 transformed corners.
    fn transform_aabb(&self, aabb: &Aabb) -> Aabb;
}

impl Mat4Ext for Mat4 {
    fn rotation_about(center: Vec3, rotation: Mat3) -> Mat4 {
        Mat4::from_translation(center)
            * Mat4::from_mat3(rotation)
            * Mat4::from_translation(-center)
    }

    fn transform_aabb(&self, aabb: &Aabb) -> Aabb {
        if aabb.is_empty() {
            return *aabb;
        }
        Aabb::from_points(aabb.corners().map(|c| self.transform_point3(c)))
    }
}

/// Extension trait for Vec3 used as a direction or an RGB colour.
pub trait Vec3Ext {
    /// Mirror `self` about the plane with unit normal `normal`.
    ///
    /// The result points away from the surface when `self` points into it.
    fn reflect_about(self, normal: Vec3) -> Vec3;

    /// Largest of the three components.
    fn max_channel(self) -> f32;

    /// Scale down so the largest channel is at most 1. Hue is preserved.
    fn max_to_one(self) -> Vec3;
}

impl Vec3Ext for Vec3 {
    fn reflect_about(self, normal: Vec3) -> Vec3 {
        self - 2.0 * self.dot(normal) * normal
    }

    fn max_channel(self) -> f32 {
        self.max_element()
    }

    fn max_to_one(self) -> Vec3 {
        let max = self.max_channel();
        if max > 1.0 {
            self / max
        } else {
            self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_rotation_about_keeps_center_fixed() {
        let center = Vec3::new(2.0, 4.0, 0.0);
        let m = Mat4::rotation_about(center, Mat3::from_rotation_y(FRAC_PI_2));

        assert!((m.transform_point3(center) - center).length() < 1e-5);

        // One unit along +X from the centre swings to -Z.
        let p = m.transform_point3(center + Vec3::X);
        assert!((p - (center - Vec3::Z)).length() < 1e-5);
    }

    #[test]
    fn test_transform_aabb_translation() {
        let aabb = Aabb::from_corners(Vec3::ZERO, Vec3::ONE);
        let m = Mat4::from_translation(Vec3::new(5.0, 0.0, 0.0));
        let out = m.transform_aabb(&aabb);

        assert_eq!(out.min, Vec3::new(5.0, 0.0, 0.0));
        assert_eq!(out.max, Vec3::new(6.0, 1.0, 1.0));
    }

    #[test]
    fn test_reflect_about() {
        let incoming = Vec3::new(1.0, -1.0, 0.0);
        let reflected = incoming.reflect_about(Vec3::Y);
        assert_eq!(reflected, Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_max_to_one() {
        let c = Vec3::new(2.0, 1.0, 0.5).max_to_one();
        assert!((c - Vec3::new(1.0, 0.5, 0.25)).length() < 1e-6);

        let dim = Vec3::new(0.2, 0.4, 0.9);
        assert_eq!(dim.max_to_one(), dim);
    }
}
