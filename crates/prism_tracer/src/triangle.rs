//! Ray/triangle intersection and triangle meshes for the tracer.

use prism_core::{Mesh, MeshResult};
use prism_math::{Interval, Mat3, Ray, Vec3};
use std::path::Path;

use crate::hittable::{CullMode, Hittable, Intersection, RaySide};
use crate::plane::Plane;

/// Intersect the line through `ray` with triangle `[a, b, c]`.
///
/// The triangle faces `(b - a) x (c - a)`; `cull` applies to that plane.
/// The hit point must lie on the inner side of all three edges.
pub fn intersect_triangle(ray: &Ray, [a, b, c]: [Vec3; 3], cull: CullMode) -> Option<f32> {
    let plane = Plane::through(a, b, c);
    let t = plane.intersect_line(ray, cull)?.t;

    let point = ray.at(t);
    let n = plane.normal;

    if n.dot((b - a).cross(point - a)) < 0.0 {
        return None;
    }
    if n.dot((c - a).cross(point - a)) > 0.0 {
        return None;
    }
    if n.dot((c - b).cross(point - b)) < 0.0 {
        return None;
    }

    Some(t)
}

/// A triangle mesh the tracer can intersect.
#[derive(Debug, Clone)]
pub struct TraceMesh {
    mesh: Mesh,
}

impl TraceMesh {
    pub fn new(mesh: Mesh) -> Self {
        Self { mesh }
    }

    /// Positions-only OBJ, faces kept as written.
    pub fn load(path: &Path) -> MeshResult<Self> {
        Ok(Self::new(prism_core::load_obj_positions(path)?))
    }

    /// A single-triangle mesh.
    pub fn triangle(a: Vec3, b: Vec3, c: Vec3) -> Self {
        Self::new(Mesh::from_positions(&[a, b, c], vec![[0, 1, 2]]))
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn translate(&mut self, offset: Vec3) {
        self.mesh.translate(offset);
    }

    /// Spin about the mesh centre around the world Y axis.
    pub fn spin(&mut self, angle: f32) {
        self.mesh.rotate_about_center(Mat3::from_rotation_y(angle));
    }

    /// Nearest accepted triangle hit, measured by `|t|`.
    fn nearest(&self, ray: &Ray, cull: CullMode, accept: impl Fn(f32) -> bool) -> Option<Intersection> {
        self.mesh
            .triangles()
            .enumerate()
            .filter_map(|(face, triangle)| {
                intersect_triangle(ray, triangle, cull)
                    .filter(|&t| accept(t))
                    .map(|t| Intersection { t, face: Some(face) })
            })
            .min_by(|a, b| a.t.abs().total_cmp(&b.t.abs()))
    }
}

impl Hittable for TraceMesh {
    fn intersect_line(&self, ray: &Ray, cull: CullMode) -> Option<Intersection> {
        self.nearest(ray, cull, |_| true)
    }

    /// Face normal, flipped to face against `view`.
    fn normal_at(&self, _point: Vec3, hit: &Intersection, view: Vec3) -> Vec3 {
        let Some(face) = hit.face else {
            return Vec3::ZERO;
        };
        let [a, b, c] = self.mesh.face_positions(face);
        let normal = (b - a).cross(c - a);
        if normal.dot(view) > 0.0 {
            -normal
        } else {
            normal
        }
    }

    fn intersect(&self, ray: &Ray, cull: CullMode, range: Interval, side: RaySide) -> Option<Intersection> {
        if cull == CullMode::None {
            return None;
        }
        self.nearest(ray, cull, |t| side.accepts(range, t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Faces -Z, towards a camera looking down +Z.
    fn facing_triangle(z: f32) -> [Vec3; 3] {
        [
            Vec3::new(-1.0, 0.0, z),
            Vec3::new(0.0, 1.0, z),
            Vec3::new(1.0, 0.0, z),
        ]
    }

    #[test]
    fn test_triangle_hit_and_miss() {
        let tri = facing_triangle(5.0);
        let hit = Ray::new(Vec3::new(0.0, 0.5, 0.0), Vec3::Z);
        let outside = Ray::new(Vec3::new(0.9, 0.9, 0.0), Vec3::Z);

        let t = intersect_triangle(&hit, tri, CullMode::Front).unwrap();
        assert!((t - 5.0).abs() < 1e-5);
        assert!(intersect_triangle(&outside, tri, CullMode::Front).is_none());
    }

    #[test]
    fn test_triangle_cull() {
        let tri = facing_triangle(5.0);
        let from_behind = Ray::new(Vec3::new(0.0, 0.5, 10.0), Vec3::NEG_Z);

        assert!(intersect_triangle(&from_behind, tri, CullMode::Front).is_none());
        assert!(intersect_triangle(&from_behind, tri, CullMode::Back).is_some());
        assert!(intersect_triangle(&from_behind, tri, CullMode::Both).is_some());
    }

    #[test]
    fn test_mesh_returns_nearest_face() {
        let [a, b, c] = facing_triangle(8.0);
        let [d, e, f] = facing_triangle(3.0);
        let mesh = TraceMesh::new(Mesh::from_positions(&[a, b, c, d, e, f], vec![[0, 1, 2], [3, 4, 5]]));
        let ray = Ray::new(Vec3::new(0.0, 0.5, 0.0), Vec3::Z);

        let hit = mesh
            .intersect(&ray, CullMode::Front, Ray::range(), RaySide::Forward)
            .unwrap();
        assert!((hit.t - 3.0).abs() < 1e-5);
        assert_eq!(hit.face, Some(1));
    }

    #[test]
    fn test_mesh_range_checks_each_face() {
        // The first face is behind the origin; the second must still be found.
        let [a, b, c] = facing_triangle(-2.0);
        let [d, e, f] = facing_triangle(4.0);
        let mesh = TraceMesh::new(Mesh::from_positions(&[a, b, c, d, e, f], vec![[0, 1, 2], [3, 4, 5]]));
        let ray = Ray::new(Vec3::new(0.0, 0.5, 0.0), Vec3::Z);

        let hit = mesh
            .intersect(&ray, CullMode::Front, Ray::range(), RaySide::Forward)
            .unwrap();
        assert_eq!(hit.face, Some(1));
    }

    #[test]
    fn test_mesh_normal_faces_viewer() {
        let [a, b, c] = facing_triangle(5.0);
        let mesh = TraceMesh::triangle(a, b, c);
        let hit = Intersection { t: 5.0, face: Some(0) };

        let towards = mesh.normal_at(Vec3::ZERO, &hit, Vec3::Z).normalize();
        let away = mesh.normal_at(Vec3::ZERO, &hit, Vec3::NEG_Z).normalize();
        assert!((towards - Vec3::NEG_Z).length() < 1e-6);
        assert!((away - Vec3::Z).length() < 1e-6);
    }

    #[test]
    fn test_spin_keeps_center() {
        let [a, b, c] = facing_triangle(5.0);
        let mut mesh = TraceMesh::triangle(a, b, c);
        let center = mesh.mesh().center();
        mesh.spin(0.3);
        assert!((mesh.mesh().center() - center).length() < 1e-4);
    }
}
