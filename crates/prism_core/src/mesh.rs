//! Indexed triangle meshes shared by both renderers.
//!
//! A [`Mesh`] owns its vertex and face arrays. Meshes loaded from disk go
//! through [`MeshBuilder`], which deduplicates identical vertices, and get
//! per-vertex tangents for normal mapping.

use std::collections::HashMap;

use prism_math::{Aabb, Mat3, Mat4, Mat4Ext, Vec2, Vec3};

/// A mesh vertex: position plus shading attributes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vertex {
    pub position: Vec3,
    pub uv: Vec2,
    pub normal: Vec3,
    pub tangent: Vec3,
}

impl Vertex {
    pub fn new(position: Vec3, uv: Vec2, normal: Vec3) -> Self {
        Self {
            position,
            uv,
            normal,
            tangent: Vec3::ZERO,
        }
    }

    /// Vertex with only a position; every other attribute is zero.
    pub fn at(position: Vec3) -> Self {
        Self::new(position, Vec2::ZERO, Vec3::ZERO)
    }
}

/// Three indices into a mesh's vertex array.
pub type Face = [u32; 3];

/// A mesh consisting of vertices and triangle faces.
#[derive(Clone, Debug)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub faces: Vec<Face>,

    /// Axis-aligned bounding box
    pub bounds: Aabb,

    /// Drawn blended by the hardware path and skipped by the software path.
    pub transparent: bool,
}

impl Mesh {
    /// Create a mesh from vertices and faces. Tangents are left as given.
    pub fn new(vertices: Vec<Vertex>, faces: Vec<Face>) -> Self {
        let bounds = Aabb::from_points(vertices.iter().map(|v| v.position));
        Self {
            vertices,
            faces,
            bounds,
            transparent: false,
        }
    }

    /// Create a position-only mesh (ray tracer geometry).
    pub fn from_positions(positions: &[Vec3], faces: Vec<Face>) -> Self {
        Self::new(positions.iter().copied().map(Vertex::at).collect(), faces)
    }

    pub fn with_transparency(mut self, transparent: bool) -> Self {
        self.transparent = transparent;
        self
    }

    /// The three corner positions of face `index`.
    pub fn face_positions(&self, index: usize) -> [Vec3; 3] {
        self.faces[index].map(|i| self.vertices[i as usize].position)
    }

    /// Iterate corner positions of every face.
    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        (0..self.faces.len()).map(move |i| self.face_positions(i))
    }

    /// Accumulate per-face tangents from UV gradients and orthogonalize them
    /// against each vertex normal.
    pub fn compute_tangents(&mut self) {
        for vertex in &mut self.vertices {
            vertex.tangent = Vec3::ZERO;
        }

        for face in &self.faces {
            let [a, b, c] = face.map(|i| self.vertices[i as usize]);
            let tangent = face_tangent([a.position, b.position, c.position], [a.uv, b.uv, c.uv]);
            for &i in face {
                self.vertices[i as usize].tangent += tangent;
            }
        }

        for vertex in &mut self.vertices {
            vertex.tangent = vertex.tangent.reject_from(vertex.normal).normalize();
        }
    }

    /// Apply `matrix` to positions, and its linear part to normals and tangents.
    pub fn transform(&mut self, matrix: &Mat4) {
        for vertex in &mut self.vertices {
            vertex.position = matrix.transform_point3(vertex.position);
            vertex.normal = matrix.transform_vector3(vertex.normal);
            vertex.tangent = matrix.transform_vector3(vertex.tangent);
        }
        self.bounds = matrix.transform_aabb(&self.bounds);
    }

    /// Rotate the mesh in place about its bounding box centre.
    pub fn rotate_about_center(&mut self, rotation: Mat3) {
        let center = self.center();
        self.transform(&Mat4::rotation_about(center, rotation));
        self.recompute_bounds();
    }

    /// Move the mesh by `offset`.
    pub fn translate(&mut self, offset: Vec3) {
        self.transform(&Mat4::from_translation(offset));
    }

    pub fn recompute_bounds(&mut self) {
        self.bounds = Aabb::from_points(self.vertices.iter().map(|v| v.position));
    }

    /// Get the mesh center (center of bounding box).
    pub fn center(&self) -> Vec3 {
        self.bounds.centroid()
    }

    /// Get the mesh size (diagonal length of bounding box).
    pub fn size(&self) -> f32 {
        self.bounds.size().length()
    }

    /// Get the number of triangles in the mesh.
    pub fn triangle_count(&self) -> usize {
        self.faces.len()
    }

    /// Get the number of vertices in the mesh.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Flat index list, three per face.
    pub fn indices(&self) -> Vec<u32> {
        self.faces.iter().flatten().copied().collect()
    }
}

/// Tangent of one face from its UV edge gradients.
pub fn face_tangent(positions: [Vec3; 3], uvs: [Vec2; 3]) -> Vec3 {
    let edge1 = positions[1] - positions[0];
    let edge2 = positions[2] - positions[0];
    let du = Vec2::new(uvs[1].x - uvs[0].x, uvs[2].x - uvs[0].x);
    let dv = Vec2::new(uvs[1].y - uvs[0].y, uvs[2].y - uvs[0].y);
    let r = du.perp_dot(dv);
    edge1 * (dv.y / r) - edge2 * (dv.x / r)
}

/// Exact bit pattern of position, uv and normal.
type VertexKey = [u32; 8];

fn vertex_key(v: &Vertex) -> VertexKey {
    [
        v.position.x.to_bits(),
        v.position.y.to_bits(),
        v.position.z.to_bits(),
        v.uv.x.to_bits(),
        v.uv.y.to_bits(),
        v.normal.x.to_bits(),
        v.normal.y.to_bits(),
        v.normal.z.to_bits(),
    ]
}

/// Incremental mesh construction with vertex deduplication.
#[derive(Debug, Default)]
pub struct MeshBuilder {
    vertices: Vec<Vertex>,
    faces: Vec<Face>,
    lookup: HashMap<VertexKey, u32>,
}

impl MeshBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a vertex, reusing the index of an identical one if present.
    pub fn add_vertex(&mut self, vertex: Vertex) -> u32 {
        let next = self.vertices.len() as u32;
        let index = *self.lookup.entry(vertex_key(&vertex)).or_insert(next);
        if index == next {
            self.vertices.push(vertex);
        }
        index
    }

    pub fn add_face(&mut self, face: Face) {
        self.faces.push(face);
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Finish the mesh and derive tangents.
    pub fn build(self) -> Mesh {
        let mut mesh = Mesh::new(self.vertices, self.faces);
        mesh.compute_tangents();
        mesh
    }

    /// Finish the mesh without touching tangents.
    pub fn build_untextured(self) -> Mesh {
        Mesh::new(self.vertices, self.faces)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn quad() -> Mesh {
        // Unit quad in the XY plane facing -Z, UVs with v pointing down.
        let mut builder = MeshBuilder::new();
        let n = Vec3::NEG_Z;
        let a = builder.add_vertex(Vertex::new(Vec3::new(0.0, 1.0, 0.0), Vec2::new(0.0, 0.0), n));
        let b = builder.add_vertex(Vertex::new(Vec3::new(1.0, 1.0, 0.0), Vec2::new(1.0, 0.0), n));
        let c = builder.add_vertex(Vertex::new(Vec3::new(1.0, 0.0, 0.0), Vec2::new(1.0, 1.0), n));
        let d = builder.add_vertex(Vertex::new(Vec3::new(0.0, 0.0, 0.0), Vec2::new(0.0, 1.0), n));
        builder.add_face([a, b, c]);
        builder.add_face([a, c, d]);
        builder.build()
    }

    #[test]
    fn test_builder_deduplicates() {
        let mut builder = MeshBuilder::new();
        let v = Vertex::new(Vec3::ONE, Vec2::new(0.5, 0.5), Vec3::Y);
        let first = builder.add_vertex(v);
        let second = builder.add_vertex(v);
        let other = builder.add_vertex(Vertex { uv: Vec2::ZERO, ..v });

        assert_eq!(first, second);
        assert_ne!(first, other);
        assert_eq!(builder.vertex_count(), 2);
    }

    #[test]
    fn test_tangents_follow_u_direction() {
        let mesh = quad();

        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.triangle_count(), 2);
        for v in &mesh.vertices {
            assert!((v.tangent - Vec3::X).length() < 1e-5, "tangent {:?}", v.tangent);
            assert!(v.tangent.dot(v.normal).abs() < 1e-5);
        }
    }

    #[test]
    fn test_bounds_and_center() {
        let mesh = Mesh::from_positions(
            &[
                Vec3::new(-1.0, -2.0, -3.0),
                Vec3::new(4.0, 5.0, 6.0),
                Vec3::new(0.0, 0.0, 0.0),
            ],
            vec![[0, 1, 2]],
        );

        assert_eq!(mesh.bounds.min, Vec3::new(-1.0, -2.0, -3.0));
        assert_eq!(mesh.bounds.max, Vec3::new(4.0, 5.0, 6.0));
        assert_eq!(mesh.center(), Vec3::new(1.5, 1.5, 1.5));
    }

    #[test]
    fn test_rotate_about_center_keeps_center() {
        let mut mesh = Mesh::from_positions(
            &[
                Vec3::new(1.0, 4.0, 0.0),
                Vec3::new(3.0, 4.0, 0.0),
                Vec3::new(2.0, 5.0, 0.0),
            ],
            vec![[0, 1, 2]],
        );
        let center = mesh.center();
        mesh.rotate_about_center(Mat3::from_rotation_y(FRAC_PI_2));

        assert!((mesh.center() - center).length() < 1e-5);
        // The x extent is now along z.
        let size = mesh.bounds.size();
        assert!(size.x.abs() < 1e-5);
        assert!((size.z - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_transform_rotates_normals() {
        let mut mesh = quad();
        mesh.transform(&Mat4::from_rotation_y(FRAC_PI_2));

        // -Z swings to -X under a quarter turn about +Y.
        for v in &mesh.vertices {
            assert!((v.normal - Vec3::NEG_X).length() < 1e-5);
            assert!((v.tangent - Vec3::NEG_Z).length() < 1e-5);
        }
    }

    #[test]
    fn test_indices_flatten_faces() {
        let mesh = quad();
        assert_eq!(mesh.indices(), vec![0, 1, 2, 0, 2, 3]);
        assert_eq!(mesh.face_positions(1)[2], Vec3::ZERO);
    }
}
