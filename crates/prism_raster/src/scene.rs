//! Rasterizer scene model: objects, their surfaces, and the demo scenes.

use std::path::Path;

use prism_core::{load_obj, Face, Mesh, MeshError, SurfaceId, SurfaceTable, Texture, TextureError, Vertex};
use prism_math::{Vec2, Vec3};
use thiserror::Error;

/// Errors raised while assembling a scene from assets.
#[derive(Error, Debug)]
pub enum SceneError {
    #[error(transparent)]
    Mesh(#[from] MeshError),

    #[error(transparent)]
    Texture(#[from] TextureError),
}

/// Texture ids an object shades with. [`SurfaceId::NONE`] means "no map".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SurfaceRefs {
    pub diffuse: SurfaceId,
    pub specular: SurfaceId,
    pub gloss: SurfaceId,
    pub normal: SurfaceId,
}

impl SurfaceRefs {
    pub fn diffuse(diffuse: SurfaceId) -> Self {
        Self {
            diffuse,
            ..Default::default()
        }
    }
}

/// Vertices drawn as a triangle strip.
#[derive(Debug, Clone, PartialEq)]
pub struct Strip {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

impl Strip {
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Unroll into faces.
    ///
    /// A window is skipped when its first two or last two indices repeat,
    /// which is how strips are restarted. Odd windows swap their last two
    /// indices so every face keeps the winding of the first.
    pub fn faces(&self) -> impl Iterator<Item = Face> + '_ {
        self.indices
            .windows(3)
            .enumerate()
            .filter(|(_, w)| w[0] != w[1] && w[1] != w[2])
            .map(|(i, w)| {
                if i % 2 == 1 {
                    [w[0], w[2], w[1]]
                } else {
                    [w[0], w[1], w[2]]
                }
            })
    }
}

/// The geometry variants the rasterizer draws.
#[derive(Debug, Clone)]
pub enum Geometry {
    Triangle([Vertex; 3]),
    List(Mesh),
    Strip(Strip),
}

impl Geometry {
    /// Only indexed meshes carry usable normals and tangents.
    pub fn has_normals(&self) -> bool {
        matches!(self, Geometry::List(_))
    }

    pub fn vertices(&self) -> &[Vertex] {
        match self {
            Geometry::Triangle(vertices) => vertices,
            Geometry::List(mesh) => &mesh.vertices,
            Geometry::Strip(strip) => &strip.vertices,
        }
    }
}

/// A piece of geometry and the surfaces it is shaded with.
#[derive(Debug, Clone)]
pub struct RasterObject {
    pub geometry: Geometry,
    pub surfaces: SurfaceRefs,
}

impl RasterObject {
    pub fn new(geometry: Geometry, surfaces: SurfaceRefs) -> Self {
        Self { geometry, surfaces }
    }

    /// Transparent meshes are only drawn by the hardware path.
    pub fn is_transparent(&self) -> bool {
        matches!(&self.geometry, Geometry::List(mesh) if mesh.transparent)
    }
}

/// Objects plus the surface table they reference.
#[derive(Debug, Default)]
pub struct RasterScene {
    pub objects: Vec<RasterObject>,
    pub surfaces: SurfaceTable,
}

impl RasterScene {
    pub fn new(surfaces: SurfaceTable) -> Self {
        Self {
            objects: Vec::new(),
            surfaces,
        }
    }

    pub fn push(&mut self, geometry: Geometry, surfaces: SurfaceRefs) {
        self.objects.push(RasterObject::new(geometry, surfaces));
    }

    /// Meshes, for hardware upload.
    pub fn meshes(&self) -> impl Iterator<Item = (&Mesh, &SurfaceRefs)> {
        self.objects.iter().filter_map(|object| match &object.geometry {
            Geometry::List(mesh) => Some((mesh, &object.surfaces)),
            _ => None,
        })
    }

    pub fn triangle_count(&self) -> usize {
        self.objects
            .iter()
            .map(|object| match &object.geometry {
                Geometry::Triangle(_) => 1,
                Geometry::List(mesh) => mesh.triangle_count(),
                Geometry::Strip(strip) => strip.faces().count(),
            })
            .sum()
    }

    /// The vehicle and its fire effect, loaded from `assets`.
    ///
    /// Missing meshes or textures are fatal.
    pub fn load_vehicle(assets: &Path) -> Result<Self, SceneError> {
        let mut surfaces = SurfaceTable::with_base_dir(assets);

        let vehicle = load_obj(assets.join("vehicle.obj"))?;
        let vehicle_surfaces = SurfaceRefs {
            diffuse: surfaces.load("vehicle_diffuse.png")?,
            specular: surfaces.load("vehicle_specular.png")?,
            gloss: surfaces.load("vehicle_gloss.png")?,
            normal: surfaces.load("vehicle_normal.png")?,
        };

        let fire = load_obj(assets.join("fireFX.obj"))?.with_transparency(true);
        let fire_surfaces = SurfaceRefs::diffuse(surfaces.load("fireFX_diffuse.png")?);

        let mut scene = Self::new(surfaces);
        scene.push(Geometry::List(vehicle), vehicle_surfaces);
        scene.push(Geometry::List(fire), fire_surfaces);

        log::info!(
            "Vehicle scene: {} objects, {} triangles, {} surfaces",
            scene.objects.len(),
            scene.triangle_count(),
            scene.surfaces.len()
        );
        Ok(scene)
    }

    /// A triangle, a textured grid mesh and the same grid as a strip, all
    /// using a generated UV grid texture. Needs no assets.
    ///
    /// Faces wind counter-clockwise as seen from +Z looking down -Z, the
    /// view [`RasterScene::PRIMITIVES_CAMERA`] sets up.
    pub fn primitives() -> Self {
        let mut surfaces = SurfaceTable::new();
        let grid = surfaces.insert("<uv grid>", uv_grid_texture(256, 8));

        let mut scene = Self::new(surfaces);

        let s3 = 3.0_f32.sqrt();
        scene.push(
            Geometry::Triangle([
                uv_vertex(Vec3::new(-2.0, 0.0, 0.0), Vec2::new(0.0, 1.0)),
                uv_vertex(Vec3::new(-4.0, 0.0, 0.0), Vec2::new(1.0, 1.0)),
                uv_vertex(Vec3::new(-3.0, s3, 0.0), Vec2::new(0.5, 1.0 - s3 / 2.0)),
            ]),
            SurfaceRefs::diffuse(grid),
        );

        let mesh_vertices = grid_vertices(Vec3::new(0.0, 1.0, 0.0))
            .into_iter()
            .map(|v| Vertex { normal: Vec3::Z, ..v })
            .collect();
        let faces = vec![
            [0, 3, 1],
            [3, 4, 1],
            [1, 4, 2],
            [4, 5, 2],
            [3, 6, 4],
            [6, 7, 4],
            [4, 7, 5],
            [7, 8, 5],
        ];
        let mut mesh = Mesh::new(mesh_vertices, faces);
        mesh.compute_tangents();
        scene.push(Geometry::List(mesh), SurfaceRefs::diffuse(grid));

        scene.push(
            Geometry::Strip(Strip::new(
                grid_vertices(Vec3::new(3.0, 1.0, 0.0)),
                vec![0, 3, 1, 4, 2, 5, 5, 3, 3, 6, 4, 7, 5, 8],
            )),
            SurfaceRefs::diffuse(grid),
        );

        scene
    }

    /// Camera position and look direction framing [`RasterScene::primitives`].
    pub const PRIMITIVES_CAMERA: (Vec3, Vec3) = (Vec3::new(0.0, 0.0, 8.0), Vec3::NEG_Z);

    /// Camera position and look direction framing [`RasterScene::load_vehicle`].
    pub const VEHICLE_CAMERA: (Vec3, Vec3) = (Vec3::new(0.0, 0.0, 50.0), Vec3::NEG_Z);
}

fn uv_vertex(position: Vec3, uv: Vec2) -> Vertex {
    Vertex::new(position, uv, Vec3::ZERO)
}

/// 3x3 grid of vertices spanning 2x2 units around `origin.x`, top row at
/// `origin.y`. Columns run towards -X, which is screen right when looking
/// down -Z.
fn grid_vertices(origin: Vec3) -> Vec<Vertex> {
    let mut vertices = Vec::with_capacity(9);
    for row in 0..3 {
        for col in 0..3 {
            let position = origin + Vec3::new(1.0 - col as f32, -(row as f32), 0.0);
            let uv = Vec2::new(col as f32 * 0.5, row as f32 * 0.5);
            vertices.push(uv_vertex(position, uv));
        }
    }
    vertices
}

/// Square checker texture with `cells` cells per side, tinted by UV.
pub fn uv_grid_texture(size: u32, cells: u32) -> Texture {
    let cell = (size / cells).max(1);
    let mut pixels = Vec::with_capacity((size * size) as usize);
    for y in 0..size {
        for x in 0..size {
            let dark = ((x / cell) + (y / cell)) % 2 == 0;
            let shade = if dark { 0.35 } else { 1.0 };
            let u = x as f32 / size as f32;
            let v = y as f32 / size as f32;
            let rgb = [u, v, 1.0 - u * v].map(|c| ((0.3 + 0.7 * c) * shade * 255.0) as u8);
            pixels.push([rgb[0], rgb[1], rgb[2], 255]);
        }
    }
    Texture::new(size, size, pixels, "<uv grid>")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_unrolls_with_alternating_winding() {
        let strip = Strip::new(Vec::new(), vec![0, 3, 1, 4, 2, 5, 5, 3, 3, 6, 4, 7, 5, 8]);
        let faces: Vec<Face> = strip.faces().collect();

        assert_eq!(
            faces,
            vec![
                [0, 3, 1],
                [3, 4, 1],
                [1, 4, 2],
                [4, 5, 2],
                // windows 4..=7 contain a repeated pair and are skipped
                [3, 6, 4],
                [6, 7, 4],
                [4, 7, 5],
                [7, 8, 5],
            ]
        );
    }

    #[test]
    fn test_strip_repeated_outer_indices_are_kept() {
        // Only adjacent repeats mark a restart.
        let strip = Strip::new(Vec::new(), vec![0, 1, 0]);
        assert_eq!(strip.faces().collect::<Vec<_>>(), vec![[0, 1, 0]]);
    }

    #[test]
    fn test_transparency_only_applies_to_meshes() {
        let mesh = Mesh::from_positions(&[Vec3::ZERO, Vec3::X, Vec3::Y], vec![[0, 1, 2]]);
        let object = RasterObject::new(
            Geometry::List(mesh.with_transparency(true)),
            SurfaceRefs::default(),
        );
        assert!(object.is_transparent());

        let tri = RasterObject::new(
            Geometry::Triangle([Vertex::default(); 3]),
            SurfaceRefs::default(),
        );
        assert!(!tri.is_transparent());
        assert!(!tri.geometry.has_normals());
    }

    #[test]
    fn test_primitives_scene() {
        let scene = RasterScene::primitives();

        assert_eq!(scene.objects.len(), 3);
        assert_eq!(scene.meshes().count(), 1);
        assert_eq!(scene.triangle_count(), 1 + 8 + 8);
        assert_eq!(scene.surfaces.len(), 1);
    }

    #[test]
    fn test_missing_assets_are_fatal() {
        let result = RasterScene::load_vehicle(Path::new("/nonexistent/assets"));
        assert!(matches!(result, Err(SceneError::Mesh(_))));
    }
}
