//! The software rasterization pipeline.
//!
//! Per object: project every vertex, assemble triangles by variant, drop
//! triangles outside the view depth range or not fully on the raster,
//! then test each pixel of the bounding box, depth test it and shade it.

use prism_core::{Color, ImageBuffer, Vertex};
use prism_math::{Camera, IVec2, Vec2, Vec3};

use crate::coverage::{
    in_view_depth, interpolate, interpolate_depth, perspective_sum, point_in_triangle,
    project_point, ProjectedVertex, RasterBox,
};
use crate::options::RenderOptions;
use crate::scene::{Geometry, RasterObject, RasterScene};
use crate::shading::{depth_shade, shade, Fragment};

/// Counters for one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Triangles assembled from all objects.
    pub triangles: usize,
    /// Triangles that passed depth and raster culling.
    pub rasterized: usize,
    /// Pixels that passed coverage and depth tests.
    pub fragments: usize,
}

/// CPU rasterizer owning its colour and depth buffers.
#[derive(Debug, Clone)]
pub struct Rasterizer {
    color: ImageBuffer,
    depth: Vec<f32>,
    stats: FrameStats,
}

/// One assembled triangle: its projected corners and source vertices.
struct Triangle<'a> {
    projected: [ProjectedVertex; 3],
    vertices: [&'a Vertex; 3],
}

impl Rasterizer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            color: ImageBuffer::new(width, height),
            depth: vec![f32::INFINITY; (width * height) as usize],
            stats: FrameStats::default(),
        }
    }

    pub fn width(&self) -> u32 {
        self.color.width
    }

    pub fn height(&self) -> u32 {
        self.color.height
    }

    /// Reallocate the buffers for a new target size.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width != self.width() || height != self.height() {
            *self = Self::new(width, height);
        }
    }

    /// The last rendered frame.
    pub fn image(&self) -> &ImageBuffer {
        &self.color
    }

    pub fn depth_at(&self, x: u32, y: u32) -> f32 {
        self.depth[self.color.index(x, y)]
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// Render one frame of `scene` as seen by `camera`.
    pub fn render(&mut self, camera: &Camera, scene: &RasterScene, options: &RenderOptions) -> &ImageBuffer {
        self.color.clear(Color::ZERO);
        self.depth.fill(f32::INFINITY);
        self.stats = FrameStats::default();

        for object in &scene.objects {
            // Transparent meshes are left to the hardware path.
            if object.is_transparent() {
                continue;
            }
            self.draw_object(camera, object, scene, options);
        }

        log::trace!(
            "Rasterized {}/{} triangles, {} fragments",
            self.stats.rasterized,
            self.stats.triangles,
            self.stats.fragments
        );
        &self.color
    }

    fn draw_object(
        &mut self,
        camera: &Camera,
        object: &RasterObject,
        scene: &RasterScene,
        options: &RenderOptions,
    ) {
        let (width, height) = (self.width(), self.height());
        let vertices = object.geometry.vertices();
        let projected: Vec<ProjectedVertex> = vertices
            .iter()
            .map(|v| project_point(camera, v.position, width, height))
            .collect();

        let assemble = |face: [u32; 3]| Triangle {
            projected: face.map(|i| projected[i as usize]),
            vertices: face.map(|i| &vertices[i as usize]),
        };

        match &object.geometry {
            Geometry::Triangle(_) => {
                self.draw_triangle(camera, assemble([0, 1, 2]), object, scene, options);
            }
            Geometry::List(mesh) => {
                for &face in &mesh.faces {
                    self.draw_triangle(camera, assemble(face), object, scene, options);
                }
            }
            Geometry::Strip(strip) => {
                for face in strip.faces() {
                    self.draw_triangle(camera, assemble(face), object, scene, options);
                }
            }
        }
    }

    fn draw_triangle(
        &mut self,
        camera: &Camera,
        triangle: Triangle<'_>,
        object: &RasterObject,
        scene: &RasterScene,
        options: &RenderOptions,
    ) {
        self.stats.triangles += 1;

        if !in_view_depth(&triangle.projected) {
            return;
        }
        // Partially visible triangles are dropped; there is no clipping.
        let bounds = RasterBox::around(&triangle.projected);
        if !bounds.is_fully_on_raster(self.width(), self.height()) {
            return;
        }
        self.stats.rasterized += 1;

        let has_normals = object.geometry.has_normals();
        let use_tangents = has_normals && options.normal_map && !object.surfaces.normal.is_none();
        let w = triangle.projected.map(|v| v.w);
        let positions = triangle.vertices.map(|v| v.position);
        let face_normal = swizzled_face_normal(positions);

        for pixel in bounds.pixels() {
            let point = pixel.as_vec2();
            let Some(weights) = point_in_triangle(point, &triangle.projected, options.cull) else {
                continue;
            };

            let depth = interpolate_depth(weights, w);
            let index = self.pixel_index(pixel);
            if depth >= self.depth[index] {
                continue;
            }
            self.depth[index] = depth;
            self.stats.fragments += 1;

            let color = if options.depth_view {
                depth_shade(depth)
            } else {
                let normal = if has_normals {
                    perspective_sum(weights, w, triangle.vertices.map(|v| v.normal)).normalize()
                } else {
                    face_normal
                };
                let tangent = if use_tangents {
                    perspective_sum(weights, w, triangle.vertices.map(|v| v.tangent)).normalize()
                } else {
                    Vec3::ZERO
                };
                let world = interpolate(weights, w, positions);
                let fragment = Fragment {
                    uv: interpolate(weights, w, triangle.vertices.map(|v| v.uv)),
                    normal,
                    tangent,
                    view: (world - camera.ray_origin()).normalize(),
                };
                shade(&fragment, &object.surfaces, &scene.surfaces, options)
            };
            self.color.pixels[index] = color;
        }
    }

    fn pixel_index(&self, pixel: IVec2) -> usize {
        self.color.index(pixel.x as u32, pixel.y as u32)
    }
}

/// Flat normal for faces without vertex normals.
///
/// The geometric normal with its x and z components exchanged; this is the
/// lighting look these primitives have always had.
fn swizzled_face_normal([a, b, c]: [Vec3; 3]) -> Vec3 {
    let n = (b - a).cross(c - a).normalize();
    Vec3::new(n.z, n.y, n.x)
}

/// Number of pixels a triangle with raster corners `a`, `b`, `c` covers analytically.
pub fn raster_area(a: Vec2, b: Vec2, c: Vec2) -> f32 {
    ((b - a).perp_dot(c - a) / 2.0).abs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{CullMode, DirectionalLight};
    use crate::scene::{Strip, SurfaceRefs};
    use prism_core::{Mesh, SurfaceTable, Texture};
    use std::f32::consts::FRAC_PI_2;

    const W: u32 = 160;
    const H: u32 = 120;

    fn camera() -> Camera {
        Camera::new(Vec3::ZERO, Vec3::Z)
            .with_field_of_view(FRAC_PI_2)
            .with_screen_size(W, H)
    }

    /// Light travelling along -X so the swizzled normal of a face looking at
    /// the camera (+X after the swap) is fully lit.
    fn options() -> RenderOptions {
        RenderOptions {
            light: DirectionalLight {
                direction: Vec3::NEG_X,
                color: Vec3::ONE,
                intensity: 3.0,
            },
            ..Default::default()
        }
    }

    /// Counter-clockwise on screen for a camera looking down +Z.
    fn front_triangle(z: f32, scale: f32) -> [Vertex; 3] {
        [
            Vertex::at(Vec3::new(-scale, -scale, z)),
            Vertex::at(Vec3::new(scale, -scale, z)),
            Vertex::at(Vec3::new(0.0, scale, z)),
        ]
    }

    fn scene_with(objects: Vec<(Geometry, Color)>) -> RasterScene {
        let mut surfaces = SurfaceTable::new();
        let mut scene_objects = Vec::new();
        for (i, (geometry, color)) in objects.into_iter().enumerate() {
            let id = surfaces.insert(&format!("solid{i}"), Texture::solid_color(color));
            scene_objects.push(RasterObject::new(geometry, SurfaceRefs::diffuse(id)));
        }
        RasterScene {
            objects: scene_objects,
            surfaces,
        }
    }

    fn center(rasterizer: &Rasterizer) -> Color {
        rasterizer.image().get(W / 2, H / 2)
    }

    #[test]
    fn test_clear_to_black() {
        let mut rasterizer = Rasterizer::new(W, H);
        rasterizer.render(&camera(), &RasterScene::default(), &options());

        assert!(rasterizer.image().pixels.iter().all(|&c| c == Color::ZERO));
        assert_eq!(rasterizer.depth_at(0, 0), f32::INFINITY);
    }

    #[test]
    fn test_nearer_triangle_wins_in_either_order() {
        let near = (Geometry::Triangle(front_triangle(5.0, 2.0)), Color::X);
        let far = (Geometry::Triangle(front_triangle(9.0, 4.0)), Color::Y);

        let mut rasterizer = Rasterizer::new(W, H);
        rasterizer.render(&camera(), &scene_with(vec![near.clone(), far.clone()]), &options());
        let near_first = center(&rasterizer);

        rasterizer.render(&camera(), &scene_with(vec![far, near]), &options());
        let far_first = center(&rasterizer);

        assert_eq!(near_first, far_first);
        assert!(near_first.x > 0.9 && near_first.y < 0.5);
    }

    #[test]
    fn test_pixel_count_matches_area() {
        let mut rasterizer = Rasterizer::new(W, H);
        let tri = front_triangle(6.0, 2.0);
        rasterizer.render(
            &camera(),
            &scene_with(vec![(Geometry::Triangle(tri), Color::ONE)]),
            &options(),
        );

        let cam = camera();
        let [a, b, c] = tri.map(|v| project_point(&cam, v.position, W, H).raster);
        let area = raster_area(a, b, c);
        let perimeter = (b - a).length() + (c - b).length() + (a - c).length();
        let count = rasterizer.stats().fragments as f32;

        assert_eq!(rasterizer.stats().rasterized, 1);
        assert!(area > 100.0);
        assert!((count - area).abs() <= perimeter, "count {count}, area {area}");

        let lit = rasterizer.image().pixels.iter().filter(|&&c| c != Color::ZERO).count();
        assert_eq!(lit, rasterizer.stats().fragments);
    }

    #[test]
    fn test_back_faces_follow_cull_mode() {
        let [a, b, c] = front_triangle(6.0, 2.0);
        let back = scene_with(vec![(Geometry::Triangle([a, c, b]), Color::ONE)]);
        let mut rasterizer = Rasterizer::new(W, H);

        let mut opts = options();
        rasterizer.render(&camera(), &back, &opts);
        assert_eq!(rasterizer.stats().fragments, 0);

        opts.cull = CullMode::Back;
        rasterizer.render(&camera(), &back, &opts);
        assert!(rasterizer.stats().fragments > 0);

        opts.cull = CullMode::Both;
        rasterizer.render(&camera(), &back, &opts);
        assert!(rasterizer.stats().fragments > 0);
    }

    #[test]
    fn test_triangles_outside_view_or_raster_are_dropped() {
        // Straddles the near plane.
        let mut straddling = front_triangle(6.0, 2.0);
        straddling[2].position.z = -1.0;
        // Larger than the screen.
        let huge = front_triangle(6.0, 50.0);

        let scene = scene_with(vec![
            (Geometry::Triangle(straddling), Color::ONE),
            (Geometry::Triangle(huge), Color::ONE),
        ]);
        let mut rasterizer = Rasterizer::new(W, H);
        rasterizer.render(&camera(), &scene, &options());

        assert_eq!(rasterizer.stats().triangles, 2);
        assert_eq!(rasterizer.stats().rasterized, 0);
        assert_eq!(rasterizer.stats().fragments, 0);
    }

    #[test]
    fn test_depth_view_is_greyscale() {
        let mut opts = options();
        opts.depth_view = true;
        let mut rasterizer = Rasterizer::new(W, H);
        rasterizer.render(
            &camera(),
            &scene_with(vec![(Geometry::Triangle(front_triangle(6.0, 2.0)), Color::X)]),
            &opts,
        );

        let c = center(&rasterizer);
        assert!(c.x > 0.0);
        assert_eq!(c.x, c.y);
        assert_eq!(c.y, c.z);
        assert!((rasterizer.depth_at(W / 2, H / 2) - 7.0).abs() < 0.1);
    }

    #[test]
    fn test_transparent_meshes_are_skipped() {
        let [a, b, c] = front_triangle(6.0, 2.0);
        let mesh = Mesh::new(vec![a, b, c], vec![[0, 1, 2]]).with_transparency(true);
        let mut rasterizer = Rasterizer::new(W, H);
        rasterizer.render(
            &camera(),
            &scene_with(vec![(Geometry::List(mesh), Color::ONE)]),
            &options(),
        );

        assert_eq!(rasterizer.stats().triangles, 0);
    }

    #[test]
    fn test_mesh_uses_vertex_normals() {
        let normal = Vec3::NEG_Z;
        let [a, b, c] = front_triangle(6.0, 2.0).map(|v| Vertex { normal, ..v });
        let mesh = Mesh::new(vec![a, b, c], vec![[0, 1, 2]]);
        let scene = scene_with(vec![(Geometry::List(mesh), Color::ONE)]);

        // Light travelling along +Z hits a -Z normal head on.
        let mut opts = options();
        opts.light.direction = Vec3::Z;
        let mut rasterizer = Rasterizer::new(W, H);
        rasterizer.render(&camera(), &scene, &opts);
        assert!(center(&rasterizer).x > 0.9);

        // The swizzled face normal would have been lit by -X instead.
        opts.light.direction = Vec3::NEG_X;
        rasterizer.render(&camera(), &scene, &opts);
        assert_eq!(center(&rasterizer), Color::ZERO);
    }

    #[test]
    fn test_strip_draws_all_faces() {
        let vertices = vec![
            Vertex::at(Vec3::new(-2.0, 2.0, 6.0)),
            Vertex::at(Vec3::new(-2.0, -2.0, 6.0)),
            Vertex::at(Vec3::new(2.0, 2.0, 6.0)),
            Vertex::at(Vec3::new(2.0, -2.0, 6.0)),
        ];
        let scene = scene_with(vec![(
            Geometry::Strip(Strip::new(vertices, vec![0, 1, 2, 3])),
            Color::ONE,
        )]);
        let mut rasterizer = Rasterizer::new(W, H);
        rasterizer.render(&camera(), &scene, &options());

        assert_eq!(rasterizer.stats().triangles, 2);
        assert_eq!(rasterizer.stats().rasterized, 2);
    }

    #[test]
    fn test_resize() {
        let mut rasterizer = Rasterizer::new(W, H);
        rasterizer.resize(32, 16);
        assert_eq!(rasterizer.image().pixels.len(), 32 * 16);
        assert_eq!(rasterizer.depth_at(31, 15), f32::INFINITY);
    }
}
