//! Triangle setup: projection to raster space, bounding boxes, the
//! signed-area coverage test and perspective-correct interpolation.

use std::ops::{Add, Mul};

use prism_math::{ndc_to_raster, Camera, ClipRange, IVec2, Vec2, Vec3};

use crate::options::CullMode;

/// A vertex after projection.
///
/// `raster` is in pixels, `depth` is the post-divide clip z and `w` is the
/// camera-space depth kept for perspective correction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectedVertex {
    pub raster: Vec2,
    pub depth: f32,
    pub w: f32,
}

/// Transform a world-space point to raster space.
pub fn project_point(camera: &Camera, point: Vec3, width: u32, height: u32) -> ProjectedVertex {
    let clip = camera.world_to_clip_point(point);
    let w = clip.w;
    let ndc = Vec2::new(clip.x / w, clip.y / w);
    ProjectedVertex {
        raster: ndc_to_raster(ndc, width, height),
        depth: clip.z / w,
        w,
    }
}

/// Integer pixel bounds of a triangle, inclusive on both corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterBox {
    pub top_left: IVec2,
    pub bottom_right: IVec2,
}

impl RasterBox {
    /// Box over the truncated raster coordinates of three vertices.
    pub fn around(triangle: &[ProjectedVertex; 3]) -> Self {
        let pixels = triangle.map(|v| v.raster.as_ivec2());
        Self {
            top_left: pixels[0].min(pixels[1]).min(pixels[2]),
            bottom_right: pixels[0].max(pixels[1]).max(pixels[2]),
        }
    }

    /// True when the box lies strictly inside a `width` x `height` raster.
    /// Pixel row and column 0 count as outside.
    pub fn is_fully_on_raster(&self, width: u32, height: u32) -> bool {
        self.top_left.min_element() > 0
            && self.bottom_right.x < width as i32
            && self.bottom_right.y < height as i32
    }

    /// Every pixel in the box, row by row.
    pub fn pixels(&self) -> impl Iterator<Item = IVec2> {
        let (tl, br) = (self.top_left, self.bottom_right);
        (tl.y..=br.y).flat_map(move |y| (tl.x..=br.x).map(move |x| IVec2::new(x, y)))
    }
}

/// Reject a triangle whose camera depths are not all within the view range.
pub fn in_view_depth(triangle: &[ProjectedVertex; 3]) -> bool {
    ClipRange::VIEW.contains_all(triangle.map(|v| v.w))
}

/// Signed area of the parallelogram spanned by `p - a` and `b - a`.
///
/// Positive when `p` lies to the right of `a -> b` in the y-down raster.
pub fn edge(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    (p - a).perp_dot(b - a)
}

/// Raw edge areas for `p`: component `i` is the area opposite vertex `i`.
pub fn edge_areas(p: Vec2, a: Vec2, b: Vec2, c: Vec2) -> Vec3 {
    Vec3::new(edge(p, b, c), edge(p, c, a), edge(p, a, b))
}

/// Barycentric weights of `p`, normalized so they sum to one.
///
/// Defined for points outside the triangle too (some weights negative).
pub fn barycentric(p: Vec2, a: Vec2, b: Vec2, c: Vec2) -> Vec3 {
    let areas = edge_areas(p, a, b, c);
    areas / (areas.x + areas.y + areas.z)
}

/// Coverage test for pixel `p` under `cull`.
///
/// Every edge area must be strictly positive (front) or strictly negative
/// (back); `Both` accepts either as long as all three agree. Points exactly
/// on an edge are not covered. Returns the barycentric weights on a hit.
pub fn point_in_triangle(p: Vec2, triangle: &[ProjectedVertex; 3], cull: CullMode) -> Option<Vec3> {
    let [a, b, c] = triangle.map(|v| v.raster);
    let areas = edge_areas(p, a, b, c);

    let front = areas.min_element() > 0.0;
    let back = areas.max_element() < 0.0;
    let covered = match cull {
        CullMode::Front => front,
        CullMode::Back => back,
        CullMode::Both => front || back,
    };

    covered.then(|| areas / (areas.x + areas.y + areas.z))
}

/// Perspective-correct depth: `1 / sum(b_i / w_i)`.
pub fn interpolate_depth(weights: Vec3, w: [f32; 3]) -> f32 {
    1.0 / (weights.x / w[0] + weights.y / w[1] + weights.z / w[2])
}

/// `sum(attr_i / w_i * b_i)`, the un-normalized perspective sum.
///
/// Multiply by the interpolated depth to recover the attribute, or
/// normalize the result for direction attributes.
pub fn perspective_sum<T>(weights: Vec3, w: [f32; 3], values: [T; 3]) -> T
where
    T: Copy + Mul<f32, Output = T> + Add<Output = T>,
{
    values[0] * (weights.x / w[0]) + values[1] * (weights.y / w[1]) + values[2] * (weights.z / w[2])
}

/// Perspective-correct interpolation of a planar attribute.
pub fn interpolate<T>(weights: Vec3, w: [f32; 3], values: [T; 3]) -> T
where
    T: Copy + Mul<f32, Output = T> + Add<Output = T>,
{
    perspective_sum(weights, w, values) * interpolate_depth(weights, w)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn flat(points: [Vec2; 3]) -> [ProjectedVertex; 3] {
        points.map(|raster| ProjectedVertex {
            raster,
            depth: 0.5,
            w: 1.0,
        })
    }

    // Counter-clockwise on screen (y down): front facing.
    fn front_triangle() -> [ProjectedVertex; 3] {
        flat([
            Vec2::new(10.0, 50.0),
            Vec2::new(50.0, 50.0),
            Vec2::new(30.0, 10.0),
        ])
    }

    #[test]
    fn test_weights_inside_are_positive_and_sum_to_one() {
        let tri = front_triangle();
        for p in [Vec2::new(30.0, 30.0), Vec2::new(20.0, 45.0), Vec2::new(45.0, 48.0)] {
            let weights = point_in_triangle(p, &tri, CullMode::Front).unwrap();
            assert!(weights.min_element() >= 0.0);
            assert!((weights.x + weights.y + weights.z - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_random_interior_points() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        let tri = front_triangle();
        let [a, b, c] = tri.map(|v| v.raster);
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..200 {
            // Random convex combination, kept off the edges.
            let raw = Vec3::new(
                rng.gen_range(0.05..1.0),
                rng.gen_range(0.05..1.0),
                rng.gen_range(0.05..1.0),
            );
            let expected = raw / (raw.x + raw.y + raw.z);
            let p = a * expected.x + b * expected.y + c * expected.z;

            let weights = point_in_triangle(p, &tri, CullMode::Front).unwrap();
            assert!(weights.min_element() >= 0.0);
            assert!((weights.x + weights.y + weights.z - 1.0).abs() < 1e-4);
            assert!((weights - expected).length() < 1e-3);
        }
    }

    #[test]
    fn test_weights_reconstruct_point() {
        let tri = front_triangle();
        let p = Vec2::new(27.0, 33.0);
        let weights = point_in_triangle(p, &tri, CullMode::Front).unwrap();
        let [a, b, c] = tri.map(|v| v.raster);
        let rebuilt = a * weights.x + b * weights.y + c * weights.z;
        assert!((rebuilt - p).length() < 1e-3);
    }

    #[test]
    fn test_edge_point_has_exactly_one_zero_weight() {
        let [a, b, c] = front_triangle().map(|v| v.raster);
        // Midpoint of the a-b edge.
        let weights = barycentric((a + b) * 0.5, a, b, c);

        let zeros = weights.to_array().iter().filter(|w| w.abs() < 1e-6).count();
        assert_eq!(zeros, 1);
        assert!(weights.z.abs() < 1e-6);
        assert!((weights.x - 0.5).abs() < 1e-6);
        assert!((weights.y - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_edge_points_are_not_covered() {
        let tri = front_triangle();
        assert!(point_in_triangle(Vec2::new(30.0, 50.0), &tri, CullMode::Front).is_none());
    }

    #[test]
    fn test_cull_modes() {
        let front = front_triangle();
        let back = [front[0], front[2], front[1]];
        let p = Vec2::new(30.0, 35.0);

        assert!(point_in_triangle(p, &front, CullMode::Front).is_some());
        assert!(point_in_triangle(p, &front, CullMode::Back).is_none());
        assert!(point_in_triangle(p, &back, CullMode::Front).is_none());
        assert!(point_in_triangle(p, &back, CullMode::Back).is_some());
        assert!(point_in_triangle(p, &front, CullMode::Both).is_some());

        // Back faces still yield positive weights.
        let weights = point_in_triangle(p, &back, CullMode::Both).unwrap();
        assert!(weights.min_element() > 0.0);
        assert!((weights.x + weights.y + weights.z - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_raster_box() {
        let tri = flat([
            Vec2::new(10.7, 50.2),
            Vec2::new(50.9, 49.9),
            Vec2::new(30.1, 10.5),
        ]);
        let bounds = RasterBox::around(&tri);

        assert_eq!(bounds.top_left, IVec2::new(10, 10));
        assert_eq!(bounds.bottom_right, IVec2::new(50, 50));
        assert!(bounds.is_fully_on_raster(64, 64));
        assert!(!bounds.is_fully_on_raster(50, 64));
        assert_eq!(bounds.pixels().count(), 41 * 41);
    }

    #[test]
    fn test_raster_box_column_zero_is_off_raster() {
        let tri = flat([Vec2::new(0.2, 5.0), Vec2::new(8.0, 5.0), Vec2::new(4.0, 1.0)]);
        assert!(!RasterBox::around(&tri).is_fully_on_raster(64, 64));
    }

    #[test]
    fn test_view_depth_range() {
        let mut tri = front_triangle();
        assert!(in_view_depth(&tri));

        tri[1].w = 0.05;
        assert!(!in_view_depth(&tri));

        tri[1].w = 120.0;
        assert!(!in_view_depth(&tri));
    }

    #[test]
    fn test_centroid_uv_is_perspective_correct() {
        // A triangle tilted in depth so screen-space and world-space
        // centroids differ.
        let positions = [
            Vec3::new(-1.0, -1.0, 2.0),
            Vec3::new(1.0, -1.0, 6.0),
            Vec3::new(0.0, 1.0, 3.0),
        ];
        let uvs = [Vec2::new(0.0, 0.0), Vec2::new(1.0, 0.0), Vec2::new(0.0, 1.0)];
        let centroid = (positions[0] + positions[1] + positions[2]) / 3.0;

        for distance in [0.0, 5.0, 20.0] {
            let camera = Camera::new(Vec3::new(0.0, 0.0, -distance), Vec3::Z)
                .with_field_of_view(FRAC_PI_2)
                .with_screen_size(640, 480);
            let tri = positions.map(|p| project_point(&camera, p, 640, 480));
            let target = project_point(&camera, centroid, 640, 480).raster;

            let [a, b, c] = tri.map(|v| v.raster);
            let weights = barycentric(target, a, b, c);
            let w = tri.map(|v| v.w);
            let uv = interpolate(weights, w, uvs);

            assert!((uv - Vec2::splat(1.0 / 3.0)).length() < 1e-3, "uv {uv:?} at {distance}");

            // Plain screen-space weights would be off for this triangle.
            let affine = uvs[0] * weights.x + uvs[1] * weights.y + uvs[2] * weights.z;
            assert!((affine - Vec2::splat(1.0 / 3.0)).length() > 1e-2);

            // View depth is measured from the ray origin, one focal length
            // behind the camera.
            let depth = interpolate_depth(weights, w);
            assert!((depth - (centroid.z + distance + 1.0)).abs() < 1e-3);
        }
    }

    #[test]
    fn test_project_point_center() {
        let camera = Camera::new(Vec3::ZERO, Vec3::Z).with_screen_size(640, 480);
        let projected = project_point(&camera, Vec3::new(0.0, 0.0, 10.0), 640, 480);

        assert!((projected.raster - Vec2::new(319.5, 239.5)).length() < 1e-3);
        assert!((projected.w - 11.0).abs() < 1e-4);
        assert!(projected.depth > 0.0 && projected.depth < 1.0);
    }
}
