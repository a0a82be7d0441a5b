//! Bucket-based tile rendering.
//!
//! Divides the image into tiles (buckets) that can be rendered
//! independently and in parallel using rayon. Each bucket writes a
//! disjoint pixel range.

use prism_core::{Color, ImageBuffer};

use crate::renderer::{trace_ray, PrimaryRays, TraceSettings};
use crate::scene::TraceScene;
use prism_math::Ray;

/// A tile of the frame, traced as one unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucket {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Position in the trace order.
    pub index: usize,
}

impl Bucket {
    pub fn new(x: u32, y: u32, width: u32, height: u32, index: usize) -> Self {
        Self { x, y, width, height, index }
    }

    pub fn pixel_count(&self) -> u32 {
        self.width * self.height
    }

    /// Squared distance from the tile centre to `(cx, cy)`.
    fn distance_sq_to(&self, cx: f32, cy: f32) -> f32 {
        let dx = self.x as f32 + self.width as f32 * 0.5 - cx;
        let dy = self.y as f32 + self.height as f32 * 0.5 - cy;
        dx * dx + dy * dy
    }
}

/// Tile edge in pixels when none is configured.
pub const DEFAULT_BUCKET_SIZE: u32 = 64;

/// Cover a `width` x `height` frame with tiles of at most `bucket_size`
/// pixels a side, ordered outwards from the centre of the frame.
///
/// Edge tiles are clipped to the frame. Indices follow the returned order.
pub fn generate_buckets(width: u32, height: u32, bucket_size: u32) -> Vec<Bucket> {
    let step = bucket_size as usize;
    let mut buckets: Vec<Bucket> = (0..height)
        .step_by(step)
        .flat_map(|y| {
            (0..width).step_by(step).map(move |x| {
                Bucket::new(x, y, bucket_size.min(width - x), bucket_size.min(height - y), 0)
            })
        })
        .collect();

    let (cx, cy) = (width as f32 * 0.5, height as f32 * 0.5);
    // Stable sort keeps row-major order between tiles at equal distance.
    buckets.sort_by(|a, b| a.distance_sq_to(cx, cy).total_cmp(&b.distance_sq_to(cx, cy)));

    for (index, bucket) in buckets.iter_mut().enumerate() {
        bucket.index = index;
    }
    buckets
}

/// Trace every pixel of a bucket, untone-mapped.
///
/// Ray directions are stepped across each row rather than recomputed.
/// Returns pixels in row-major order within the bucket.
pub fn render_bucket(
    bucket: &Bucket,
    rays: &PrimaryRays,
    scene: &TraceScene,
    settings: &TraceSettings,
) -> Vec<Color> {
    let mut pixels = Vec::with_capacity(bucket.pixel_count() as usize);
    let mut row_start = rays.direction(bucket.x, bucket.y);

    for _ in 0..bucket.height {
        let mut direction = row_start;
        for _ in 0..bucket.width {
            let ray = Ray::new(rays.origin, direction);
            pixels.push(trace_ray(scene, &ray, settings));
            direction += rays.step_x;
        }
        row_start += rays.step_y;
    }

    pixels
}

/// Traced pixels of one bucket, row-major.
#[derive(Debug, Clone)]
pub struct BucketResult {
    pub bucket: Bucket,
    pub pixels: Vec<Color>,
}

impl BucketResult {
    pub fn new(bucket: Bucket, pixels: Vec<Color>) -> Self {
        Self { bucket, pixels }
    }

    /// Copy the bucket's pixels into their place in `image`.
    pub fn write_to(&self, image: &mut ImageBuffer) {
        let width = self.bucket.width as usize;
        for (row, colors) in self.pixels.chunks(width.max(1)).enumerate() {
            let start = image.index(self.bucket.x, self.bucket.y + row as u32);
            image.pixels[start..start + colors.len()].copy_from_slice(colors);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn covered_pixels(buckets: &[Bucket]) -> u32 {
        buckets.iter().map(Bucket::pixel_count).sum()
    }

    #[test]
    fn test_buckets_tile_the_frame() {
        let buckets = generate_buckets(128, 64, 32);
        assert_eq!(buckets.len(), 8);
        assert_eq!(covered_pixels(&buckets), 128 * 64);
    }

    #[test]
    fn test_edge_buckets_are_clipped() {
        let buckets = generate_buckets(70, 40, 32);
        assert_eq!(buckets.len(), 6);
        assert_eq!(covered_pixels(&buckets), 70 * 40);
        assert!(buckets.iter().any(|b| b.width == 6 && b.height == 8));
        assert!(buckets.iter().all(|b| b.x + b.width <= 70 && b.y + b.height <= 40));
    }

    #[test]
    fn test_centre_bucket_comes_first() {
        let buckets = generate_buckets(96, 96, 32);
        assert_eq!((buckets[0].x, buckets[0].y), (32, 32));
        assert!(buckets.iter().enumerate().all(|(i, b)| b.index == i));
    }

    #[test]
    fn test_write_to_places_rows() {
        let mut image = ImageBuffer::new(4, 4);
        let bucket = Bucket::new(2, 1, 2, 2, 0);
        let pixels = vec![Color::X, Color::Y, Color::Z, Color::ONE];
        BucketResult::new(bucket, pixels).write_to(&mut image);

        assert_eq!(image.get(2, 1), Color::X);
        assert_eq!(image.get(3, 1), Color::Y);
        assert_eq!(image.get(2, 2), Color::Z);
        assert_eq!(image.get(3, 2), Color::ONE);
        assert_eq!(image.get(1, 1), Color::ZERO);
    }

    #[test]
    fn test_render_bucket_matches_per_pixel_rays() {
        use crate::scenes::{open_scene, DEMO_CAMERA};
        use prism_math::Camera;

        let camera = Camera::new(DEMO_CAMERA.0, DEMO_CAMERA.1).with_screen_size(32, 32);
        let rays = PrimaryRays::new(&camera, 32, 32);
        let scene = open_scene();
        let settings = TraceSettings::default();
        let bucket = Bucket::new(8, 16, 4, 4, 0);

        let pixels = render_bucket(&bucket, &rays, &scene, &settings);
        let expected = trace_ray(&scene, &rays.ray(8, 16), &settings);
        assert_eq!(pixels.len(), 16);
        assert!((pixels[0] - expected).length() < 1e-4);
    }
}
