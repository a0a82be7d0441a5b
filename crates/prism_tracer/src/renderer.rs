//! Direct-lighting ray tracer.
//!
//! One primary ray per pixel, nearest hit, then a sum over the lights
//! with optional hard shadows and one of two reflectance models. Frames
//! are tone mapped per pixel or against the whole-frame maximum.

use prism_core::{Color, ImageBuffer};
use prism_math::{raster_to_screen, Camera, Ray, Vec3, Vec3Ext};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::brdf::{lambert, lambert_cook_torrance, lambert_phong};
use crate::bucket::{generate_buckets, render_bucket, BucketResult, DEFAULT_BUCKET_SIZE};
use crate::light::Light;
use crate::scene::{Hit, TraceScene};

/// How shaded values above 1 are brought into range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToneMapping {
    /// Divide each pixel by its own largest channel when above 1.
    #[default]
    PerPixel,
    /// Divide every pixel by the largest channel of the frame.
    WholeFrame,
}

impl ToneMapping {
    pub fn toggle(self) -> Self {
        match self {
            ToneMapping::PerPixel => ToneMapping::WholeFrame,
            ToneMapping::WholeFrame => ToneMapping::PerPixel,
        }
    }
}

/// Render settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TraceSettings {
    /// Cook-Torrance instead of the Lambert/Phong blend.
    pub pbr: bool,
    pub hard_shadows: bool,
    pub tone_mapping: ToneMapping,
    /// Render buckets on the rayon pool.
    pub parallel: bool,
    pub bucket_size: u32,
}

impl Default for TraceSettings {
    fn default() -> Self {
        Self {
            pbr: true,
            hard_shadows: true,
            tone_mapping: ToneMapping::PerPixel,
            parallel: true,
            bucket_size: DEFAULT_BUCKET_SIZE,
        }
    }
}

/// Primary ray directions for one frame.
///
/// The direction for pixel `(x, y)` is `top_left + x * step_x + y * step_y`;
/// callers walk the image by adding the steps instead of re-projecting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrimaryRays {
    pub origin: Vec3,
    pub top_left: Vec3,
    pub step_x: Vec3,
    pub step_y: Vec3,
}

impl PrimaryRays {
    pub fn new(camera: &Camera, width: u32, height: u32) -> Self {
        let corner = raster_to_screen(0.0, 0.0, width, height);
        let step_x = raster_to_screen(1.0, 0.0, width, height) - corner;
        let step_y = raster_to_screen(0.0, 1.0, width, height) - corner;

        Self {
            origin: camera.ray_origin(),
            top_left: camera.view_to_world_vector(corner.extend(1.0)),
            step_x: camera.view_to_world_vector(step_x.extend(0.0)),
            step_y: camera.view_to_world_vector(step_y.extend(0.0)),
        }
    }

    /// Direction through pixel `(x, y)`.
    pub fn direction(&self, x: u32, y: u32) -> Vec3 {
        self.top_left + self.step_x * x as f32 + self.step_y * y as f32
    }

    pub fn ray(&self, x: u32, y: u32) -> Ray {
        Ray::new(self.origin, self.direction(x, y))
    }
}

/// Light gathered at a hit before tone mapping.
pub fn shade_hit(scene: &TraceScene, hit: &Hit<'_>, view: Vec3, settings: &TraceSettings) -> Color {
    let material = &hit.object.material;
    let mut light_color = Color::ZERO;

    for light in &scene.lights {
        // Only the side of the surface facing the light is lit.
        if hit.normal.dot(light.vector_to(hit.point)) >= 0.0 {
            continue;
        }
        if settings.hard_shadows && scene.is_occluded(light, hit.point) {
            continue;
        }
        light_color += direct_light(light, hit, view, settings);
    }

    material.tint(light_color)
}

fn direct_light(light: &Light, hit: &Hit<'_>, view: Vec3, settings: &TraceSettings) -> Color {
    let material = &hit.object.material;
    let incident = light.incident(hit.point);
    let strength = incident.color * incident.intensity;

    if settings.pbr {
        let alpha = material.roughness * material.roughness;
        strength
            * lambert(incident.direction, hit.normal)
            * lambert_cook_torrance(
                hit.normal,
                incident.direction,
                view,
                material.specular,
                alpha,
                material.nonmetal,
                material.color,
            )
    } else {
        strength * lambert_phong(hit.normal, incident.direction, view, material.roughness)
    }
}

/// Untone-mapped colour seen along `ray`; black on a miss.
pub fn trace_ray(scene: &TraceScene, ray: &Ray, settings: &TraceSettings) -> Color {
    match scene.nearest_hit(ray) {
        Some(hit) => shade_hit(scene, &hit, ray.direction.normalize(), settings),
        None => Color::ZERO,
    }
}

/// Bring a finished frame into `[0, 1]`.
pub fn apply_tone_mapping(pixels: &mut [Color], mode: ToneMapping) {
    match mode {
        ToneMapping::PerPixel => {
            for pixel in pixels.iter_mut() {
                *pixel = pixel.max_to_one();
            }
        }
        ToneMapping::WholeFrame => {
            let high = pixels
                .iter()
                .map(|p| p.max_channel())
                .fold(0.0_f32, f32::max);
            if high > 0.0 {
                for pixel in pixels.iter_mut() {
                    *pixel /= high;
                }
            }
        }
    }
}

/// Owns the frame and renders scenes into it.
#[derive(Debug, Clone)]
pub struct Tracer {
    image: ImageBuffer,
}

impl Tracer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: ImageBuffer::new(width, height),
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        self.image.resize(width, height);
    }

    pub fn image(&self) -> &ImageBuffer {
        &self.image
    }

    /// Render one frame of `scene` from `camera`.
    pub fn render(&mut self, camera: &Camera, scene: &TraceScene, settings: &TraceSettings) -> &ImageBuffer {
        let (width, height) = (self.image.width, self.image.height);
        let rays = PrimaryRays::new(camera, width, height);
        let buckets = generate_buckets(width, height, settings.bucket_size.max(1));

        let results: Vec<BucketResult> = if settings.parallel {
            buckets
                .into_par_iter()
                .map(|bucket| BucketResult::new(bucket, render_bucket(&bucket, &rays, scene, settings)))
                .collect()
        } else {
            buckets
                .into_iter()
                .map(|bucket| BucketResult::new(bucket, render_bucket(&bucket, &rays, scene, settings)))
                .collect()
        };

        for result in &results {
            result.write_to(&mut self.image);
        }
        apply_tone_mapping(&mut self.image.pixels, settings.tone_mapping);

        log::trace!("Traced {} buckets", results.len());
        &self.image
    }
}
