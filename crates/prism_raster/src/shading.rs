//! Fragment shading for the software path.

use prism_core::{Color, SurfaceId, SurfaceTable};
use prism_math::{remap, Mat3, Vec2, Vec3, Vec3Ext, VIEW_FAR, VIEW_NEAR};

use crate::options::RenderOptions;
use crate::scene::SurfaceRefs;

/// Golden-ratio offset used by the depth visualisation curve.
const DEPTH_CURVE: f32 = 0.618_034;

/// Share of the lambert term added back as flat ambient light.
const AMBIENT: f32 = 0.75;

/// Interpolated attributes of one fragment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fragment {
    pub uv: Vec2,
    pub normal: Vec3,
    /// Zero when the geometry carries no tangents or normal mapping is off.
    pub tangent: Vec3,
    /// Unit vector from the ray origin to the fragment.
    pub view: Vec3,
}

/// Phong lobe `max(0, -view . reflection)^exponent`.
pub fn phong(view: Vec3, reflection: Vec3, exponent: f32) -> f32 {
    (-view.dot(reflection)).max(0.0).powf(exponent)
}

/// Decode a tangent-space normal map sample from `[0, 1]` to a unit vector.
pub fn decode_normal(sample: Vec3) -> Vec3 {
    ((sample - Vec3::splat(0.5)) * 2.0).normalize()
}

/// Move a tangent-space normal into world space using the fragment frame.
///
/// The frame's columns are `tangent x normal`, `tangent`, `normal`.
pub fn perturb_normal(normal: Vec3, tangent: Vec3, mapped: Vec3) -> Vec3 {
    Mat3::from_cols(tangent.cross(normal), tangent, normal) * mapped
}

/// Greyscale for a depth value; the view near plane maps to white.
pub fn depth_shade(depth: f32) -> Color {
    let value = 1.0 / (DEPTH_CURVE + remap(depth, VIEW_NEAR, VIEW_FAR)) - DEPTH_CURVE;
    Color::splat(value)
}

/// Shade one fragment with the options' directional light.
pub fn shade(
    fragment: &Fragment,
    refs: &SurfaceRefs,
    surfaces: &SurfaceTable,
    options: &RenderOptions,
) -> Color {
    let light = &options.light;
    let diffuse = surfaces.sample(refs.diffuse, fragment.uv);

    let specular_map = if options.specular {
        refs.specular
    } else {
        SurfaceId::NONE
    };
    let mut specular = surfaces.sample(specular_map, fragment.uv);

    let normal = if options.normal_map && !refs.normal.is_none() {
        let mapped = decode_normal(surfaces.sample(refs.normal, fragment.uv));
        perturb_normal(fragment.normal, fragment.tangent, mapped)
    } else {
        fragment.normal
    };

    let lambert = (-normal.dot(light.direction)).max(0.0);
    let lit = light.color * (lambert * light.intensity);
    let ambient = light.color * (AMBIENT * lambert);

    if options.specular && !refs.specular.is_none() {
        let reflection = light.direction.reflect_about(normal);
        specular *= phong(fragment.view, reflection, 1.0);
    }

    (diffuse * lit + (specular + ambient)).max_to_one()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::DirectionalLight;
    use prism_core::Texture;

    fn flat_fragment(normal: Vec3) -> Fragment {
        Fragment {
            uv: Vec2::splat(0.5),
            normal,
            tangent: Vec3::ZERO,
            view: Vec3::Z,
        }
    }

    fn overhead_light() -> RenderOptions {
        RenderOptions {
            light: DirectionalLight {
                direction: Vec3::NEG_Y,
                color: Vec3::ONE,
                intensity: 3.0,
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_depth_shade_endpoints() {
        assert!((depth_shade(VIEW_NEAR).x - 1.0).abs() < 1e-5);
        let far = depth_shade(VIEW_FAR).x;
        assert!((far - (1.0 / 1.618_034 - 0.618_034)).abs() < 1e-5);
        assert!(far.abs() < 1e-5);
    }

    #[test]
    fn test_decode_flat_normal() {
        let n = decode_normal(Vec3::new(0.5, 0.5, 1.0));
        assert!((n - Vec3::Z).length() < 1e-6);
    }

    #[test]
    fn test_perturb_flat_normal_is_identity() {
        let n = perturb_normal(Vec3::Y, Vec3::X, Vec3::Z);
        assert!((n - Vec3::Y).length() < 1e-6);
    }

    #[test]
    fn test_phong_clamps_to_zero() {
        assert_eq!(phong(Vec3::Z, Vec3::Z, 1.0), 0.0);
        assert!((phong(Vec3::Z, Vec3::NEG_Z, 1.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_lit_surface_is_brighter_than_unlit() {
        let mut surfaces = SurfaceTable::new();
        let grey = surfaces.insert("grey", Texture::solid_color(Vec3::splat(0.2)));
        let refs = SurfaceRefs::diffuse(grey);
        let options = overhead_light();

        let up = shade(&flat_fragment(Vec3::Y), &refs, &surfaces, &options);
        let down = shade(&flat_fragment(Vec3::NEG_Y), &refs, &surfaces, &options);

        assert_eq!(down, Vec3::ZERO);
        assert!(up.x > 0.5);
    }

    #[test]
    fn test_overexposure_keeps_hue() {
        let mut surfaces = SurfaceTable::new();
        let red = surfaces.insert("red", Texture::solid_color(Vec3::X));
        let refs = SurfaceRefs::diffuse(red);

        // 1 * 3 + 0.75 on red, 0.75 elsewhere, divided by 3.75.
        let color = shade(&flat_fragment(Vec3::Y), &refs, &surfaces, &overhead_light());
        assert!((color - Vec3::new(1.0, 0.2, 0.2)).length() < 1e-2);
    }

    #[test]
    fn test_specular_needs_map_and_toggle() {
        let mut surfaces = SurfaceTable::new();
        let black = surfaces.insert("black", Texture::solid_color(Vec3::ZERO));
        let white = surfaces.insert("white", Texture::solid_color(Vec3::ONE));
        let refs = SurfaceRefs {
            diffuse: black,
            specular: white,
            ..Default::default()
        };
        let mut options = overhead_light();
        // Looking straight down the reflected light.
        let fragment = Fragment {
            view: Vec3::NEG_Y,
            ..flat_fragment(Vec3::Y)
        };

        let with_spec = shade(&fragment, &refs, &surfaces, &options);
        options.specular = false;
        let without_spec = shade(&fragment, &refs, &surfaces, &options);

        assert!(with_spec.x > without_spec.x);
        assert!((without_spec.x - 0.75).abs() < 1e-2);
    }

    #[test]
    fn test_missing_diffuse_is_black_base() {
        let surfaces = SurfaceTable::new();
        let color = shade(
            &flat_fragment(Vec3::Y),
            &SurfaceRefs::default(),
            &surfaces,
            &overhead_light(),
        );
        // Only the ambient share remains.
        assert!((color - Vec3::splat(0.75)).length() < 1e-5);
    }
}
