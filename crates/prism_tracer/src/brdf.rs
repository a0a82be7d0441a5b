//! Reflectance models for direct lighting.
//!
//! Light and view vectors point towards the surface (the way the light and
//! the eye ray travel). Normals are unit length and point out of the surface.

use prism_core::Color;
use prism_math::{Vec3, Vec3Ext};
use std::f32::consts::PI;

/// Fresnel reflectance at normal incidence for nonmetals.
pub const NONMETAL_F0: f32 = 0.4;

/// Exponent of the Phong lobe in the Lambert/Phong blend.
pub const PHONG_EXPONENT: i32 = 60;

/// Lambert/Phong intensities are scaled down by this to sit next to PBR.
pub const LAMBERT_PHONG_SCALE: f32 = 0.35;

/// Lambert cosine. Not clamped: callers only shade lit sides.
#[inline]
pub fn lambert(light: Vec3, normal: Vec3) -> f32 {
    -light.dot(normal)
}

/// Phong lobe between the view ray and the reflected light.
#[inline]
pub fn phong(view: Vec3, reflection: Vec3, exponent: i32) -> f32 {
    view.dot(reflection).powi(exponent)
}

/// Blend of a Lambert and a Phong term weighted by roughness.
pub fn lambert_phong(normal: Vec3, light: Vec3, view: Vec3, roughness: f32) -> f32 {
    let reflection = light.reflect_about(normal);
    let intensity = roughness * lambert(light, normal)
        + (1.0 - roughness) * phong(view, reflection, PHONG_EXPONENT);
    intensity * LAMBERT_PHONG_SCALE
}

/// GGX/Trowbridge-Reitz distribution with `alpha = roughness²`.
#[inline]
pub fn ggx_d(n_dot_h: f32, alpha: f32) -> f32 {
    let a2 = alpha * alpha;
    let denom = n_dot_h * n_dot_h * (a2 - 1.0) + 1.0;
    a2 / (PI * denom * denom)
}

/// Schlick-GGX geometry term for one direction.
#[inline]
pub fn schlick_ggx(n_dot_x: f32, k: f32) -> f32 {
    n_dot_x / (n_dot_x * (1.0 - k) + k)
}

/// Smith geometry term for direct lighting, `k = (alpha + 1)² / 8`.
#[inline]
pub fn smith_g(n_dot_v: f32, n_dot_l: f32, alpha: f32) -> f32 {
    let k = (alpha + 1.0) * (alpha + 1.0) / 8.0;
    schlick_ggx(n_dot_v, k) * schlick_ggx(n_dot_l, k)
}

/// Schlick Fresnel approximation.
#[inline]
pub fn schlick_fresnel(h_dot_v: f32, f0: Color) -> Color {
    f0 + (Color::ONE - f0) * (1.0 - h_dot_v).powi(5)
}

/// Cook-Torrance specular lobe `D * G / (4 * nl * nv) * F`.
///
/// Returns the lobe and the Fresnel term it was weighted with.
pub fn cook_torrance(normal: Vec3, light: Vec3, view: Vec3, alpha: f32, f0: Color) -> (Color, Color) {
    let half = (light + view).normalize();
    let n_dot_l = -normal.dot(light);
    let n_dot_v = -normal.dot(view);
    let n_dot_h = -normal.dot(half);
    let h_dot_v = half.dot(view);

    let fresnel = schlick_fresnel(h_dot_v, f0);
    let factor = ggx_d(n_dot_h, alpha) * smith_g(n_dot_v, n_dot_l, alpha) / (4.0 * n_dot_l * n_dot_v);
    (fresnel * factor, fresnel)
}

/// Lambert diffuse plus Cook-Torrance specular.
///
/// Nonmetals use a grey Fresnel base and give back a grey weight; metals
/// use `base_color` as the Fresnel base and return the tinted lobe only.
pub fn lambert_cook_torrance(
    normal: Vec3,
    light: Vec3,
    view: Vec3,
    specular: f32,
    alpha: f32,
    nonmetal: bool,
    base_color: Color,
) -> Color {
    if nonmetal {
        let (spec, fresnel) = cook_torrance(normal, light, view, alpha, Color::splat(NONMETAL_F0));
        let weight = (1.0 - fresnel.x) * lambert(light, normal) + specular * spec.x;
        Color::splat(weight)
    } else {
        let (spec, _) = cook_torrance(normal, light, view, alpha, base_color);
        spec * specular
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Light straight down onto an up-facing surface, eye at 45 degrees.
    fn setup() -> (Vec3, Vec3, Vec3) {
        (Vec3::Y, Vec3::NEG_Y, Vec3::new(0.0, -1.0, 1.0).normalize())
    }

    #[test]
    fn test_lambert() {
        assert!((lambert(Vec3::NEG_Y, Vec3::Y) - 1.0).abs() < 1e-6);
        assert!(lambert(Vec3::Y, Vec3::Y) < 0.0);
    }

    #[test]
    fn test_phong_peaks_on_mirror_direction() {
        let (n, l, _) = setup();
        let r = l.reflect_about(n);
        let mirror_view = -r;
        let off_view = Vec3::new(1.0, -1.0, 0.0).normalize();

        assert!((phong(mirror_view, r, PHONG_EXPONENT) - 1.0).abs() < 1e-5);
        assert!(phong(off_view, r, PHONG_EXPONENT) < 1e-3);
    }

    #[test]
    fn test_lambert_phong_rough_is_scaled_lambert() {
        let (n, l, v) = setup();
        assert!((lambert_phong(n, l, v, 1.0) - LAMBERT_PHONG_SCALE).abs() < 1e-6);
    }

    #[test]
    fn test_ggx_normalised_peak() {
        // Smoother surfaces concentrate the distribution.
        assert!(ggx_d(1.0, 0.1) > ggx_d(1.0, 0.5));
        assert!((ggx_d(1.0, 1.0) - 1.0 / PI).abs() < 1e-6);
    }

    #[test]
    fn test_fresnel_limits() {
        let f0 = Color::splat(NONMETAL_F0);
        assert!((schlick_fresnel(1.0, f0) - f0).length() < 1e-6);
        assert!((schlick_fresnel(0.0, f0) - Color::ONE).length() < 1e-6);
    }

    #[test]
    fn test_nonmetal_is_grey() {
        let (n, l, v) = setup();
        let c = lambert_cook_torrance(n, l, v, 1.0, 0.36, true, Color::new(1.0, 0.0, 0.0));

        assert!(c.x > 0.0);
        assert_eq!(c.x, c.y);
        assert_eq!(c.y, c.z);
    }

    #[test]
    fn test_metal_takes_base_color() {
        let (n, l, v) = setup();
        let c = lambert_cook_torrance(n, l, v, 1.0, 0.36, false, Color::new(1.0, 0.5, 0.0));

        assert!(c.x > c.y);
        assert!(c.y > c.z);
        assert!(c.z >= 0.0);
    }

    #[test]
    fn test_specular_factor_scales_metal() {
        let (n, l, v) = setup();
        let base = Color::new(0.5, 1.0, 0.8);
        let full = lambert_cook_torrance(n, l, v, 1.0, 0.36, false, base);
        let half = lambert_cook_torrance(n, l, v, 0.5, 0.36, false, base);

        assert!((full * 0.5 - half).length() < 1e-5);
    }
}
