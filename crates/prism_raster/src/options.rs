//! Runtime toggles for the rasterizer.

use prism_math::Vec3;
use serde::{Deserialize, Serialize};

/// Which pipeline draws the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderMode {
    Software,
    #[default]
    Hardware,
}

impl RenderMode {
    pub fn toggle(self) -> Self {
        match self {
            RenderMode::Software => RenderMode::Hardware,
            RenderMode::Hardware => RenderMode::Software,
        }
    }
}

/// Which triangle facings are drawn.
///
/// `Front` keeps triangles that wind counter-clockwise on screen, `Back`
/// the clockwise ones, `Both` keeps either.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CullMode {
    #[default]
    Front,
    Back,
    Both,
}

impl CullMode {
    /// Front -> Back -> Both -> Front.
    pub fn cycle(self) -> Self {
        match self {
            CullMode::Front => CullMode::Back,
            CullMode::Back => CullMode::Both,
            CullMode::Both => CullMode::Front,
        }
    }
}

/// Texture filtering used by the hardware path. The software path always
/// samples the nearest texel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SamplerMode {
    #[default]
    Point,
    Linear,
    Anisotropic,
}

impl SamplerMode {
    /// Point -> Linear -> Anisotropic -> Point.
    pub fn cycle(self) -> Self {
        match self {
            SamplerMode::Point => SamplerMode::Linear,
            SamplerMode::Linear => SamplerMode::Anisotropic,
            SamplerMode::Anisotropic => SamplerMode::Point,
        }
    }
}

/// The single light the rasterizer shades with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DirectionalLight {
    /// Direction the light travels in (not required to be unit length).
    pub direction: Vec3,
    pub color: Vec3,
    pub intensity: f32,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self {
            direction: Vec3::new(0.577, -0.577, -0.577),
            color: Vec3::ONE,
            intensity: 3.0,
        }
    }
}

/// Everything the render call needs besides the camera and the scene.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    pub mode: RenderMode,
    pub cull: CullMode,
    pub sampler: SamplerMode,
    /// Blend transparent meshes (hardware path).
    pub transparency: bool,
    /// Apply normal maps where the object has one.
    pub normal_map: bool,
    /// Add the specular term where the object has a specular map.
    pub specular: bool,
    /// Show depth as greyscale instead of shading.
    pub depth_view: bool,
    pub light: DirectionalLight,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            mode: RenderMode::default(),
            cull: CullMode::default(),
            sampler: SamplerMode::default(),
            transparency: true,
            normal_map: true,
            specular: true,
            depth_view: false,
            light: DirectionalLight::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = RenderOptions::default();
        assert_eq!(options.mode, RenderMode::Hardware);
        assert_eq!(options.cull, CullMode::Front);
        assert_eq!(options.sampler, SamplerMode::Point);
        assert!(options.transparency && options.normal_map && options.specular);
        assert!(!options.depth_view);
        assert_eq!(options.light.intensity, 3.0);
    }

    #[test]
    fn test_cycles() {
        assert_eq!(CullMode::Front.cycle().cycle().cycle(), CullMode::Front);
        assert_eq!(CullMode::Back.cycle(), CullMode::Both);
        assert_eq!(SamplerMode::Linear.cycle(), SamplerMode::Anisotropic);
        assert_eq!(SamplerMode::Anisotropic.cycle(), SamplerMode::Point);
        assert_eq!(RenderMode::Hardware.toggle(), RenderMode::Software);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let options: RenderOptions =
            serde_json::from_str(r#"{ "mode": "software", "cull": "both" }"#).unwrap();
        assert_eq!(options.mode, RenderMode::Software);
        assert_eq!(options.cull, CullMode::Both);
        assert!(options.specular);
        assert_eq!(options.light, DirectionalLight::default());
    }
}
