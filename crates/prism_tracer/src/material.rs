//! Surface description for tracer objects.

use prism_core::Color;
use serde::{Deserialize, Serialize};

/// How a surface reflects light.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Material {
    /// Base colour; the Fresnel base for metals.
    pub color: Color,
    /// Scales the final colour of nonmetals.
    pub reflectance: f32,
    /// Weight of the specular lobe.
    pub specular: f32,
    /// 0 is mirror-like, 1 fully diffuse.
    pub roughness: f32,
    pub nonmetal: bool,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            color: Color::ONE,
            reflectance: 1.0,
            specular: 1.0,
            roughness: 1.0,
            nonmetal: true,
        }
    }
}

impl Material {
    pub fn nonmetal(color: Color, roughness: f32) -> Self {
        Self {
            color,
            roughness,
            ..Default::default()
        }
    }

    pub fn metal(color: Color, roughness: f32) -> Self {
        Self {
            color,
            roughness,
            nonmetal: false,
            ..Default::default()
        }
    }

    /// Applied to the gathered light: nonmetals are tinted by
    /// `color * reflectance`, metals are already tinted by their Fresnel term.
    pub fn tint(&self, light: Color) -> Color {
        if self.nonmetal {
            light * self.color * self.reflectance
        } else {
            light
        }
    }
}
