//! Light sources for the ray tracer.

use prism_core::Color;
use prism_math::Vec3;

/// Light emitted from a point, falling off with the squared distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointLight {
    pub position: Vec3,
    pub intensity: f32,
    pub color: Color,
}

/// Light arriving from one direction everywhere at equal strength.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    /// Unit direction the light travels in.
    pub direction: Vec3,
    pub intensity: f32,
    pub color: Color,
}

impl DirectionalLight {
    pub fn new(direction: Vec3, intensity: f32, color: Color) -> Self {
        Self {
            direction: direction.normalize(),
            intensity,
            color,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Light {
    Point(PointLight),
    Directional(DirectionalLight),
}

/// Light arriving at one surface point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Incident {
    /// Unit direction from the light towards the surface.
    pub direction: Vec3,
    /// Scalar strength at the surface.
    pub intensity: f32,
    pub color: Color,
}

impl Light {
    pub fn point(position: Vec3, intensity: f32, color: Color) -> Self {
        Light::Point(PointLight {
            position,
            intensity,
            color,
        })
    }

    pub fn directional(direction: Vec3, intensity: f32, color: Color) -> Self {
        Light::Directional(DirectionalLight::new(direction, intensity, color))
    }

    pub fn color(&self) -> Color {
        match self {
            Light::Point(light) => light.color,
            Light::Directional(light) => light.color,
        }
    }

    /// Unnormalised vector from the light towards `point`.
    ///
    /// For directional lights this is the light direction itself.
    pub fn vector_to(&self, point: Vec3) -> Vec3 {
        match self {
            Light::Point(light) => point - light.position,
            Light::Directional(light) => light.direction,
        }
    }

    /// Direction and strength of the light reaching `point`.
    pub fn incident(&self, point: Vec3) -> Incident {
        let vector = self.vector_to(point);
        let intensity = match self {
            Light::Point(light) => light.intensity / vector.length_squared(),
            Light::Directional(light) => light.intensity,
        };
        Incident {
            direction: vector.normalize(),
            intensity,
            color: self.color(),
        }
    }
}
