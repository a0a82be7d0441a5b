//! Tracer scene: objects with materials and cull modes, plus lights.

use prism_math::{Ray, Vec3};

use crate::hittable::{CullMode, Hittable, Intersection, RaySide, Shape};
use crate::light::Light;
use crate::material::Material;

/// A shape with its surface and cull mode.
#[derive(Debug, Clone)]
pub struct TraceObject {
    pub shape: Shape,
    pub material: Material,
    pub cull: CullMode,
}

impl TraceObject {
    pub fn new(shape: Shape, material: Material) -> Self {
        Self {
            shape,
            material,
            cull: CullMode::default(),
        }
    }

    pub fn with_cull(mut self, cull: CullMode) -> Self {
        self.cull = cull;
        self
    }
}

/// The nearest surface along a primary ray.
#[derive(Debug, Clone, Copy)]
pub struct Hit<'a> {
    pub object: &'a TraceObject,
    pub intersection: Intersection,
    pub point: Vec3,
    /// Unit surface normal.
    pub normal: Vec3,
}

#[derive(Debug, Clone, Default)]
pub struct TraceScene {
    pub objects: Vec<TraceObject>,
    pub lights: Vec<Light>,
}

impl TraceScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, object: TraceObject) {
        self.objects.push(object);
    }

    pub fn add_light(&mut self, light: Light) {
        self.lights.push(light);
    }

    /// Closest forward hit over all visible objects.
    pub fn nearest_hit(&self, ray: &Ray) -> Option<Hit<'_>> {
        let range = Ray::range();
        let (object, intersection) = self
            .objects
            .iter()
            .filter_map(|object| {
                object
                    .shape
                    .intersect(ray, object.cull, range, RaySide::Forward)
                    .map(|hit| (object, hit))
            })
            .min_by(|a, b| a.1.t.total_cmp(&b.1.t))?;

        let point = ray.at(intersection.t);
        let normal = object
            .shape
            .normal_at(point, &intersection, ray.direction)
            .normalize();
        Some(Hit {
            object,
            intersection,
            point,
            normal,
        })
    }

    /// True when something blocks `light` from reaching `point`.
    ///
    /// Point lights cast from the light to the point and count hits before
    /// the point; directional lights cast from the point along the light
    /// direction and count hits behind it. Every visible object is tested
    /// two-sided.
    pub fn is_occluded(&self, light: &Light, point: Vec3) -> bool {
        let range = Ray::range();
        match light {
            Light::Point(source) => {
                let ray = Ray::between(source.position, point);
                self.any_hit(&ray, RaySide::Forward, |t| t < 1.0 - range.min)
            }
            Light::Directional(source) => {
                let ray = Ray::new(point, source.direction);
                self.any_hit(&ray, RaySide::Behind, |_| true)
            }
        }
    }

    fn any_hit(&self, ray: &Ray, side: RaySide, accept: impl Fn(f32) -> bool) -> bool {
        self.objects
            .iter()
            .filter(|object| object.cull != CullMode::None)
            .any(|object| {
                object
                    .shape
                    .intersect(ray, CullMode::Both, Ray::range(), side)
                    .is_some_and(|hit| accept(hit.t))
            })
    }

    /// Spin every mesh about its own centre.
    pub fn spin_meshes(&mut self, angle: f32) {
        for object in &mut self.objects {
            if let Shape::Mesh(mesh) = &mut object.shape {
                mesh.spin(angle);
            }
        }
    }

    pub fn mesh_count(&self) -> usize {
        self.objects
            .iter()
            .filter(|object| matches!(object.shape, Shape::Mesh(_)))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Plane, Sphere};
    use prism_core::Color;

    fn scene() -> TraceScene {
        let mut scene = TraceScene::new();
        scene.add(TraceObject::new(
            Shape::Plane(Plane::new(Vec3::new(0.0, -2.0, 0.0), Vec3::Y)),
            Material::default(),
        ));
        scene.add(TraceObject::new(
            Shape::Sphere(Sphere::new(Vec3::ZERO, 1.0)),
            Material::default(),
        ));
        scene
    }

    #[test]
    fn test_nearest_hit_prefers_closer_object() {
        let ray = Ray::new(Vec3::new(0.0, 5.0, 0.0), Vec3::NEG_Y);
        let scene = scene();
        let hit = scene.nearest_hit(&ray).unwrap();

        assert!(matches!(hit.object.shape, Shape::Sphere(_)));
        assert!((hit.intersection.t - 4.0).abs() < 1e-4);
        assert!((hit.normal - Vec3::Y).length() < 1e-4);
    }

    #[test]
    fn test_hidden_object_is_skipped() {
        let mut scene = scene();
        scene.objects[1].cull = CullMode::None;
        let ray = Ray::new(Vec3::new(0.0, 5.0, 0.0), Vec3::NEG_Y);
        let hit = scene.nearest_hit(&ray).unwrap();

        assert!(matches!(hit.object.shape, Shape::Plane(_)));
        assert!((hit.intersection.t - 7.0).abs() < 1e-4);
    }

    #[test]
    fn test_point_light_occlusion() {
        let scene = scene();
        let light = Light::point(Vec3::new(0.0, 5.0, 0.0), 10.0, Color::ONE);

        // Under the sphere on the floor.
        assert!(scene.is_occluded(&light, Vec3::new(0.0, -2.0, 0.0)));
        // Off to the side.
        assert!(!scene.is_occluded(&light, Vec3::new(4.0, -2.0, 0.0)));
        // The sphere's own top is not shadowed by itself.
        assert!(!scene.is_occluded(&light, Vec3::new(0.0, 1.0, 0.0)));
    }

    #[test]
    fn test_directional_light_occlusion() {
        let scene = scene();
        let light = Light::directional(Vec3::NEG_Y, 1.0, Color::ONE);

        assert!(scene.is_occluded(&light, Vec3::new(0.0, -2.0, 0.0)));
        assert!(!scene.is_occluded(&light, Vec3::new(4.0, -2.0, 0.0)));
    }

    #[test]
    fn test_hidden_objects_cast_no_shadow() {
        let mut scene = scene();
        scene.objects[1].cull = CullMode::None;
        let light = Light::point(Vec3::new(0.0, 5.0, 0.0), 10.0, Color::ONE);

        assert!(!scene.is_occluded(&light, Vec3::new(0.0, -2.0, 0.0)));
    }
}
