//! Built-in demo scenes.

use prism_core::Color;
use prism_math::Vec3;
use std::f32::consts::FRAC_1_SQRT_2;
use std::path::Path;

use crate::hittable::{CullMode, Shape};
use crate::light::Light;
use crate::material::Material;
use crate::scene::{TraceObject, TraceScene};
use crate::triangle::TraceMesh;
use crate::{Plane, Sphere};

/// Camera position and look direction the demo scenes are framed for.
pub const DEMO_CAMERA: (Vec3, Vec3) = (Vec3::new(0.0, 1.0, -4.0), Vec3::Z);

/// Mesh file loaded into the bunny scene.
pub const BUNNY_FILE: &str = "lowpoly_bunny.obj";

/// Scenes 0 (box), 1 (open) and 2 (bunny).
///
/// The bunny is read from `assets` when it exists there.
pub fn demo_scenes(assets: &Path) -> Vec<TraceScene> {
    vec![box_scene(), open_scene(), bunny_scene(&assets.join(BUNNY_FILE))]
}

/// Spheres and triangles inside a closed box.
pub fn box_scene() -> TraceScene {
    let mut scene = TraceScene::new();
    let walls = [
        (Vec3::new(0.0, -2.0, 0.0), Vec3::Y),
        (Vec3::new(0.0, 10.0, 0.0), Vec3::NEG_Y),
        (Vec3::new(-5.0, 0.0, 0.0), Vec3::X),
        (Vec3::new(5.0, 0.0, 0.0), Vec3::NEG_X),
        (Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z),
        (Vec3::new(0.0, 0.0, -5.0), Vec3::Z),
    ];
    for (origin, normal) in walls {
        scene.add(plane(origin, normal));
    }
    add_spheres_and_triangles(&mut scene);
    add_point_lights(&mut scene);
    scene
}

/// The same spheres and triangles over a floor, with a sun.
pub fn open_scene() -> TraceScene {
    let mut scene = TraceScene::new();
    scene.add(floor());
    add_spheres_and_triangles(&mut scene);
    add_point_lights(&mut scene);
    add_sun(&mut scene);
    scene
}

/// A floor with the bunny mesh, if it can be loaded from `path`.
pub fn bunny_scene(path: &Path) -> TraceScene {
    let mut scene = TraceScene::new();
    scene.add(floor());

    if path.exists() {
        match TraceMesh::load(path) {
            Ok(mesh) => {
                log::info!(
                    "Loaded {} ({} triangles)",
                    path.display(),
                    mesh.mesh().triangle_count()
                );
                scene.add(TraceObject::new(
                    Shape::Mesh(mesh),
                    Material::nonmetal(Color::new(1.0, 0.8, 0.5), 0.6),
                ));
            }
            Err(e) => log::warn!("Skipping {}: {}", path.display(), e),
        }
    } else {
        log::warn!("{} not found, bunny scene has only a floor", path.display());
    }

    add_point_lights(&mut scene);
    add_sun(&mut scene);
    scene
}

fn plane(origin: Vec3, normal: Vec3) -> TraceObject {
    TraceObject::new(Shape::Plane(Plane::new(origin, normal)), Material::default())
}

fn floor() -> TraceObject {
    plane(Vec3::new(0.0, -2.0, 0.0), Vec3::Y)
}

fn add_spheres_and_triangles(scene: &mut TraceScene) {
    let roughness = [0.1, 0.6, 1.0];
    for (i, x) in [-2.0, 0.0, 2.0].into_iter().enumerate() {
        scene.add(TraceObject::new(
            Shape::Sphere(Sphere::new(Vec3::new(x, 0.0, 0.0), FRAC_1_SQRT_2)),
            Material::nonmetal(Color::new(1.0, 0.5, 0.8), roughness[i]),
        ));
    }
    for (i, x) in [-2.0, 0.0, 2.0].into_iter().enumerate() {
        scene.add(TraceObject::new(
            Shape::Sphere(Sphere::new(Vec3::new(x, 2.5, 0.0), FRAC_1_SQRT_2)),
            Material::metal(Color::new(0.5, 1.0, 0.8), roughness[i]),
        ));
    }

    let culls = [CullMode::Front, CullMode::Both, CullMode::Back];
    for (cull, x) in culls.into_iter().zip([-2.0, 0.0, 2.0]) {
        let mut triangle = unit_triangle();
        triangle.translate(Vec3::new(x, 4.0, 0.0));
        scene.add(
            TraceObject::new(
                Shape::Mesh(triangle),
                Material::nonmetal(Color::new(1.0, 0.8, 0.5), 0.6),
            )
            .with_cull(cull),
        );
    }
}

/// Upright triangle facing -Z, towards the demo camera.
fn unit_triangle() -> TraceMesh {
    TraceMesh::triangle(
        Vec3::new(-0.75, -0.5, 0.0),
        Vec3::new(0.0, 0.75, 0.0),
        Vec3::new(0.75, -0.5, 0.0),
    )
}

fn add_point_lights(scene: &mut TraceScene) {
    scene.add_light(Light::point(Vec3::new(-1.0, 5.0, 3.0), 10.0, Color::new(1.0, 1.0, 0.8)));
    scene.add_light(Light::point(Vec3::new(1.0, 2.0, -2.5), 10.0, Color::new(0.8, 0.8, 1.0)));
    scene.add_light(Light::point(Vec3::new(1.0, 6.0, -1.0), 10.0, Color::new(0.8, 0.8, 1.0)));
}

fn add_sun(scene: &mut TraceScene) {
    scene.add_light(Light::directional(Vec3::new(-0.5, -1.0, -0.5), 1.0, Color::ONE));
}
