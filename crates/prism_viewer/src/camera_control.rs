//! Keyboard and mouse camera movement.
//!
//! Input is collected between frames into a [`MovementInput`] and applied
//! once per frame by [`CameraMovement::update`].

use std::collections::HashSet;
use std::f32::consts::PI;

use prism_math::{Camera, Mat3, Vec2, Vec3};
use winit::keyboard::KeyCode;

/// Keyboard speed in units per second.
const MOVEMENT_FACTOR: f32 = 2.0;
/// Distance to the pivot at which movement runs at its base speed.
const DISTANCE_FACTOR: f32 = 3.0;
/// Field of view change in radians per second.
const ZOOM_FACTOR: f32 = PI / 5.0;
/// Radians per pixel of mouse motion.
const MOUSE_ROTATION_FACTOR: f32 = 1.0 / 200.0;
/// Units per pixel of mouse motion.
const MOUSE_MOVEMENT_FACTOR: f32 = 1.0 / 100.0;
/// Focal length scale per wheel step.
const WHEEL_FACTOR: f32 = 1.01;
/// Stand-in for the distance to the object in focus when zooming a free camera.
const FOCUS_DISTANCE: f32 = 10.0;

/// What the held mouse buttons do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MouseAction {
    #[default]
    None,
    /// Left button: move along the look direction and yaw.
    Walk,
    /// Right button: yaw and pitch.
    Pivot,
    /// Both buttons: move along world up.
    Climb,
}

impl MouseAction {
    pub fn from_buttons(left: bool, right: bool) -> Self {
        match (left, right) {
            (true, true) => MouseAction::Climb,
            (true, false) => MouseAction::Walk,
            (false, true) => MouseAction::Pivot,
            (false, false) => MouseAction::None,
        }
    }
}

/// Input gathered since the last frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MovementInput {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
    pub zoom_in: bool,
    pub zoom_out: bool,
    pub mouse: MouseAction,
    /// Pixels moved, x to the right and y up.
    pub mouse_delta: Vec2,
    /// Wheel steps, positive away from the user.
    pub wheel: f32,
}

impl MovementInput {
    /// Keyboard part of the input from the set of held keys.
    pub fn from_keys(keys: &HashSet<KeyCode>) -> Self {
        let held = |codes: &[KeyCode]| codes.iter().any(|code| keys.contains(code));
        Self {
            forward: held(&[KeyCode::KeyW, KeyCode::ArrowUp]),
            backward: held(&[KeyCode::KeyS, KeyCode::ArrowDown]),
            left: held(&[KeyCode::KeyA, KeyCode::ArrowLeft]),
            right: held(&[KeyCode::KeyD, KeyCode::ArrowRight]),
            up: held(&[KeyCode::Space, KeyCode::PageUp]),
            down: held(&[KeyCode::ShiftLeft, KeyCode::PageDown]),
            zoom_in: held(&[KeyCode::NumpadAdd]),
            zoom_out: held(&[KeyCode::NumpadSubtract]),
            ..Default::default()
        }
    }
}

/// Forward, up and left of a look direction, with up derived from world Y.
fn basis(direction: Vec3) -> (Vec3, Vec3, Vec3) {
    let forward = direction.normalize();
    let left = forward.cross(Vec3::Y).normalize_or_zero();
    let up = left.cross(forward);
    (forward, up, left)
}

/// Camera movement settings for one viewer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraMovement {
    /// Orbit `pivot` and keep looking at it instead of flying freely.
    pub orbit: bool,
    pub pivot: Vec3,
    /// Scale translation by the distance to the pivot.
    pub scale_by_distance: bool,
    /// Move a free camera back while zooming so the framing holds.
    pub compensate_zoom: bool,
}

impl CameraMovement {
    /// Rasterizer viewer: starts orbiting the origin, speed follows distance.
    pub fn rasterizer() -> Self {
        Self {
            orbit: true,
            pivot: Vec3::ZERO,
            scale_by_distance: true,
            compensate_zoom: true,
        }
    }

    /// Ray tracer viewer: free flight at constant speed.
    pub fn tracer() -> Self {
        Self {
            orbit: false,
            pivot: Vec3::ZERO,
            scale_by_distance: false,
            compensate_zoom: false,
        }
    }

    pub fn toggle_orbit(&mut self) {
        self.orbit = !self.orbit;
    }

    fn distance_scale(&self, camera: &Camera) -> f32 {
        if self.scale_by_distance {
            self.pivot.distance(camera.position()) / DISTANCE_FACTOR
        } else {
            1.0
        }
    }

    /// Apply one frame of input lasting `dt` seconds.
    pub fn update(&self, camera: &mut Camera, dt: f32, input: &MovementInput) {
        self.apply_keyboard(camera, dt, input);
        self.apply_mouse(camera, input);
        self.apply_wheel(camera, input.wheel);

        if self.orbit {
            camera.set_direction(self.pivot - camera.position());
        }
    }

    fn apply_keyboard(&self, camera: &mut Camera, dt: f32, input: &MovementInput) {
        let step = dt * MOVEMENT_FACTOR * self.distance_scale(camera);
        let (forward, up, left) = basis(camera.direction());

        let mut offset = Vec3::ZERO;
        if input.forward {
            offset += forward;
        } else if input.backward {
            offset -= forward;
        }
        if input.left {
            offset += left;
        } else if input.right {
            offset -= left;
        }
        if input.up {
            offset += up;
        } else if input.down {
            offset -= up;
        }
        if offset != Vec3::ZERO {
            camera.set_position(camera.position() + offset * step);
        }

        if input.zoom_in {
            camera.set_field_of_view(camera.field_of_view() - ZOOM_FACTOR * dt);
        } else if input.zoom_out {
            camera.set_field_of_view(camera.field_of_view() + ZOOM_FACTOR * dt);
        }
    }

    fn apply_mouse(&self, camera: &mut Camera, input: &MovementInput) {
        let action = input.mouse;
        if action == MouseAction::None || input.mouse_delta == Vec2::ZERO {
            return;
        }

        let movement = MOUSE_MOVEMENT_FACTOR * self.distance_scale(camera);
        let yaw = input.mouse_delta.x * MOUSE_ROTATION_FACTOR;
        let pitch = input.mouse_delta.y * MOUSE_ROTATION_FACTOR;
        let dy = input.mouse_delta.y;

        if self.orbit {
            let (forward, up, left) = basis(camera.direction());
            match action {
                MouseAction::Walk => camera.set_position(camera.position() + forward * (movement * dy)),
                MouseAction::Pivot => {
                    camera.orbit(Mat3::from_axis_angle(up, yaw), self.pivot);
                    camera.orbit(Mat3::from_axis_angle(left, pitch), self.pivot);
                }
                MouseAction::Climb | MouseAction::None => {}
            }
            return;
        }

        let forward = camera.direction();
        let left = forward.cross(Vec3::Y).normalize_or_zero();
        match action {
            MouseAction::Climb => camera.set_position(camera.position() + Vec3::Y * (movement * dy)),
            MouseAction::Walk => {
                camera.set_position(camera.position() + forward * (movement * dy));
                camera.rotate(Mat3::from_axis_angle(Vec3::Y, yaw));
            }
            MouseAction::Pivot => {
                camera.rotate(Mat3::from_axis_angle(Vec3::Y, yaw));
                camera.rotate(Mat3::from_axis_angle(left, pitch));
            }
            MouseAction::None => {}
        }
    }

    /// Scale the focal length by `1.01^wheel`.
    fn apply_wheel(&self, camera: &mut Camera, wheel: f32) {
        if wheel == 0.0 {
            return;
        }
        let factor = WHEEL_FACTOR.powf(wheel);
        let focal = camera.focal_length();
        let position = camera.position();

        camera.set_focal_length(focal * factor);

        if !self.compensate_zoom {
            return;
        }
        if self.orbit {
            camera.set_position(position - (self.pivot - position) * (factor - 1.0));
        } else {
            let distance = FOCUS_DISTANCE * focal;
            camera.set_position(position - camera.direction() * (distance * (factor - 1.0)));
        }
    }
}
