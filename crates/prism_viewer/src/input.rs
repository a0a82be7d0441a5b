//! Window input accumulated between frames.

use std::collections::HashSet;

use prism_math::Vec2;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};
use winit::keyboard::KeyCode;

use crate::camera_control::{MouseAction, MovementInput};

/// Pixels of trackpad scrolling that count as one wheel step.
const PIXELS_PER_WHEEL_STEP: f32 = 20.0;

/// Held keys and buttons plus mouse motion since the last frame.
#[derive(Debug, Default)]
pub struct InputState {
    pub keys_pressed: HashSet<KeyCode>,
    left_mouse_pressed: bool,
    right_mouse_pressed: bool,
    last_mouse_pos: Option<(f64, f64)>,
    mouse_delta: Vec2,
    wheel: f32,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a mouse event. Returns true if the event was consumed.
    pub fn handle_mouse(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::MouseInput { button, state, .. } => {
                let pressed = *state == ElementState::Pressed;
                match button {
                    MouseButton::Left => self.left_mouse_pressed = pressed,
                    MouseButton::Right => self.right_mouse_pressed = pressed,
                    _ => return false,
                }
                true
            }
            WindowEvent::CursorMoved { position, .. } => {
                if let Some(last_pos) = self.last_mouse_pos {
                    // Screen y grows downwards; movement wants y up.
                    self.mouse_delta += Vec2::new(
                        (position.x - last_pos.0) as f32,
                        (last_pos.1 - position.y) as f32,
                    );
                }
                self.last_mouse_pos = Some((position.x, position.y));
                true
            }
            WindowEvent::CursorLeft { .. } => {
                self.last_mouse_pos = None;
                true
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.wheel += match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / PIXELS_PER_WHEEL_STEP,
                };
                true
            }
            _ => false,
        }
    }

    pub fn key_down(&mut self, key: KeyCode) {
        self.keys_pressed.insert(key);
    }

    pub fn key_up(&mut self, key: KeyCode) {
        self.keys_pressed.remove(&key);
    }

    /// Movement for this frame. Mouse motion and wheel steps are consumed.
    pub fn take_movement(&mut self) -> MovementInput {
        let input = MovementInput {
            mouse: MouseAction::from_buttons(self.left_mouse_pressed, self.right_mouse_pressed),
            mouse_delta: self.mouse_delta,
            wheel: self.wheel,
            ..MovementInput::from_keys(&self.keys_pressed)
        };
        self.mouse_delta = Vec2::ZERO;
        self.wheel = 0.0;
        input
    }

    /// Whether anything is held that moves the camera without new events.
    pub fn is_active(&self) -> bool {
        !self.keys_pressed.is_empty() || self.left_mouse_pressed || self.right_mouse_pressed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_movement_consumes_wheel() {
        let mut input = InputState::new();
        input.wheel = 3.0;
        input.mouse_delta = Vec2::new(4.0, -2.0);
        input.key_down(KeyCode::KeyW);

        let first = input.take_movement();
        assert_eq!(first.wheel, 3.0);
        assert_eq!(first.mouse_delta, Vec2::new(4.0, -2.0));
        assert!(first.forward);

        let second = input.take_movement();
        assert_eq!(second.wheel, 0.0);
        assert_eq!(second.mouse_delta, Vec2::ZERO);
        assert!(second.forward);
    }

    #[test]
    fn test_key_up_releases() {
        let mut input = InputState::new();
        input.key_down(KeyCode::KeyD);
        assert!(input.is_active());
        input.key_up(KeyCode::KeyD);
        assert!(!input.is_active());
        assert!(!input.take_movement().right);
    }
}
