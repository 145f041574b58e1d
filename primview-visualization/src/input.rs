//! Mouse state accumulated between frames

use crate::camera::{Camera3D, ORBIT_SPEED};
use nalgebra::Vector2;
use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};

/// What a mouse drag does to the camera
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragMode {
    Orbit,
    Pan,
}

/// Input gathered since the last frame
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameInput {
    pub drag_mode: Option<DragMode>,
    /// Cursor movement in pixels while a button was held
    pub drag: Vector2<f32>,
    /// Wheel notches, positive away from the user
    pub scroll: f32,
}

impl FrameInput {
    pub fn is_idle(&self) -> bool {
        self.scroll == 0.0 && (self.drag_mode.is_none() || self.drag == Vector2::zeros())
    }

    /// Blender-style camera update
    pub fn apply(&self, camera: &mut Camera3D) {
        match self.drag_mode {
            Some(DragMode::Orbit) => {
                camera.orbit(self.drag.x * ORBIT_SPEED, self.drag.y * ORBIT_SPEED)
            }
            Some(DragMode::Pan) => camera.pan(self.drag.x, self.drag.y),
            None => {}
        }
        if self.scroll != 0.0 {
            camera.dolly(self.scroll);
        }
    }
}

/// Tracks buttons, modifiers and cursor motion from window events
#[derive(Debug, Default)]
pub struct InputTracker {
    left: bool,
    middle: bool,
    right: bool,
    shift: bool,
    last_cursor: Option<Vector2<f64>>,
    drag: Vector2<f32>,
    scroll: f32,
}

impl InputTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drag_mode(&self) -> Option<DragMode> {
        if self.right || ((self.left || self.middle) && self.shift) {
            Some(DragMode::Pan)
        } else if self.left || self.middle {
            Some(DragMode::Orbit)
        } else {
            None
        }
    }

    /// Record a window event. Returns `true` if the event was mouse input.
    pub fn handle_event(&mut self, event: &WindowEvent) -> bool {
        match event {
            WindowEvent::MouseInput { state, button, .. } => {
                let pressed = *state == ElementState::Pressed;
                match button {
                    MouseButton::Left => self.left = pressed,
                    MouseButton::Middle => self.middle = pressed,
                    MouseButton::Right => self.right = pressed,
                    _ => return false,
                }
                true
            }
            WindowEvent::CursorMoved { position, .. } => {
                let position = Vector2::new(position.x, position.y);
                if let Some(last) = self.last_cursor {
                    if self.drag_mode().is_some() {
                        self.drag += (position - last).cast::<f32>();
                    }
                }
                self.last_cursor = Some(position);
                true
            }
            WindowEvent::CursorLeft { .. } => {
                self.last_cursor = None;
                true
            }
            WindowEvent::MouseWheel { delta, .. } => {
                self.scroll += match delta {
                    MouseScrollDelta::LineDelta(_, y) => *y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 / 100.0,
                };
                true
            }
            WindowEvent::ModifiersChanged(modifiers) => {
                self.shift = modifiers.state().shift_key();
                false
            }
            WindowEvent::Focused(false) => {
                self.release_all();
                false
            }
            _ => false,
        }
    }

    /// Take the accumulated input, resetting motion for the next frame
    pub fn take_frame_input(&mut self) -> FrameInput {
        let input = FrameInput {
            drag_mode: self.drag_mode(),
            drag: self.drag,
            scroll: self.scroll,
        };
        self.drag = Vector2::zeros();
        self.scroll = 0.0;
        input
    }

    fn release_all(&mut self) {
        self.left = false;
        self.middle = false;
        self.right = false;
        self.shift = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drag_modes() {
        let mut tracker = InputTracker::new();
        assert_eq!(tracker.drag_mode(), None);

        tracker.left = true;
        assert_eq!(tracker.drag_mode(), Some(DragMode::Orbit));
        tracker.shift = true;
        assert_eq!(tracker.drag_mode(), Some(DragMode::Pan));

        tracker.release_all();
        tracker.right = true;
        assert_eq!(tracker.drag_mode(), Some(DragMode::Pan));
    }

    #[test]
    fn test_take_frame_input_resets_motion() {
        let mut tracker = InputTracker::new();
        tracker.middle = true;
        tracker.drag = Vector2::new(3.0, -2.0);
        tracker.scroll = 1.5;

        let input = tracker.take_frame_input();
        assert_eq!(input.drag_mode, Some(DragMode::Orbit));
        assert_eq!(input.drag, Vector2::new(3.0, -2.0));
        assert_eq!(input.scroll, 1.5);

        let next = tracker.take_frame_input();
        assert!(next.is_idle());
        assert_eq!(next.drag_mode, Some(DragMode::Orbit));
    }

    #[test]
    fn test_apply_scroll_dollies() {
        let mut camera = Camera3D::default();
        let input = FrameInput {
            scroll: 1.0,
            ..Default::default()
        };
        input.apply(&mut camera);
        assert!(camera.distance() < 4.0);
    }

    #[test]
    fn test_apply_without_button_ignores_drag() {
        let mut camera = Camera3D::default();
        let input = FrameInput {
            drag_mode: None,
            drag: Vector2::new(50.0, 50.0),
            scroll: 0.0,
        };
        input.apply(&mut camera);
        assert_eq!(camera, Camera3D::default());
    }
}
