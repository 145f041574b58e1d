//! Orbit camera for 3D visualization

use nalgebra::{Matrix4, Perspective3, Point3, Unit, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};

/// Radians of orbit per pixel of drag
pub const ORBIT_SPEED: f32 = 0.01;
/// Fraction of the view distance panned per pixel of drag
pub const PAN_SPEED: f32 = 0.0015;
/// Distance factor applied per wheel notch
pub const DOLLY_STEP: f32 = 0.9;
pub const MIN_DISTANCE: f32 = 0.01;

const MAX_PITCH: f32 = std::f32::consts::FRAC_PI_2 - 0.01;

/// Maps OpenGL clip depth (-1..1) to wgpu's 0..1
#[rustfmt::skip]
const OPENGL_TO_WGPU: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.5,
    0.0, 0.0, 0.0, 1.0,
);

/// A perspective camera orbiting a look-at point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Camera3D {
    pub origin: Point3<f32>,
    pub lookat: Point3<f32>,
    /// Use +Z as the up axis instead of +Y
    pub z_up: bool,
    /// Vertical field of view in radians
    pub fovy: f32,
    pub aspect_ratio: f32,
    pub near: f32,
    pub far: f32,
    home_origin: Point3<f32>,
    home_lookat: Point3<f32>,
}

impl Camera3D {
    /// Create a camera; `reset` returns to this placement
    pub fn new(origin: Point3<f32>, lookat: Point3<f32>, z_up: bool) -> Self {
        Self {
            origin,
            lookat,
            z_up,
            fovy: std::f32::consts::FRAC_PI_4,
            aspect_ratio: 1.0,
            near: 0.01,
            far: 1000.0,
            home_origin: origin,
            home_lookat: lookat,
        }
    }

    pub fn up(&self) -> Vector3<f32> {
        if self.z_up {
            Vector3::z()
        } else {
            Vector3::y()
        }
    }

    pub fn distance(&self) -> f32 {
        (self.origin - self.lookat).norm()
    }

    /// Get the view matrix
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(&self.origin, &self.lookat, &self.up())
    }

    /// Get the projection matrix
    pub fn projection_matrix(&self) -> Matrix4<f32> {
        let aspect = if self.aspect_ratio > 0.0 {
            self.aspect_ratio
        } else {
            1.0
        };
        Perspective3::new(aspect, self.fovy, self.near, self.far).into_inner()
    }

    /// Projection times view, with depth remapped for wgpu
    pub fn view_projection(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU * self.projection_matrix() * self.view_matrix()
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect_ratio = width as f32 / height as f32;
        }
    }

    /// Rotate the camera around `lookat`: yaw about the up axis, then pitch,
    /// clamped short of the poles
    pub fn orbit(&mut self, yaw: f32, pitch: f32) {
        let up = self.up();
        let offset = self.origin - self.lookat;
        let radius = offset.norm();
        if radius <= f32::EPSILON {
            return;
        }

        let yawed = UnitQuaternion::from_axis_angle(&Unit::new_unchecked(up), -yaw) * offset;

        let elevation = (yawed.dot(&up) / radius).clamp(-1.0, 1.0).asin();
        let target = (elevation + pitch).clamp(-MAX_PITCH, MAX_PITCH);
        let right = up.cross(&yawed);
        let rotated = match Unit::try_new(right, 1e-6) {
            Some(axis) => UnitQuaternion::from_axis_angle(&axis, -(target - elevation)) * yawed,
            None => yawed,
        };

        self.origin = self.lookat + rotated;
    }

    /// Slide camera and target in the view plane by `dx`, `dy` pixels
    pub fn pan(&mut self, dx: f32, dy: f32) {
        let forward = self.lookat - self.origin;
        let Some(right) = Unit::try_new(forward.cross(&self.up()), 1e-6) else {
            return;
        };
        let screen_up = right.cross(&forward).normalize();
        let scale = self.distance() * PAN_SPEED;
        let shift = (-right.into_inner() * dx + screen_up * dy) * scale;
        self.origin += shift;
        self.lookat += shift;
    }

    /// Move toward `lookat` by `notches` wheel steps; negative moves away
    pub fn dolly(&mut self, notches: f32) {
        let offset = self.origin - self.lookat;
        let distance = offset.norm();
        if distance <= f32::EPSILON {
            return;
        }
        let new_distance = (distance * DOLLY_STEP.powf(notches)).max(MIN_DISTANCE);
        self.origin = self.lookat + offset * (new_distance / distance);
    }

    /// Re-center on a bounding box, keeping the viewing direction
    pub fn frame_bounds(&mut self, min: Point3<f32>, max: Point3<f32>) {
        let center = nalgebra::center(&min, &max);
        let radius = ((max - min).norm() * 0.5).max(MIN_DISTANCE);
        let distance = radius / (self.fovy * 0.5).sin() * 1.1;

        let direction = Unit::try_new(self.origin - self.lookat, 1e-6)
            .map(Unit::into_inner)
            .unwrap_or_else(Vector3::z);

        self.lookat = center;
        self.origin = center + direction * distance;
        self.far = self.far.max(distance + radius * 4.0);
    }

    /// Return to the initial placement
    pub fn reset(&mut self) {
        self.origin = self.home_origin;
        self.lookat = self.home_lookat;
    }
}

impl Default for Camera3D {
    fn default() -> Self {
        Self::new(Point3::new(0.0, 0.0, 4.0), Point3::origin(), false)
    }
}
