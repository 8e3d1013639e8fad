//! Constrained orbit camera.
//!
//! The camera orbits a fixed target on a sphere. Distance and polar angle are
//! clamped, pan is never applied, and auto-rotation pauses while a drag is
//! in progress. Camera rotation and the avatar's own spin are independent and
//! compose at render time.

use std::f32::consts::{FRAC_PI_2, PI, TAU};

use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::CameraConfig;

/// Camera input from the host, in surface pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CameraGesture {
    DragStart { x: f32, y: f32 },
    DragMove { x: f32, y: f32 },
    DragEnd,
    /// Positive zooms out
    Scroll { delta: f32 },
    Pan { dx: f32, dy: f32 },
}

/// Snapshot of the camera for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CameraState {
    pub eye: Vec3,
    pub target: Vec3,
    pub fov_degrees: f32,
    pub distance: f32,
    pub azimuth: f32,
    pub polar: f32,
}

/// Like `f32::clamp`, but an inverted or NaN range never panics.
fn clamp_loose(v: f32, min: f32, max: f32) -> f32 {
    v.max(min).min(max)
}

#[derive(Debug, Clone)]
pub struct OrbitCamera {
    config: CameraConfig,
    target: Vec3,
    distance: f32,
    /// Rotation about +Y, radians
    azimuth: f32,
    /// Angle from +Y, radians
    polar: f32,
    drag_from: Option<(f32, f32)>,
    viewport_height: f32,
}

impl OrbitCamera {
    pub fn new(config: CameraConfig) -> Self {
        let distance = clamp_loose(config.distance, config.min_distance, config.max_distance);
        let polar = clamp_loose(FRAC_PI_2, config.min_polar_angle, config.max_polar_angle);
        Self {
            target: Vec3::from(config.target),
            distance,
            azimuth: 0.0,
            polar,
            drag_from: None,
            viewport_height: 1.0,
            config,
        }
    }

    pub fn set_viewport_height(&mut self, height: u32) {
        self.viewport_height = height.max(1) as f32;
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn azimuth(&self) -> f32 {
        self.azimuth
    }

    pub fn polar(&self) -> f32 {
        self.polar
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn is_dragging(&self) -> bool {
        self.drag_from.is_some()
    }

    /// Apply a gesture. Returns false if it was rejected or had no effect.
    pub fn apply(&mut self, gesture: CameraGesture) -> bool {
        match gesture {
            CameraGesture::DragStart { x, y } => {
                self.drag_from = Some((x, y));
                true
            }
            CameraGesture::DragMove { x, y } => {
                let Some((px, py)) = self.drag_from else {
                    return false;
                };
                self.drag_from = Some((x, y));
                let scale = TAU * self.config.rotate_speed / self.viewport_height;
                self.rotate((x - px) * scale, (y - py) * scale);
                true
            }
            CameraGesture::DragEnd => self.drag_from.take().is_some(),
            CameraGesture::Scroll { delta } => {
                if !self.config.enable_zoom || delta == 0.0 {
                    return false;
                }
                self.zoom(delta);
                true
            }
            CameraGesture::Pan { .. } => {
                debug!("Pan gesture rejected");
                false
            }
        }
    }

    /// Orbit left/right by `d_azimuth` and up/down by `d_polar`.
    pub fn rotate(&mut self, d_azimuth: f32, d_polar: f32) {
        self.azimuth = (self.azimuth - d_azimuth).rem_euclid(TAU);
        self.polar = clamp_loose(
            self.polar - d_polar,
            self.config.min_polar_angle,
            self.config.max_polar_angle,
        )
        .clamp(1e-4, PI - 1e-4);
    }

    /// Scale distance by `0.95^(zoom_speed)` per scroll unit.
    pub fn zoom(&mut self, delta: f32) {
        let factor = 0.95f32.powf(self.config.zoom_speed * delta.abs());
        let distance = if delta > 0.0 {
            self.distance / factor
        } else {
            self.distance * factor
        };
        self.distance = clamp_loose(distance, self.config.min_distance, self.config.max_distance);
    }

    /// Advance auto-rotation. One revolution takes `60 / speed` seconds.
    pub fn update(&mut self, dt: f32) {
        if self.config.auto_rotate && !self.is_dragging() {
            let angle = TAU / 60.0 * self.config.auto_rotate_speed * dt;
            self.azimuth = (self.azimuth - angle).rem_euclid(TAU);
        }
    }

    pub fn eye(&self) -> Vec3 {
        let (sp, cp) = self.polar.sin_cos();
        let (sa, ca) = self.azimuth.sin_cos();
        self.target + self.distance * Vec3::new(sp * sa, cp, sp * ca)
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye(), self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.config.fov_degrees.to_radians(), aspect, 0.1, 100.0)
    }

    pub fn state(&self) -> CameraState {
        CameraState {
            eye: self.eye(),
            target: self.target,
            fov_degrees: self.config.fov_degrees,
            distance: self.distance,
            azimuth: self.azimuth,
            polar: self.polar,
        }
    }
}
