//! Render surfaces and the static fallback.
//!
//! A [`GraphicsBackend`] hands out [`RenderSurface`]s. When it cannot, the
//! avatar shows a [`Placeholder`] instead and never reports the failure to
//! its host.

use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard};

use super::compose::FrameDescription;
use crate::config::PlaceholderKind;
use crate::error::SurfaceError;

/// Something frames can be drawn into.
pub trait RenderSurface: Send {
    fn size(&self) -> (u32, u32);

    fn resize(&mut self, width: u32, height: u32) -> Result<(), SurfaceError>;

    fn draw(&mut self, frame: &FrameDescription) -> Result<(), SurfaceError>;
}

/// Creates surfaces for mounted avatars.
pub trait GraphicsBackend: Send + Sync {
    fn name(&self) -> &str;

    fn create_surface(
        &self,
        width: u32,
        height: u32,
    ) -> Result<Box<dyn RenderSurface>, SurfaceError>;
}

/// Static, non-interactive stand-in for the avatar.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Placeholder {
    pub kind: PlaceholderKind,
    pub width: u32,
    pub height: u32,
    /// Wireframe line color, or the gradient's top color
    pub primary: [f32; 4],
    /// Gradient bottom color (unused for wireframe)
    pub secondary: [f32; 4],
    pub reason: String,
}

impl Placeholder {
    pub fn new(kind: PlaceholderKind, width: u32, height: u32, reason: &SurfaceError) -> Self {
        Self {
            kind,
            width,
            height,
            primary: sensei3d_fx::rgb_hex(0x8b5cf6),
            secondary: sensei3d_fx::rgb_hex(0x1e1b4b),
            reason: reason.to_string(),
        }
    }

    pub fn resized(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }
}

/// What a headless surface has seen.
#[derive(Debug, Default)]
pub struct Recording {
    pub surfaces_created: usize,
    pub surfaces_released: usize,
    pub frames_drawn: u64,
    pub last_frame: Option<FrameDescription>,
    pub resizes: Vec<(u32, u32)>,
    /// Once set, every draw fails with `ContextLost`
    pub context_lost: bool,
}

fn lock(recording: &Mutex<Recording>) -> MutexGuard<'_, Recording> {
    match recording.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Draws nothing; records every frame it is given.
#[derive(Debug, Clone, Default)]
pub struct HeadlessBackend {
    recording: Arc<Mutex<Recording>>,
}

impl HeadlessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames_drawn(&self) -> u64 {
        lock(&self.recording).frames_drawn
    }

    pub fn last_frame(&self) -> Option<FrameDescription> {
        lock(&self.recording).last_frame.clone()
    }

    pub fn resizes(&self) -> Vec<(u32, u32)> {
        lock(&self.recording).resizes.clone()
    }

    /// Surfaces created minus surfaces dropped.
    pub fn live_surfaces(&self) -> usize {
        let rec = lock(&self.recording);
        rec.surfaces_created - rec.surfaces_released
    }

    /// Simulate the graphics context going away.
    pub fn lose_context(&self) {
        lock(&self.recording).context_lost = true;
    }
}

impl GraphicsBackend for HeadlessBackend {
    fn name(&self) -> &str {
        "headless"
    }

    fn create_surface(
        &self,
        width: u32,
        height: u32,
    ) -> Result<Box<dyn RenderSurface>, SurfaceError> {
        if width == 0 || height == 0 {
            return Err(SurfaceError::ZeroSize { width, height });
        }
        let mut rec = lock(&self.recording);
        if rec.context_lost {
            return Err(SurfaceError::ContextLost);
        }
        rec.surfaces_created += 1;
        Ok(Box::new(HeadlessSurface {
            width,
            height,
            recording: Arc::clone(&self.recording),
        }))
    }
}

struct HeadlessSurface {
    width: u32,
    height: u32,
    recording: Arc<Mutex<Recording>>,
}

impl RenderSurface for HeadlessSurface {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<(), SurfaceError> {
        if width == 0 || height == 0 {
            return Err(SurfaceError::ZeroSize { width, height });
        }
        self.width = width;
        self.height = height;
        lock(&self.recording).resizes.push((width, height));
        Ok(())
    }

    fn draw(&mut self, frame: &FrameDescription) -> Result<(), SurfaceError> {
        let mut rec = lock(&self.recording);
        if rec.context_lost {
            return Err(SurfaceError::ContextLost);
        }
        rec.frames_drawn += 1;
        rec.last_frame = Some(frame.clone());
        Ok(())
    }
}

impl Drop for HeadlessSurface {
    fn drop(&mut self) {
        lock(&self.recording).surfaces_released += 1;
    }
}

/// A backend with no graphics context at all.
#[derive(Debug, Clone, Default)]
pub struct UnavailableBackend {
    reason: String,
}

impl UnavailableBackend {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl GraphicsBackend for UnavailableBackend {
    fn name(&self) -> &str {
        "unavailable"
    }

    fn create_surface(
        &self,
        _width: u32,
        _height: u32,
    ) -> Result<Box<dyn RenderSurface>, SurfaceError> {
        Err(SurfaceError::NoContext(self.reason.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headless_tracks_surfaces() {
        let backend = HeadlessBackend::new();
        let surface = backend.create_surface(320, 240).unwrap();
        assert_eq!(surface.size(), (320, 240));
        assert_eq!(backend.live_surfaces(), 1);
        drop(surface);
        assert_eq!(backend.live_surfaces(), 0);
    }

    #[test]
    fn test_zero_size_rejected() {
        let backend = HeadlessBackend::new();
        let err = backend.create_surface(0, 240).err();
        assert_eq!(
            err,
            Some(SurfaceError::ZeroSize {
                width: 0,
                height: 240
            })
        );
    }

    #[test]
    fn test_unavailable_backend() {
        let backend = UnavailableBackend::new("no adapter");
        match backend.create_surface(320, 240) {
            Err(SurfaceError::NoContext(reason)) => assert_eq!(reason, "no adapter"),
            _ => panic!("expected NoContext"),
        }
    }

    #[test]
    fn test_resize_recorded() {
        let backend = HeadlessBackend::new();
        let mut surface = backend.create_surface(320, 240).unwrap();
        surface.resize(640, 480).unwrap();
        assert!(surface.resize(0, 0).is_err());
        assert_eq!(backend.resizes(), vec![(640, 480)]);
        assert_eq!(surface.size(), (640, 480));
    }

    #[test]
    fn test_placeholder_reason() {
        let p = Placeholder::new(
            PlaceholderKind::Gradient,
            100,
            50,
            &SurfaceError::NoContext("none".into()),
        );
        assert!(p.reason.contains("none"));
        assert_eq!((p.width, p.height), (100, 50));
    }
}
