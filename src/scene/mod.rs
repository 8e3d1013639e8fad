//! Scene module
//!
//! Quality tiers, the orbit camera, the lighting stage, frame composition,
//! and the surfaces frames are drawn into.

pub mod camera;
pub mod compose;
pub mod lighting;
pub mod quality;
pub mod surface;

pub use camera::{CameraGesture, CameraState, OrbitCamera};
pub use compose::{compose_frame, DrawItem, FrameDescription, FrameInputs, Stage};
pub use lighting::{ContactShadow, GroundPlane, Light, LightingRig};
pub use quality::{QualityChange, QualityController, QualitySettings, QualityTier, SceneLayout};
pub use surface::{
    GraphicsBackend, HeadlessBackend, Placeholder, RenderSurface, UnavailableBackend,
};
