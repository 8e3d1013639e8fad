//! Flattens the avatar, its effects, and the stage into one frame.

use glam::Mat4;
use serde::Serialize;

use super::camera::{CameraState, OrbitCamera};
use super::lighting::{ContactShadow, GroundPlane, LightingRig};
use super::quality::{QualitySettings, QualityTier, SceneLayout};
use crate::avatar::rig::{Material, Rig, Segment, Shape};
use crate::avatar::state::BehaviorState;
use crate::config::RenderConfig;
use sensei3d_fx::{EffectEmitter, LabelInstance, ParticleGpuData};

/// Static stage content, rebuilt only when the tier changes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stage {
    pub lighting: LightingRig,
    pub ground: GroundPlane,
    pub contact_shadow: ContactShadow,
}

impl Stage {
    pub fn new(settings: &QualitySettings, render: &RenderConfig) -> Self {
        Self {
            lighting: LightingRig::for_quality(settings),
            ground: GroundPlane::new(render.ground_height, settings),
            contact_shadow: ContactShadow::new(render.ground_height, settings),
        }
    }
}

/// One visible segment, ready to draw.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrawItem {
    pub segment: Segment,
    pub shape: Shape,
    /// Radial segment count for round shapes, 1 otherwise
    pub tessellation: u32,
    pub world: Mat4,
    pub material: Material,
    pub cast_shadow: bool,
}

/// Everything needed to draw one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameDescription {
    pub frame: u64,
    pub time: f32,
    pub state: BehaviorState,
    pub tier: QualityTier,
    pub layout: SceneLayout,
    pub width: u32,
    pub height: u32,
    pub camera: CameraState,
    pub view: Mat4,
    pub projection: Mat4,
    pub stage: Stage,
    pub items: Vec<DrawItem>,
    pub particles: Vec<ParticleGpuData>,
    pub labels: Vec<LabelInstance>,
    pub speech_bubble: Option<String>,
}

impl FrameDescription {
    pub fn item(&self, segment: Segment) -> Option<&DrawItem> {
        self.items.iter().find(|i| i.segment == segment)
    }
}

/// Borrowed view of everything that feeds a frame.
pub struct FrameInputs<'a> {
    pub frame: u64,
    pub time: f32,
    pub state: BehaviorState,
    pub rig: &'a Rig,
    pub quality: &'a QualitySettings,
    pub layout: SceneLayout,
    pub camera: &'a OrbitCamera,
    pub stage: &'a Stage,
    pub effects: &'a EffectEmitter,
    pub speech_bubble: &'a str,
    pub width: u32,
    pub height: u32,
}

fn tessellation(shape: &Shape, quality: &QualitySettings) -> u32 {
    match shape {
        Shape::Sphere { .. } => quality.sphere_segments,
        Shape::Cylinder { .. } => quality.cylinder_segments,
        _ => 1,
    }
}

pub fn compose_frame(inputs: &FrameInputs<'_>) -> FrameDescription {
    let world = inputs.rig.world_transforms();
    let shadows = inputs.quality.shadows_enabled();

    let items = inputs
        .rig
        .nodes()
        .iter()
        .filter(|n| n.visible && n.shape != Shape::None)
        .map(|n| DrawItem {
            segment: n.segment,
            shape: n.shape,
            tessellation: tessellation(&n.shape, inputs.quality),
            world: inputs.rig.shape_matrix(&world, n.segment),
            material: n.material,
            cast_shadow: shadows && n.cast_shadow,
        })
        .collect();

    let mut particles = Vec::with_capacity(inputs.effects.particle_count());
    inputs.effects.write_particles(&mut particles);

    let bubble_visible = inputs.rig.node(Segment::SpeechBubble).visible;
    let aspect = inputs.width.max(1) as f32 / inputs.height.max(1) as f32;

    FrameDescription {
        frame: inputs.frame,
        time: inputs.time,
        state: inputs.state,
        tier: inputs.quality.tier,
        layout: inputs.layout,
        width: inputs.width,
        height: inputs.height,
        camera: inputs.camera.state(),
        view: inputs.camera.view_matrix(),
        projection: inputs.camera.projection_matrix(aspect),
        stage: inputs.stage.clone(),
        items,
        particles,
        labels: inputs.effects.label_instances(),
        speech_bubble: bubble_visible.then(|| inputs.speech_bubble.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CameraConfig, QualityConfig};
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use sensei3d_fx::BatchParams;

    fn compose(tier: QualityTier, bubble: bool) -> FrameDescription {
        let quality = QualitySettings::for_tier(tier, &QualityConfig::default());
        let mut rig = Rig::teacher(1.5);
        rig.node_mut(Segment::SpeechBubble).visible = bubble;
        let camera = OrbitCamera::new(CameraConfig::default());
        let stage = Stage::new(&quality, &RenderConfig::default());
        let mut rng = StdRng::seed_from_u64(4);
        let effects = EffectEmitter::new(
            BatchParams {
                count: quality.ambient_particles,
                ..Default::default()
            },
            [0.0, 0.6, 0.0],
            &mut rng,
        );
        compose_frame(&FrameInputs {
            frame: 7,
            time: 0.1,
            state: BehaviorState::Idle,
            rig: &rig,
            quality: &quality,
            layout: SceneLayout::Regular,
            camera: &camera,
            stage: &stage,
            effects: &effects,
            speech_bubble: "Ready to learn?",
            width: 800,
            height: 600,
        })
    }

    #[test]
    fn test_desktop_frame() {
        let frame = compose(QualityTier::Desktop, false);
        assert_eq!(frame.frame, 7);
        assert_eq!(frame.particles.len(), 60);
        assert!(frame.items.iter().any(|i| i.cast_shadow));
        assert_eq!(frame.item(Segment::Head).map(|i| i.tessellation), Some(32));
        assert!(frame.item(Segment::Root).is_none());
        assert!(frame.item(Segment::SpeechBubble).is_none());
        assert_eq!(frame.speech_bubble, None);
    }

    #[test]
    fn test_mobile_frame() {
        let frame = compose(QualityTier::Mobile, true);
        assert_eq!(frame.particles.len(), 30);
        assert!(frame.items.iter().all(|i| !i.cast_shadow));
        assert_eq!(frame.item(Segment::Head).map(|i| i.tessellation), Some(16));
        assert_eq!(frame.speech_bubble.as_deref(), Some("Ready to learn?"));
    }

    #[test]
    fn test_frame_serializes() {
        let frame = compose(QualityTier::Desktop, false);
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["tier"], "desktop");
        assert_eq!(json["state"], "idle");
        assert!(json["items"].as_array().map_or(false, |a| !a.is_empty()));
    }
}
