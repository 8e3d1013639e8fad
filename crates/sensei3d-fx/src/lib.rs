//! Sparkle particles and floating labels for the sensei3d avatar.
//!
//! The [`EffectEmitter`] owns one ambient batch that lives as long as the
//! avatar, plus an optional hover effect (a denser burst and a few floating
//! labels) that is built on hover entry and dropped on hover exit.

pub mod labels;
pub mod oscillator;
pub mod particles;

pub use labels::{arc_layout, FloatingLabel, LabelInstance};
pub use oscillator::Oscillator;
pub use particles::{BatchParams, ParticleBatch, ParticleGpuData};

use rand::Rng;

/// Convert a `0xRRGGBB` color to opaque RGBA in `[0, 1]`.
pub fn rgb_hex(hex: u32) -> [f32; 4] {
    [
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
        1.0,
    ]
}

/// Parameters for the effect created on hover entry.
#[derive(Debug, Clone)]
pub struct HoverEffectParams {
    pub burst: BatchParams,
    pub label_texts: Vec<String>,
    pub label_count: usize,
    pub label_radius: f32,
}

/// Burst plus labels that exist only while the avatar is hovered.
#[derive(Debug)]
pub struct HoverEffect {
    burst: ParticleBatch,
    labels: Vec<FloatingLabel>,
}

impl HoverEffect {
    pub fn burst(&self) -> &ParticleBatch {
        &self.burst
    }

    pub fn labels(&self) -> &[FloatingLabel] {
        &self.labels
    }
}

/// Owns all particle and label state of one avatar.
#[derive(Debug)]
pub struct EffectEmitter {
    ambient: ParticleBatch,
    hover: Option<HoverEffect>,
    center: [f32; 3],
}

impl EffectEmitter {
    pub fn new<R: Rng>(ambient: BatchParams, center: [f32; 3], rng: &mut R) -> Self {
        Self {
            ambient: ParticleBatch::new(ambient, center, rng),
            hover: None,
            center,
        }
    }

    /// Rebuild the ambient batch, e.g. after a quality tier change.
    pub fn set_ambient<R: Rng>(&mut self, params: BatchParams, rng: &mut R) {
        self.ambient = ParticleBatch::new(params, self.center, rng);
    }

    pub fn ambient(&self) -> &ParticleBatch {
        &self.ambient
    }

    pub fn hover(&self) -> Option<&HoverEffect> {
        self.hover.as_ref()
    }

    pub fn is_hover_active(&self) -> bool {
        self.hover.is_some()
    }

    /// Create the hover burst and labels. No-op if one already exists.
    pub fn on_hover_enter<R: Rng>(&mut self, params: &HoverEffectParams, rng: &mut R) {
        if self.hover.is_some() {
            return;
        }
        let label_center = [self.center[0], self.center[1] + 1.2, self.center[2]];
        self.hover = Some(HoverEffect {
            burst: ParticleBatch::new(params.burst, self.center, rng),
            labels: arc_layout(
                &params.label_texts,
                params.label_count,
                label_center,
                params.label_radius,
            ),
        });
    }

    /// Destroy the hover effect and free its particles.
    pub fn on_hover_exit(&mut self) {
        self.hover = None;
    }

    pub fn update(&mut self, dt: f32) {
        self.ambient.update(dt);
        if let Some(hover) = &mut self.hover {
            hover.burst.update(dt);
            for label in &mut hover.labels {
                label.update(dt);
            }
        }
    }

    /// Total live particles across all batches.
    pub fn particle_count(&self) -> usize {
        self.ambient.len() + self.hover.as_ref().map_or(0, |h| h.burst.len())
    }

    pub fn write_particles(&self, out: &mut Vec<ParticleGpuData>) {
        self.ambient.write_gpu_data(out);
        if let Some(hover) = &self.hover {
            hover.burst.write_gpu_data(out);
        }
    }

    pub fn label_instances(&self) -> Vec<LabelInstance> {
        self.hover
            .as_ref()
            .map(|h| h.labels.iter().map(FloatingLabel::instance).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn hover_params() -> HoverEffectParams {
        HoverEffectParams {
            burst: BatchParams {
                count: 40,
                scale: 2.5,
                fade_in: 0.2,
                ..Default::default()
            },
            label_texts: vec!["π".into(), "∑".into(), "A+".into()],
            label_count: 3,
            label_radius: 1.1,
        }
    }

    #[test]
    fn test_rgb_hex() {
        let c = rgb_hex(0xff8000);
        assert_eq!(c[0], 1.0);
        assert!((c[1] - 128.0 / 255.0).abs() < 1e-6);
        assert_eq!(c[2], 0.0);
        assert_eq!(c[3], 1.0);
    }

    #[test]
    fn test_hover_lifecycle() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut emitter = EffectEmitter::new(
            BatchParams {
                count: 60,
                ..Default::default()
            },
            [0.0; 3],
            &mut rng,
        );
        assert_eq!(emitter.particle_count(), 60);
        assert!(emitter.label_instances().is_empty());

        emitter.on_hover_enter(&hover_params(), &mut rng);
        assert_eq!(emitter.particle_count(), 100);
        assert_eq!(emitter.label_instances().len(), 3);

        // A second enter keeps the existing effect.
        emitter.update(0.5);
        emitter.on_hover_enter(&hover_params(), &mut rng);
        assert!(emitter.hover().map_or(false, |h| h.burst().age() > 0.0));

        emitter.on_hover_exit();
        assert!(!emitter.is_hover_active());
        assert_eq!(emitter.particle_count(), 60);

        let mut out = Vec::new();
        emitter.write_particles(&mut out);
        assert_eq!(out.len(), 60);
    }

    #[test]
    fn test_set_ambient_changes_count() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut emitter = EffectEmitter::new(BatchParams::default(), [0.0; 3], &mut rng);
        emitter.set_ambient(
            BatchParams {
                count: 30,
                ..Default::default()
            },
            &mut rng,
        );
        assert_eq!(emitter.ambient().len(), 30);
    }
}
