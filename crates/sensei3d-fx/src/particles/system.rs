use bytemuck::{Pod, Zeroable};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

use crate::oscillator::Oscillator;

/// Hard ceiling per batch, independent of what the caller asks for.
pub const MAX_PARTICLES: usize = 2048;

pub const SHAPE_STAR: u32 = 1;
pub const SHAPE_CIRCLE: u32 = 3;

/// Tunables for one sparkle batch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BatchParams {
    /// Number of particles
    pub count: usize,
    /// Edge length of the cube the particles are scattered in
    pub scale: f32,
    /// Per-particle billboard size
    pub size: f32,
    /// Drift speed multiplier
    pub speed: f32,
    /// Linear RGBA color
    pub color: [f32; 4],
    /// Peak alpha
    pub opacity: f32,
    /// Seconds to fade from invisible to `opacity` after creation
    pub fade_in: f32,
}

impl Default for BatchParams {
    fn default() -> Self {
        Self {
            count: 60,
            scale: 4.0,
            size: 3.0,
            speed: 0.3,
            color: crate::rgb_hex(0xa78bfa),
            opacity: 0.4,
            fade_in: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
struct Sparkle {
    anchor: [f32; 3],
    drift: [Oscillator; 3],
    twinkle: Oscillator,
    size: f32,
    shape: u32,
}

/// GPU instance data for one particle (48 bytes).
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct ParticleGpuData {
    pub position: [f32; 3],
    pub size: f32,
    pub color: [f32; 4],
    pub rotation: f32,
    pub shape: u32,
    pub alpha: f32,
    pub _pad: f32,
}

/// A looping set of sparkles around a center point.
///
/// Every particle gets its own random phase, so the batch never pulses in
/// lockstep. Particles never die; the batch lives until its owner drops it.
#[derive(Debug, Clone)]
pub struct ParticleBatch {
    params: BatchParams,
    center: [f32; 3],
    sparkles: Vec<Sparkle>,
    age: f32,
}

impl ParticleBatch {
    pub fn new<R: Rng>(params: BatchParams, center: [f32; 3], rng: &mut R) -> Self {
        let count = params.count.min(MAX_PARTICLES);
        // Negative or non-finite scales collapse to a point instead of an empty range.
        let extent = if params.scale.is_finite() { params.scale.abs() } else { 0.0 };
        let half = extent * 0.5;
        let mut sparkles = Vec::with_capacity(count);

        for _ in 0..count {
            let anchor = [
                rng.gen_range(-half..=half),
                rng.gen_range(-half..=half),
                rng.gen_range(-half..=half),
            ];
            // Drift stays well inside the cube so the batch keeps its footprint.
            let reach = extent * 0.05;
            let mut drift = [Oscillator::ZERO; 3];
            for axis in &mut drift {
                *axis = Oscillator::new(
                    rng.gen_range(0.3..1.0) * reach,
                    params.speed * rng.gen_range(0.5..1.5),
                )
                .with_phase(rng.gen_range(0.0..TAU));
            }
            let twinkle = Oscillator::new(1.0, params.speed * rng.gen_range(4.0..10.0))
                .with_phase(rng.gen_range(0.0..TAU));
            let shape = if rng.gen_bool(0.7) {
                SHAPE_STAR
            } else {
                SHAPE_CIRCLE
            };

            sparkles.push(Sparkle {
                anchor,
                drift,
                twinkle,
                size: params.size * rng.gen_range(0.6..1.0),
                shape,
            });
        }

        Self {
            params,
            center,
            sparkles,
            age: 0.0,
        }
    }

    pub fn params(&self) -> &BatchParams {
        &self.params
    }

    pub fn len(&self) -> usize {
        self.sparkles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sparkles.is_empty()
    }

    /// Seconds since the batch was created.
    pub fn age(&self) -> f32 {
        self.age
    }

    pub fn update(&mut self, dt: f32) {
        self.age += dt.max(0.0);
    }

    fn fade(&self) -> f32 {
        if self.params.fade_in <= 0.0 {
            1.0
        } else {
            (self.age / self.params.fade_in).clamp(0.0, 1.0)
        }
    }

    /// Append instance data for every particle to `out`.
    pub fn write_gpu_data(&self, out: &mut Vec<ParticleGpuData>) {
        let t = self.age;
        let fade = self.fade();
        out.reserve(self.sparkles.len());

        for s in &self.sparkles {
            let position = [
                self.center[0] + s.anchor[0] + s.drift[0].sample(t),
                self.center[1] + s.anchor[1] + s.drift[1].sample(t),
                self.center[2] + s.anchor[2] + s.drift[2].sample(t),
            ];
            out.push(ParticleGpuData {
                position,
                size: s.size,
                color: self.params.color,
                rotation: s.twinkle.phase + t * self.params.speed,
                shape: s.shape,
                alpha: s.twinkle.unit(t) * self.params.opacity * fade,
                _pad: 0.0,
            });
        }
    }
}
