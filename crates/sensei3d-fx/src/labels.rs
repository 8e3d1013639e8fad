//! Short floating text labels shown around the avatar while it is hovered.

use serde::Serialize;
use std::f32::consts::TAU;

use crate::oscillator::Oscillator;

/// One label drifting on its own bob/sway rhythm.
#[derive(Debug, Clone)]
pub struct FloatingLabel {
    text: String,
    anchor: [f32; 3],
    bob: Oscillator,
    sway: Oscillator,
    fade_in: f32,
    age: f32,
}

/// Snapshot of a label for the current frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelInstance {
    pub text: String,
    pub position: [f32; 3],
    pub rotation_z: f32,
    pub alpha: f32,
}

impl FloatingLabel {
    pub fn new(text: impl Into<String>, anchor: [f32; 3], bob: Oscillator, sway: Oscillator) -> Self {
        Self {
            text: text.into(),
            anchor,
            bob,
            sway,
            fade_in: 0.4,
            age: 0.0,
        }
    }

    pub fn with_fade_in(mut self, seconds: f32) -> Self {
        self.fade_in = seconds.max(0.0);
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn update(&mut self, dt: f32) {
        self.age += dt.max(0.0);
    }

    pub fn instance(&self) -> LabelInstance {
        let t = self.age;
        let alpha = if self.fade_in <= 0.0 {
            1.0
        } else {
            (t / self.fade_in).clamp(0.0, 1.0)
        };
        LabelInstance {
            text: self.text.clone(),
            position: [
                self.anchor[0],
                self.anchor[1] + self.bob.sample(t),
                self.anchor[2],
            ],
            rotation_z: self.sway.sample(t),
            alpha,
        }
    }
}

/// Lay out `count` labels on an arc of `radius` above `center`.
///
/// Texts cycle if `count` exceeds the list. Each label gets a distinct
/// frequency and phase so they never bob in unison.
pub fn arc_layout(texts: &[String], count: usize, center: [f32; 3], radius: f32) -> Vec<FloatingLabel> {
    if texts.is_empty() {
        return Vec::new();
    }

    (0..count)
        .map(|i| {
            // Spread across the upper half circle, left to right.
            let frac = if count > 1 {
                i as f32 / (count - 1) as f32
            } else {
                0.5
            };
            let angle = std::f32::consts::PI * (0.85 - 0.7 * frac);
            let anchor = [
                center[0] + radius * angle.cos(),
                center[1] + radius * angle.sin() * 0.6,
                center[2] + 0.2,
            ];
            let phase = i as f32 * TAU / count as f32;
            let bob = Oscillator::new(0.12, 1.6 + 0.35 * i as f32).with_phase(phase);
            let sway = Oscillator::new(0.15, 1.1 + 0.2 * i as f32).with_phase(phase * 0.5);
            FloatingLabel::new(texts[i % texts.len()].clone(), anchor, bob, sway)
        })
        .collect()
}
