//! Sinusoidal motion primitive shared by the avatar and its effects.

use serde::{Deserialize, Serialize};

/// `amplitude * sin(t * frequency + phase)`, with `frequency` in rad/s.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Oscillator {
    pub amplitude: f32,
    pub frequency: f32,
    pub phase: f32,
}

impl Oscillator {
    pub const ZERO: Oscillator = Oscillator::new(0.0, 0.0);

    pub const fn new(amplitude: f32, frequency: f32) -> Self {
        Self {
            amplitude,
            frequency,
            phase: 0.0,
        }
    }

    /// Same oscillator shifted by `phase` radians.
    pub const fn with_phase(mut self, phase: f32) -> Self {
        self.phase = phase;
        self
    }

    /// Signed sample in `[-amplitude, amplitude]`.
    #[inline]
    pub fn sample(&self, t: f32) -> f32 {
        self.amplitude * (t * self.frequency + self.phase).sin()
    }

    /// Sample remapped to `[0, amplitude]`.
    #[inline]
    pub fn unit(&self, t: f32) -> f32 {
        self.amplitude * (0.5 + 0.5 * (t * self.frequency + self.phase).sin())
    }
}

impl Default for Oscillator {
    fn default() -> Self {
        Self::ZERO
    }
}
