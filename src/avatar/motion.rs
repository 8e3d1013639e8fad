//! Procedural motion: elapsed time in, rig transforms out.
//!
//! Everything here is a function of `(t, dt, behavior)` plus the one piece of
//! carried state the motion genuinely needs, the accumulated body rotation.

use std::f32::consts::TAU;

use glam::Quat;
use sensei3d_fx::Oscillator;
use serde::Serialize;

use super::rig::{Rig, Segment};
use crate::config::{BehaviorConfig, MotionConfig};

/// Emissive intensity the book eases toward while hovered.
pub const BOOK_GLOW: f32 = 0.3;

/// Vertical bob offset, always within `[-A, A]`.
#[inline]
pub fn bob(cfg: &MotionConfig, t: f32) -> f32 {
    Oscillator::new(cfg.bob_amplitude, cfg.bob_frequency).sample(t)
}

/// Lateral body sway (Z rotation).
#[inline]
pub fn body_sway(cfg: &MotionConfig, t: f32) -> f32 {
    Oscillator::new(cfg.sway_amplitude, cfg.sway_frequency).sample(t)
}

/// Head tilt (Z) and nod (X). Each has its own frequency and phase so the
/// head never moves in lockstep with the body.
pub fn head_motion(cfg: &MotionConfig, t: f32) -> (f32, f32) {
    let tilt = Oscillator::new(cfg.head_tilt_amplitude, cfg.head_tilt_frequency)
        .with_phase(cfg.head_tilt_phase)
        .sample(t);
    let nod = Oscillator::new(cfg.head_nod_amplitude, cfg.head_nod_frequency)
        .with_phase(cfg.head_nod_phase)
        .sample(t);
    (tilt, nod)
}

/// Per-frame ease factor for a given `dt`. Equals `k` at the reference rate.
pub fn ease_factor(k: f32, dt: f32, reference_fps: f32) -> f32 {
    if dt <= 0.0 {
        return 0.0;
    }
    let frames = dt * reference_fps;
    1.0 - (1.0 - k.clamp(0.0, 1.0)).powf(frames)
}

/// The representative of `target` (mod 2π) closest to `current`.
fn nearest_equivalent(current: f32, target: f32) -> f32 {
    target + TAU * ((current - target) / TAU).round()
}

/// Advance the body rotation by one frame.
///
/// Idle: constant spin. Hovered: exponential ease toward the target angle,
/// taking the short way around. Neither branch can jump, so switching
/// between them is continuous.
pub fn advance_rotation(cfg: &MotionConfig, rotation: f32, dt: f32, hovered: bool) -> f32 {
    if hovered {
        let target = nearest_equivalent(rotation, cfg.hover_target_angle);
        let k = ease_factor(cfg.hover_ease, dt, cfg.reference_fps);
        rotation + (target - rotation) * k
    } else {
        rotation + dt * cfg.idle_spin_speed
    }
}

/// Arm angle of the wave overlay at `elapsed` seconds into the wave.
///
/// A decaying sinusoid windowed to reach exactly zero at the end, so the arm
/// returns to rest without a snap.
pub fn wave_angle(cfg: &BehaviorConfig, elapsed: f32) -> f32 {
    let duration = cfg.wave_duration_ms as f32 / 1000.0;
    if elapsed <= 0.0 || elapsed >= duration {
        return 0.0;
    }
    let envelope = (-cfg.wave_decay * elapsed).exp() * (1.0 - elapsed / duration);
    cfg.wave_amplitude * envelope * (cfg.wave_frequency * elapsed).sin()
}

/// Everything the motion step needs to know about the behavior.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionInput {
    pub hovered: bool,
    /// Seconds into the active wave, if any
    pub wave_elapsed: Option<f32>,
    pub eye_openness: f32,
}

/// Derived transforms for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Pose {
    pub time: f32,
    pub bob_y: f32,
    pub rotation_y: f32,
    pub sway_z: f32,
    pub head_tilt_z: f32,
    pub head_nod_x: f32,
    pub wave_z: f32,
    pub eye_openness: f32,
    pub book_glow: f32,
    pub speech_bubble: bool,
}

/// Carries the phase accumulator and rotation between frames.
#[derive(Debug, Clone)]
pub struct MotionGenerator {
    motion: MotionConfig,
    behavior: BehaviorConfig,
    /// Seconds since mount, narrowed to `f32` only when sampled.
    elapsed: f64,
    rotation_y: f32,
    book_glow: f32,
}

impl MotionGenerator {
    pub fn new(motion: MotionConfig, behavior: BehaviorConfig) -> Self {
        Self {
            motion,
            behavior,
            elapsed: 0.0,
            rotation_y: 0.0,
            book_glow: 0.0,
        }
    }

    /// Seconds since mount.
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn rotation_y(&self) -> f32 {
        self.rotation_y
    }

    /// Advance by `dt` seconds and produce the pose for the new time.
    pub fn step(&mut self, dt: f32, input: MotionInput) -> Pose {
        let dt = dt.max(0.0);
        self.elapsed += f64::from(dt);
        self.rotation_y = advance_rotation(&self.motion, self.rotation_y, dt, input.hovered);

        let glow_target = if input.hovered { BOOK_GLOW } else { 0.0 };
        let k = ease_factor(self.motion.hover_ease, dt, self.motion.reference_fps);
        self.book_glow += (glow_target - self.book_glow) * k;

        self.pose(input)
    }

    /// Pose at the current time without advancing.
    pub fn pose(&self, input: MotionInput) -> Pose {
        let t = self.elapsed as f32;
        let (head_tilt_z, head_nod_x) = head_motion(&self.motion, t);
        Pose {
            time: t,
            bob_y: bob(&self.motion, t),
            rotation_y: self.rotation_y,
            sway_z: body_sway(&self.motion, t),
            head_tilt_z,
            head_nod_x,
            wave_z: input
                .wave_elapsed
                .map_or(0.0, |e| wave_angle(&self.behavior, e)),
            eye_openness: input.eye_openness,
            book_glow: self.book_glow,
            speech_bubble: input.hovered,
        }
    }
}

/// Write a pose onto the rig, starting from the rest pose.
pub fn apply_pose(rig: &mut Rig, pose: &Pose) {
    rig.reset_pose();

    let root = rig.node_mut(Segment::Root);
    root.local.translation.y = root.rest.translation.y + pose.bob_y;
    root.local.rotation = Quat::from_rotation_y(pose.rotation_y) * root.rest.rotation;

    let torso = rig.node_mut(Segment::Torso);
    torso.local.rotation = Quat::from_rotation_z(pose.sway_z) * torso.rest.rotation;

    let head = rig.node_mut(Segment::Head);
    head.local.rotation =
        Quat::from_rotation_z(pose.head_tilt_z) * Quat::from_rotation_x(pose.head_nod_x);

    let arm = rig.node_mut(Segment::LeftUpperArm);
    arm.local.rotation = arm.rest.rotation * Quat::from_rotation_z(-pose.wave_z);

    rig.set_eye_openness(pose.eye_openness);
    rig.node_mut(Segment::Book).material.emissive_intensity = pose.book_glow;
    rig.node_mut(Segment::SpeechBubble).visible = pose.speech_bubble;
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn idle() -> MotionInput {
        MotionInput {
            hovered: false,
            wave_elapsed: None,
            eye_openness: 1.0,
        }
    }

    fn hovered() -> MotionInput {
        MotionInput {
            hovered: true,
            ..idle()
        }
    }

    #[test]
    fn test_bob_bounded() {
        let cfg = MotionConfig::default();
        for i in 0..10_000 {
            let t = i as f32 * 0.013;
            let y = bob(&cfg, t);
            assert!(y.abs() <= cfg.bob_amplitude + 1e-6, "y({t}) = {y}");
        }
    }

    #[test]
    fn test_bob_continuous_across_hover() {
        let mut gen = MotionGenerator::new(MotionConfig::default(), BehaviorConfig::default());
        let mut prev = gen.step(DT, idle()).bob_y;
        for frame in 0..600 {
            let input = if (120..300).contains(&frame) {
                hovered()
            } else {
                idle()
            };
            let y = gen.step(DT, input).bob_y;
            // Max slope is A·f, so one frame moves less than A·f·dt.
            assert!((y - prev).abs() <= 0.08 * 0.5 * DT + 1e-5);
            prev = y;
        }
    }

    #[test]
    fn test_clock_keeps_frame_resolution_after_hours() {
        let mut gen = MotionGenerator::new(MotionConfig::default(), BehaviorConfig::default());
        gen.elapsed = 10.0 * 3600.0;
        let start = gen.elapsed();
        for _ in 0..60 {
            gen.step(DT, idle());
        }
        let advanced = gen.elapsed() - start;
        assert!((advanced - f64::from(DT) * 60.0).abs() < 1e-9, "{advanced}");
    }

    #[test]
    fn test_idle_spin_is_linear() {
        let cfg = MotionConfig::default();
        let mut rot = 0.0;
        for _ in 0..60 {
            rot = advance_rotation(&cfg, rot, DT, false);
        }
        assert!((rot - cfg.idle_spin_speed).abs() < 1e-4);
    }

    #[test]
    fn test_hover_ease_converges_without_overshoot() {
        let cfg = MotionConfig::default();
        let mut rot = 1.0;
        let mut prev_gap = f32::INFINITY;
        for _ in 0..600 {
            rot = advance_rotation(&cfg, rot, DT, true);
            let gap = rot - cfg.hover_target_angle;
            assert!(gap >= 0.0, "overshot target");
            assert!(gap < prev_gap);
            prev_gap = gap;
        }
        assert!(prev_gap < 1e-3);
    }

    #[test]
    fn test_hover_takes_short_way_around() {
        let cfg = MotionConfig::default();
        // Several turns in; the target is the nearest multiple of 2π.
        let start = 3.0 * TAU + 0.2;
        let next = advance_rotation(&cfg, start, DT, true);
        assert!(next < start);
        assert!(start - next < 0.2 * 0.06);
    }

    #[test]
    fn test_ease_factor_matches_reference_rate() {
        assert!((ease_factor(0.05, 1.0 / 60.0, 60.0) - 0.05).abs() < 1e-6);
        assert_eq!(ease_factor(0.05, 0.0, 60.0), 0.0);
        // Two half-frames equal one full frame.
        let half = ease_factor(0.05, 1.0 / 120.0, 60.0);
        assert!((1.0 - (1.0 - half) * (1.0 - half) - 0.05).abs() < 1e-6);
    }

    #[test]
    fn test_rotation_continuous_at_transitions() {
        let mut gen = MotionGenerator::new(MotionConfig::default(), BehaviorConfig::default());
        let mut prev = gen.rotation_y();
        for frame in 0..400 {
            let input = if (100..250).contains(&frame) {
                hovered()
            } else {
                idle()
            };
            let rot = gen.step(DT, input).rotation_y;
            assert!((rot - prev).abs() < 0.05, "jump at frame {frame}");
            prev = rot;
        }
    }

    #[test]
    fn test_wave_angle_window() {
        let cfg = BehaviorConfig::default();
        assert_eq!(wave_angle(&cfg, 0.0), 0.0);
        assert_eq!(wave_angle(&cfg, 1.0), 0.0);
        assert_eq!(wave_angle(&cfg, 1.5), 0.0);
        let peak = (1..100)
            .map(|i| wave_angle(&cfg, i as f32 / 100.0).abs())
            .fold(0.0f32, f32::max);
        assert!(peak > 0.1 && peak <= cfg.wave_amplitude);
        // Tapers toward the end.
        assert!(wave_angle(&cfg, 0.99).abs() < 0.01);
    }

    #[test]
    fn test_head_motion_decoupled_from_bob() {
        let cfg = MotionConfig::default();
        // Bob and head tilt do not peak together.
        let (tilt0, _) = head_motion(&cfg, 0.0);
        assert_eq!(bob(&cfg, 0.0), 0.0);
        assert!(tilt0.abs() > 0.01);
    }

    #[test]
    fn test_apply_pose() {
        let mut rig = Rig::teacher(1.0);
        let mut gen = MotionGenerator::new(MotionConfig::default(), BehaviorConfig::default());
        let pose = gen.step(
            0.5,
            MotionInput {
                hovered: true,
                wave_elapsed: Some(0.2),
                eye_openness: 0.1,
            },
        );
        apply_pose(&mut rig, &pose);

        assert!(rig.node(Segment::SpeechBubble).visible);
        assert_eq!(rig.eye_openness(), 0.1);
        assert!(rig.node(Segment::Book).material.emissive_intensity > 0.0);
        assert!((rig.node(Segment::Root).local.translation.y - pose.bob_y).abs() < 1e-6);
        assert_ne!(
            rig.node(Segment::LeftUpperArm).local.rotation,
            rig.node(Segment::LeftUpperArm).rest.rotation
        );

        let rest = gen.pose(idle());
        apply_pose(&mut rig, &rest);
        assert!(!rig.node(Segment::SpeechBubble).visible);
        assert_eq!(rig.eye_openness(), 1.0);
    }
}
