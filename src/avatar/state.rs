//! Avatar behavior state machine
//!
//! The base state is `Idle` or `Hovered`. Blinking and waving are overlays on
//! top of it: each is driven by timers in the owner's [`TimerQueue`] and
//! resolves back to the base state on its own.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use super::timers::{FiredTimer, TimerHandle, TimerKind, TimerQueue};
use crate::config::BehaviorConfig;

/// The observable behavior of the avatar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BehaviorState {
    /// Pointer elsewhere, body slowly spinning
    Idle,
    /// Pointer over the avatar
    Hovered,
    /// Eyes momentarily closed
    Blinking,
    /// Greeting wave in progress
    Waving,
}

impl Default for BehaviorState {
    fn default() -> Self {
        Self::Idle
    }
}

impl std::fmt::Display for BehaviorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BehaviorState::Idle => write!(f, "idle"),
            BehaviorState::Hovered => write!(f, "hovered"),
            BehaviorState::Blinking => write!(f, "blinking"),
            BehaviorState::Waving => write!(f, "waving"),
        }
    }
}

/// Where the blink cycle currently is. Exactly one blink timer is pending
/// once the machine has started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlinkPhase {
    Stopped,
    /// Eyes open, waiting for the next blink
    Waiting(TimerHandle),
    /// Eyes closed since `fired_at`
    Closed {
        restore: TimerHandle,
        fired_at: Duration,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Wave {
    started: Duration,
    end: TimerHandle,
}

/// Behavior of one avatar instance.
#[derive(Debug, Clone)]
pub struct BehaviorMachine {
    config: BehaviorConfig,
    hovered: bool,
    blink: BlinkPhase,
    wave: Option<Wave>,
    eye_openness: f32,
}

impl BehaviorMachine {
    pub fn new(config: BehaviorConfig) -> Self {
        Self {
            config,
            hovered: false,
            blink: BlinkPhase::Stopped,
            wave: None,
            eye_openness: 1.0,
        }
    }

    /// Schedule the first blink. Calling it again is a no-op.
    pub fn start<R: Rng>(&mut self, now: Duration, timers: &mut TimerQueue<TimerKind>, rng: &mut R) {
        if self.blink == BlinkPhase::Stopped {
            self.schedule_blink(now, timers, rng);
        }
    }

    fn blink_interval<R: Rng>(&self, rng: &mut R) -> Duration {
        let (min, max) = (
            self.config.blink_interval_min_ms,
            self.config.blink_interval_max_ms,
        );
        // An empty range means a fixed interval.
        let ms = if min < max { rng.gen_range(min..max) } else { min };
        Duration::from_millis(ms)
    }

    fn schedule_blink<R: Rng>(
        &mut self,
        from: Duration,
        timers: &mut TimerQueue<TimerKind>,
        rng: &mut R,
    ) {
        let deadline = from + self.blink_interval(rng);
        self.blink = BlinkPhase::Waiting(timers.schedule(deadline, TimerKind::Blink));
    }

    /// Pointer entered the hit region. Returns true if the base state changed.
    ///
    /// Starts the wave overlay unless one is already in flight.
    pub fn pointer_enter(&mut self, now: Duration, timers: &mut TimerQueue<TimerKind>) -> bool {
        if self.hovered {
            return false;
        }
        self.hovered = true;

        if self.wave.is_none() {
            let end = now + Duration::from_millis(self.config.wave_duration_ms);
            self.wave = Some(Wave {
                started: now,
                end: timers.schedule(end, TimerKind::WaveEnd),
            });
            debug!("Wave started at {:?}", now);
        }
        true
    }

    /// Pointer left the hit region. Returns true if the base state changed.
    ///
    /// A wave in flight keeps playing until its own timer ends it.
    pub fn pointer_leave(&mut self) -> bool {
        if !self.hovered {
            return false;
        }
        self.hovered = false;
        true
    }

    /// Apply a fired timer. Returns false for timers this machine does not own.
    pub fn on_timer<R: Rng>(
        &mut self,
        fired: FiredTimer<TimerKind>,
        timers: &mut TimerQueue<TimerKind>,
        rng: &mut R,
    ) -> bool {
        match fired.kind {
            TimerKind::Blink => {
                if self.blink != BlinkPhase::Waiting(fired.handle) {
                    return false;
                }
                self.eye_openness = self.config.blink_openness;
                let restore = fired.deadline + Duration::from_millis(self.config.blink_hold_ms);
                self.blink = BlinkPhase::Closed {
                    restore: timers.schedule(restore, TimerKind::BlinkRestore),
                    fired_at: fired.deadline,
                };
                debug!("Blink at {:?}", fired.deadline);
                true
            }
            TimerKind::BlinkRestore => {
                let BlinkPhase::Closed { restore, fired_at } = self.blink else {
                    return false;
                };
                if restore != fired.handle {
                    return false;
                }
                self.eye_openness = 1.0;
                self.schedule_blink(fired_at, timers, rng);
                true
            }
            TimerKind::WaveEnd => match self.wave {
                Some(wave) if wave.end == fired.handle => {
                    self.wave = None;
                    debug!("Wave ended at {:?}", fired.deadline);
                    true
                }
                _ => false,
            },
            TimerKind::ResizeSettled => false,
        }
    }

    /// Current behavior, overlays first.
    pub fn state(&self) -> BehaviorState {
        if self.is_waving() {
            BehaviorState::Waving
        } else if self.is_blinking() {
            BehaviorState::Blinking
        } else {
            self.base_state()
        }
    }

    /// `Idle` or `Hovered`, ignoring overlays.
    pub fn base_state(&self) -> BehaviorState {
        if self.hovered {
            BehaviorState::Hovered
        } else {
            BehaviorState::Idle
        }
    }

    pub fn is_hovered(&self) -> bool {
        self.hovered
    }

    pub fn is_waving(&self) -> bool {
        self.wave.is_some()
    }

    pub fn is_blinking(&self) -> bool {
        matches!(self.blink, BlinkPhase::Closed { .. })
    }

    /// Eye openness in `[0, 1]`.
    pub fn eye_openness(&self) -> f32 {
        self.eye_openness
    }

    /// Seconds into the active wave.
    pub fn wave_elapsed(&self, now: Duration) -> Option<f32> {
        self.wave
            .map(|w| now.saturating_sub(w.started).as_secs_f32())
    }
}
