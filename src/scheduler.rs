//! Frame scheduling
//!
//! [`FrameScheduler`] owns mounted avatars and ticks each once per frame.
//! [`FrameLoop`] drives a scheduler from a tokio interval until shutdown.

use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::error::SchedulerError;
use crate::instance::{AvatarInstance, TeardownReport, TickReport};

/// Identifies one subscribed avatar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct SubscriptionId(u64);

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Default)]
pub struct FrameScheduler {
    next_id: u64,
    instances: BTreeMap<SubscriptionId, AvatarInstance>,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, instance: AvatarInstance) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.instances.insert(id, instance);
        debug!("Subscribed avatar {}", id);
        id
    }

    /// Stop ticking an avatar and hand it back for teardown.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> Result<AvatarInstance, SchedulerError> {
        self.instances
            .remove(&id)
            .ok_or(SchedulerError::UnknownSubscription(id.0))
    }

    /// Unsubscribe and unmount in one step.
    pub fn unmount(&mut self, id: SubscriptionId) -> Result<TeardownReport, SchedulerError> {
        self.unsubscribe(id).map(AvatarInstance::unmount)
    }

    /// Unmount everything, in subscription order.
    pub fn unmount_all(&mut self) -> Vec<TeardownReport> {
        std::mem::take(&mut self.instances)
            .into_values()
            .map(AvatarInstance::unmount)
            .collect()
    }

    pub fn get(&self, id: SubscriptionId) -> Option<&AvatarInstance> {
        self.instances.get(&id)
    }

    /// One update-and-draw pass over every subscribed avatar.
    pub fn tick(&mut self, dt: Duration) -> Vec<(SubscriptionId, TickReport)> {
        self.instances
            .iter_mut()
            .map(|(id, instance)| (*id, instance.tick(dt)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }
}

/// Why a frame loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopExit {
    Shutdown,
    FrameBudget,
}

/// Fixed-rate driver for a [`FrameScheduler`].
#[derive(Debug, Clone)]
pub struct FrameLoop {
    period: Duration,
    max_frames: Option<u64>,
}

impl FrameLoop {
    pub fn new(fps: f32) -> Result<Self, SchedulerError> {
        if !fps.is_finite() || fps <= 0.0 {
            return Err(SchedulerError::InvalidFrameRate(fps));
        }
        Ok(Self {
            period: Duration::from_secs_f64(1.0 / f64::from(fps)),
            max_frames: None,
        })
    }

    /// Stop after this many frames.
    pub fn with_frame_budget(mut self, frames: u64) -> Self {
        self.max_frames = Some(frames);
        self
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Tick until shutdown is signalled or the frame budget runs out.
    ///
    /// Late frames are skipped rather than bunched; each tick receives the
    /// real time since the previous one.
    pub async fn run(
        &self,
        scheduler: &mut FrameScheduler,
        mut shutdown: broadcast::Receiver<()>,
    ) -> (LoopExit, u64) {
        let mut interval = tokio::time::interval(self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut frames = 0u64;
        let mut last = Instant::now();

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let now = Instant::now();
                    scheduler.tick(now - last);
                    last = now;
                    frames += 1;
                    if self.max_frames.is_some_and(|max| frames >= max) {
                        info!("Frame budget of {} reached", frames);
                        return (LoopExit::FrameBudget, frames);
                    }
                }
                _ = shutdown.recv() => {
                    info!("Frame loop stopping after {} frames", frames);
                    return (LoopExit::Shutdown, frames);
                }
            }
        }
    }
}
