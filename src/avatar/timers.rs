//! Deferred callbacks owned by one avatar instance.
//!
//! Timers are plain records in an arena keyed by [`TimerHandle`]. Nothing
//! fires on its own: the owner drains due timers at the start of each frame
//! tick, so a timer's effect is never visible half-applied.

use std::time::Duration;

/// What a pending timer will do when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    /// Close the eyes
    Blink,
    /// Reopen the eyes after the hold
    BlinkRestore,
    /// Clear the wave overlay
    WaveEnd,
    /// A resize burst has gone quiet
    ResizeSettled,
}

/// Opaque handle to a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

/// A timer popped from the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FiredTimer<K> {
    pub handle: TimerHandle,
    /// Logical fire time (the deadline, not the tick that observed it)
    pub deadline: Duration,
    pub kind: K,
}

#[derive(Debug)]
struct PendingTimer<K> {
    handle: TimerHandle,
    deadline: Duration,
    kind: K,
}

/// Pending timers ordered by deadline, ties broken by scheduling order.
#[derive(Debug)]
pub struct TimerQueue<K> {
    next_id: u64,
    pending: Vec<PendingTimer<K>>,
}

impl<K> Default for TimerQueue<K> {
    fn default() -> Self {
        Self {
            next_id: 0,
            pending: Vec::new(),
        }
    }
}

impl<K: Copy> TimerQueue<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, deadline: Duration, kind: K) -> TimerHandle {
        let handle = TimerHandle(self.next_id);
        self.next_id += 1;
        self.pending.push(PendingTimer {
            handle,
            deadline,
            kind,
        });
        handle
    }

    /// Cancel a timer. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.pending.len();
        self.pending.retain(|t| t.handle != handle);
        self.pending.len() != before
    }

    /// Cancel everything. Returns how many timers were still pending.
    pub fn cancel_all(&mut self) -> usize {
        let n = self.pending.len();
        self.pending.clear();
        n
    }

    pub fn is_pending(&self, handle: TimerHandle) -> bool {
        self.pending.iter().any(|t| t.handle == handle)
    }

    /// Remove and return the earliest timer due at or before `now`.
    pub fn pop_due(&mut self, now: Duration) -> Option<FiredTimer<K>> {
        let idx = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, t)| t.deadline <= now)
            .min_by_key(|(_, t)| (t.deadline, t.handle))
            .map(|(i, _)| i)?;

        let t = self.pending.swap_remove(idx);
        Some(FiredTimer {
            handle: t.handle,
            deadline: t.deadline,
            kind: t.kind,
        })
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.pending.iter().map(|t| t.deadline).min()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
