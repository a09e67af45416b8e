//! One-shot timers for the detection loop.
//!
//! The loop only ever needs "run this once after a delay" and "forget that
//! timer". `TimerQueue` keeps deadlines on a virtual clock; the runtime
//! advances it from a monotonic `Instant`, tests advance it by hand.

use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerKind {
    /// Next detection tick.
    Tick,
    /// End of the pause after a confident hit.
    Cooldown,
}

pub trait Scheduler {
    /// Arm a timer firing once after `delay`.
    fn schedule_once(&mut self, delay: Duration, kind: TimerKind) -> TimerHandle;

    /// Disarm a timer. Returns false if it already fired or was cancelled.
    fn cancel(&mut self, handle: TimerHandle) -> bool;
}

#[derive(Clone, Copy, Debug)]
struct Timer {
    handle: TimerHandle,
    due: Duration,
    kind: TimerKind,
}

#[derive(Debug, Default)]
pub struct TimerQueue {
    now: Duration,
    next_id: u64,
    pending: Vec<Timer>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time.
    pub fn now(&self) -> Duration {
        self.now
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn is_armed(&self, kind: TimerKind) -> bool {
        self.pending.iter().any(|t| t.kind == kind)
    }

    /// Earliest deadline, if any timer is armed.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.pending.iter().map(|t| t.due).min()
    }

    /// Remove and return the earliest timer due at or before `limit`.
    ///
    /// The clock moves to that timer's deadline, so anything scheduled while
    /// handling it is measured from when it fired.
    pub fn pop_due(&mut self, limit: Duration) -> Option<(TimerHandle, TimerKind)> {
        let idx = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due <= limit)
            .min_by_key(|(_, t)| (t.due, t.handle))
            .map(|(idx, _)| idx)?;
        let timer = self.pending.remove(idx);
        self.now = self.now.max(timer.due);
        Some((timer.handle, timer.kind))
    }

    /// Move the clock forward without firing anything.
    pub fn set_now(&mut self, now: Duration) {
        self.now = self.now.max(now);
    }
}

impl Scheduler for TimerQueue {
    fn schedule_once(&mut self, delay: Duration, kind: TimerKind) -> TimerHandle {
        self.next_id += 1;
        let handle = TimerHandle(self.next_id);
        self.pending.push(Timer {
            handle,
            due: self.now + delay,
            kind,
        });
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.pending.len();
        self.pending.retain(|t| t.handle != handle);
        self.pending.len() != before
    }
}
