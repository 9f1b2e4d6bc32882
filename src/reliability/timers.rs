// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Timer integration (§9 "Timer integration", §4.7 "Discard timer set").
//!
//! The entity never talks to a concrete TTI-driven scheduler; it takes a
//! [`TimerFactory`] capability at construction whose only contract is
//! `arm`/`cancel`. Timer callbacks must be delivered on the same task as
//! the owning bearer (§5) — this crate does not enforce that itself, it is
//! a requirement on whatever `TimerFactory` implementation the host wires
//! in.

use std::collections::HashMap;
use std::time::Duration;

/// Opaque handle returned by [`TimerFactory::arm`]. Cancellation by handle
/// must be idempotent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(pub u64);

/// Capability the host provides so the entity never depends on a concrete
/// scheduler. `arm` schedules `callback` to run once after `duration`;
/// `cancel` is a no-op if the handle already fired or was already
/// cancelled.
pub trait TimerFactory {
    fn arm(&mut self, duration: Duration, callback: TimerCallback) -> TimerHandle;
    fn cancel(&mut self, handle: TimerHandle);
}

/// What a fired timer identifies: which SN's discard timer expired, or
/// that the bearer's single t-Reordering timer expired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCallback {
    Discard { sn: u32 },
    Reordering,
}

/// An in-memory [`TimerFactory`] that does not actually schedule anything;
/// the host drives time forward explicitly by calling [`ManualClock::advance`]
/// and collecting the callbacks that fired. This is the fake this crate's
/// own tests use in place of a real TTI scheduler (§A.4 — no mocking
/// framework, fakes are plain structs implementing the trait).
#[derive(Debug, Default)]
pub struct ManualClock {
    next_handle: u64,
    pending: HashMap<TimerHandle, (Duration, TimerCallback)>,
    elapsed: Duration,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances the clock by `step` and returns every callback whose
    /// deadline has now passed, in the order their timers were armed.
    pub fn advance(&mut self, step: Duration) -> Vec<TimerCallback> {
        self.elapsed += step;
        let mut fired = Vec::new();
        let elapsed = self.elapsed;
        self.pending.retain(|_, (deadline, callback)| {
            if *deadline <= elapsed {
                fired.push(*callback);
                false
            } else {
                true
            }
        });
        fired
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

impl TimerFactory for ManualClock {
    fn arm(&mut self, duration: Duration, callback: TimerCallback) -> TimerHandle {
        let handle = TimerHandle(self.next_handle);
        self.next_handle += 1;
        self.pending.insert(handle, (self.elapsed + duration, callback));
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        self.pending.remove(&handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_once_deadline_passed() {
        let mut clock = ManualClock::new();
        clock.arm(Duration::from_millis(50), TimerCallback::Discard { sn: 3 });
        assert!(clock.advance(Duration::from_millis(49)).is_empty());
        assert_eq!(clock.pending_count(), 1);
        let fired = clock.advance(Duration::from_millis(1));
        assert_eq!(fired, vec![TimerCallback::Discard { sn: 3 }]);
        assert_eq!(clock.pending_count(), 0);
    }

    #[test]
    fn cancel_is_idempotent() {
        let mut clock = ManualClock::new();
        let handle = clock.arm(Duration::from_millis(10), TimerCallback::Reordering);
        clock.cancel(handle);
        clock.cancel(handle);
        assert!(clock.advance(Duration::from_millis(20)).is_empty());
    }
}
