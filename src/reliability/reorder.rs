// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! NR RX reception buffer and reordering state machine (§4.5) — the most
//! subtle algorithm in the core. Keyed by COUNT (not SN): cardinality is
//! bounded by the reordering window `2^(SN_LEN-1)`.

use std::collections::BTreeMap;

/// Whether t-Reordering is running, and if so the COUNT that triggered it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReorderingTimerState {
    Idle,
    Running { rx_reord: u32 },
}

/// NR bearer state: `RX_NEXT`, `RX_DELIV`, the reception buffer, and the
/// t-Reordering state (§3 "Bearer state — NR variant").
#[derive(Debug)]
pub struct ReceptionBuffer {
    buffer: BTreeMap<u32, Vec<u8>>,
    rx_next: u32,
    rx_deliv: u32,
    timer: ReorderingTimerState,
}

/// Outcome of inserting one PDU: what to deliver upward, and whether the
/// t-Reordering timer needs to be started, restarted, or stopped.
#[derive(Debug, Default)]
pub struct InsertOutcome {
    pub delivered: Vec<(u32, Vec<u8>)>,
    pub start_reordering: Option<u32>,
    pub stop_reordering: bool,
}

impl ReceptionBuffer {
    pub fn new() -> Self {
        Self { buffer: BTreeMap::new(), rx_next: 0, rx_deliv: 0, timer: ReorderingTimerState::Idle }
    }

    pub fn rx_next(&self) -> u32 {
        self.rx_next
    }

    pub fn rx_deliv(&self) -> u32 {
        self.rx_deliv
    }

    pub fn timer_state(&self) -> ReorderingTimerState {
        self.timer
    }

    /// Installs handover-imported counters (§6.4), with an empty buffer and
    /// the reordering timer idle.
    pub fn set_counters(&mut self, rx_next: u32, rx_deliv: u32) {
        self.rx_next = rx_next;
        self.rx_deliv = rx_deliv;
    }

    pub fn reestablish(&mut self) {
        self.buffer.clear();
        self.rx_next = 0;
        self.rx_deliv = 0;
        self.timer = ReorderingTimerState::Idle;
    }

    /// True iff `count` must be discarded without buffering: already
    /// delivered, or already present (§4.5 step 3).
    pub fn is_duplicate_or_stale(&self, count: u32) -> bool {
        count < self.rx_deliv || self.buffer.contains_key(&count)
    }

    /// Steps 3-8 of §4.5, given a PDU already deciphered and
    /// integrity-verified with resolved COUNT `rcvd_count`. The caller is
    /// responsible for the duplicate/stale check via
    /// [`Self::is_duplicate_or_stale`] before calling this.
    pub fn insert(&mut self, rcvd_count: u32, sdu: Vec<u8>) -> InsertOutcome {
        let mut outcome = InsertOutcome::default();
        self.buffer.insert(rcvd_count, sdu);

        if rcvd_count >= self.rx_next {
            self.rx_next = rcvd_count + 1;
        }

        if rcvd_count == self.rx_deliv {
            self.deliver_in_order(&mut outcome);
        }

        match self.timer {
            ReorderingTimerState::Running { rx_reord } if self.rx_deliv >= rx_reord => {
                self.timer = ReorderingTimerState::Idle;
                outcome.stop_reordering = true;
            }
            ReorderingTimerState::Idle if self.rx_deliv < self.rx_next => {
                self.timer = ReorderingTimerState::Running { rx_reord: self.rx_next };
                outcome.start_reordering = Some(self.rx_next);
            }
            _ => {}
        }

        outcome
    }

    /// t-Reordering expiry (§4.5): delivers everything below `RX_REORD`
    /// plus the consecutive run starting at `RX_REORD`, then restarts the
    /// timer if a gap remains.
    pub fn on_reordering_expiry(&mut self) -> InsertOutcome {
        let mut outcome = InsertOutcome::default();
        let ReorderingTimerState::Running { rx_reord } = self.timer else {
            return outcome;
        };

        while let Some((&count, _)) = self.buffer.first_key_value() {
            if count >= rx_reord {
                break;
            }
            let (count, sdu) = self.buffer.pop_first().unwrap();
            outcome.delivered.push((count, sdu));
        }
        self.rx_deliv = rx_reord;
        self.deliver_in_order(&mut outcome);

        self.timer = ReorderingTimerState::Idle;
        outcome.stop_reordering = true;
        if self.rx_deliv < self.rx_next {
            self.timer = ReorderingTimerState::Running { rx_reord: self.rx_next };
            outcome.start_reordering = Some(self.rx_next);
            outcome.stop_reordering = false;
        }
        outcome
    }

    /// Delivers every buffered SDU whose COUNT is `RX_DELIV, RX_DELIV+1, …`
    /// until a gap is found, and advances `RX_DELIV` past them.
    fn deliver_in_order(&mut self, outcome: &mut InsertOutcome) {
        while let Some(sdu) = self.buffer.remove(&self.rx_deliv) {
            outcome.delivered.push((self.rx_deliv, sdu));
            self.rx_deliv += 1;
        }
    }
}

impl Default for ReceptionBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Scenario 5: inject COUNT=1 then COUNT=0 from initial zero state.
    #[test]
    fn out_of_order_then_fill_gap_delivers_both() {
        let mut rx = ReceptionBuffer::new();
        let o1 = rx.insert(1, vec![1]);
        assert!(o1.delivered.is_empty());
        assert_eq!(o1.start_reordering, Some(2));
        assert_eq!(rx.rx_next(), 2);

        let o2 = rx.insert(0, vec![0]);
        assert_eq!(o2.delivered, vec![(0, vec![0]), (1, vec![1])]);
        assert_eq!(rx.rx_deliv(), 2);
        assert_eq!(rx.timer_state(), ReorderingTimerState::Idle);
        assert!(o2.stop_reordering);
    }

    #[test]
    fn in_order_delivery_never_starts_timer() {
        let mut rx = ReceptionBuffer::new();
        let o1 = rx.insert(0, vec![0]);
        assert_eq!(o1.delivered, vec![(0, vec![0])]);
        assert!(o1.start_reordering.is_none());
        let o2 = rx.insert(1, vec![1]);
        assert_eq!(o2.delivered, vec![(1, vec![1])]);
        assert!(o2.start_reordering.is_none());
    }

    #[test]
    fn reordering_expiry_delivers_whatever_is_buffered() {
        let mut rx = ReceptionBuffer::new();
        rx.insert(2, vec![2]); // gap at 0,1 -> starts t-Reordering with RX_REORD=3
        assert_eq!(rx.timer_state(), ReorderingTimerState::Running { rx_reord: 3 });

        let outcome = rx.on_reordering_expiry();
        assert_eq!(outcome.delivered, vec![(2, vec![2])]);
        assert_eq!(rx.rx_deliv(), 3);
        assert_eq!(rx.timer_state(), ReorderingTimerState::Idle);
    }

    #[test]
    fn duplicate_and_stale_are_rejected() {
        let mut rx = ReceptionBuffer::new();
        rx.insert(0, vec![0]);
        assert!(rx.is_duplicate_or_stale(0)); // already delivered
        rx.insert(5, vec![5]);
        assert!(rx.is_duplicate_or_stale(5)); // already buffered
    }
}
