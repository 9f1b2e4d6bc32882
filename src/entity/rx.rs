// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! RX state machine (§4.3, §4.5). Unlike TX, LTE and NR genuinely differ
//! here: LTE delivers in receipt order with simple duplicate suppression,
//! NR reorders via [`crate::reliability::reorder::ReceptionBuffer`] and a
//! single t-Reordering timer. The tagged variant in [`RxState`] is the one
//! place in the entity that still branches on RAT (§9).

use std::time::Duration;

use crate::config::{BearerConfig, BearerType, Rat, SecurityConfig, SnLength};
use crate::count;
use crate::error::RxDropReason;
use crate::reliability::header::{header_len, parse_header, CONTROL_PDU};
use crate::reliability::metrics::RxMetrics;
use crate::reliability::reorder::ReceptionBuffer;
use crate::reliability::status_report::{parse_status_report, ParsedStatusReport};
use crate::reliability::timers::{TimerCallback, TimerFactory, TimerHandle};
use crate::security::SecurityEngine;

/// What processing one inbound PDU (or a fired reordering timer) yields.
#[derive(Debug)]
pub enum RxOutcome {
    /// Zero or more SDUs now ready for the upper layer, in delivery order.
    Delivered(Vec<Vec<u8>>),
    Dropped(RxDropReason),
    /// A status-report control PDU, to be consumed by the TX side.
    ControlPdu(ParsedStatusReport),
}

/// LTE RX bearer state (§4.3): `rx_hfn`, `next_pdcp_rx_sn` (the anchor SN
/// used to resolve an incoming SN's HFN), and `last_submitted_pdcp_rx_sn`.
#[derive(Debug)]
pub struct LteRxState {
    rx_hfn: u32,
    next_pdcp_rx_sn: u32,
    last_submitted_sn: Option<u32>,
    last_submitted_count: Option<u32>,
    exhausted: bool,
}

impl LteRxState {
    pub fn new() -> Self {
        Self { rx_hfn: 0, next_pdcp_rx_sn: 0, last_submitted_sn: None, last_submitted_count: None, exhausted: false }
    }

    pub fn reestablish(&mut self) {
        *self = Self::new();
    }

    fn receive(
        &mut self,
        payload: Vec<u8>,
        sn: u32,
        resolved_count: u32,
        sn_length: SnLength,
        metrics: &mut RxMetrics,
    ) -> RxOutcome {
        self.last_submitted_sn = Some(sn);
        self.last_submitted_count = Some(resolved_count);
        let (hfn, _) = count::unpack(resolved_count, sn_length);
        self.rx_hfn = hfn;
        self.next_pdcp_rx_sn = (sn + 1) % sn_length.modulus();

        if count::is_count_exhausted(resolved_count) {
            self.exhausted = true;
        }
        metrics.record_delivered(1);
        RxOutcome::Delivered(vec![payload])
    }

    pub fn rx_hfn(&self) -> u32 {
        self.rx_hfn
    }

    pub fn next_pdcp_rx_sn(&self) -> u32 {
        self.next_pdcp_rx_sn
    }

    pub fn last_submitted_sn(&self) -> Option<u32> {
        self.last_submitted_sn
    }

    /// Installs handover-imported state (§6.4).
    pub fn import(&mut self, rx_hfn: u32, next_pdcp_rx_sn: u32, last_submitted_sn: Option<u32>, sn_length: SnLength) {
        self.rx_hfn = rx_hfn;
        self.next_pdcp_rx_sn = next_pdcp_rx_sn;
        self.last_submitted_sn = last_submitted_sn;
        self.last_submitted_count = last_submitted_sn.map(|sn| count::pack(rx_hfn, sn, sn_length));
    }
}

impl Default for LteRxState {
    fn default() -> Self {
        Self::new()
    }
}

/// NR RX bearer state (§4.5): the reception buffer plus the single
/// outstanding t-Reordering timer handle, if one is armed.
#[derive(Debug)]
pub struct NrRxState {
    buffer: ReceptionBuffer,
    reordering_timer: Option<TimerHandle>,
    exhausted: bool,
}

impl NrRxState {
    pub fn new() -> Self {
        Self { buffer: ReceptionBuffer::new(), reordering_timer: None, exhausted: false }
    }

    pub fn reestablish(&mut self, timer_factory: &mut dyn TimerFactory) {
        if let Some(handle) = self.reordering_timer.take() {
            timer_factory.cancel(handle);
        }
        self.buffer.reestablish();
        self.exhausted = false;
    }

    fn apply_timer_transition(
        &mut self,
        start: Option<u32>,
        stop: bool,
        t_reordering: Duration,
        timer_factory: &mut dyn TimerFactory,
    ) {
        if stop {
            if let Some(handle) = self.reordering_timer.take() {
                timer_factory.cancel(handle);
            }
        }
        if start.is_some() {
            if let Some(handle) = self.reordering_timer.take() {
                timer_factory.cancel(handle);
            }
            self.reordering_timer = Some(timer_factory.arm(t_reordering, TimerCallback::Reordering));
        }
    }

    pub fn on_reordering_expiry(&mut self, t_reordering: Duration, timer_factory: &mut dyn TimerFactory, metrics: &mut RxMetrics) -> RxOutcome {
        self.reordering_timer = None;
        let outcome = self.buffer.on_reordering_expiry();
        self.apply_timer_transition(outcome.start_reordering, outcome.stop_reordering, t_reordering, timer_factory);
        metrics.record_delivered(outcome.delivered.len() as u64);
        RxOutcome::Delivered(outcome.delivered.into_iter().map(|(_, sdu)| sdu).collect())
    }
}

impl Default for NrRxState {
    fn default() -> Self {
        Self::new()
    }
}

impl NrRxState {
    pub fn rx_next(&self) -> u32 {
        self.buffer.rx_next()
    }

    pub fn rx_deliv(&self) -> u32 {
        self.buffer.rx_deliv()
    }

    /// Installs handover-imported state (§6.4): both `RX_NEXT` and
    /// `RX_DELIV` start at the imported COUNT, matching a fresh reception
    /// buffer with nothing yet buffered out of order.
    pub fn import(&mut self, rx_next: u32) {
        self.buffer = ReceptionBuffer::new();
        self.buffer.set_counters(rx_next, rx_next);
        self.exhausted = false;
    }
}

/// The RX half of a PDCP entity: LTE and NR get their own variant (§9).
#[derive(Debug)]
pub enum RxState {
    Lte(LteRxState),
    Nr(NrRxState),
}

impl RxState {
    pub fn new(rat: Rat) -> Self {
        match rat {
            Rat::Lte => Self::Lte(LteRxState::new()),
            Rat::Nr => Self::Nr(NrRxState::new()),
        }
    }

    pub fn reestablish(&mut self, timer_factory: &mut dyn TimerFactory) {
        match self {
            Self::Lte(lte) => lte.reestablish(),
            Self::Nr(nr) => nr.reestablish(timer_factory),
        }
    }

    /// §4.3/§4.5 combined entry point: parses the header, routes control
    /// PDUs, resolves COUNT, deciphers, verifies integrity, then either
    /// delivers immediately (LTE) or reorders (NR).
    #[allow(clippy::too_many_arguments)]
    pub fn receive_pdu(
        &mut self,
        pdu: &[u8],
        cfg: &BearerConfig,
        sec_cfg: &SecurityConfig,
        engine: &SecurityEngine,
        timer_factory: &mut dyn TimerFactory,
        metrics: &mut RxMetrics,
    ) -> RxOutcome {
        let exhausted = match self {
            Self::Lte(lte) => lte.exhausted,
            Self::Nr(nr) => nr.exhausted,
        };
        if exhausted {
            metrics.record_drop(RxDropReason::OutOfWindow);
            return RxOutcome::Dropped(RxDropReason::OutOfWindow);
        }

        let has_dc = !matches!((cfg.rat, cfg.bearer_type), (Rat::Lte, BearerType::Srb));
        if has_dc {
            let len = header_len(cfg.sn_length);
            if pdu.is_empty() || pdu.len() < len {
                metrics.record_drop(RxDropReason::MalformedHeader);
                return RxOutcome::Dropped(RxDropReason::MalformedHeader);
            }
            if (pdu[0] >> 7) & 1 == CONTROL_PDU {
                return match parse_status_report(&pdu[1..], cfg.sn_length.bits()) {
                    Some(report) => RxOutcome::ControlPdu(report),
                    None => {
                        metrics.record_drop(RxDropReason::MalformedHeader);
                        RxOutcome::Dropped(RxDropReason::MalformedHeader)
                    }
                };
            }
        }

        let Some(parsed) = parse_header(pdu, cfg.sn_length, has_dc) else {
            metrics.record_drop(RxDropReason::MalformedHeader);
            return RxOutcome::Dropped(RxDropReason::MalformedHeader);
        };
        let header_bytes = &pdu[..header_len(cfg.sn_length)];
        let rest = &pdu[header_len(cfg.sn_length)..];

        let (anchor_sn, anchor_hfn) = match self {
            Self::Lte(lte) => (lte.next_pdcp_rx_sn, lte.rx_hfn),
            Self::Nr(nr) => count::unpack(nr.buffer.rx_deliv(), cfg.sn_length),
        };
        let resolved_count = count::resolve_count(anchor_sn, anchor_hfn, parsed.sn, cfg.sn_length);

        let is_dup = match self {
            Self::Lte(lte) => lte.last_submitted_count.is_some_and(|last| resolved_count <= last),
            Self::Nr(nr) => nr.buffer.is_duplicate_or_stale(resolved_count),
        };
        if is_dup {
            metrics.record_drop(RxDropReason::Duplicate);
            return RxOutcome::Dropped(RxDropReason::Duplicate);
        }

        let mac_len = if sec_cfg.integrity_enabled.rx { 4 } else { 0 };
        if rest.len() < mac_len {
            metrics.record_drop(RxDropReason::MalformedHeader);
            return RxOutcome::Dropped(RxDropReason::MalformedHeader);
        }
        let (ciphertext, mac_bytes) = rest.split_at(rest.len() - mac_len);
        let bearer = cfg.bearer_index();
        let (k_int, k_enc) = sec_cfg.key_for(cfg.bearer_type);

        let mut received_mac = mac_bytes.to_vec();
        if sec_cfg.ciphering_enabled.rx && cfg.bearer_type == BearerType::Drb && !received_mac.is_empty() {
            engine.apply_keystream(sec_cfg.ciphering_algo, k_enc, resolved_count, bearer, cfg.rx_direction, &mut received_mac);
        }

        let mut payload = ciphertext.to_vec();
        if sec_cfg.ciphering_enabled.rx {
            engine.apply_keystream(sec_cfg.ciphering_algo, k_enc, resolved_count, bearer, cfg.rx_direction, &mut payload);
        }

        if sec_cfg.integrity_enabled.rx {
            let mut message = header_bytes.to_vec();
            message.extend_from_slice(&payload);
            let expected = engine.compute_mac(sec_cfg.integrity_algo, k_int, resolved_count, bearer, cfg.rx_direction, &message);
            if expected.as_slice() != received_mac.as_slice() {
                metrics.record_drop(RxDropReason::IntegrityFailure);
                crate::warn!("bearer {} dropping pdu: integrity check failed", cfg.lcid);
                return RxOutcome::Dropped(RxDropReason::IntegrityFailure);
            }
        }

        match self {
            Self::Lte(lte) => lte.receive(payload, parsed.sn, resolved_count, cfg.sn_length, metrics),
            Self::Nr(nr) => {
                let outcome = nr.buffer.insert(resolved_count, payload);
                nr.apply_timer_transition(outcome.start_reordering, outcome.stop_reordering, duration_of(cfg.t_reordering), timer_factory);
                if count::is_count_exhausted(resolved_count) {
                    nr.exhausted = true;
                }
                metrics.record_delivered(outcome.delivered.len() as u64);
                RxOutcome::Delivered(outcome.delivered.into_iter().map(|(_, sdu)| sdu).collect())
            }
        }
    }

    /// NR only: the bearer's single t-Reordering timer has fired. A no-op
    /// on LTE, which has no such timer.
    pub fn on_reordering_expiry(&mut self, t_reordering: Duration, timer_factory: &mut dyn TimerFactory, metrics: &mut RxMetrics) -> RxOutcome {
        match self {
            Self::Lte(_) => RxOutcome::Delivered(Vec::new()),
            Self::Nr(nr) => nr.on_reordering_expiry(t_reordering, timer_factory, metrics),
        }
    }

}

fn duration_of(timer: crate::config::TimerDuration) -> Duration {
    match timer {
        crate::config::TimerDuration::Millis(ms) => Duration::from_millis(u64::from(ms)),
        crate::config::TimerDuration::Infinity => Duration::from_secs(u64::MAX / 1000),
    }
}
