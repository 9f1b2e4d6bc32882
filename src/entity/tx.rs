// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! TX state machine (§4.2, §4.4). LTE and NR share one implementation: both
//! variants compute `count = (hfn << SN_LEN) | sn` and advance it by one
//! per SDU, so the only RAT-specific behaviour is which header layout gets
//! packed — already handled by [`crate::reliability::header`]. The
//! duplication the source carries between its LTE and NR TX paths
//! collapses entirely here (§9).

use std::time::Duration;

use crate::config::{BearerConfig, BearerType, SecurityConfig};
use crate::count;
use crate::error::{PdcpError, Result};
use crate::reliability::header::pack_header;
use crate::reliability::metrics::TxMetrics;
use crate::reliability::timers::{TimerCallback, TimerFactory};
use crate::reliability::undelivered::UndeliveredTable;
use crate::rlc::RlcSink;
use crate::security::SecurityEngine;

#[derive(Debug)]
pub struct TxState {
    /// Always the next COUNT to assign — `TX_NEXT` for NR, and the LTE
    /// `(tx_hfn, next_pdcp_tx_sn)` pair packed into the same 32 bits,
    /// since both advance identically (§3).
    next_count: u32,
    undelivered: UndeliveredTable,
}

impl TxState {
    pub fn new() -> Self {
        Self { next_count: 0, undelivered: UndeliveredTable::new() }
    }

    pub fn tx_next(&self) -> u32 {
        self.next_count
    }

    /// Installs handover-imported state (§6.4).
    pub fn set_tx_next(&mut self, count: u32) {
        self.next_count = count;
    }

    /// Cancels every outstanding discard timer, clears the undelivered-SDU
    /// table, and resets `TX_NEXT`/`(tx_hfn, next_pdcp_tx_sn)` to zero
    /// (§5 "Cancellation semantics" — the security keys themselves are
    /// untouched by reestablishment).
    pub fn reestablish(&mut self, timer_factory: &mut dyn TimerFactory) {
        for handle in self.undelivered.drain_timer_handles() {
            timer_factory.cancel(handle);
        }
        self.next_count = 0;
    }

    #[allow(clippy::too_many_arguments)]
    pub fn write_sdu(
        &mut self,
        sdu: Vec<u8>,
        cfg: &BearerConfig,
        sec_cfg: &SecurityConfig,
        engine: &SecurityEngine,
        rlc: &mut dyn RlcSink,
        timer_factory: &mut dyn TimerFactory,
        metrics: &mut TxMetrics,
    ) -> Result<()> {
        let count = self.next_count;
        if count::is_count_exhausted(count) {
            crate::error!("bearer {} refusing write_sdu: COUNT exhausted", cfg.lcid);
            return Err(PdcpError::CountWraparoundImminent);
        }

        let (_, sn) = count::unpack(count, cfg.sn_length);
        let has_dc = !matches!((cfg.rat, cfg.bearer_type), (crate::config::Rat::Lte, BearerType::Srb));
        let header = pack_header(sn, cfg.sn_length, has_dc);
        let bearer = cfg.bearer_index();
        let (k_int, k_enc) = sec_cfg.key_for(cfg.bearer_type);

        let mut payload = sdu.clone();
        let mut mac = None;
        if sec_cfg.integrity_enabled.tx {
            let mut message = header.clone();
            message.extend_from_slice(&payload);
            mac = Some(engine.compute_mac(sec_cfg.integrity_algo, k_int, count, bearer, cfg.tx_direction, &message));
        }

        if sec_cfg.ciphering_enabled.tx {
            engine.apply_keystream(sec_cfg.ciphering_algo, k_enc, count, bearer, cfg.tx_direction, &mut payload);
            if cfg.bearer_type == BearerType::Drb {
                if let Some(ref mut mac_bytes) = mac {
                    engine.apply_keystream(sec_cfg.ciphering_algo, k_enc, count, bearer, cfg.tx_direction, mac_bytes);
                }
            }
        }

        let mut pdu = header;
        pdu.extend_from_slice(&payload);
        if let Some(mac_bytes) = mac {
            pdu.extend_from_slice(&mac_bytes);
        }
        rlc.write_sdu(cfg.lcid, pdu);
        metrics.transmitted += 1;
        crate::debug!("bearer {} tx sn={sn} count={count}", cfg.lcid);

        if cfg.bearer_type == BearerType::Drb && !cfg.discard_timer.is_infinite() {
            let handle = match cfg.discard_timer {
                crate::config::TimerDuration::Millis(ms) => {
                    Some(timer_factory.arm(Duration::from_millis(u64::from(ms)), TimerCallback::Discard { sn }))
                }
                crate::config::TimerDuration::Infinity => None,
            };
            self.undelivered.insert(sn, sdu, handle);
        } else if cfg.status_report_required {
            self.undelivered.insert(sn, sdu, None);
        }

        self.next_count = count.wrapping_add(1);
        Ok(())
    }

    /// Cancels the discard timer (if any) and removes the undelivered-SDU
    /// entry for each SN, marking it delivered for status-report accounting
    /// (§4.2); SNs not present are silently ignored (idempotence property
    /// in §8).
    pub fn notify_delivery(&mut self, sn_list: &[u32], sn_length: crate::config::SnLength, timer_factory: &mut dyn TimerFactory) {
        let modulus = sn_length.modulus();
        for &sn in sn_list {
            if let Some(handle) = self.undelivered.acknowledge(sn, modulus) {
                timer_factory.cancel(handle);
            }
        }
    }

    /// Builds a status report from this TX's own delivery-acknowledgment
    /// bookkeeping (§4.6, §8 scenario 7).
    pub fn build_status_report(&self, sn_length: crate::config::SnLength) -> Vec<u8> {
        self.undelivered.build_status_report(sn_length.bits())
    }

    /// Discard-timer expiry: tells RLC to drop `sn` and removes the entry.
    pub fn on_discard_timer_expiry(&mut self, sn: u32, lcid: u16, rlc: &mut dyn RlcSink, metrics: &mut TxMetrics) {
        if self.undelivered.remove(sn).is_some() {
            rlc.discard_sdu(lcid, sn);
            metrics.discarded += 1;
            crate::warn!("bearer {lcid} discard-timer expired for sn={sn}");
        }
    }

    /// Consumes a status report (§4.3): acknowledges every SN `< fms` and
    /// every SN marked received in the bitmap.
    pub fn consume_status_report(
        &mut self,
        report: &crate::reliability::status_report::ParsedStatusReport,
        sn_length: crate::config::SnLength,
        timer_factory: &mut dyn TimerFactory,
        metrics: &mut TxMetrics,
    ) {
        let modulus = sn_length.modulus();
        let below_fms: Vec<u32> = (0..report.fms.min(modulus)).collect();
        for sn in below_fms.into_iter().chain(report.received_above_fms.iter().copied()) {
            if let Some(handle) = self.undelivered.acknowledge(sn, modulus) {
                timer_factory.cancel(handle);
            }
        }
        metrics.status_reports_consumed += 1;
    }

    pub fn undelivered_count(&self) -> usize {
        self.undelivered.len()
    }
}

impl Default for TxState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BearerConfig, BearerType, Rat, SecurityConfig, SnLength};
    use crate::reliability::timers::ManualClock;
    use crate::rlc::test_support::RecordingRlc;
    use crate::security::SecurityEngine;

    fn nr_drb_config() -> BearerConfig {
        BearerConfig::builder(5, BearerType::Drb, Rat::Nr)
            .sn_length(SnLength::Bits12)
            .build()
            .unwrap()
    }

    fn aes_security() -> SecurityConfig {
        let key: Vec<u8> = (0u8..16).collect();
        SecurityConfig::builder()
            .shared_keys(key.clone(), key)
            .integrity_algo(crate::config::IntegrityAlgo::Eia2)
            .ciphering_algo(crate::config::CipheringAlgo::Eea2)
            .integrity_enabled(crate::config::EnabledDirections::BOTH)
            .ciphering_enabled(crate::config::EnabledDirections::BOTH)
            .build()
            .unwrap()
    }

    // Scenario 1 from the end-to-end test table.
    #[test]
    fn literal_scenario_nr_tx_next_zero() {
        let cfg = nr_drb_config();
        let sec = aes_security();
        let engine = SecurityEngine;
        let mut tx = TxState::new();
        let mut rlc = RecordingRlc::default();
        let mut clock = ManualClock::new();
        let mut metrics = TxMetrics::default();

        tx.write_sdu(vec![0x18, 0xE2], &cfg, &sec, &engine, &mut rlc, &mut clock, &mut metrics).unwrap();

        assert_eq!(rlc.written.len(), 1);
        assert_eq!(rlc.written[0].0, cfg.lcid);
        assert_eq!(tx.tx_next(), 1);
    }

    #[test]
    fn rejects_sdu_at_count_exhaustion() {
        let cfg = nr_drb_config();
        let sec = aes_security();
        let engine = SecurityEngine;
        let mut tx = TxState::new();
        tx.next_count = u32::MAX;
        let mut rlc = RecordingRlc::default();
        let mut clock = ManualClock::new();
        let mut metrics = TxMetrics::default();

        let err = tx
            .write_sdu(vec![1, 2], &cfg, &sec, &engine, &mut rlc, &mut clock, &mut metrics)
            .unwrap_err();
        assert_eq!(err, PdcpError::CountWraparoundImminent);
        assert!(rlc.written.is_empty());
    }

    #[test]
    fn discard_timer_scenario() {
        // Scenario 6: discard = 50ms, one SDU written, no delivery ack.
        let cfg = BearerConfig::builder(5, BearerType::Drb, Rat::Lte)
            .sn_length(SnLength::Bits12)
            .discard_timer(crate::config::TimerDuration::Millis(50))
            .build()
            .unwrap();
        let sec = aes_security();
        let engine = SecurityEngine;
        let mut tx = TxState::new();
        let mut rlc = RecordingRlc::default();
        let mut clock = ManualClock::new();
        let mut metrics = TxMetrics::default();

        tx.write_sdu(vec![0xAA], &cfg, &sec, &engine, &mut rlc, &mut clock, &mut metrics).unwrap();
        assert_eq!(clock.advance(Duration::from_millis(49)), vec![]);
        assert_eq!(clock.pending_count(), 1);
        assert_eq!(metrics.discarded, 0);

        let fired = clock.advance(Duration::from_millis(1));
        assert_eq!(fired.len(), 1);
        if let TimerCallback::Discard { sn } = fired[0] {
            tx.on_discard_timer_expiry(sn, cfg.lcid, &mut rlc, &mut metrics);
        } else {
            panic!("expected a discard callback");
        }
        assert_eq!(metrics.discarded, 1);
        assert_eq!(tx.undelivered_count(), 0);
    }

    #[test]
    fn notify_delivery_is_idempotent() {
        let cfg = nr_drb_config();
        let sec = aes_security();
        let engine = SecurityEngine;
        let mut tx = TxState::new();
        let mut rlc = RecordingRlc::default();
        let mut clock = ManualClock::new();
        let mut metrics = TxMetrics::default();
        let cfg = BearerConfig::builder(cfg.lcid, BearerType::Drb, Rat::Nr)
            .sn_length(SnLength::Bits12)
            .discard_timer(crate::config::TimerDuration::Millis(1000))
            .build()
            .unwrap();

        tx.write_sdu(vec![1], &cfg, &sec, &engine, &mut rlc, &mut clock, &mut metrics).unwrap();
        assert_eq!(tx.undelivered_count(), 1);
        tx.notify_delivery(&[0], cfg.sn_length, &mut clock);
        assert_eq!(tx.undelivered_count(), 0);
        // Re-delivery of the same notification is a silent no-op.
        tx.notify_delivery(&[0], cfg.sn_length, &mut clock);
        assert_eq!(tx.undelivered_count(), 0);
    }

    // Scenario 7: LTE TX status report with gaps, SN_LEN=12.
    #[test]
    fn literal_scenario_status_report_with_gaps() {
        let cfg = BearerConfig::builder(5, BearerType::Drb, Rat::Lte)
            .sn_length(SnLength::Bits12)
            .build()
            .unwrap();
        let sec = aes_security();
        let engine = SecurityEngine;
        let mut tx = TxState::new();
        let mut rlc = RecordingRlc::default();
        let mut clock = ManualClock::new();
        let mut metrics = TxMetrics::default();

        for _ in 0..257 {
            tx.write_sdu(vec![0], &cfg, &sec, &engine, &mut rlc, &mut clock, &mut metrics).unwrap();
        }
        let all_sns: Vec<u32> = (0..257).collect();
        tx.notify_delivery(&all_sns, cfg.sn_length, &mut clock);
        assert_eq!(tx.build_status_report(cfg.sn_length), vec![0x01, 0x01]);

        for _ in 257..272 {
            tx.write_sdu(vec![0], &cfg, &sec, &engine, &mut rlc, &mut clock, &mut metrics).unwrap();
        }
        let delivered: Vec<u32> = (257..272).filter(|sn| !matches!(sn, 257 | 258 | 271)).collect();
        tx.notify_delivery(&delivered, cfg.sn_length, &mut clock);
        assert_eq!(tx.build_status_report(cfg.sn_length), vec![0x01, 0x01, 0x7F, 0xF8]);
    }
}
