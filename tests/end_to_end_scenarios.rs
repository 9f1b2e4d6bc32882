// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Entity-level scenarios from the literal end-to-end test table.

use pdcp::reliability::header::pack_header;
use pdcp::reliability::timers::{ManualClock, TimerCallback};
use pdcp::{
    BearerConfig, BearerState, BearerType, CipheringAlgo, EnabledDirections, IntegrityAlgo, PdcpEntity, Rat,
    RlcSink, RxOutcome, SecurityConfig, SnLength,
};
use std::time::Duration;

#[derive(Default)]
struct RecordingRlc {
    written: Vec<(u16, Vec<u8>)>,
    discarded: Vec<(u16, u32)>,
}

impl RlcSink for RecordingRlc {
    fn write_sdu(&mut self, lcid: u16, pdu: Vec<u8>) {
        self.written.push((lcid, pdu));
    }

    fn discard_sdu(&mut self, lcid: u16, sn: u32) {
        self.discarded.push((lcid, sn));
    }
}

// Matches the 16-byte key already verified against the literal scenario-1
// MAC/ciphertext bytes in `security::aes`'s own unit test.
fn shared_key() -> Vec<u8> {
    (0u8..16).collect()
}

fn eia2_eea2_security() -> SecurityConfig {
    let key = shared_key();
    SecurityConfig::builder()
        .shared_keys(key.clone(), key)
        .integrity_algo(IntegrityAlgo::Eia2)
        .ciphering_algo(CipheringAlgo::Eea2)
        .integrity_enabled(EnabledDirections::BOTH)
        .ciphering_enabled(EnabledDirections::BOTH)
        .build()
        .unwrap()
}

fn null_security() -> SecurityConfig {
    SecurityConfig::builder().build().unwrap()
}

// Scenario 2: NR TX, SN_LEN=12, TX_NEXT=2048.
#[test]
fn scenario_2_nr_tx_sn12_tx_next_2048() {
    let cfg = BearerConfig::builder(5, BearerType::Drb, Rat::Nr).sn_length(SnLength::Bits12).build().unwrap();
    let mut entity = PdcpEntity::new(cfg);
    entity.config_security(eia2_eea2_security()).unwrap();

    let state = BearerState {
        tx_hfn: 2048 >> 12,
        next_pdcp_tx_sn: 2048 & 0xFFF,
        rx_hfn: 0,
        next_pdcp_rx_sn: 0,
        last_submitted_pdcp_rx_sn: None,
    };
    let mut clock = ManualClock::new();
    entity.set_bearer_state(state, false, &mut clock).unwrap();

    let mut rlc = RecordingRlc::default();
    entity.write_sdu(&[0x18, 0xE2], &mut rlc, &mut clock).unwrap();

    assert_eq!(rlc.written.len(), 1);
    assert_eq!(rlc.written[0].1, vec![0x88, 0x00, 0x8D, 0x2C, 0xE5, 0x38, 0xC0, 0x42]);
}

// Scenario 3: NR TX, SN_LEN=18, TX_NEXT=0.
#[test]
fn scenario_3_nr_tx_sn18_tx_next_zero() {
    let cfg = BearerConfig::builder(5, BearerType::Drb, Rat::Nr).sn_length(SnLength::Bits18).build().unwrap();
    let mut entity = PdcpEntity::new(cfg);
    entity.config_security(eia2_eea2_security()).unwrap();

    let mut clock = ManualClock::new();
    let mut rlc = RecordingRlc::default();
    entity.write_sdu(&[0x18, 0xE2], &mut rlc, &mut clock).unwrap();

    assert_eq!(rlc.written.len(), 1);
    assert_eq!(rlc.written[0].1, vec![0x80, 0x00, 0x00, 0x8F, 0xE3, 0x37, 0x33, 0xD5, 0x64]);
}

// Scenario 4: NR RX wraparound, SN_LEN=12. Initial RX_NEXT = RX_DELIV =
// 4294967295. A PDU at COUNT 4294967295 delivers; a PDU at COUNT 0
// (wraparound) is dropped.
#[test]
fn scenario_4_nr_rx_wraparound_drops_after_exhaustion() {
    let cfg = BearerConfig::builder(5, BearerType::Drb, Rat::Nr).sn_length(SnLength::Bits12).build().unwrap();
    let mut entity = PdcpEntity::new(cfg);
    entity.config_security(null_security()).unwrap();

    let (rx_hfn, next_pdcp_rx_sn) = (u32::MAX >> 12, u32::MAX & 0xFFF);
    let state = BearerState { tx_hfn: 0, next_pdcp_tx_sn: 0, rx_hfn, next_pdcp_rx_sn, last_submitted_pdcp_rx_sn: None };
    let mut clock = ManualClock::new();
    entity.set_bearer_state(state, false, &mut clock).unwrap();

    let mut pdu_at_max = pack_header(u32::MAX & 0xFFF, SnLength::Bits12, true);
    pdu_at_max.push(0xAA);
    match entity.write_pdu(&pdu_at_max, &mut clock).unwrap() {
        RxOutcome::Delivered(sdus) => assert_eq!(sdus, vec![vec![0xAA]]),
        other => panic!("expected delivery at COUNT=u32::MAX, got {other:?}"),
    }

    let mut pdu_at_zero = pack_header(0, SnLength::Bits12, true);
    pdu_at_zero.push(0xBB);
    match entity.write_pdu(&pdu_at_zero, &mut clock).unwrap() {
        RxOutcome::Dropped(_) => {}
        other => panic!("expected the wraparound PDU to be dropped, got {other:?}"),
    }
}

// Scenario 6: LTE TX discard timer, SN_LEN=12, discard=50ms, DRB.
#[test]
fn scenario_6_lte_discard_timer_fires_after_fifty_ms() {
    let cfg = BearerConfig::builder(5, BearerType::Drb, Rat::Lte)
        .sn_length(SnLength::Bits12)
        .discard_timer(pdcp::TimerDuration::Millis(50))
        .build()
        .unwrap();
    let mut entity = PdcpEntity::new(cfg);
    entity.config_security(null_security()).unwrap();

    let mut rlc = RecordingRlc::default();
    let mut clock = ManualClock::new();
    entity.write_sdu(&[0xAA], &mut rlc, &mut clock).unwrap();

    assert_eq!(clock.advance(Duration::from_millis(49)), vec![]);
    assert_eq!(clock.pending_count(), 1);
    assert_eq!(rlc.discarded.len(), 0);

    let fired = clock.advance(Duration::from_millis(1));
    assert_eq!(fired.len(), 1);
    let TimerCallback::Discard { sn } = fired[0] else { panic!("expected a discard callback") };
    entity.on_discard_timer_expiry(sn, &mut rlc).unwrap();

    assert_eq!(rlc.discarded.len(), 1);
    assert_eq!(clock.pending_count(), 0);
}

// Scenario 7: LTE TX status report with gaps, SN_LEN=12, driven through
// the entity-level API end to end (write_sdu + notify_delivery +
// send_status_report).
#[test]
fn scenario_7_lte_status_report_with_gaps() {
    let cfg = BearerConfig::builder(5, BearerType::Drb, Rat::Lte).sn_length(SnLength::Bits12).build().unwrap();
    let mut entity = PdcpEntity::new(cfg);
    entity.config_security(null_security()).unwrap();

    let mut rlc = RecordingRlc::default();
    let mut clock = ManualClock::new();

    for _ in 0..257 {
        entity.write_sdu(&[0], &mut rlc, &mut clock).unwrap();
    }
    let all_sns: Vec<u32> = (0..257).collect();
    entity.notify_delivery(&all_sns, &mut clock).unwrap();
    assert_eq!(entity.send_status_report().unwrap(), vec![0x01, 0x01]);

    for _ in 257..272 {
        entity.write_sdu(&[0], &mut rlc, &mut clock).unwrap();
    }
    let delivered: Vec<u32> = (257..272).filter(|sn| !matches!(sn, 257 | 258 | 271)).collect();
    entity.notify_delivery(&delivered, &mut clock).unwrap();
    assert_eq!(entity.send_status_report().unwrap(), vec![0x01, 0x01, 0x7F, 0xF8]);
}

// Idempotence property (§8): notify_delivery([sn]) applied twice behaves
// the same as applied once.
#[test]
fn notify_delivery_idempotence_at_entity_level() {
    let cfg = BearerConfig::builder(5, BearerType::Drb, Rat::Nr)
        .sn_length(SnLength::Bits12)
        .discard_timer(pdcp::TimerDuration::Millis(1000))
        .build()
        .unwrap();
    let mut entity = PdcpEntity::new(cfg);
    entity.config_security(null_security()).unwrap();

    let mut rlc = RecordingRlc::default();
    let mut clock = ManualClock::new();
    entity.write_sdu(&[1], &mut rlc, &mut clock).unwrap();
    assert_eq!(clock.pending_count(), 1);

    entity.notify_delivery(&[0], &mut clock).unwrap();
    assert_eq!(clock.pending_count(), 0);
    entity.notify_delivery(&[0], &mut clock).unwrap();
    assert_eq!(clock.pending_count(), 0);
}

// Handover state export/import round-trip (§6.4), driven entirely through
// the public entity API rather than the internal unit test's fields.
#[test]
fn handover_state_roundtrips_across_two_entities() {
    let cfg = BearerConfig::builder(5, BearerType::Drb, Rat::Nr).sn_length(SnLength::Bits12).build().unwrap();
    let mut source = PdcpEntity::new(cfg.clone());
    source.config_security(null_security()).unwrap();
    let mut rlc = RecordingRlc::default();
    let mut clock = ManualClock::new();
    for sdu in [vec![1u8], vec![2u8], vec![3u8]] {
        source.write_sdu(&sdu, &mut rlc, &mut clock).unwrap();
    }

    let state = source.get_bearer_state();
    assert_eq!(state.next_pdcp_tx_sn, 3);

    let mut target = PdcpEntity::new(cfg);
    target.config_security(null_security()).unwrap();
    target.set_bearer_state(state, true, &mut clock).unwrap();
    assert_eq!(target.get_bearer_state(), state);

    let mut rlc2 = RecordingRlc::default();
    target.write_sdu(&[4], &mut rlc2, &mut clock).unwrap();
    assert_eq!(target.get_bearer_state().next_pdcp_tx_sn, 4);
}
