// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # pdcp - Packet Data Convergence Protocol
//!
//! A pure Rust implementation of the 3GPP PDCP sublayer (TS 36.323 for LTE,
//! TS 38.323 for NR), covering header compression-free data-plane and
//! control-plane PDU processing, security (integrity and ciphering),
//! in-order delivery with reordering, and reliable-handover support via
//! status reports.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdcp::{BearerConfig, BearerType, PdcpEntity, Rat, RlcSink};
//! use pdcp::reliability::timers::ManualClock;
//!
//! struct MyRlc;
//! impl RlcSink for MyRlc {
//!     fn write_sdu(&mut self, _lcid: u16, _pdu: Vec<u8>) {}
//!     fn discard_sdu(&mut self, _lcid: u16, _sn: u32) {}
//! }
//!
//! fn main() -> pdcp::Result<()> {
//!     let cfg = BearerConfig::builder(5, BearerType::Drb, Rat::Nr).build()?;
//!     let mut entity = PdcpEntity::new(cfg);
//!     let mut rlc = MyRlc;
//!     let mut timers = ManualClock::new();
//!     entity.write_sdu(b"sensor reading", &mut rlc, &mut timers)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------------+
//! |                         Bearer Registry                             |
//! |             LCID -> PdcpEntity, configure/reestablish/teardown      |
//! +---------------------------------------------------------------------+
//! |                          PDCP Entity                                 |
//! |   TxState (LTE+NR unified) | RxState (Lte | Nr reordering variant)  |
//! +---------------------------------------------------------------------+
//! |   Security Engine      |  Reliability machinery  |  Buffer Pool     |
//! |   EIA0-3 / EEA0-3       |  header/status codecs    |  scratch alloc  |
//! |                         |  discard+reordering timers                |
//! +---------------------------------------------------------------------+
//! |                        RlcSink (lower layer)                        |
//! +---------------------------------------------------------------------+
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`PdcpEntity`] | One instance per bearer; owns TX/RX state, security, counters |
//! | [`BearerRegistry`] | LCID -> `PdcpEntity` lookup and lifecycle dispatch |
//! | [`BearerConfig`] | Immutable-after-configure per-bearer configuration |
//! | [`SecurityConfig`] | Integrity/ciphering keys and algorithm selection |
//! | [`RlcSink`] | The entity's only dependency on the lower layer |
//! | [`TimerFactory`] | Host-provided discard/t-Reordering timer capability |
//!
//! ## Modules Overview
//!
//! - [`entity`] - The PDCP entity and its TX/RX state machines (start here)
//! - [`config`] - Bearer and security configuration
//! - [`security`] - EIA0-3/EEA0-3 integrity and ciphering engine
//! - [`reliability`] - Wire codecs, timers, undelivered-SDU table, reordering buffer
//! - [`registry`] - Bearer registry
//! - [`count`] - COUNT/HFN/SN arithmetic and window resolution
//! - [`logging`] - Compile-time configurable logging (zero-cost when disabled)
//!
//! ## See Also
//!
//! - [3GPP TS 36.323 (E-UTRA PDCP)](https://www.3gpp.org/ftp/Specs/archive/36_series/36.323/)
//! - [3GPP TS 38.323 (NR PDCP)](https://www.3gpp.org/ftp/Specs/archive/38_series/38.323/)
//! - [3GPP TS 33.401 Annex B (EIA2/EEA2 constructions)](https://www.3gpp.org/ftp/Specs/archive/33_series/33.401/)

// Clippy: No blanket suppressions. Fix issues properly or use inline #[allow] with justification.

/// Shared byte-buffer allocation handle (§9 "Shared byte-buffer pool").
pub mod buffer_pool;
/// COUNT/HFN/SN arithmetic and the window-based COUNT resolution rule.
pub mod count;
/// The PDCP entity and its TX/RX state machines.
pub mod entity;
/// PDCP error types: surfaced (`PdcpError`) and locally-recovered (`RxDropReason`).
pub mod error;
/// Compile-time configurable logging system (zero-cost when disabled).
pub mod logging;
/// Bearer and security configuration.
pub mod config;
/// Bearer registry: LCID -> `PdcpEntity` lookup and lifecycle dispatch.
pub mod registry;
/// Reliability machinery: wire codecs, timers, undelivered-SDU table, reordering buffer.
pub mod reliability;
/// The RLC-facing contract PDCP depends on.
pub mod rlc;
/// EIA0-3/EEA0-3 integrity and ciphering engine.
pub mod security;

pub use config::{
    BearerConfig, BearerConfigBuilder, BearerType, CipheringAlgo, Direction, EnabledDirections,
    IntegrityAlgo, Rat, SecurityConfig, SecurityConfigBuilder, SnLength, TimerDuration,
};
pub use entity::{BearerState, PdcpEntity, RxOutcome};
pub use error::{PdcpError, Result, RxDropReason};
pub use registry::BearerRegistry;
pub use reliability::timers::TimerFactory;
pub use rlc::RlcSink;
pub use security::SecurityEngine;

/// Crate version string.
pub const VERSION: &str = "0.1.0";
