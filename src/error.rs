// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! PDCP error types.
//!
//! Two taxonomies, matching the propagation policy of a PDCP entity:
//! [`PdcpError`] makes the bearer unusable and is surfaced to the caller;
//! [`RxDropReason`] is recovered locally by the RX state machine (the PDU
//! is dropped, a counter is incremented, and the call still returns success).

use std::fmt;

/// Errors that make a bearer unusable and must be surfaced to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PdcpError {
    // === Configuration errors ===
    /// A bearer or security configuration value is outside its closed set
    /// (e.g. an `sn_length` other than 5/7/12/15/18).
    InvalidConfig(String),
    /// A key was the wrong width for the selected algorithm.
    InvalidKeyLength { expected: usize, actual: usize },

    // === Entity lifecycle errors ===
    /// `write_sdu`/`write_pdu` called on an entity that has been torn down.
    EntityTornDown,
    /// No bearer registered for the given LCID.
    UnknownBearer(u16),

    // === Resource errors ===
    /// TX COUNT has reached `2^32 - 1`; the bearer must be re-keyed before
    /// any further SDU can be transmitted.
    CountWraparoundImminent,
    /// The buffer pool could not satisfy an allocation request.
    BufferPoolExhausted,

    // === Imported state errors ===
    /// `set_bearer_state` was given a field that does not fit the bearer's
    /// configured SN width.
    BearerStateOutOfRange(String),
}

impl fmt::Display for PdcpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig(msg) => write!(f, "invalid configuration: {msg}"),
            Self::InvalidKeyLength { expected, actual } => {
                write!(f, "invalid key length: expected {expected} bytes, got {actual}")
            }
            Self::EntityTornDown => write!(f, "operation on a torn-down PDCP entity"),
            Self::UnknownBearer(lcid) => write!(f, "no entity registered for bearer {lcid}"),
            Self::CountWraparoundImminent => {
                write!(f, "COUNT wraparound imminent, bearer must be re-keyed")
            }
            Self::BufferPoolExhausted => write!(f, "buffer pool exhausted"),
            Self::BearerStateOutOfRange(msg) => write!(f, "imported bearer state out of range: {msg}"),
        }
    }
}

impl std::error::Error for PdcpError {}

/// Crate-level `Result` alias for fallible operations that surface
/// [`PdcpError`] to the caller.
pub type Result<T> = core::result::Result<T, PdcpError>;

/// Causes for a PDU being dropped on the RX path without surfacing an
/// error. The state machine recovers locally and increments the matching
/// counter in [`crate::reliability::metrics::RxMetrics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RxDropReason {
    /// MAC-I did not match the locally computed value.
    IntegrityFailure,
    /// Resolved COUNT already delivered or already buffered.
    Duplicate,
    /// Resolved COUNT fell outside `[RX_DELIV - W, RX_NEXT + W)`.
    OutOfWindow,
    /// PDU shorter than its header requires, or a reserved bit was set.
    MalformedHeader,
    /// Control PDU received on an SRB, or on a bearer that does not expect one.
    UnexpectedControlPdu,
}

impl fmt::Display for RxDropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IntegrityFailure => write!(f, "integrity check failure"),
            Self::Duplicate => write!(f, "duplicate PDU"),
            Self::OutOfWindow => write!(f, "COUNT out of window"),
            Self::MalformedHeader => write!(f, "malformed header"),
            Self::UnexpectedControlPdu => write!(f, "unexpected control PDU"),
        }
    }
}
