// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! The RLC-facing contract (§4.1, §6): PDCP hands finished PDUs down through
//! `RlcSink::write_sdu` and asks RLC to drop a still-pending SDU through
//! `discard_sdu` on discard-timer expiry. RLC itself is out of scope
//! (§1) — this trait is the entity's only dependency on it.

/// What a PDCP entity expects its lower-layer collaborator to provide.
/// The name matches the wording in §4.1 ("Expects RLC to implement
/// `write_sdu(lcid, pdu)` and `discard_sdu(lcid, sn)`"), even though from
/// RLC's own perspective this is its receive side.
pub trait RlcSink {
    /// Hands a finished PDU (header + ciphertext + optional MAC-I) down to
    /// RLC for the given bearer.
    fn write_sdu(&mut self, lcid: u16, pdu: Vec<u8>);

    /// Tells RLC to drop any RLC-layer state still tracking SN `sn` on
    /// bearer `lcid`, called from discard-timer expiry (§4.7).
    fn discard_sdu(&mut self, lcid: u16, sn: u32);
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::RlcSink;

    /// Fake `RlcSink` used by this crate's own unit/integration tests — a
    /// plain struct implementing the trait, per the no-mocking-framework
    /// convention.
    #[derive(Default)]
    pub struct RecordingRlc {
        pub written: Vec<(u16, Vec<u8>)>,
        pub discarded: Vec<(u16, u32)>,
    }

    impl RlcSink for RecordingRlc {
        fn write_sdu(&mut self, lcid: u16, pdu: Vec<u8>) {
            self.written.push((lcid, pdu));
        }

        fn discard_sdu(&mut self, lcid: u16, sn: u32) {
            self.discarded.push((lcid, sn));
        }
    }
}
