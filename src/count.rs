// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! COUNT arithmetic and the SN-to-COUNT window resolution rule (§3).
//!
//! COUNT is the 32-bit concatenation `HFN || SN`. The receiver never sees
//! the HFN on the wire; it reconstructs the HFN of an incoming SN by
//! comparing the SN against a window of width `W = 2^(SN_LEN-1)` centred on
//! its own local state.

use crate::config::SnLength;

/// `count == HFN || SN`, as a single packed 32-bit counter.
pub fn pack(hfn: u32, sn: u32, sn_length: SnLength) -> u32 {
    (hfn << sn_length.bits()) | (sn & (sn_length.modulus() - 1))
}

/// Splits a 32-bit COUNT back into `(hfn, sn)`.
pub fn unpack(count: u32, sn_length: SnLength) -> (u32, u32) {
    let sn = count & (sn_length.modulus() - 1);
    let hfn = count >> sn_length.bits();
    (hfn, sn)
}

/// Resolves an incoming SN `x` to the COUNT nearest to local anchor SN `s`,
/// given the current HFN, per the window rule in §3:
///
/// ```text
/// if  s - W <= x < s               -> use current HFN
/// if  x < s - W   (mod 2^SN_LEN)   -> use HFN + 1   (wrap upward)
/// if  x >= s + W  (mod 2^SN_LEN)   -> use HFN - 1   (wrap downward)
/// ```
pub fn resolve_count(anchor_sn: u32, anchor_hfn: u32, incoming_sn: u32, sn_length: SnLength) -> u32 {
    let window = sn_length.window() as i64;
    let anchor = anchor_sn as i64;
    let incoming = incoming_sn as i64;

    // Plain (non-modular) integer comparison against the threshold: when the
    // anchor sits near the top of the SN space, `anchor - window` goes
    // negative and the "wrap upward" branch is unreachable, which is
    // correct (a small incoming SN there is a genuine next-epoch arrival).
    // Symmetrically near the bottom of the SN space the "wrap downward"
    // branch becomes unreachable.
    if incoming < anchor - window {
        pack(anchor_hfn.wrapping_add(1), incoming_sn, sn_length)
    } else if incoming >= anchor + window {
        pack(anchor_hfn.wrapping_sub(1), incoming_sn, sn_length)
    } else {
        pack(anchor_hfn, incoming_sn, sn_length)
    }
}

/// True once COUNT has reached `2^32 - 1`; the TX must stop producing new
/// PDUs and the RX must drop further PDUs (§3 invariant).
pub fn is_count_exhausted(count: u32) -> bool {
    count == u32::MAX
}
