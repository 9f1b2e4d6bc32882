// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! EIA2 (AES-CMAC) and EEA2 (AES-CTR), per 3GPP TS 33.401 Annex B.
//!
//! `ring` (the crate the security engine's DDS-Security ancestor used for
//! AES-GCM) exposes only an AEAD interface; it has no raw AES block cipher,
//! CTR mode, or CMAC. Neither primitive is constructible from it, so this
//! module reaches for the RustCrypto building blocks (`aes`, `ctr`, `cmac`,
//! `cipher`) instead.
//!
//! Both algorithms share the same 8-byte prefix built from
//! `(COUNT, BEARER, DIRECTION)`:
//!
//! - EEA2's keystream is AES-CTR with a 16-byte initial counter block equal
//!   to that prefix followed by 8 zero bytes.
//! - EIA2's MAC-I is the first 4 bytes of AES-CMAC computed over that same
//!   8-byte prefix concatenated with the message.

use aes::cipher::{KeyIvInit, StreamCipher};
use aes::{Aes128, Aes256};
use cmac::{Cmac, Mac};

use super::{pack_count_bearer_direction, CipheringAlgorithm, IntegrityAlgorithm};
use crate::config::Direction;

#[derive(Debug, Default, Clone, Copy)]
pub struct Eia2;

impl IntegrityAlgorithm for Eia2 {
    fn compute_mac(&self, key: &[u8], count: u32, bearer: u8, direction: Direction, message: &[u8]) -> [u8; 4] {
        let prefix = pack_count_bearer_direction(count, bearer, direction);
        let full = cmac_128(key, &prefix, message);
        let mut mac = [0u8; 4];
        mac.copy_from_slice(&full[0..4]);
        mac
    }
}

fn cmac_128(key: &[u8], prefix: &[u8; 8], message: &[u8]) -> [u8; 16] {
    let mut out = [0u8; 16];
    match key.len() {
        32 => {
            let mut mac = <Cmac<Aes256> as Mac>::new_from_slice(key).expect("32-byte key");
            mac.update(prefix);
            mac.update(message);
            out.copy_from_slice(&mac.finalize().into_bytes());
        }
        _ => {
            let mut mac = <Cmac<Aes128> as Mac>::new_from_slice(&key[..16]).expect("16-byte key");
            mac.update(prefix);
            mac.update(message);
            out.copy_from_slice(&mac.finalize().into_bytes());
        }
    }
    out
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Eea2;

impl CipheringAlgorithm for Eea2 {
    fn apply_keystream(&self, key: &[u8], count: u32, bearer: u8, direction: Direction, data: &mut [u8]) {
        let prefix = pack_count_bearer_direction(count, bearer, direction);
        let mut iv = [0u8; 16];
        iv[0..8].copy_from_slice(&prefix);

        if key.len() == 32 {
            let mut cipher = ctr::Ctr128BE::<Aes256>::new(key.into(), &iv.into());
            cipher.apply_keystream(data);
        } else {
            let mut cipher = ctr::Ctr128BE::<Aes128>::new(key[..16].into(), &iv.into());
            cipher.apply_keystream(data);
        }
    }
}
