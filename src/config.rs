// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Bearer and security configuration.
//!
//! `BearerConfig` is immutable once installed via `PdcpEntity::configure`;
//! `SecurityConfig` is mutable and is rotated at reestablishment via
//! `config_security`. Both are built with `with_*` builder methods and
//! validated at `configure()` time rather than at construction time, so a
//! caller can build one incrementally.

use crate::error::{PdcpError, Result};

/// Radio access technology a bearer is instantiated for. Selects the TX/RX
/// state-machine variant (§4.2/§4.3 vs §4.4/§4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rat {
    Lte,
    Nr,
}

/// Signalling vs data radio bearer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BearerType {
    /// Control-plane bearer; integrity is mandatory.
    Srb,
    /// User-plane bearer; integrity is optional.
    Drb,
}

/// Width of the SN field in bits. The closed set recognised by the
/// configuration; any other value is rejected by `validate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnLength {
    Bits5,
    Bits7,
    Bits12,
    Bits15,
    Bits18,
}

impl SnLength {
    pub fn bits(self) -> u32 {
        match self {
            Self::Bits5 => 5,
            Self::Bits7 => 7,
            Self::Bits12 => 12,
            Self::Bits15 => 15,
            Self::Bits18 => 18,
        }
    }

    /// `2^SN_LEN`, the modulus of the SN space.
    pub fn modulus(self) -> u32 {
        1u32 << self.bits()
    }

    /// `W = 2^(SN_LEN - 1)`, the reordering/TX window half-width.
    pub fn window(self) -> u32 {
        1u32 << (self.bits() - 1)
    }
}

/// Per-SN timer duration, in milliseconds, with an `Infinity` sentinel that
/// disables the timer entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerDuration {
    Millis(u32),
    Infinity,
}

impl TimerDuration {
    pub fn is_infinite(self) -> bool {
        matches!(self, Self::Infinity)
    }
}

/// Integrity algorithm identifiers (§6.2, closed set).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntegrityAlgo {
    Eia0,
    Eia1,
    Eia2,
    Eia3,
}

/// Ciphering algorithm identifiers (§6.2, closed set).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CipheringAlgo {
    Eea0,
    Eea1,
    Eea2,
    Eea3,
}

/// Direction a PDCP entity applies a given security transform in. A single
/// entity in this crate is not statically UE-side or eNB-side, so directions
/// are labelled TX/RX rather than uplink/downlink (per the bearer's
/// configured `tx_direction`/`rx_direction` label, see [`Direction`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EnabledDirections {
    pub tx: bool,
    pub rx: bool,
}

impl EnabledDirections {
    pub const NONE: Self = Self { tx: false, rx: false };
    pub const BOTH: Self = Self { tx: true, rx: true };

    pub fn tx_only() -> Self {
        Self { tx: true, rx: false }
    }

    pub fn rx_only() -> Self {
        Self { tx: false, rx: true }
    }
}

/// The DIRECTION input to the security algorithms (§6.2): 0 = uplink,
/// 1 = downlink. A bearer's TX path uses `tx_direction`, its RX path uses
/// `rx_direction`; for a UE these are (uplink, downlink), for an eNB/gNB
/// they are reversed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Uplink,
    Downlink,
}

impl Direction {
    pub fn bit(self) -> u8 {
        match self {
            Self::Uplink => 0,
            Self::Downlink => 1,
        }
    }
}

/// Immutable-after-configure bearer configuration (§3 "Bearer configuration").
#[derive(Debug, Clone)]
pub struct BearerConfig {
    pub lcid: u16,
    pub bearer_type: BearerType,
    pub rat: Rat,
    pub sn_length: SnLength,
    pub t_reordering: TimerDuration,
    pub discard_timer: TimerDuration,
    pub status_report_required: bool,
    pub tx_direction: Direction,
    pub rx_direction: Direction,
}

impl BearerConfig {
    pub fn builder(lcid: u16, bearer_type: BearerType, rat: Rat) -> BearerConfigBuilder {
        BearerConfigBuilder::new(lcid, bearer_type, rat)
    }

    /// BEARER input to the security algorithms: `lcid - 1` (§4.2 step 4, §6.2).
    pub fn bearer_index(&self) -> u8 {
        (self.lcid.saturating_sub(1) & 0x1F) as u8
    }

    pub fn validate(&self) -> Result<()> {
        if self.rat == Rat::Lte && matches!(self.sn_length, SnLength::Bits18) {
            return Err(PdcpError::InvalidConfig(
                "LTE does not define an 18-bit SN length".into(),
            ));
        }
        if self.rat == Rat::Nr && !matches!(self.sn_length, SnLength::Bits12 | SnLength::Bits18) {
            return Err(PdcpError::InvalidConfig(
                "NR PDCP only defines 12-bit and 18-bit SN lengths".into(),
            ));
        }
        if self.bearer_type == BearerType::Srb && !matches!(self.sn_length, SnLength::Bits5 | SnLength::Bits12) {
            return Err(PdcpError::InvalidConfig(
                "SRBs use a 5-bit (LTE) or 12-bit (NR) SN length".into(),
            ));
        }
        Ok(())
    }
}

/// Builder for [`BearerConfig`]. Fields not touched keep their 3GPP default.
pub struct BearerConfigBuilder {
    inner: BearerConfig,
}

impl BearerConfigBuilder {
    fn new(lcid: u16, bearer_type: BearerType, rat: Rat) -> Self {
        let default_sn = match (rat, bearer_type) {
            (Rat::Lte, BearerType::Srb) => SnLength::Bits5,
            (Rat::Lte, BearerType::Drb) => SnLength::Bits12,
            (Rat::Nr, _) => SnLength::Bits12,
        };
        Self {
            inner: BearerConfig {
                lcid,
                bearer_type,
                rat,
                sn_length: default_sn,
                t_reordering: TimerDuration::Millis(100),
                discard_timer: TimerDuration::Infinity,
                status_report_required: false,
                tx_direction: Direction::Uplink,
                rx_direction: Direction::Downlink,
            },
        }
    }

    pub fn sn_length(mut self, sn_length: SnLength) -> Self {
        self.inner.sn_length = sn_length;
        self
    }

    pub fn t_reordering(mut self, duration: TimerDuration) -> Self {
        self.inner.t_reordering = duration;
        self
    }

    pub fn discard_timer(mut self, duration: TimerDuration) -> Self {
        self.inner.discard_timer = duration;
        self
    }

    pub fn status_report_required(mut self, required: bool) -> Self {
        self.inner.status_report_required = required;
        self
    }

    pub fn directions(mut self, tx: Direction, rx: Direction) -> Self {
        self.inner.tx_direction = tx;
        self.inner.rx_direction = rx;
        self
    }

    pub fn build(self) -> Result<BearerConfig> {
        self.inner.validate()?;
        Ok(self.inner)
    }
}

/// Mutable security configuration, rotated at reestablishment (§3 "Security
/// configuration"). Separate control-plane/user-plane key pairs mirror how
/// the reference test suite configures `sec_cfg` (one K_int/K_enc pair is
/// used for SRBs, a second for DRBs).
#[derive(Clone, zeroize::Zeroize, zeroize::ZeroizeOnDrop)]
pub struct SecurityConfig {
    pub k_int_cp: Vec<u8>,
    pub k_enc_cp: Vec<u8>,
    pub k_int_up: Vec<u8>,
    pub k_enc_up: Vec<u8>,
    #[zeroize(skip)]
    pub integrity_algo: IntegrityAlgo,
    #[zeroize(skip)]
    pub ciphering_algo: CipheringAlgo,
    #[zeroize(skip)]
    pub integrity_enabled: EnabledDirections,
    #[zeroize(skip)]
    pub ciphering_enabled: EnabledDirections,
}

impl std::fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("integrity_algo", &self.integrity_algo)
            .field("ciphering_algo", &self.ciphering_algo)
            .field("integrity_enabled", &self.integrity_enabled)
            .field("ciphering_enabled", &self.ciphering_enabled)
            .finish_non_exhaustive()
    }
}

impl SecurityConfig {
    pub fn builder() -> SecurityConfigBuilder {
        SecurityConfigBuilder::default()
    }

    pub fn validate(&self) -> Result<()> {
        for (name, key) in [
            ("k_int_cp", &self.k_int_cp),
            ("k_enc_cp", &self.k_enc_cp),
            ("k_int_up", &self.k_int_up),
            ("k_enc_up", &self.k_enc_up),
        ] {
            if !matches!(key.len(), 16 | 32) {
                return Err(PdcpError::InvalidConfig(format!(
                    "{name} must be 16 or 32 bytes, got {}",
                    key.len()
                )));
            }
        }
        Ok(())
    }

    pub fn key_for(&self, bearer_type: BearerType) -> (&[u8], &[u8]) {
        match bearer_type {
            BearerType::Srb => (&self.k_int_cp, &self.k_enc_cp),
            BearerType::Drb => (&self.k_int_up, &self.k_enc_up),
        }
    }
}

/// Builder for [`SecurityConfig`]; defaults to EIA0/EEA0 (null algorithms)
/// with no direction enabled, matching an unconfigured bearer at startup.
#[derive(Default)]
pub struct SecurityConfigBuilder {
    k_int_cp: Vec<u8>,
    k_enc_cp: Vec<u8>,
    k_int_up: Vec<u8>,
    k_enc_up: Vec<u8>,
    integrity_algo: Option<IntegrityAlgo>,
    ciphering_algo: Option<CipheringAlgo>,
    integrity_enabled: EnabledDirections,
    ciphering_enabled: EnabledDirections,
}

impl SecurityConfigBuilder {
    pub fn control_plane_keys(mut self, k_int: Vec<u8>, k_enc: Vec<u8>) -> Self {
        self.k_int_cp = k_int;
        self.k_enc_cp = k_enc;
        self
    }

    pub fn user_plane_keys(mut self, k_int: Vec<u8>, k_enc: Vec<u8>) -> Self {
        self.k_int_up = k_int;
        self.k_enc_up = k_enc;
        self
    }

    /// Sets the same K_int/K_enc pair for both control- and user-plane,
    /// matching scenarios where SRB and DRB share key material (§8).
    pub fn shared_keys(mut self, k_int: Vec<u8>, k_enc: Vec<u8>) -> Self {
        self.k_int_cp = k_int.clone();
        self.k_enc_cp = k_enc.clone();
        self.k_int_up = k_int;
        self.k_enc_up = k_enc;
        self
    }

    pub fn integrity_algo(mut self, algo: IntegrityAlgo) -> Self {
        self.integrity_algo = Some(algo);
        self
    }

    pub fn ciphering_algo(mut self, algo: CipheringAlgo) -> Self {
        self.ciphering_algo = Some(algo);
        self
    }

    pub fn integrity_enabled(mut self, dirs: EnabledDirections) -> Self {
        self.integrity_enabled = dirs;
        self
    }

    pub fn ciphering_enabled(mut self, dirs: EnabledDirections) -> Self {
        self.ciphering_enabled = dirs;
        self
    }

    pub fn build(self) -> Result<SecurityConfig> {
        let cfg = SecurityConfig {
            k_int_cp: self.k_int_cp,
            k_enc_cp: self.k_enc_cp,
            k_int_up: self.k_int_up,
            k_enc_up: self.k_enc_up,
            integrity_algo: self.integrity_algo.unwrap_or(IntegrityAlgo::Eia0),
            ciphering_algo: self.ciphering_algo.unwrap_or(CipheringAlgo::Eea0),
            integrity_enabled: self.integrity_enabled,
            ciphering_enabled: self.ciphering_enabled,
        };
        cfg.validate()?;
        Ok(cfg)
    }
}
