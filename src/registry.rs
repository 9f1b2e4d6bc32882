// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Bearer registry: LCID -> entity map (§2 "Bearer registry"). Dispatches
//! configure/reestablish/teardown by LCID, and is the lookup point a
//! discard-timer callback uses to find its owning entity (§9 "Back-reference
//! from discard timer to entity" — the timer holds a weak handle of
//! `(bearer id, SN)`, not an owning reference back into the entity).

use std::collections::HashMap;

use crate::entity::PdcpEntity;
use crate::error::{PdcpError, Result};

#[derive(Default)]
pub struct BearerRegistry {
    entities: HashMap<u16, PdcpEntity>,
}

impl BearerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, entity: PdcpEntity) {
        self.entities.insert(entity.bearer_id(), entity);
    }

    pub fn get(&self, lcid: u16) -> Result<&PdcpEntity> {
        self.entities.get(&lcid).ok_or(PdcpError::UnknownBearer(lcid))
    }

    pub fn get_mut(&mut self, lcid: u16) -> Result<&mut PdcpEntity> {
        self.entities.get_mut(&lcid).ok_or(PdcpError::UnknownBearer(lcid))
    }

    /// A torn-down entity must cancel all its timers before a bearer id can
    /// be reused (§9 "An entity being torn down must cancel all its timers
    /// first").
    pub fn teardown(&mut self, lcid: u16) -> Result<()> {
        let entity = self.get_mut(lcid)?;
        entity.teardown();
        self.entities.remove(&lcid);
        crate::info!("bearer {lcid} torn down and removed from registry");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BearerConfig, BearerType, Rat};
    use crate::entity::PdcpEntity;

    #[test]
    fn unknown_bearer_is_an_error() {
        let registry = BearerRegistry::new();
        assert_eq!(registry.get(7).unwrap_err(), PdcpError::UnknownBearer(7));
    }

    #[test]
    fn register_and_lookup() {
        let mut registry = BearerRegistry::new();
        let cfg = BearerConfig::builder(3, BearerType::Drb, Rat::Nr).build().unwrap();
        registry.register(PdcpEntity::new(cfg));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.get(3).unwrap().bearer_id(), 3);
    }
}
