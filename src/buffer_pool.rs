// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Byte-buffer allocation (§9 "Shared byte-buffer pool", §5 "Shared
//! resources"). The source this crate is grounded on uses a process-wide
//! buffer pool with a type-erased destructor; this crate re-architects
//! that as a plain allocator the entity holds a handle to, with buffer
//! ownership transferred by move at every API boundary. There is no
//! global mutable pool.

/// A handle to an allocator producing PDU-sized scratch buffers. Cloning a
/// handle does not clone pool state; it is meant to be held by each entity
/// that needs one, not shared through a global.
#[derive(Debug, Clone, Default)]
pub struct BufferPool {
    capacity_hint: usize,
}

impl BufferPool {
    pub fn new(capacity_hint: usize) -> Self {
        Self { capacity_hint }
    }

    /// Allocates a zero-length buffer with capacity reserved for a PDU of
    /// roughly the pool's configured size. Ownership moves to the caller;
    /// there is nothing to return to the pool.
    pub fn acquire(&self) -> Vec<u8> {
        Vec::with_capacity(self.capacity_hint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_reserves_capacity() {
        let pool = BufferPool::new(256);
        let buf = pool.acquire();
        assert!(buf.capacity() >= 256);
        assert!(buf.is_empty());
    }
}
