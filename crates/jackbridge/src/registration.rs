//! Port registration buffer
//!
//! The server announces port (un)registrations on its own notification thread.
//! That thread may not query the server back, so identifiers are only queued
//! here and inspected later on the poll thread.
//!
//! ```text
//! server notification thread          poll thread
//!        │                                 │
//!   push(id) ──► Mutex<Vec<PortId>> ◄── drain_into(&mut scratch)
//!                (held for one push        (swap under lock, inspect
//!                 or one swap)              scratch with lock released)
//! ```

use std::mem;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::types::PortId;

#[derive(Debug, Default)]
pub struct RegistrationBuffer {
    pending: Mutex<Vec<PortId>>,
}

impl RegistrationBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    // Only plain identifiers live behind the lock, so a panic elsewhere
    // cannot leave the queue half-updated.
    fn lock(&self) -> MutexGuard<'_, Vec<PortId>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue an identifier. Called from the server's notification thread.
    pub fn push(&self, id: PortId) {
        self.lock().push(id);
    }

    /// Move everything queued so far into `scratch`, in arrival order.
    ///
    /// `scratch` should be empty; when it is, the two vectors are swapped so
    /// neither side reallocates. Identifiers already in `scratch` are kept
    /// ahead of the drained ones.
    pub fn drain_into(&self, scratch: &mut Vec<PortId>) {
        let mut pending = self.lock();
        if pending.is_empty() {
            return;
        }
        if scratch.is_empty() {
            mem::swap(&mut *pending, scratch);
        } else {
            scratch.append(&mut pending);
        }
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drop everything queued and release the backing allocation.
    pub fn clear(&self) {
        *self.lock() = Vec::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_drain_preserves_arrival_order() {
        let buffer = RegistrationBuffer::new();
        buffer.push(PortId(7));
        buffer.push(PortId(3));
        buffer.push(PortId(9));

        let mut scratch = Vec::new();
        buffer.drain_into(&mut scratch);

        assert_eq!(scratch, vec![PortId(7), PortId(3), PortId(9)]);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_drain_on_empty_buffer_leaves_scratch_alone() {
        let buffer = RegistrationBuffer::new();
        let mut scratch = Vec::with_capacity(16);
        buffer.drain_into(&mut scratch);
        assert!(scratch.is_empty());
        assert!(scratch.capacity() >= 16);
    }

    #[test]
    fn test_drain_appends_behind_leftovers() {
        let buffer = RegistrationBuffer::new();
        buffer.push(PortId(2));

        let mut scratch = vec![PortId(1)];
        buffer.drain_into(&mut scratch);
        assert_eq!(scratch, vec![PortId(1), PortId(2)]);
    }

    #[test]
    fn test_interleaved_push_and_drain_delivers_each_id_once() {
        let buffer = RegistrationBuffer::new();
        let mut delivered = Vec::new();
        let mut scratch = Vec::new();

        for round in 0..10u32 {
            for i in 0..round {
                buffer.push(PortId(round * 100 + i));
            }
            buffer.drain_into(&mut scratch);
            delivered.append(&mut scratch);
        }

        let expected: Vec<PortId> = (0..10u32)
            .flat_map(|round| (0..round).map(move |i| PortId(round * 100 + i)))
            .collect();
        assert_eq!(delivered, expected);
    }

    #[test]
    fn test_concurrent_producers_lose_nothing() {
        let buffer = Arc::new(RegistrationBuffer::new());
        let producers: Vec<_> = (0..4u32)
            .map(|p| {
                let buffer = Arc::clone(&buffer);
                thread::spawn(move || {
                    for i in 0..1000 {
                        buffer.push(PortId(p * 10_000 + i));
                    }
                })
            })
            .collect();

        let mut delivered = Vec::new();
        let mut scratch = Vec::new();
        while producers.iter().any(|h| !h.is_finished()) {
            buffer.drain_into(&mut scratch);
            delivered.append(&mut scratch);
        }
        for handle in producers {
            handle.join().unwrap();
        }
        buffer.drain_into(&mut scratch);
        delivered.append(&mut scratch);

        assert_eq!(delivered.len(), 4000);
        // Per-producer order survives the interleaving
        for p in 0..4u32 {
            let ids: Vec<u32> = delivered
                .iter()
                .map(|id| id.0)
                .filter(|id| id / 10_000 == p)
                .collect();
            let expected: Vec<u32> = (0..1000).map(|i| p * 10_000 + i).collect();
            assert_eq!(ids, expected);
        }
    }

    #[test]
    fn test_clear_discards_pending() {
        let buffer = RegistrationBuffer::new();
        buffer.push(PortId(1));
        buffer.clear();
        assert_eq!(buffer.len(), 0);
    }
}
