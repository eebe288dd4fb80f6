//! Deterministic `IdGenerator` for tests.

use std::sync::atomic::{AtomicU64, Ordering};

use progression_core::id::IdGenerator;
use uuid::Uuid;

/// Generates `prefix-0000…0001`, `prefix-0000…0002`, … so every id a test
/// run mints is predictable and distinct from ids created with `new_v4`.
#[derive(Debug)]
pub struct SequentialIdGenerator {
    prefix: u64,
    next: AtomicU64,
}

impl SequentialIdGenerator {
    /// Creates a generator whose ids share the high 64 bits `prefix`.
    #[must_use]
    pub fn new(prefix: u64) -> Self {
        Self {
            prefix,
            next: AtomicU64::new(1),
        }
    }

    /// Returns the id the `n`-th call (1-based) to `next_id` produces.
    #[must_use]
    pub fn nth(&self, n: u64) -> Uuid {
        Uuid::from_u64_pair(self.prefix, n)
    }
}

impl Default for SequentialIdGenerator {
    fn default() -> Self {
        Self::new(0xFEED)
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&self) -> Uuid {
        let n = self.next.fetch_add(1, Ordering::SeqCst);
        Uuid::from_u64_pair(self.prefix, n)
    }
}
