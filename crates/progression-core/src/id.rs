//! Identifier generation abstraction for determinism.
//!
//! In production, ids are random v4 UUIDs. In tests and replays, a
//! sequential implementation is injected so event and fee ids are known in
//! advance.

use uuid::Uuid;

/// Abstraction over UUID generation.
pub trait IdGenerator: Send + Sync {
    /// Returns a fresh identifier.
    fn next_id(&self) -> Uuid;
}

/// Production generator backed by random v4 UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomIdGenerator;

impl IdGenerator for RandomIdGenerator {
    fn next_id(&self) -> Uuid {
        Uuid::new_v4()
    }
}
