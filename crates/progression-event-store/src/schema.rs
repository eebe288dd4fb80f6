//! Postgres details the event store interprets. The table itself is created
//! by the SQL migrations in the workspace `migrations/` directory.

/// Postgres error code for a unique-constraint violation.
pub(crate) const UNIQUE_VIOLATION: &str = "23505";
