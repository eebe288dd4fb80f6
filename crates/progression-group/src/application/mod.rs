//! Application layer for the Group aggregate.

pub mod query_handlers;
