//! Application layer for the Case aggregate.

pub mod command_handlers;
pub mod query_handlers;
