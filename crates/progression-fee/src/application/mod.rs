//! Application layer for the Fee aggregate.

pub mod command_handlers;
pub mod query_handlers;
