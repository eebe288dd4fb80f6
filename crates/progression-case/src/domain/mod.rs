//! Domain layer for the Case aggregate.

pub mod aggregates;
pub mod commands;
pub mod events;
