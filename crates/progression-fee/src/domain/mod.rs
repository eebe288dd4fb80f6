//! Domain layer for the Fee aggregate.

pub mod aggregates;
pub mod commands;
pub mod events;
