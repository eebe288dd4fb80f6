//! Domain layer for the Group aggregate.

pub mod aggregates;
pub mod commands;
pub mod events;
