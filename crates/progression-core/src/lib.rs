//! Progression Core — shared event-sourcing abstractions.
//!
//! This crate defines the fundamental traits and types that every aggregate
//! crate and the coordinator depend on: the event stream contract, the event
//! envelope, aggregate rehydration, decision outcomes and stream ownership.
//! It contains no infrastructure code.

pub mod aggregate;
pub mod clock;
pub mod command;
pub mod error;
pub mod event;
pub mod guard;
pub mod id;
pub mod outcome;
pub mod rehydrate;
pub mod repository;
pub mod stream;
