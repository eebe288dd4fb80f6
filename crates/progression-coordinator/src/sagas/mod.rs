//! Multi-stream sagas.
//!
//! Each saga appends to one stream at a time in a fixed order and never
//! compensates. Every step re-reads the state it depends on, so a saga that
//! stopped part-way can be restarted from the beginning.

pub mod add_case_to_group;
pub mod add_civil_fee;
pub mod remove_case_from_group;
