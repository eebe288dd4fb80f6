//! Court-case progression — Case aggregate.
//!
//! Responsible for a prosecution case's defendants, its membership of a
//! case group, the civil fees it references and its ejection.

pub mod application;
pub mod domain;
