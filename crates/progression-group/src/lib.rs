//! Court-case progression — Group aggregate.
//!
//! Responsible for which cases belong to a case group and which one of them
//! is the group master.

pub mod application;
pub mod domain;
