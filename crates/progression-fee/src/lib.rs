//! Court-case progression — Fee aggregate.
//!
//! Responsible for civil fee records: their creation, their duplication for
//! a case leaving a group, and their payment status.

pub mod application;
pub mod domain;
