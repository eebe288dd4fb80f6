//! Route modules: the command endpoint plus one read router per aggregate.

pub mod cases;
pub mod commands;
pub mod fees;
pub mod groups;
pub mod health;
