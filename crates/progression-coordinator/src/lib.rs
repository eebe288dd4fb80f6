//! Court-case progression — coordination across streams.
//!
//! Commands that touch a single stream go straight to their aggregate's
//! handler. Commands spanning case, group and fee streams run as forward-only
//! sagas. Every command enters through the [`dispatch::CommandDispatcher`],
//! which retries the whole command when an append loses an optimistic
//! concurrency race.

pub mod dispatch;
pub mod retry;
pub mod sagas;
