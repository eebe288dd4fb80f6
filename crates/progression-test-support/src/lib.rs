//! Shared test fakes and utilities for the court-case progression service.

mod clock;
mod id;
mod repository;

pub use clock::{FixedClock, fixed_now};
pub use id::SequentialIdGenerator;
pub use repository::{
    AppendCall, FailingEventRepository, Fault, FaultInjectingEventRepository,
    RecordingEventRepository,
};
