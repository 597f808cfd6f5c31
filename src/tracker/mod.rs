//! Polling loop
//!
//! - `Tracker` - owns the capture source, matcher, input controller and clock
//! - `TickOutcome` / `TrackerState` - what each tick did
//! - `Clock` - injectable time source

mod clock;
mod runner;

pub use clock::{Clock, ManualClock, SystemClock};
pub use runner::{RunSummary, TickOutcome, Tracker, TrackerState};
