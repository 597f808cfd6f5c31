//! Marker Tracker
//!
//! Captures a small square at the centre of the screen, finds a visual marker
//! in it by template matching, and nudges the cursor onto the marker with a
//! relative move followed by a click.
//!
//! The pieces are owned values wired together by [`Tracker`]:
//! - [`vision::FrameSource`] grabs grayscale frames of the capture region
//! - [`vision::TemplateMatcher`] scores the template against each frame
//! - [`input::InputController`] polls the trigger/exit inputs and injects events
//! - [`tracker::Clock`] paces the loop
//!
//! Only Windows has platform backends; elsewhere the library builds and can be
//! driven through the mock sources.

pub mod config;
pub mod error;
pub mod input;
pub mod tracker;
pub mod vision;

// Re-export commonly used types
pub use config::{ScreenRegion, Sensitivity, TrackerConfig};
pub use error::{Result, TrackerError};
pub use input::{compute_offset, Input, InputController, InputDevice};
pub use tracker::{Clock, RunSummary, SystemClock, TickOutcome, Tracker, TrackerState};
pub use vision::{FrameSource, MatchResult, Template, TemplateMatcher};
