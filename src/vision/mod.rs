//! Screen capture and marker detection
//!
//! Frames come from a [`FrameSource`], are matched against a fixed
//! [`Template`] by [`TemplateMatcher`], and the best placement is reported as
//! a [`MatchResult`] whether or not it clears the acceptance threshold.
//!
//! # Example
//!
//! ```ignore
//! use marker_tracker::vision::{load_template, Template, TemplateMatcher};
//!
//! let matcher = TemplateMatcher::new(Template::new(load_template("marker.png")?));
//! let result = matcher.find(&frame)?;
//! if result.is_confident(0.8) {
//!     println!("marker at {:?}", result.location);
//! }
//! ```

pub mod capture;
pub mod detector;

#[cfg(target_os = "windows")]
mod gdi;

pub use capture::{load_template, FrameSource, MockCapture};
pub use detector::{MatchResult, ScoreMap, Template, TemplateMatcher};

#[cfg(target_os = "windows")]
pub use gdi::{enable_dpi_awareness, primary_screen_size, GdiCapture};
