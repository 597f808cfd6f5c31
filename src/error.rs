//! Error types for the tracker

use std::path::PathBuf;
use thiserror::Error;

/// Result type for tracker operations
pub type Result<T> = std::result::Result<T, TrackerError>;

/// Error type for everything the tracker can fail at
///
/// None of these are retried; the loop stops on the first one.
#[derive(Debug, Error)]
pub enum TrackerError {
    /// The template image could not be read or decoded
    #[error("failed to load template '{path}': {source}")]
    Template {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The template does not fit inside the captured frame
    #[error(
        "template {template_width}x{template_height} does not fit in a {frame_width}x{frame_height} frame"
    )]
    TemplateTooLarge {
        template_width: u32,
        template_height: u32,
        frame_width: u32,
        frame_height: u32,
    },

    /// Screen capture failed
    #[error("screen capture failed: {0}")]
    Capture(String),

    /// Reading input state or injecting events failed
    #[error("input error: {0}")]
    Input(String),

    /// Configuration values are inconsistent
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Configuration text could not be parsed
    #[error("failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// The current platform has no backend for this operation
    #[error("{0} is not supported on this platform")]
    Unsupported(&'static str),
}
