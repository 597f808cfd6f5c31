//! Screen capture functionality

use image::GrayImage;
use std::collections::VecDeque;
use std::path::Path;

use crate::config::ScreenRegion;
use crate::{Result, TrackerError};

/// Something that can produce grayscale frames of a screen region
pub trait FrameSource {
    /// Grab `region` as a `region.width` x `region.height` grayscale image
    fn capture(&mut self, region: &ScreenRegion) -> Result<GrayImage>;
}

/// Load an image file and convert it to grayscale
pub fn load_template(path: impl AsRef<Path>) -> Result<GrayImage> {
    let path = path.as_ref();
    let image = image::open(path).map_err(|source| TrackerError::Template {
        path: path.to_path_buf(),
        source,
    })?;
    let gray = image.to_luma8();
    log::info!(
        "Loaded template {:?} ({}x{})",
        path,
        gray.width(),
        gray.height()
    );
    Ok(gray)
}

// =============================================================================
// Mock Implementation for Testing
// =============================================================================

/// Frame source that replays prepared frames
///
/// Frames are returned in order; the last one repeats forever. Frames are
/// handed back as-is, whatever region is requested.
#[derive(Debug, Default)]
pub struct MockCapture {
    frames: VecDeque<GrayImage>,
    requested: Vec<ScreenRegion>,
    fail: bool,
}

impl MockCapture {
    /// Always return `frame`
    pub fn new(frame: GrayImage) -> Self {
        Self::with_frames(vec![frame])
    }

    pub fn with_frames(frames: Vec<GrayImage>) -> Self {
        Self {
            frames: frames.into(),
            requested: Vec::new(),
            fail: false,
        }
    }

    /// A source whose every capture fails
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Regions passed to `capture`, in order
    pub fn requested(&self) -> &[ScreenRegion] {
        &self.requested
    }
}

impl FrameSource for MockCapture {
    fn capture(&mut self, region: &ScreenRegion) -> Result<GrayImage> {
        self.requested.push(*region);
        if self.fail {
            return Err(TrackerError::Capture("mock capture failure".into()));
        }

        let frame = if self.frames.len() > 1 {
            self.frames.pop_front()
        } else {
            self.frames.front().cloned()
        };
        frame.ok_or_else(|| TrackerError::Capture("no frames queued".into()))
    }
}
