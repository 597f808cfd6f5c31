//! Tracker configuration
//!
//! Geometry, sensitivity, timing and key bindings live in a single
//! [`TrackerConfig`]. The defaults reproduce the stock setup: a 240px square
//! at the centre of a 1920x1080 screen, 0.8 acceptance threshold, 1ms poll.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::input::Input;
use crate::{Result, TrackerError};

/// Reference sensitivity the host application's movement units are calibrated against
pub const REFERENCE_SENSITIVITY: f64 = 0.55;

/// Screen rectangle that gets captured every poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenRegion {
    pub top: u32,
    pub left: u32,
    pub width: u32,
    pub height: u32,
}

impl ScreenRegion {
    /// Square of `size` pixels centred on a `screen_width` x `screen_height` screen
    pub fn centered(screen_width: u32, screen_height: u32, size: u32) -> Self {
        let radius = size / 2;
        Self {
            top: (screen_height / 2).saturating_sub(radius),
            left: (screen_width / 2).saturating_sub(radius),
            width: size,
            height: size,
        }
    }

    /// Half the region width; the distance from an edge to the crosshair
    pub fn radius(&self) -> u32 {
        self.width / 2
    }

    /// As `(top, left, width, height)`
    pub fn as_tuple(&self) -> (u32, u32, u32, u32) {
        (self.top, self.left, self.width, self.height)
    }
}

/// Sensitivity constants and the movement factor derived from them
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sensitivity {
    /// Host-level mouse sensitivity
    #[serde(default = "default_host_sensitivity")]
    pub host_sensitivity: f64,
    /// In-application mouse sensitivity
    #[serde(default = "default_app_mouse_sensitivity")]
    pub app_mouse_sensitivity: f64,
    /// In-application aim sensitivity multiplier
    #[serde(default = "default_app_aim_sensitivity")]
    pub app_aim_sensitivity: f64,
    /// Constant added on top of the scaled sensitivity
    #[serde(default = "default_movement_compensation")]
    pub movement_compensation: f64,
}

fn default_host_sensitivity() -> f64 {
    0.55
}

fn default_app_mouse_sensitivity() -> f64 {
    0.5
}

fn default_app_aim_sensitivity() -> f64 {
    1.0
}

fn default_movement_compensation() -> f64 {
    0.2
}

impl Default for Sensitivity {
    fn default() -> Self {
        Self {
            host_sensitivity: default_host_sensitivity(),
            app_mouse_sensitivity: default_app_mouse_sensitivity(),
            app_aim_sensitivity: default_app_aim_sensitivity(),
            movement_compensation: default_movement_compensation(),
        }
    }
}

impl Sensitivity {
    pub fn new(
        host_sensitivity: f64,
        app_mouse_sensitivity: f64,
        app_aim_sensitivity: f64,
        movement_compensation: f64,
    ) -> Self {
        Self {
            host_sensitivity,
            app_mouse_sensitivity,
            app_aim_sensitivity,
            movement_compensation,
        }
    }

    /// Scalar that converts a pixel offset into injected movement units
    pub fn factor(&self) -> f64 {
        let app = self.app_mouse_sensitivity * self.app_aim_sensitivity;
        (self.host_sensitivity * app) / REFERENCE_SENSITIVITY + self.movement_compensation
    }
}

/// Complete tracker configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackerConfig {
    #[serde(default = "default_screen_width")]
    pub screen_width: u32,
    #[serde(default = "default_screen_height")]
    pub screen_height: u32,
    /// Side length of the captured square
    #[serde(default = "default_capture_size")]
    pub capture_size: u32,
    /// Template image, loaded once at startup
    #[serde(default = "default_template_path")]
    pub template_path: PathBuf,
    /// Minimum confidence before the tracker acts
    #[serde(default = "default_threshold")]
    pub threshold: f32,
    /// Sleep between polls in milliseconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_click_delay_min")]
    pub click_delay_min_ms: u64,
    #[serde(default = "default_click_delay_max")]
    pub click_delay_max_ms: u64,
    /// Input that must be held for the tracker to capture and act
    #[serde(default = "default_trigger")]
    pub trigger: Input,
    /// Input that stops the loop
    #[serde(default = "default_exit")]
    pub exit: Input,
    #[serde(default = "default_exit_beep_hz")]
    pub exit_beep_hz: u32,
    #[serde(default = "default_exit_beep_ms")]
    pub exit_beep_ms: u64,
    #[serde(default)]
    pub sensitivity: Sensitivity,
}

fn default_screen_width() -> u32 {
    1920
}

fn default_screen_height() -> u32 {
    1080
}

fn default_capture_size() -> u32 {
    240
}

fn default_template_path() -> PathBuf {
    PathBuf::from("marker.png")
}

fn default_threshold() -> f32 {
    0.8
}

fn default_poll_interval() -> u64 {
    1
}

fn default_click_delay_min() -> u64 {
    10
}

fn default_click_delay_max() -> u64 {
    30
}

fn default_trigger() -> Input {
    Input::RightButton
}

fn default_exit() -> Input {
    Input::XButton2
}

fn default_exit_beep_hz() -> u32 {
    1000
}

fn default_exit_beep_ms() -> u64 {
    10
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            screen_width: default_screen_width(),
            screen_height: default_screen_height(),
            capture_size: default_capture_size(),
            template_path: default_template_path(),
            threshold: default_threshold(),
            poll_interval_ms: default_poll_interval(),
            click_delay_min_ms: default_click_delay_min(),
            click_delay_max_ms: default_click_delay_max(),
            trigger: default_trigger(),
            exit: default_exit(),
            exit_beep_hz: default_exit_beep_hz(),
            exit_beep_ms: default_exit_beep_ms(),
            sensitivity: Sensitivity::default(),
        }
    }
}

impl TrackerConfig {
    /// Parse a configuration from TOML; missing fields take their defaults
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: TrackerConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Set the screen dimensions
    pub fn with_screen_size(mut self, width: u32, height: u32) -> Self {
        self.screen_width = width;
        self.screen_height = height;
        self
    }

    /// Set the capture square size
    pub fn with_capture_size(mut self, size: u32) -> Self {
        self.capture_size = size;
        self
    }

    /// Set the acceptance threshold
    pub fn with_threshold(mut self, threshold: f32) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set the sensitivity constants
    pub fn with_sensitivity(mut self, sensitivity: Sensitivity) -> Self {
        self.sensitivity = sensitivity;
        self
    }

    /// Region captured every poll
    pub fn region(&self) -> ScreenRegion {
        ScreenRegion::centered(self.screen_width, self.screen_height, self.capture_size)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn exit_beep_duration(&self) -> Duration {
        Duration::from_millis(self.exit_beep_ms)
    }

    /// Check that the values describe a usable setup
    pub fn validate(&self) -> Result<()> {
        if self.capture_size == 0 {
            return Err(TrackerError::Config("capture_size must be positive".into()));
        }
        if self.capture_size > self.screen_width || self.capture_size > self.screen_height {
            return Err(TrackerError::Config(format!(
                "capture_size {} exceeds the {}x{} screen",
                self.capture_size, self.screen_width, self.screen_height
            )));
        }
        if !(-1.0..=1.0).contains(&self.threshold) {
            return Err(TrackerError::Config(format!(
                "threshold {} is outside [-1, 1]",
                self.threshold
            )));
        }
        if self.click_delay_min_ms > self.click_delay_max_ms {
            return Err(TrackerError::Config(format!(
                "click delay range {}..={}ms is inverted",
                self.click_delay_min_ms, self.click_delay_max_ms
            )));
        }
        if self.trigger == self.exit {
            log::warn!("Trigger and exit are both bound to {}", self.exit);
        }
        Ok(())
    }
}
