//! Trigger/exit polling and the move-and-click action

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::ops::RangeInclusive;
use std::time::Duration;

use super::{Input, InputDevice};
use crate::config::TrackerConfig;
use crate::tracker::Clock;
use crate::Result;

/// Movement needed to bring a match onto the region centre
///
/// `location` is the top-left corner of the matched window; adding
/// `template_center` gives the marker position inside the region. Each axis
/// is `(target - radius) * sensitivity`, truncated toward zero.
pub fn compute_offset(
    location: (u32, u32),
    template_center: (u32, u32),
    region_radius: u32,
    sensitivity: f64,
) -> (i32, i32) {
    let axis = |loc: u32, center: u32| {
        let target = f64::from(loc) + f64::from(center);
        (-(f64::from(region_radius) - target) * sensitivity) as i32
    };
    (
        axis(location.0, template_center.0),
        axis(location.1, template_center.1),
    )
}

/// Wraps an [`InputDevice`] with the configured bindings
pub struct InputController<D: InputDevice> {
    device: D,
    trigger: Input,
    exit: Input,
    click_delay_ms: RangeInclusive<u64>,
    rng: StdRng,
}

impl<D: InputDevice> InputController<D> {
    pub fn new(device: D, config: &TrackerConfig) -> Self {
        Self {
            device,
            trigger: config.trigger,
            exit: config.exit,
            click_delay_ms: config.click_delay_min_ms..=config.click_delay_max_ms,
            rng: StdRng::from_entropy(),
        }
    }

    /// Replace the random source used for click delays
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn is_trigger_held(&self) -> Result<bool> {
        self.device.is_pressed(self.trigger)
    }

    pub fn is_exit_requested(&self) -> Result<bool> {
        self.device.is_pressed(self.exit)
    }

    pub fn trigger(&self) -> Input {
        self.trigger
    }

    pub fn exit(&self) -> Input {
        self.exit
    }

    /// Move by `(dx, dy)` then click the left button
    ///
    /// The button is held for a random delay from the configured range.
    /// Returns the delay that was used.
    pub fn move_and_click(&mut self, dx: i32, dy: i32, clock: &dyn Clock) -> Result<Duration> {
        self.device.move_relative(dx, dy)?;
        self.device.left_down()?;

        let hold = Duration::from_millis(self.rng.gen_range(self.click_delay_ms.clone()));
        clock.sleep(hold);

        self.device.left_up()?;
        Ok(hold)
    }

    pub fn beep(&mut self, frequency_hz: u32, duration: Duration) -> Result<()> {
        self.device.beep(frequency_hz, duration)
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }
}
