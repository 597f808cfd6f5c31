//! Tracker runner
//!
//! Polls input every tick; while the trigger is held it captures the region,
//! matches the template and acts on confident matches.

use rand::rngs::StdRng;
use std::time::Duration;

use super::clock::Clock;
use crate::config::{ScreenRegion, TrackerConfig};
use crate::input::{compute_offset, InputController, InputDevice};
use crate::vision::{FrameSource, TemplateMatcher};
use crate::{Result, TrackerError};

const STATS_INTERVAL: Duration = Duration::from_secs(5);

/// What the tracker did on its last tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerState {
    /// Trigger not held
    Idle,
    /// Trigger held, no confident match
    Seeking,
    /// Trigger held, confident match acted on
    Acting,
}

/// Result of a single tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TickOutcome {
    /// Exit input asserted; the loop should stop
    Exit,
    Idle,
    Seeking {
        confidence: f32,
    },
    Acted {
        location: (u32, u32),
        confidence: f32,
        dx: i32,
        dy: i32,
    },
}

/// Counters accumulated over a run
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunSummary {
    pub ticks: u64,
    pub captures: u64,
    pub actions: u64,
    /// Highest confidence seen in any capture
    pub best_confidence: Option<f32>,
}

/// The polling loop and everything it drives
pub struct Tracker<S: FrameSource, D: InputDevice, C: Clock> {
    config: TrackerConfig,
    region: ScreenRegion,
    factor: f64,
    source: S,
    matcher: TemplateMatcher,
    input: InputController<D>,
    clock: C,
    state: TrackerState,
    summary: RunSummary,
    last_stats: Duration,
}

impl<S: FrameSource, D: InputDevice, C: Clock> Tracker<S, D, C> {
    /// Build a tracker from owned handles
    ///
    /// Trigger, exit and click timing for `device` are taken from `config`.
    /// Fails if the configuration is invalid or the template cannot fit in
    /// the capture region.
    pub fn new(
        config: TrackerConfig,
        source: S,
        matcher: TemplateMatcher,
        device: D,
        clock: C,
    ) -> Result<Self> {
        config.validate()?;

        let region = config.region();
        let template = matcher.template();
        if template.width() > region.width || template.height() > region.height {
            return Err(TrackerError::TemplateTooLarge {
                template_width: template.width(),
                template_height: template.height(),
                frame_width: region.width,
                frame_height: region.height,
            });
        }

        let input = InputController::new(device, &config);
        let factor = config.sensitivity.factor();
        log::info!(
            "Tracking region top={} left={} size={}x{}, sensitivity factor {:.3}, threshold {:.2}",
            region.top,
            region.left,
            region.width,
            region.height,
            factor,
            config.threshold
        );

        let last_stats = clock.now();
        Ok(Self {
            config,
            region,
            factor,
            source,
            matcher,
            input,
            clock,
            state: TrackerState::Idle,
            summary: RunSummary::default(),
            last_stats,
        })
    }

    /// Replace the random source used for click hold delays
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.input = self.input.with_rng(rng);
        self
    }

    /// Sleep one poll interval, then check exit, trigger and the screen
    pub fn tick(&mut self) -> Result<TickOutcome> {
        self.clock.sleep(self.config.poll_interval());
        self.summary.ticks += 1;

        if self.input.is_exit_requested()? {
            return Ok(TickOutcome::Exit);
        }

        if !self.input.is_trigger_held()? {
            self.state = TrackerState::Idle;
            return Ok(TickOutcome::Idle);
        }

        let frame = self.source.capture(&self.region)?;
        let result = self.matcher.find(&frame)?;
        self.summary.captures += 1;
        self.summary.best_confidence = Some(match self.summary.best_confidence {
            Some(best) => best.max(result.confidence),
            None => result.confidence,
        });

        if !result.is_confident(self.config.threshold) {
            self.state = TrackerState::Seeking;
            return Ok(TickOutcome::Seeking {
                confidence: result.confidence,
            });
        }

        let (dx, dy) = compute_offset(
            result.location,
            self.matcher.template().center(),
            self.region.radius(),
            self.factor,
        );
        log::debug!(
            "Match at {:?} ({:.3}), moving ({}, {})",
            result.location,
            result.confidence,
            dx,
            dy
        );

        self.input.move_and_click(dx, dy, &self.clock)?;
        self.state = TrackerState::Acting;
        self.summary.actions += 1;

        Ok(TickOutcome::Acted {
            location: result.location,
            confidence: result.confidence,
            dx,
            dy,
        })
    }

    /// Tick until the exit input is asserted
    ///
    /// Errors from capture, matching or input end the run immediately.
    pub fn run(&mut self) -> Result<RunSummary> {
        log::info!("Tracker started, {} to exit", self.input.exit());

        loop {
            if self.tick()? == TickOutcome::Exit {
                break;
            }
            self.log_stats();
        }

        self.input
            .beep(self.config.exit_beep_hz, self.config.exit_beep_duration())?;

        log::info!(
            "Tracker stopped after {} ticks: {} captures, {} actions",
            self.summary.ticks,
            self.summary.captures,
            self.summary.actions
        );
        Ok(self.summary)
    }

    fn log_stats(&mut self) {
        let now = self.clock.now();
        if now.saturating_sub(self.last_stats) < STATS_INTERVAL {
            return;
        }
        self.last_stats = now;
        log::debug!(
            "{} ticks, {} captures, {} actions, best confidence {:?}",
            self.summary.ticks,
            self.summary.captures,
            self.summary.actions,
            self.summary.best_confidence
        );
    }

    pub fn state(&self) -> TrackerState {
        self.state
    }

    pub fn summary(&self) -> RunSummary {
        self.summary
    }

    pub fn region(&self) -> ScreenRegion {
        self.region
    }

    pub fn input(&self) -> &InputController<D> {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut InputController<D> {
        &mut self.input
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}
