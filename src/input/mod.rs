//! Input polling and injection
//!
//! Logical inputs are named by [`Input`] and only translated to platform
//! key codes inside a backend. [`InputDevice`] is the seam between the
//! tracker and the OS, so the loop can be driven by [`MockInput`] in tests.

mod controller;

#[cfg(target_os = "windows")]
mod windows;

pub use controller::{compute_offset, InputController};

#[cfg(target_os = "windows")]
pub use windows::WindowsInput;

use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

use crate::Result;

/// A key or mouse button the tracker can poll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Input {
    LeftButton,
    RightButton,
    MiddleButton,
    XButton1,
    XButton2,
    Numpad0,
    Numpad1,
    Numpad2,
    Numpad3,
    Numpad4,
    Numpad5,
    Numpad6,
    Numpad7,
    Numpad8,
    Numpad9,
    Escape,
    F1,
    F2,
    F3,
    F4,
    F5,
    F6,
    F7,
    F8,
    F9,
    F10,
    F11,
    F12,
}

impl fmt::Display for Input {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Input::LeftButton => write!(f, "left mouse button"),
            Input::RightButton => write!(f, "right mouse button"),
            Input::MiddleButton => write!(f, "middle mouse button"),
            Input::XButton1 => write!(f, "mouse button 4"),
            Input::XButton2 => write!(f, "mouse button 5"),
            Input::Numpad0 => write!(f, "Numpad 0"),
            Input::Numpad1 => write!(f, "Numpad 1"),
            Input::Numpad2 => write!(f, "Numpad 2"),
            Input::Numpad3 => write!(f, "Numpad 3"),
            Input::Numpad4 => write!(f, "Numpad 4"),
            Input::Numpad5 => write!(f, "Numpad 5"),
            Input::Numpad6 => write!(f, "Numpad 6"),
            Input::Numpad7 => write!(f, "Numpad 7"),
            Input::Numpad8 => write!(f, "Numpad 8"),
            Input::Numpad9 => write!(f, "Numpad 9"),
            Input::Escape => write!(f, "Escape"),
            Input::F1 => write!(f, "F1"),
            Input::F2 => write!(f, "F2"),
            Input::F3 => write!(f, "F3"),
            Input::F4 => write!(f, "F4"),
            Input::F5 => write!(f, "F5"),
            Input::F6 => write!(f, "F6"),
            Input::F7 => write!(f, "F7"),
            Input::F8 => write!(f, "F8"),
            Input::F9 => write!(f, "F9"),
            Input::F10 => write!(f, "F10"),
            Input::F11 => write!(f, "F11"),
            Input::F12 => write!(f, "F12"),
        }
    }
}

/// A synthetic event sent to the OS
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// Relative cursor movement in device units
    Move { dx: i32, dy: i32 },
    /// Left button pressed
    LeftDown,
    /// Left button released
    LeftUp,
    Beep { frequency_hz: u32, duration: Duration },
}

/// Polls input state and injects synthetic events
pub trait InputDevice {
    /// Whether `input` is currently held down
    fn is_pressed(&self, input: Input) -> Result<bool>;

    /// Inject a relative mouse move
    fn move_relative(&mut self, dx: i32, dy: i32) -> Result<()>;

    fn left_down(&mut self) -> Result<()>;

    fn left_up(&mut self) -> Result<()>;

    /// Play a short tone
    fn beep(&mut self, frequency_hz: u32, duration: Duration) -> Result<()>;
}

// =============================================================================
// Mock Implementation for Testing
// =============================================================================

/// Scripted input device that records everything injected into it
///
/// Held inputs stay pressed until released. The exit input can also be
/// scheduled to assert itself after a number of polls.
#[derive(Debug, Default)]
pub struct MockInput {
    held: HashSet<Input>,
    press_after: Vec<(Input, usize)>,
    polls: Cell<usize>,
    events: Vec<InputEvent>,
}

impl MockInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold `input` down from the start
    pub fn with_held(mut self, input: Input) -> Self {
        self.held.insert(input);
        self
    }

    /// Report `input` as pressed once it has been polled `polls` times
    pub fn with_press_after(mut self, input: Input, polls: usize) -> Self {
        self.press_after.push((input, polls));
        self
    }

    pub fn press(&mut self, input: Input) {
        self.held.insert(input);
    }

    pub fn release(&mut self, input: Input) {
        self.held.remove(&input);
    }

    /// Everything injected so far, in order
    pub fn events(&self) -> &[InputEvent] {
        &self.events
    }

    /// Only the movement events
    pub fn moves(&self) -> Vec<(i32, i32)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                InputEvent::Move { dx, dy } => Some((*dx, *dy)),
                _ => None,
            })
            .collect()
    }

    /// Number of times any input was polled
    pub fn poll_count(&self) -> usize {
        self.polls.get()
    }
}

impl InputDevice for MockInput {
    fn is_pressed(&self, input: Input) -> Result<bool> {
        let polls = self.polls.get() + 1;
        self.polls.set(polls);

        if self.held.contains(&input) {
            return Ok(true);
        }
        Ok(self
            .press_after
            .iter()
            .any(|(scheduled, after)| *scheduled == input && polls > *after))
    }

    fn move_relative(&mut self, dx: i32, dy: i32) -> Result<()> {
        self.events.push(InputEvent::Move { dx, dy });
        Ok(())
    }

    fn left_down(&mut self) -> Result<()> {
        self.events.push(InputEvent::LeftDown);
        Ok(())
    }

    fn left_up(&mut self) -> Result<()> {
        self.events.push(InputEvent::LeftUp);
        Ok(())
    }

    fn beep(&mut self, frequency_hz: u32, duration: Duration) -> Result<()> {
        self.events.push(InputEvent::Beep {
            frequency_hz,
            duration,
        });
        Ok(())
    }
}
