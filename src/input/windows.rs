//! Windows input backend (GetAsyncKeyState / SendInput / Beep)

#![cfg(target_os = "windows")]

use std::time::Duration;

use windows::Win32::System::Diagnostics::Debug::Beep;
use windows::Win32::UI::Input::KeyboardAndMouse::{
    GetAsyncKeyState, SendInput, INPUT, INPUT_0, INPUT_MOUSE, MOUSEEVENTF_LEFTDOWN,
    MOUSEEVENTF_LEFTUP, MOUSEEVENTF_MOVE, MOUSEINPUT, MOUSE_EVENT_FLAGS, VIRTUAL_KEY,
    VK_ESCAPE, VK_F1, VK_F10, VK_F11, VK_F12, VK_F2, VK_F3, VK_F4, VK_F5, VK_F6, VK_F7, VK_F8,
    VK_F9, VK_LBUTTON, VK_MBUTTON, VK_NUMPAD0, VK_NUMPAD1, VK_NUMPAD2, VK_NUMPAD3, VK_NUMPAD4,
    VK_NUMPAD5, VK_NUMPAD6, VK_NUMPAD7, VK_NUMPAD8, VK_NUMPAD9, VK_RBUTTON, VK_XBUTTON1,
    VK_XBUTTON2,
};

use super::{Input, InputDevice};
use crate::{Result, TrackerError};

/// Virtual-key code for a logical input
fn virtual_key(input: Input) -> VIRTUAL_KEY {
    match input {
        Input::LeftButton => VK_LBUTTON,
        Input::RightButton => VK_RBUTTON,
        Input::MiddleButton => VK_MBUTTON,
        Input::XButton1 => VK_XBUTTON1,
        Input::XButton2 => VK_XBUTTON2,
        Input::Numpad0 => VK_NUMPAD0,
        Input::Numpad1 => VK_NUMPAD1,
        Input::Numpad2 => VK_NUMPAD2,
        Input::Numpad3 => VK_NUMPAD3,
        Input::Numpad4 => VK_NUMPAD4,
        Input::Numpad5 => VK_NUMPAD5,
        Input::Numpad6 => VK_NUMPAD6,
        Input::Numpad7 => VK_NUMPAD7,
        Input::Numpad8 => VK_NUMPAD8,
        Input::Numpad9 => VK_NUMPAD9,
        Input::Escape => VK_ESCAPE,
        Input::F1 => VK_F1,
        Input::F2 => VK_F2,
        Input::F3 => VK_F3,
        Input::F4 => VK_F4,
        Input::F5 => VK_F5,
        Input::F6 => VK_F6,
        Input::F7 => VK_F7,
        Input::F8 => VK_F8,
        Input::F9 => VK_F9,
        Input::F10 => VK_F10,
        Input::F11 => VK_F11,
        Input::F12 => VK_F12,
    }
}

/// Input device backed by the Win32 input APIs
#[derive(Debug, Default)]
pub struct WindowsInput;

impl WindowsInput {
    pub fn new() -> Self {
        Self
    }

    fn send_mouse(&self, dx: i32, dy: i32, flags: MOUSE_EVENT_FLAGS) -> Result<()> {
        let input = INPUT {
            r#type: INPUT_MOUSE,
            Anonymous: INPUT_0 {
                mi: MOUSEINPUT {
                    dx,
                    dy,
                    dwFlags: flags,
                    ..Default::default()
                },
            },
        };

        let sent = unsafe { SendInput(&[input], std::mem::size_of::<INPUT>() as i32) };
        if sent == 1 {
            Ok(())
        } else {
            Err(TrackerError::Input(format!(
                "SendInput accepted {} of 1 events ({:?})",
                sent,
                windows::core::Error::from_win32()
            )))
        }
    }
}

impl InputDevice for WindowsInput {
    fn is_pressed(&self, input: Input) -> Result<bool> {
        // High bit set means the key is down right now
        let state = unsafe { GetAsyncKeyState(i32::from(virtual_key(input).0)) };
        Ok(state < 0)
    }

    fn move_relative(&mut self, dx: i32, dy: i32) -> Result<()> {
        self.send_mouse(dx, dy, MOUSEEVENTF_MOVE)
    }

    fn left_down(&mut self) -> Result<()> {
        self.send_mouse(0, 0, MOUSEEVENTF_LEFTDOWN)
    }

    fn left_up(&mut self) -> Result<()> {
        self.send_mouse(0, 0, MOUSEEVENTF_LEFTUP)
    }

    fn beep(&mut self, frequency_hz: u32, duration: Duration) -> Result<()> {
        let ms = u32::try_from(duration.as_millis()).unwrap_or(u32::MAX);
        unsafe { Beep(frequency_hz, ms) }
            .map_err(|e| TrackerError::Input(format!("Beep failed: {}", e)))
    }
}
