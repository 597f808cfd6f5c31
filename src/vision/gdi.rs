//! Windows screen capture via GDI BitBlt

#![cfg(target_os = "windows")]

use image::{DynamicImage, GrayImage, RgbaImage};
use windows::Win32::Graphics::Gdi::{
    BitBlt, CreateCompatibleBitmap, CreateCompatibleDC, DeleteDC, DeleteObject, GetDC, GetDIBits,
    ReleaseDC, SelectObject, BITMAPINFO, BITMAPINFOHEADER, BI_RGB, DIB_RGB_COLORS, HBITMAP, HDC,
    HGDIOBJ, SRCCOPY,
};
use windows::Win32::UI::HiDpi::{
    SetProcessDpiAwarenessContext, DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2,
};
use windows::Win32::UI::WindowsAndMessaging::{
    GetSystemMetrics, SetProcessDPIAware, SM_CXSCREEN, SM_CYSCREEN,
};

use super::capture::FrameSource;
use crate::config::ScreenRegion;
use crate::{Result, TrackerError};

/// Opt the process out of display scaling
///
/// Screen metrics and BitBlt coordinates are in physical pixels afterwards.
/// Call before querying any size. Falls back to system-wide awareness on
/// releases without per-monitor v2.
pub fn enable_dpi_awareness() -> bool {
    unsafe {
        match SetProcessDpiAwarenessContext(DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2) {
            Ok(()) => true,
            Err(e) => {
                log::debug!("Per-monitor DPI awareness unavailable: {}", e);
                SetProcessDPIAware().as_bool()
            }
        }
    }
}

/// Size of the primary display, if the system reports one
pub fn primary_screen_size() -> Option<(u32, u32)> {
    let (width, height) = unsafe { (GetSystemMetrics(SM_CXSCREEN), GetSystemMetrics(SM_CYSCREEN)) };
    if width > 0 && height > 0 {
        Some((width as u32, height as u32))
    } else {
        None
    }
}

/// Screen capture that owns its device contexts for its whole lifetime
pub struct GdiCapture {
    screen_dc: HDC,
    memory_dc: HDC,
    bitmap: HBITMAP,
    previous: HGDIOBJ,
    width: u32,
    height: u32,
}

impl GdiCapture {
    /// Allocate DCs and a bitmap sized for `width` x `height` captures
    pub fn new(width: u32, height: u32) -> Result<Self> {
        unsafe {
            let screen_dc = GetDC(None);
            if screen_dc.is_invalid() {
                return Err(TrackerError::Capture("GetDC returned no screen DC".into()));
            }

            let memory_dc = CreateCompatibleDC(screen_dc);
            if memory_dc.is_invalid() {
                ReleaseDC(None, screen_dc);
                return Err(TrackerError::Capture("CreateCompatibleDC failed".into()));
            }

            let bitmap = CreateCompatibleBitmap(screen_dc, width as i32, height as i32);
            if bitmap.is_invalid() {
                let _ = DeleteDC(memory_dc);
                ReleaseDC(None, screen_dc);
                return Err(TrackerError::Capture("CreateCompatibleBitmap failed".into()));
            }

            let previous = SelectObject(memory_dc, bitmap);

            log::debug!("GDI capture surface allocated ({}x{})", width, height);

            Ok(Self {
                screen_dc,
                memory_dc,
                bitmap,
                previous,
                width,
                height,
            })
        }
    }

    /// Copy the bitmap out as top-down BGRA rows
    fn read_bgra(&self) -> Result<Vec<u8>> {
        let mut info = BITMAPINFO {
            bmiHeader: BITMAPINFOHEADER {
                biSize: std::mem::size_of::<BITMAPINFOHEADER>() as u32,
                biWidth: self.width as i32,
                // Negative height gives top-down rows
                biHeight: -(self.height as i32),
                biPlanes: 1,
                biBitCount: 32,
                biCompression: BI_RGB.0,
                ..Default::default()
            },
            ..Default::default()
        };

        let mut buffer = vec![0u8; (self.width * self.height * 4) as usize];
        let lines = unsafe {
            GetDIBits(
                self.memory_dc,
                self.bitmap,
                0,
                self.height,
                Some(buffer.as_mut_ptr().cast()),
                &mut info,
                DIB_RGB_COLORS,
            )
        };

        if lines as u32 != self.height {
            return Err(TrackerError::Capture(format!(
                "GetDIBits copied {} of {} lines",
                lines, self.height
            )));
        }
        Ok(buffer)
    }
}

impl FrameSource for GdiCapture {
    fn capture(&mut self, region: &ScreenRegion) -> Result<GrayImage> {
        if region.width != self.width || region.height != self.height {
            *self = GdiCapture::new(region.width, region.height)?;
        }

        unsafe {
            BitBlt(
                self.memory_dc,
                0,
                0,
                self.width as i32,
                self.height as i32,
                self.screen_dc,
                region.left as i32,
                region.top as i32,
                SRCCOPY,
            )
        }
        .map_err(|e| TrackerError::Capture(format!("BitBlt failed: {}", e)))?;

        let mut pixels = self.read_bgra()?;
        for px in pixels.chunks_exact_mut(4) {
            px.swap(0, 2);
            px[3] = 255;
        }

        let rgba = RgbaImage::from_raw(self.width, self.height, pixels)
            .ok_or_else(|| TrackerError::Capture("pixel buffer size mismatch".into()))?;
        Ok(DynamicImage::ImageRgba8(rgba).to_luma8())
    }
}

impl Drop for GdiCapture {
    fn drop(&mut self) {
        unsafe {
            SelectObject(self.memory_dc, self.previous);
            let _ = DeleteObject(self.bitmap);
            let _ = DeleteDC(self.memory_dc);
            ReleaseDC(None, self.screen_dc);
        }
    }
}
