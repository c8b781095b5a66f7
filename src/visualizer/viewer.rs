// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Window for preview frames and the skeleton animation.

use std::time::{Duration, Instant};

use image::DynamicImage;
use minifb::{Key, Window, WindowOptions};

use crate::error::{ReplayError, Result};

/// A simple image window using minifb.
pub struct Viewer {
    window: Window,
    /// Width of the last shown image.
    pub width: usize,
    /// Height of the last shown image.
    pub height: usize,
    buffer: Vec<u32>,
}

impl Viewer {
    /// Create a new viewer window.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::VisualizerError`] if the window cannot be created.
    pub fn new(title: &str, width: usize, height: usize) -> Result<Self> {
        let mut window = Window::new(
            title,
            width,
            height,
            WindowOptions {
                resize: true,
                ..WindowOptions::default()
            },
        )
        .map_err(|e| ReplayError::VisualizerError(format!("Failed to create window: {e}")))?;

        window.set_target_fps(60);

        Ok(Self {
            window,
            width,
            height,
            buffer: Vec::new(),
        })
    }

    /// Check if the window is still open and no quit key (`q`, `Esc`) is held.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.window.is_open()
            && !self.window.is_key_down(Key::Escape)
            && !self.window.is_key_down(Key::Q)
    }

    /// Show an image. Returns `Ok(false)` once the user closed the window.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::VisualizerError`] if the window cannot be updated.
    pub fn update(&mut self, image: &DynamicImage) -> Result<bool> {
        if !self.is_open() {
            return Ok(false);
        }

        let rgb = image.to_rgb8();
        let (img_width, img_height) = (rgb.width() as usize, rgb.height() as usize);

        // minifb expects one u32 per pixel: 0x00RRGGBB
        self.buffer.clear();
        self.buffer.extend(rgb.pixels().map(|p| {
            (u32::from(p[0]) << 16) | (u32::from(p[1]) << 8) | u32::from(p[2])
        }));
        self.width = img_width;
        self.height = img_height;

        self.window
            .update_with_buffer(&self.buffer, self.width, self.height)
            .map_err(|e| ReplayError::VisualizerError(format!("Failed to update window: {e}")))?;

        Ok(true)
    }

    /// Keep the current image on screen for `duration` while handling window events.
    ///
    /// Returns `Ok(false)` as soon as the user closes the window.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::VisualizerError`] if the window cannot be updated.
    pub fn wait(&mut self, duration: Duration) -> Result<bool> {
        if self.buffer.is_empty() {
            std::thread::sleep(duration);
            return Ok(self.is_open());
        }

        let start = Instant::now();
        loop {
            if !self.is_open() {
                return Ok(false);
            }
            if start.elapsed() >= duration {
                return Ok(true);
            }
            self.window
                .update_with_buffer(&self.buffer, self.width, self.height)
                .map_err(|e| {
                    ReplayError::VisualizerError(format!("Failed to update window: {e}"))
                })?;
        }
    }
}
