// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Timed playback of a [`SkeletonAnimator`] in a window.

use image::DynamicImage;

use crate::animation::SkeletonAnimator;
use crate::annotate::load_font;
use crate::config::{MAX_PLOT_SIZE, MIN_PLOT_SIZE};
use crate::error::Result;
use crate::visualizer::canvas::Canvas;
use crate::visualizer::viewer::Viewer;
use crate::{verbose, warn};

/// Window title of the animation.
pub const PLAYER_TITLE: &str = "Skeleton Replay";

/// Plays an animation at its frame interval until the window is closed.
#[derive(Debug, Clone, Copy)]
pub struct Player {
    plot_size: usize,
    repeat: bool,
}

impl Player {
    /// Create a player with a square window of `plot_size` pixels.
    ///
    /// The size is clamped to [`MIN_PLOT_SIZE`]..=[`MAX_PLOT_SIZE`].
    #[must_use]
    pub fn new(plot_size: usize, repeat: bool) -> Self {
        Self {
            plot_size: plot_size.clamp(MIN_PLOT_SIZE, MAX_PLOT_SIZE),
            repeat,
        }
    }

    /// Play `animator`, blocking until the window is closed.
    ///
    /// With `repeat` the animation loops; otherwise the last frame stays on
    /// screen after one pass. Returns the number of frames displayed.
    ///
    /// # Errors
    ///
    /// Returns an error if the window cannot be created or updated.
    pub fn play(&self, animator: &SkeletonAnimator<'_>) -> Result<usize> {
        if animator.is_empty() {
            warn!("No frames recorded, nothing to replay");
            return Ok(0);
        }

        let side = u32::try_from(self.plot_size).unwrap_or(u32::MAX);
        let mut canvas = Canvas::new(side, side).with_font(load_font("Arial.ttf"));
        let mut viewer = Viewer::new(PLAYER_TITLE, self.plot_size, self.plot_size)?;
        let interval = animator.interval();

        verbose!(
            "Replaying {} frames every {:.2}ms{}",
            animator.len(),
            interval.as_secs_f64() * 1000.0,
            if self.repeat { ", looping" } else { "" }
        );

        let mut shown = 0;
        loop {
            for frame in 0..animator.len() {
                let commands = animator.render(frame)?;
                let image = DynamicImage::ImageRgb8(canvas.draw(&commands).clone());
                if !viewer.update(&image)? || !viewer.wait(interval)? {
                    return Ok(shown);
                }
                shown += 1;
            }

            if !self.repeat {
                while viewer.wait(interval)? {}
                return Ok(shown);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plot_size_clamped() {
        assert_eq!(Player::new(100_000, true).plot_size, MAX_PLOT_SIZE);
        assert_eq!(Player::new(1, false).plot_size, MIN_PLOT_SIZE);
        assert_eq!(Player::new(800, true).plot_size, 800);
    }
}
