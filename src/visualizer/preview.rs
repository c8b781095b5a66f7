// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Live preview of annotated frames during extraction.

use image::DynamicImage;

use crate::annotate::annotate_detection;
use crate::detector::Detection;
use crate::error::Result;
use crate::extract::FramePreview;
use crate::visualizer::viewer::Viewer;

/// Window title of the extraction preview.
pub const PREVIEW_TITLE: &str = "Holistic Preview";

/// Selfie-view preview window, opened on the first frame.
///
/// Frames are annotated with the detected landmarks and mirrored horizontally.
#[derive(Default)]
pub struct WindowPreview {
    viewer: Option<Viewer>,
}

impl WindowPreview {
    /// Create a preview; the window opens with the first frame.
    #[must_use]
    pub const fn new() -> Self {
        Self { viewer: None }
    }
}

impl FramePreview for WindowPreview {
    fn show(&mut self, frame: &DynamicImage, detection: &Detection) -> Result<bool> {
        let annotated = annotate_detection(frame, detection).fliph();
        let (width, height) = (annotated.width() as usize, annotated.height() as usize);

        let viewer = match self.viewer.take() {
            Some(v) if v.width == width && v.height == height => v,
            _ => Viewer::new(PREVIEW_TITLE, width, height)?,
        };

        self.viewer.insert(viewer).update(&annotated)
    }
}
