// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Session and detector configuration.
//!
//! [`ReplayConfig`] controls a replay session (input source, preview, missing-pose
//! policy, playback), [`DetectorConfig`] controls the landmark model. Both use a
//! builder pattern for convenient construction.

use std::path::{Path, PathBuf};

use crate::error::{ReplayError, Result};
use crate::extract::AbsencePolicy;
use crate::preprocessing::TensorLayout;

/// Default frame rate used when a source does not report one.
pub const DEFAULT_FPS: u32 = 30;

/// Default side length of the animation plot window in pixels.
pub const DEFAULT_PLOT_SIZE: usize = 800;

/// Accepted range for the plot window side length.
pub const MIN_PLOT_SIZE: usize = 64;
pub const MAX_PLOT_SIZE: usize = 8192;

/// Configuration for a replay session.
///
/// # Example
///
/// ```rust
/// use holistic_replay::{AbsencePolicy, ReplayConfig};
///
/// let config = ReplayConfig::new("media/test.mp4")
///     .with_show_video(true)
///     .with_absence_policy(AbsencePolicy::RepeatPrevious)
///     .with_repeat(false);
/// ```
#[derive(Debug, Clone)]
pub struct ReplayConfig {
    /// Path to the input video file, image, or image directory.
    pub source: PathBuf,
    /// Show annotated frames in a preview window during extraction.
    pub show_video: bool,
    /// What to do when the detector finds no pose in a frame.
    pub absence_policy: AbsencePolicy,
    /// Frame rate used for image sequences and sources reporting no rate.
    pub fallback_fps: u32,
    /// Side length of the square animation window in pixels.
    pub plot_size: usize,
    /// Loop the animation until the window is closed.
    pub repeat: bool,
}

impl ReplayConfig {
    /// Create a configuration for `source` with default settings.
    #[must_use]
    pub fn new<P: AsRef<Path>>(source: P) -> Self {
        Self {
            source: source.as_ref().to_path_buf(),
            show_video: false,
            absence_policy: AbsencePolicy::default(),
            fallback_fps: DEFAULT_FPS,
            plot_size: DEFAULT_PLOT_SIZE,
            repeat: true,
        }
    }

    /// Enable or disable the extraction preview window.
    #[must_use]
    pub const fn with_show_video(mut self, show: bool) -> Self {
        self.show_video = show;
        self
    }

    /// Set the missing-pose policy.
    #[must_use]
    pub const fn with_absence_policy(mut self, policy: AbsencePolicy) -> Self {
        self.absence_policy = policy;
        self
    }

    /// Set the fallback frame rate.
    #[must_use]
    pub const fn with_fallback_fps(mut self, fps: u32) -> Self {
        self.fallback_fps = fps;
        self
    }

    /// Set the animation window size.
    #[must_use]
    pub const fn with_plot_size(mut self, size: usize) -> Self {
        self.plot_size = size;
        self
    }

    /// Loop the animation or play it once.
    #[must_use]
    pub const fn with_repeat(mut self, repeat: bool) -> Self {
        self.repeat = repeat;
        self
    }

    /// Check the configuration for values that cannot work.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::ConfigError`] for an empty source path, a zero frame
    /// rate, or a plot size outside [`MIN_PLOT_SIZE`]..=[`MAX_PLOT_SIZE`].
    pub fn validate(&self) -> Result<()> {
        if self.source.as_os_str().is_empty() {
            return Err(ReplayError::ConfigError("source path is empty".to_string()));
        }
        if self.fallback_fps == 0 {
            return Err(ReplayError::ConfigError("fps must be positive".to_string()));
        }
        if !(MIN_PLOT_SIZE..=MAX_PLOT_SIZE).contains(&self.plot_size) {
            return Err(ReplayError::ConfigError(format!(
                "plot size {} is outside {MIN_PLOT_SIZE}..={MAX_PLOT_SIZE}",
                self.plot_size
            )));
        }
        Ok(())
    }
}

/// Configuration for the ONNX landmark models.
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Minimum pose presence score (0.0 to 1.0) for a frame to count as detected.
    pub min_presence: f32,
    /// Side length of the square model input.
    pub input_size: usize,
    /// Input tensor layout.
    pub layout: TensorLayout,
    /// Number of intra-op threads for ONNX Runtime.
    /// Setting this to `0` allows ONNX Runtime to choose the optimal number.
    pub num_threads: usize,
    /// Name of the landmark output tensor. Inferred from tensor sizes if `None`.
    pub landmarks_output: Option<String>,
    /// Name of the pose presence output tensor. Inferred from tensor sizes if `None`.
    pub presence_output: Option<String>,
    /// Optional hand landmark model, run on a region around each hand.
    pub hand_model: Option<PathBuf>,
    /// Optional face landmark model, run on a region around the face.
    pub face_model: Option<PathBuf>,
    /// Minimum hand or face score (0.0 to 1.0) for region landmarks to be kept.
    pub min_region_score: f32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            min_presence: 0.5,
            input_size: 256,
            layout: TensorLayout::Nhwc,
            num_threads: 0,
            landmarks_output: None,
            presence_output: None,
            hand_model: None,
            face_model: None,
            min_region_score: 0.5,
        }
    }
}

impl DetectorConfig {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the minimum pose presence score.
    #[must_use]
    pub const fn with_min_presence(mut self, threshold: f32) -> Self {
        self.min_presence = threshold;
        self
    }

    /// Set the model input size.
    #[must_use]
    pub const fn with_input_size(mut self, size: usize) -> Self {
        self.input_size = size;
        self
    }

    /// Set the input tensor layout.
    #[must_use]
    pub const fn with_layout(mut self, layout: TensorLayout) -> Self {
        self.layout = layout;
        self
    }

    /// Set the number of threads for inference.
    #[must_use]
    pub const fn with_threads(mut self, threads: usize) -> Self {
        self.num_threads = threads;
        self
    }

    /// Name the landmark and presence output tensors explicitly.
    #[must_use]
    pub fn with_output_names(mut self, landmarks: &str, presence: &str) -> Self {
        self.landmarks_output = Some(landmarks.to_string());
        self.presence_output = Some(presence.to_string());
        self
    }

    /// Run a hand landmark model on both hands.
    #[must_use]
    pub fn with_hand_model<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.hand_model = Some(path.as_ref().to_path_buf());
        self
    }

    /// Run a face landmark model on the face.
    #[must_use]
    pub fn with_face_model<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.face_model = Some(path.as_ref().to_path_buf());
        self
    }

    /// Set the minimum hand and face score.
    #[must_use]
    pub const fn with_min_region_score(mut self, threshold: f32) -> Self {
        self.min_region_score = threshold;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replay_config_defaults() {
        let config = ReplayConfig::new("video.mp4");
        assert_eq!(config.source, PathBuf::from("video.mp4"));
        assert!(!config.show_video);
        assert_eq!(config.absence_policy, AbsencePolicy::Skip);
        assert_eq!(config.fallback_fps, 30);
        assert!(config.repeat);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_replay_config_validate() {
        assert!(ReplayConfig::new("").validate().is_err());
        assert!(ReplayConfig::new("a.mp4").with_fallback_fps(0).validate().is_err());
        assert!(ReplayConfig::new("a.mp4").with_plot_size(10).validate().is_err());
        assert!(ReplayConfig::new("a.mp4").with_plot_size(100_000).validate().is_err());
        assert!(ReplayConfig::new("a.mp4").with_plot_size(MAX_PLOT_SIZE).validate().is_ok());
    }

    #[test]
    fn test_detector_config_builder() {
        let config = DetectorConfig::new()
            .with_min_presence(0.7)
            .with_input_size(224)
            .with_layout(TensorLayout::Nchw)
            .with_threads(4)
            .with_output_names("Identity", "Identity_1");

        assert!((config.min_presence - 0.7).abs() < f32::EPSILON);
        assert_eq!(config.input_size, 224);
        assert_eq!(config.layout, TensorLayout::Nchw);
        assert_eq!(config.num_threads, 4);
        assert_eq!(config.landmarks_output.as_deref(), Some("Identity"));
        assert_eq!(config.presence_output.as_deref(), Some("Identity_1"));
        assert!(config.hand_model.is_none() && config.face_model.is_none());
    }

    #[test]
    fn test_detector_config_region_models() {
        let config = DetectorConfig::new()
            .with_hand_model("hand_landmark.onnx")
            .with_face_model("face_landmark.onnx")
            .with_min_region_score(0.7);

        assert_eq!(config.hand_model, Some(PathBuf::from("hand_landmark.onnx")));
        assert_eq!(config.face_model, Some(PathBuf::from("face_landmark.onnx")));
        assert!((config.min_region_score - 0.7).abs() < f32::EPSILON);
    }
}
