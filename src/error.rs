// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Error types for landmark extraction and replay.

use std::fmt;

/// Result type alias for replay operations.
pub type Result<T> = std::result::Result<T, ReplayError>;

/// Main error type for the replay library.
#[derive(Debug)]
pub enum ReplayError {
    /// The input source could not be opened (missing path, unreadable file).
    SourceError(String),
    /// Video decoding error.
    VideoError(String),
    /// Error processing images.
    ImageError(String),
    /// Error loading the landmark model.
    ModelLoadError(String),
    /// Error during model inference.
    InferenceError(String),
    /// The detector returned no pose and the absence policy is `Abort`.
    DetectionAbsent {
        /// Zero-based index of the frame without a pose.
        frame_idx: usize,
    },
    /// A detector produced a pose with the wrong number of landmarks.
    InvalidSkeleton(String),
    /// A replay frame index outside the recorded timeline.
    FrameOutOfRange {
        /// Requested frame index.
        index: usize,
        /// Number of recorded frames.
        len: usize,
    },
    /// Invalid configuration provided.
    ConfigError(String),
    /// Visualizer error.
    VisualizerError(String),
    /// Wrapped `std::io::Error`
    Io(std::io::Error),
    /// Feature not enabled.
    FeatureNotEnabled(String),
}

impl fmt::Display for ReplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SourceError(msg) => write!(f, "Source error: {msg}"),
            Self::VideoError(msg) => write!(f, "Video error: {msg}"),
            Self::ImageError(msg) => write!(f, "Image error: {msg}"),
            Self::ModelLoadError(msg) => write!(f, "Model load error: {msg}"),
            Self::InferenceError(msg) => write!(f, "Inference error: {msg}"),
            Self::DetectionAbsent { frame_idx } => {
                write!(f, "No pose detected in frame {}", frame_idx + 1)
            }
            Self::InvalidSkeleton(msg) => write!(f, "Invalid skeleton: {msg}"),
            Self::FrameOutOfRange { index, len } => {
                write!(f, "Frame {index} out of range for timeline of {len} frames")
            }
            Self::ConfigError(msg) => write!(f, "Config error: {msg}"),
            Self::VisualizerError(msg) => write!(f, "Visualizer error: {msg}"),
            Self::Io(err) => write!(f, "IO error: {err}"),
            Self::FeatureNotEnabled(msg) => write!(f, "Feature not enabled: {msg}"),
        }
    }
}

impl std::error::Error for ReplayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ReplayError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<image::ImageError> for ReplayError {
    fn from(err: image::ImageError) -> Self {
        Self::ImageError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ReplayError::ModelLoadError("test".to_string());
        assert_eq!(err.to_string(), "Model load error: test");

        let err = ReplayError::DetectionAbsent { frame_idx: 1 };
        assert_eq!(err.to_string(), "No pose detected in frame 2");

        let err = ReplayError::FrameOutOfRange { index: 5, len: 3 };
        assert_eq!(err.to_string(), "Frame 5 out of range for timeline of 3 frames");
    }

    #[test]
    fn test_io_error_source() {
        use std::error::Error;

        let err = ReplayError::from(std::io::Error::other("disk"));
        assert!(err.source().is_some());
        assert!(ReplayError::ConfigError("x".to_string()).source().is_none());
    }
}
