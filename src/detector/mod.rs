// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Holistic landmark detection.
//!
//! A [`PoseDetector`] turns one RGB frame into a [`Detection`]: an optional pose
//! [`Skeleton`] plus optional face and hand landmark sets. An absent pose is an
//! ordinary outcome, not an error; only model or input failures are errors.

pub mod onnx;
pub mod region;

use image::DynamicImage;

use crate::error::Result;
use crate::landmark::{Landmark, Skeleton};

pub use onnx::OnnxPoseDetector;
pub use region::{HandSide, Region, RegionKind, RegionModel};

/// Landmarks detected in a single frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Detection {
    /// Pose skeleton, if a person was found.
    pub pose: Option<Skeleton>,
    /// Face mesh landmarks, when a face model is loaded (preview only).
    pub face: Option<Vec<Landmark>>,
    /// Left hand landmarks, when a hand model is loaded (preview only).
    pub left_hand: Option<Vec<Landmark>>,
    /// Right hand landmarks, when a hand model is loaded (preview only).
    pub right_hand: Option<Vec<Landmark>>,
    /// Inference time in milliseconds.
    pub inference_ms: f64,
}

impl Detection {
    /// A detection with only a pose.
    #[must_use]
    pub fn with_pose(pose: Skeleton) -> Self {
        Self {
            pose: Some(pose),
            ..Self::default()
        }
    }

    /// A detection with no landmarks at all.
    #[must_use]
    pub fn absent() -> Self {
        Self::default()
    }

    /// Check if a pose skeleton was detected.
    #[must_use]
    pub const fn has_pose(&self) -> bool {
        self.pose.is_some()
    }
}

/// A landmark detector run once per frame.
pub trait PoseDetector {
    /// Detect landmarks in an RGB frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the frame cannot be prepared or inference fails.
    /// A frame without a person yields `Ok` with `pose == None`.
    fn detect(&mut self, frame: &DynamicImage) -> Result<Detection>;

    /// Short human-readable description of the backend.
    fn describe(&self) -> String {
        "pose detector".to_string()
    }
}

impl<D: PoseDetector + ?Sized> PoseDetector for &mut D {
    fn detect(&mut self, frame: &DynamicImage) -> Result<Detection> {
        (**self).detect(frame)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

impl<D: PoseDetector + ?Sized> PoseDetector for Box<D> {
    fn detect(&mut self, frame: &DynamicImage) -> Result<Detection> {
        (**self).detect(frame)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmark::POSE_LANDMARK_COUNT;

    #[test]
    fn test_detection_constructors() {
        assert!(!Detection::absent().has_pose());

        let skeleton = Skeleton::new([Landmark::default(); POSE_LANDMARK_COUNT]);
        let detection = Detection::with_pose(skeleton);
        assert!(detection.has_pose());
        assert!(detection.face.is_none());
    }
}
