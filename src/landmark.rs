// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Pose landmarks as produced by a holistic landmark detector.
//!
//! A [`Skeleton`] always holds exactly [`POSE_LANDMARK_COUNT`] landmarks with the
//! BlazePose index semantics (0 = nose, 11/12 = shoulders, 23/24 = hips, ...).

use crate::error::{ReplayError, Result};

/// Number of pose landmarks in a skeleton.
pub const POSE_LANDMARK_COUNT: usize = 33;

/// Nose landmark, the anchor for nose-relative coordinates.
pub const NOSE: usize = 0;
/// Left shoulder landmark.
pub const LEFT_SHOULDER: usize = 11;
/// Right shoulder landmark.
pub const RIGHT_SHOULDER: usize = 12;
/// Ears, used to size the face region.
pub const LEFT_EAR: usize = 7;
pub const RIGHT_EAR: usize = 8;
/// Wrist, pinky knuckle and index knuckle of each hand, used to find the hand regions.
pub const LEFT_WRIST: usize = 15;
pub const RIGHT_WRIST: usize = 16;
pub const LEFT_PINKY: usize = 17;
pub const RIGHT_PINKY: usize = 18;
pub const LEFT_INDEX: usize = 19;
pub const RIGHT_INDEX: usize = 20;

/// A single 3D landmark in normalized image coordinates.
///
/// `x` and `y` are in `[0, 1]` relative to the image width and height, `z` is depth
/// on roughly the same scale as `x`. `visibility` is the detector's likelihood that
/// the landmark is visible, in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Landmark {
    /// Horizontal position.
    pub x: f32,
    /// Vertical position.
    pub y: f32,
    /// Depth.
    pub z: f32,
    /// Visibility likelihood.
    pub visibility: f32,
}

impl Landmark {
    /// Create a landmark with full visibility.
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            x,
            y,
            z,
            visibility: 1.0,
        }
    }

    /// Euclidean distance to another landmark in 3D.
    #[must_use]
    pub fn distance(&self, other: &Self) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dz.mul_add(dz, dx.mul_add(dx, dy * dy)).sqrt()
    }
}

/// The full set of pose landmarks for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Skeleton {
    landmarks: [Landmark; POSE_LANDMARK_COUNT],
}

impl Skeleton {
    /// Create a skeleton from a fixed-size landmark array.
    #[must_use]
    pub const fn new(landmarks: [Landmark; POSE_LANDMARK_COUNT]) -> Self {
        Self { landmarks }
    }

    /// Create a skeleton from a slice of landmarks.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::InvalidSkeleton`] if the slice does not hold exactly
    /// [`POSE_LANDMARK_COUNT`] landmarks.
    pub fn from_slice(landmarks: &[Landmark]) -> Result<Self> {
        let landmarks: [Landmark; POSE_LANDMARK_COUNT] =
            landmarks.try_into().map_err(|_| {
                ReplayError::InvalidSkeleton(format!(
                    "expected {POSE_LANDMARK_COUNT} pose landmarks, got {}",
                    landmarks.len()
                ))
            })?;
        Ok(Self { landmarks })
    }

    /// All landmarks in index order.
    #[must_use]
    pub const fn landmarks(&self) -> &[Landmark; POSE_LANDMARK_COUNT] {
        &self.landmarks
    }

    /// The nose landmark.
    #[must_use]
    pub const fn nose(&self) -> &Landmark {
        &self.landmarks[NOSE]
    }

    /// Distance between the two shoulders.
    #[must_use]
    pub fn shoulder_width(&self) -> f32 {
        self.landmarks[LEFT_SHOULDER].distance(&self.landmarks[RIGHT_SHOULDER])
    }
}

impl std::ops::Index<usize> for Skeleton {
    type Output = Landmark;

    fn index(&self, index: usize) -> &Self::Output {
        &self.landmarks[index]
    }
}
