// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Per-frame coordinate records derived from a detected skeleton.
//!
//! Two mirrored representations are stored for every frame:
//!
//! - **raw**: `(-x, -y, z)` for each landmark.
//! - **translated**: `(-(x - nose.x), -(y - nose.y), z - nose.z)`, which puts the nose at the origin.

use crate::landmark::{Landmark, POSE_LANDMARK_COUNT, Skeleton};

/// A 3D point in plot space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point3 {
    /// Horizontal component.
    pub x: f32,
    /// Vertical component.
    pub y: f32,
    /// Depth component (unused by 2D rendering).
    pub z: f32,
}

impl Point3 {
    /// Create a new point.
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// The `(x, y)` projection.
    #[must_use]
    pub const fn xy(&self) -> [f32; 2] {
        [self.x, self.y]
    }
}

/// Ordered skeleton points, index-aligned with the pose landmarks.
pub type SkeletonPoints = [Point3; POSE_LANDMARK_COUNT];

/// Mirror a skeleton on both image axes, keeping depth.
#[must_use]
pub fn raw_coordinates(skeleton: &Skeleton) -> SkeletonPoints {
    std::array::from_fn(|i| mirror(&skeleton[i]))
}

/// Translate a skeleton so the nose is the origin, then mirror it on both image axes.
#[must_use]
pub fn translated_coordinates(skeleton: &Skeleton) -> SkeletonPoints {
    let nose = *skeleton.nose();
    std::array::from_fn(|i| {
        let lm = &skeleton[i];
        Point3::new(-(lm.x - nose.x), -(lm.y - nose.y), lm.z - nose.z)
    })
}

fn mirror(lm: &Landmark) -> Point3 {
    Point3::new(-lm.x, -lm.y, lm.z)
}

/// Both coordinate representations of one processed frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameRecord {
    /// Mirrored landmark coordinates.
    pub raw: SkeletonPoints,
    /// Nose-relative mirrored landmark coordinates.
    pub translated: SkeletonPoints,
}

impl FrameRecord {
    /// Derive a record from a detected skeleton.
    #[must_use]
    pub fn from_skeleton(skeleton: &Skeleton) -> Self {
        Self {
            raw: raw_coordinates(skeleton),
            translated: translated_coordinates(skeleton),
        }
    }
}

impl From<&Skeleton> for FrameRecord {
    fn from(skeleton: &Skeleton) -> Self {
        Self::from_skeleton(skeleton)
    }
}
