// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Landmark connection tables.

use crate::landmark::POSE_LANDMARK_COUNT;

/// Number of bones in the pose skeleton.
pub const BONE_COUNT: usize = 35;

/// BlazePose skeleton structure (pairs of pose landmark indices).
/// Defines which landmarks are connected by a drawn segment.
pub const BONES: [[usize; 2]; BONE_COUNT] = [
    // face
    [0, 1],
    [1, 2],
    [2, 3],
    [3, 7],
    [0, 4],
    [4, 5],
    [5, 6],
    [6, 8],
    [9, 10],
    // right arm
    [12, 14],
    [14, 16],
    [16, 18],
    [16, 20],
    [16, 22],
    [18, 20],
    // left arm
    [11, 13],
    [13, 15],
    [15, 17],
    [15, 19],
    [15, 21],
    [17, 19],
    // torso
    [11, 12],
    [11, 23],
    [12, 24],
    [23, 24],
    // right leg
    [24, 26],
    [26, 28],
    [28, 30],
    [28, 32],
    [30, 32],
    // left leg
    [23, 25],
    [25, 27],
    [27, 29],
    [27, 31],
    [29, 31],
];

/// Bone color indices mapping to `POSE_COLORS`.
/// Mapping: face=green, right side=blue, left side=orange, torso=pink
pub const BONE_COLOR_INDICES: [usize; BONE_COUNT] = [
    16, 16, 16, 16, 16, 16, 16, 16, 16, // face
    9, 9, 9, 9, 9, 9, // right arm
    0, 0, 0, 0, 0, 0, // left arm
    7, 7, 7, 7, // torso
    9, 9, 9, 9, 9, // right leg
    0, 0, 0, 0, 0, // left leg
];

/// Number of landmarks per detected hand.
pub const HAND_LANDMARK_COUNT: usize = 21;

/// Hand skeleton structure (wrist = 0, fingers from thumb to pinky).
pub const HAND_CONNECTIONS: [[usize; 2]; 21] = [
    [0, 1],
    [1, 2],
    [2, 3],
    [3, 4],
    [0, 5],
    [5, 6],
    [6, 7],
    [7, 8],
    [5, 9],
    [9, 10],
    [10, 11],
    [11, 12],
    [9, 13],
    [13, 14],
    [14, 15],
    [15, 16],
    [13, 17],
    [0, 17],
    [17, 18],
    [18, 19],
    [19, 20],
];

/// Check that every pair in a connection table indexes into `landmark_count` points.
#[must_use]
pub fn connections_valid(connections: &[[usize; 2]], landmark_count: usize) -> bool {
    connections
        .iter()
        .all(|&[i, j]| i < landmark_count && j < landmark_count)
}

/// Check that the bone table is usable with pose skeletons.
#[must_use]
pub fn bones_valid(bones: &[[usize; 2]]) -> bool {
    connections_valid(bones, POSE_LANDMARK_COUNT)
}
