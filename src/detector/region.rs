// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Hand and face landmark models run on regions cropped around the pose.
//!
//! The pose skeleton locates each hand (wrist and knuckles) and the face (nose
//! and ears). A square region around each is cropped from the frame, letterboxed
//! into the region model's input, and the returned landmarks are mapped back to
//! normalized frame coordinates. Region landmarks only feed the preview.

#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]

use std::path::Path;

use image::{DynamicImage, GenericImageView};

use crate::config::DetectorConfig;
use crate::detector::onnx::{ModelOutput, ModelSession};
use crate::error::{ReplayError, Result};
use crate::landmark::{
    LEFT_EAR, LEFT_INDEX, LEFT_PINKY, LEFT_WRIST, Landmark, NOSE, RIGHT_EAR, RIGHT_INDEX,
    RIGHT_PINKY, RIGHT_WRIST, Skeleton,
};
use crate::preprocessing::{LetterboxResult, TensorLayout, letterbox_image, sigmoid, unproject_landmark};

/// Values per landmark row in hand and face landmark tensors (x, y, z).
const REGION_STRIDE: usize = 3;

/// Face models with iris refinement return this many landmarks.
const FACE_REFINED_COUNT: usize = 478;

/// Pose landmarks locating a region must be at least this visible.
pub const MIN_REGION_VISIBILITY: f32 = 0.5;

/// Regions smaller than this many pixels across are not worth a model run.
const MIN_REGION_SIDE: f32 = 16.0;

/// Hand crop side relative to the wrist-to-knuckle distance.
const HAND_SCALE: f32 = 4.0;

/// Face crop side relative to the ear-to-ear distance.
const FACE_SCALE: f32 = 2.0;

/// Which region model a [`RegionModel`] runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionKind {
    /// 21 hand landmarks.
    Hand,
    /// 468 face mesh landmarks.
    Face,
}

impl RegionKind {
    /// Landmarks returned per region.
    #[must_use]
    pub const fn landmark_count(self) -> usize {
        match self {
            Self::Hand => 21,
            Self::Face => 468,
        }
    }

    /// Side length of the square model input.
    #[must_use]
    pub const fn input_size(self) -> usize {
        match self {
            Self::Hand => 224,
            Self::Face => 192,
        }
    }

    fn accepts(self, len: usize) -> bool {
        len == self.landmark_count() * REGION_STRIDE
            || (self == Self::Face && len == FACE_REFINED_COUNT * REGION_STRIDE)
    }
}

/// Left or right hand, as labelled by the pose model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandSide {
    /// Pose landmarks 15, 17 and 19.
    Left,
    /// Pose landmarks 16, 18 and 20.
    Right,
}

/// A rectangle of frame pixels, always inside the frame and never empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    /// Left edge.
    pub left: u32,
    /// Top edge.
    pub top: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Region {
    /// A square of `side` pixels centred on `(cx, cy)`, clipped to the frame.
    ///
    /// Returns `None` if nothing of it lies inside the frame.
    #[must_use]
    pub fn centered(cx: f32, cy: f32, side: f32, frame_width: u32, frame_height: u32) -> Option<Self> {
        if !(cx.is_finite() && cy.is_finite() && side.is_finite()) {
            return None;
        }
        let half = side / 2.0;
        let left = (cx - half).max(0.0).floor() as u32;
        let top = (cy - half).max(0.0).floor() as u32;
        let right = ((cx + half).max(0.0).ceil() as u32).min(frame_width);
        let bottom = ((cy + half).max(0.0).ceil() as u32).min(frame_height);

        if right <= left || bottom <= top {
            return None;
        }
        Some(Self {
            left,
            top,
            width: right - left,
            height: bottom - top,
        })
    }

    /// Map a landmark normalized to this region into normalized frame coordinates.
    #[must_use]
    pub fn to_frame(&self, lm: Landmark, frame_width: u32, frame_height: u32) -> Landmark {
        let (fw, fh) = (frame_width as f32, frame_height as f32);
        let (w, h) = (self.width as f32, self.height as f32);
        Landmark {
            x: lm.x.mul_add(w, self.left as f32) / fw,
            y: lm.y.mul_add(h, self.top as f32) / fh,
            z: lm.z * w / fw,
            visibility: lm.visibility,
        }
    }
}

/// Pixel position of a pose landmark.
fn pixel(lm: &Landmark, width: u32, height: u32) -> (f32, f32) {
    (lm.x * width as f32, lm.y * height as f32)
}

/// Region around one hand, centred on the knuckles.
///
/// Returns `None` when the wrist or knuckles are not visible enough.
#[must_use]
pub fn hand_region(pose: &Skeleton, side: HandSide, width: u32, height: u32) -> Option<Region> {
    let (wrist, pinky, index) = match side {
        HandSide::Left => (LEFT_WRIST, LEFT_PINKY, LEFT_INDEX),
        HandSide::Right => (RIGHT_WRIST, RIGHT_PINKY, RIGHT_INDEX),
    };
    let (wrist, pinky, index) = (&pose[wrist], &pose[pinky], &pose[index]);
    if [wrist, pinky, index]
        .iter()
        .any(|lm| lm.visibility < MIN_REGION_VISIBILITY)
    {
        return None;
    }

    let (wx, wy) = pixel(wrist, width, height);
    let (px, py) = pixel(pinky, width, height);
    let (ix, iy) = pixel(index, width, height);
    let (kx, ky) = ((px + ix) / 2.0, (py + iy) / 2.0);

    let side = ((kx - wx).hypot(ky - wy) * HAND_SCALE).max(MIN_REGION_SIDE);
    Region::centered(kx, ky, side, width, height)
}

/// Region around the face, centred on the nose and sized by the ears.
///
/// Returns `None` when the nose or ears are not visible enough.
#[must_use]
pub fn face_region(pose: &Skeleton, width: u32, height: u32) -> Option<Region> {
    let (nose, left, right) = (&pose[NOSE], &pose[LEFT_EAR], &pose[RIGHT_EAR]);
    if [nose, left, right]
        .iter()
        .any(|lm| lm.visibility < MIN_REGION_VISIBILITY)
    {
        return None;
    }

    let (nx, ny) = pixel(nose, width, height);
    let (lx, ly) = pixel(left, width, height);
    let (rx, ry) = pixel(right, width, height);

    let side = ((lx - rx).hypot(ly - ry) * FACE_SCALE).max(MIN_REGION_SIDE);
    Region::centered(nx, ny, side, width, height)
}

/// A hand or face landmark model.
#[derive(Debug)]
pub struct RegionModel {
    model: ModelSession,
    kind: RegionKind,
    layout: TensorLayout,
    min_score: f32,
}

impl RegionModel {
    /// Load a region model, sharing layout and thread settings with the pose model.
    ///
    /// # Errors
    ///
    /// Returns an error if the model file doesn't exist or can't be loaded.
    pub fn load(path: &Path, kind: RegionKind, config: &DetectorConfig) -> Result<Self> {
        Ok(Self {
            model: ModelSession::load(path, config.num_threads)?,
            kind,
            layout: config.layout,
            min_score: config.min_region_score,
        })
    }

    /// Run the model on `region` of `frame`.
    ///
    /// # Errors
    ///
    /// Returns an error if inference fails or the outputs hold no landmark tensor.
    pub fn detect(&mut self, frame: &DynamicImage, region: Region) -> Result<Option<Vec<Landmark>>> {
        let crop = frame.crop_imm(region.left, region.top, region.width, region.height);
        let letterbox = letterbox_image(&crop, self.kind.input_size(), self.layout)?;
        let outputs = self.model.run(&letterbox.tensor)?;
        let (width, height) = frame.dimensions();
        decode_region(&outputs, self.kind, self.min_score, &letterbox, region, width, height)
    }
}

/// Decode region model outputs into landmarks in normalized frame coordinates.
///
/// The landmark tensor is the first output holding `count x 3` values, the score
/// is the first single-value output (a logit when outside `[0, 1]`). Returns
/// `Ok(None)` when the score is below `min_score`.
///
/// # Errors
///
/// Returns an error if no landmark tensor is found.
pub fn decode_region(
    outputs: &[ModelOutput],
    kind: RegionKind,
    min_score: f32,
    letterbox: &LetterboxResult,
    region: Region,
    frame_width: u32,
    frame_height: u32,
) -> Result<Option<Vec<Landmark>>> {
    let landmarks = outputs
        .iter()
        .find(|o| kind.accepts(o.data.len()))
        .ok_or_else(|| {
            ReplayError::InferenceError(format!(
                "No {kind:?} landmark output found among: {}",
                outputs
                    .iter()
                    .map(|o| format!("{} {:?}", o.name, o.shape))
                    .collect::<Vec<_>>()
                    .join(", ")
            ))
        })?;

    let score = outputs
        .iter()
        .find(|o| o.data.len() == 1)
        .and_then(|o| o.data.first().copied())
        .map_or(1.0, |v| if (0.0..=1.0).contains(&v) { v } else { sigmoid(v) });

    if score < min_score {
        return Ok(None);
    }

    let points = landmarks
        .data
        .chunks_exact(REGION_STRIDE)
        .take(kind.landmark_count())
        .map(|row| region.to_frame(unproject_landmark(row, letterbox), frame_width, frame_height))
        .collect();

    Ok(Some(points))
}
