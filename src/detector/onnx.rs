// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! ONNX Runtime backend for BlazePose-style landmark models.
//!
//! The pose model receives the whole frame letterboxed into a square input and
//! returns a landmark tensor (`N x 5`: x, y, z, visibility, presence in input
//! pixels, where the first 33 rows are the pose) and a scalar pose presence score.
//! Hand and face models are handled in [`super::region`].

use std::path::Path;
use std::time::Instant;

use image::{DynamicImage, GenericImageView};
use ndarray::Array4;
use ort::session::Session;
use ort::value::TensorRef;

use crate::config::DetectorConfig;
use crate::detector::region::{HandSide, Region, RegionKind, RegionModel, face_region, hand_region};
use crate::detector::{Detection, PoseDetector};
use crate::error::{ReplayError, Result};
use crate::landmark::{Landmark, POSE_LANDMARK_COUNT, Skeleton};
use crate::preprocessing::{LetterboxResult, letterbox_image, sigmoid, unproject_landmark};

/// Values per landmark row in the landmark tensor.
const LANDMARK_STRIDE: usize = 5;

/// Rows in the full BlazePose landmark tensor (33 pose + 6 auxiliary).
const FULL_LANDMARK_ROWS: usize = 39;

/// One named model output, flattened.
#[derive(Debug, Clone)]
pub struct ModelOutput {
    /// Output tensor name.
    pub name: String,
    /// Tensor shape.
    pub shape: Vec<usize>,
    /// Row-major tensor data.
    pub data: Vec<f32>,
}

/// An ONNX Runtime session with its input and output names.
pub(crate) struct ModelSession {
    session: Session,
    input_name: String,
    output_names: Vec<String>,
}

impl ModelSession {
    /// Load a model file into a new session.
    pub(crate) fn load(path: &Path, num_threads: usize) -> Result<Self> {
        if !path.exists() {
            return Err(ReplayError::ModelLoadError(format!(
                "Model file not found: {}",
                path.display()
            )));
        }

        let session = Session::builder()
            .map_err(|e| {
                ReplayError::ModelLoadError(format!("Failed to create session builder: {e}"))
            })?
            .with_optimization_level(ort::session::builder::GraphOptimizationLevel::Level3)
            .map_err(|e| {
                ReplayError::ModelLoadError(format!("Failed to set optimization level: {e}"))
            })?
            .with_intra_threads(num_threads)
            .map_err(|e| {
                ReplayError::ModelLoadError(format!("Failed to set intra-thread count: {e}"))
            })?
            .commit_from_file(path)
            .map_err(|e| {
                ReplayError::ModelLoadError(format!(
                    "Failed to load model {}: {e}",
                    path.display()
                ))
            })?;

        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .ok_or_else(|| ReplayError::ModelLoadError("Model has no inputs".to_string()))?;

        let output_names: Vec<String> = session.outputs.iter().map(|o| o.name.clone()).collect();

        Ok(Self {
            session,
            input_name,
            output_names,
        })
    }

    /// Output tensor names in model order.
    pub(crate) fn output_names(&self) -> &[String] {
        &self.output_names
    }

    /// Run the model and collect every output.
    pub(crate) fn run(&mut self, input: &Array4<f32>) -> Result<Vec<ModelOutput>> {
        let input_contiguous = input.as_standard_layout();

        let input_tensor = TensorRef::from_array_view(&input_contiguous).map_err(|e| {
            ReplayError::InferenceError(format!("Failed to create input tensor: {e}"))
        })?;

        let inputs = ort::inputs![self.input_name.as_str() => input_tensor];

        let outputs = self
            .session
            .run(inputs)
            .map_err(|e| ReplayError::InferenceError(format!("Inference failed: {e}")))?;

        let mut collected = Vec::with_capacity(self.output_names.len());
        for name in &self.output_names {
            let output = outputs.get(name.as_str()).ok_or_else(|| {
                ReplayError::InferenceError(format!("Output '{name}' not found"))
            })?;

            let (shape, data) = output.try_extract_tensor::<f32>().map_err(|e| {
                ReplayError::InferenceError(format!("Failed to extract output '{name}': {e}"))
            })?;

            #[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
            let shape: Vec<usize> = shape.iter().map(|&d| d.max(0) as usize).collect();

            collected.push(ModelOutput {
                name: name.clone(),
                shape,
                data: data.to_vec(),
            });
        }

        Ok(collected)
    }
}

impl std::fmt::Debug for ModelSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelSession")
            .field("input_name", &self.input_name)
            .field("output_names", &self.output_names)
            .finish_non_exhaustive()
    }
}

/// Holistic landmark detector running ONNX models.
///
/// The pose model always runs on the whole frame. Optional hand and face models
/// run on regions cropped around the detected pose and only feed the preview.
///
/// # Example
///
/// ```no_run
/// use holistic_replay::{DetectorConfig, OnnxPoseDetector};
///
/// let detector = OnnxPoseDetector::load_with_config(
///     "pose_landmark_full.onnx",
///     DetectorConfig::new()
///         .with_min_presence(0.6)
///         .with_hand_model("hand_landmark.onnx"),
/// )?;
/// # Ok::<(), holistic_replay::ReplayError>(())
/// ```
pub struct OnnxPoseDetector {
    /// Pose landmark model.
    pose: ModelSession,
    /// Hand landmark model, run once per hand.
    hands: Option<RegionModel>,
    /// Face landmark model.
    face: Option<RegionModel>,
    /// Detector configuration.
    config: DetectorConfig,
}

impl OnnxPoseDetector {
    /// Load a pose landmark model with default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the model file doesn't exist or can't be loaded.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::load_with_config(path, DetectorConfig::default())
    }

    /// Load a pose landmark model, plus any hand or face model named in `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if a model file doesn't exist or can't be loaded, or if a
    /// configured output name is missing from the pose model.
    pub fn load_with_config<P: AsRef<Path>>(path: P, config: DetectorConfig) -> Result<Self> {
        let pose = ModelSession::load(path.as_ref(), config.num_threads)?;

        for name in [&config.landmarks_output, &config.presence_output]
            .into_iter()
            .flatten()
        {
            if !pose.output_names().contains(name) {
                return Err(ReplayError::ModelLoadError(format!(
                    "Model has no output named '{name}' (outputs: {})",
                    pose.output_names().join(", ")
                )));
            }
        }

        let hands = config
            .hand_model
            .as_deref()
            .map(|path| RegionModel::load(path, RegionKind::Hand, &config))
            .transpose()?;
        let face = config
            .face_model
            .as_deref()
            .map(|path| RegionModel::load(path, RegionKind::Face, &config))
            .transpose()?;

        Ok(Self {
            pose,
            hands,
            face,
            config,
        })
    }

    /// Get the detector configuration.
    #[must_use]
    pub const fn config(&self) -> &DetectorConfig {
        &self.config
    }
}

impl PoseDetector for OnnxPoseDetector {
    fn detect(&mut self, frame: &DynamicImage) -> Result<Detection> {
        let letterbox = letterbox_image(frame, self.config.input_size, self.config.layout)?;

        let start = Instant::now();
        let outputs = self.pose.run(&letterbox.tensor)?;
        let pose = decode_pose(&outputs, &self.config, &letterbox)?;

        let mut detection = Detection::default();
        if let Some(skeleton) = &pose {
            let (width, height) = frame.dimensions();
            detection.left_hand = run_region(
                self.hands.as_mut(),
                frame,
                hand_region(skeleton, HandSide::Left, width, height),
            )?;
            detection.right_hand = run_region(
                self.hands.as_mut(),
                frame,
                hand_region(skeleton, HandSide::Right, width, height),
            )?;
            detection.face = run_region(
                self.face.as_mut(),
                frame,
                face_region(skeleton, width, height),
            )?;
        }

        detection.pose = pose;
        detection.inference_ms = start.elapsed().as_secs_f64() * 1000.0;
        Ok(detection)
    }

    fn describe(&self) -> String {
        let mut extras = String::new();
        if self.hands.is_some() {
            extras.push_str(" + hands");
        }
        if self.face.is_some() {
            extras.push_str(" + face");
        }
        format!(
            "ONNX landmark model ({}x{} {}, presence >= {:.2}){extras}",
            self.config.input_size,
            self.config.input_size,
            self.config.layout,
            self.config.min_presence
        )
    }
}

fn run_region(
    model: Option<&mut RegionModel>,
    frame: &DynamicImage,
    region: Option<Region>,
) -> Result<Option<Vec<Landmark>>> {
    match (model, region) {
        (Some(model), Some(region)) => model.detect(frame, region),
        _ => Ok(None),
    }
}

impl std::fmt::Debug for OnnxPoseDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OnnxPoseDetector")
            .field("pose", &self.pose)
            .field("hands", &self.hands)
            .field("face", &self.face)
            .field("config", &self.config)
            .finish()
    }
}

/// Decode model outputs into a pose skeleton.
///
/// Returns `Ok(None)` when the presence score is below `config.min_presence`.
///
/// # Errors
///
/// Returns an error if no landmark tensor can be identified.
pub fn decode_pose(
    outputs: &[ModelOutput],
    config: &DetectorConfig,
    letterbox: &LetterboxResult,
) -> Result<Option<Skeleton>> {
    let landmarks = find_output(outputs, config.landmarks_output.as_deref(), |o| {
        o.data.len() == FULL_LANDMARK_ROWS * LANDMARK_STRIDE
            || o.data.len() == POSE_LANDMARK_COUNT * LANDMARK_STRIDE
    })
    .ok_or_else(|| {
        ReplayError::InferenceError(format!(
            "No landmark output found among: {}",
            outputs
                .iter()
                .map(|o| format!("{} {:?}", o.name, o.shape))
                .collect::<Vec<_>>()
                .join(", ")
        ))
    })?;

    if landmarks.data.len() < POSE_LANDMARK_COUNT * LANDMARK_STRIDE {
        return Err(ReplayError::InferenceError(format!(
            "Landmark output '{}' has {} values, expected at least {}",
            landmarks.name,
            landmarks.data.len(),
            POSE_LANDMARK_COUNT * LANDMARK_STRIDE
        )));
    }

    let presence = find_output(outputs, config.presence_output.as_deref(), |o| {
        o.data.len() == 1
    })
    .and_then(|o| o.data.first().copied())
    .map_or(1.0, |v| if (0.0..=1.0).contains(&v) { v } else { sigmoid(v) });

    if presence < config.min_presence {
        return Ok(None);
    }

    let points: Vec<_> = landmarks
        .data
        .chunks_exact(LANDMARK_STRIDE)
        .take(POSE_LANDMARK_COUNT)
        .map(|row| unproject_landmark(row, letterbox))
        .collect();

    Skeleton::from_slice(&points).map(Some)
}

fn find_output<'a>(
    outputs: &'a [ModelOutput],
    name: Option<&str>,
    fallback: impl Fn(&ModelOutput) -> bool,
) -> Option<&'a ModelOutput> {
    match name {
        Some(name) => outputs.iter().find(|o| o.name == name),
        None => outputs.iter().find(|o| fallback(o)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::preprocessing::TensorLayout;
    use image::RgbImage;

    fn letterbox() -> LetterboxResult {
        let frame = DynamicImage::ImageRgb8(RgbImage::new(256, 256));
        letterbox_image(&frame, 256, TensorLayout::Nhwc).unwrap()
    }

    fn landmark_output(rows: usize) -> ModelOutput {
        let mut data = Vec::with_capacity(rows * LANDMARK_STRIDE);
        for i in 0..rows {
            #[allow(clippy::cast_precision_loss)]
            data.extend_from_slice(&[i as f32, 128.0, 0.0, 10.0, 10.0]);
        }
        ModelOutput {
            name: "Identity".to_string(),
            shape: vec![1, rows * LANDMARK_STRIDE],
            data,
        }
    }

    fn presence_output(value: f32) -> ModelOutput {
        ModelOutput {
            name: "Identity_1".to_string(),
            shape: vec![1, 1],
            data: vec![value],
        }
    }

    #[test]
    fn test_model_not_found() {
        let result = OnnxPoseDetector::load("nonexistent.onnx");
        assert!(matches!(result, Err(ReplayError::ModelLoadError(_))));
    }

    #[test]
    fn test_decode_present_pose() {
        let outputs = vec![landmark_output(39), presence_output(0.9)];
        let skeleton = decode_pose(&outputs, &DetectorConfig::default(), &letterbox())
            .unwrap()
            .unwrap();

        assert!((skeleton[0].y - 0.5).abs() < 1e-6);
        assert!((skeleton[32].x - 32.0 / 256.0).abs() < 1e-6);
        assert!(skeleton[0].visibility > 0.99);
    }

    #[test]
    fn test_decode_low_presence_is_absent() {
        let outputs = vec![landmark_output(39), presence_output(0.2)];
        let pose = decode_pose(&outputs, &DetectorConfig::default(), &letterbox()).unwrap();
        assert!(pose.is_none());
    }

    #[test]
    fn test_decode_presence_logit() {
        // A raw logit of -3 is well below 0.5 after the sigmoid.
        let outputs = vec![landmark_output(33), presence_output(-3.0)];
        let pose = decode_pose(&outputs, &DetectorConfig::default(), &letterbox()).unwrap();
        assert!(pose.is_none());
    }

    #[test]
    fn test_decode_missing_landmarks() {
        let outputs = vec![presence_output(0.9)];
        assert!(decode_pose(&outputs, &DetectorConfig::default(), &letterbox()).is_err());
    }

    #[test]
    fn test_decode_named_outputs() {
        let mut heatmap = landmark_output(39);
        heatmap.name = "heatmap".to_string();
        let mut landmarks = landmark_output(39);
        landmarks.name = "ld_3d".to_string();
        let config = DetectorConfig::new().with_output_names("ld_3d", "Identity_1");

        let outputs = vec![heatmap, landmarks, presence_output(0.9)];
        assert!(decode_pose(&outputs, &config, &letterbox()).unwrap().is_some());
    }
}
