// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

#![allow(clippy::multiple_crate_versions)]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! # Holistic Replay
//!
//! Extract 33-point pose skeletons from a video with an ONNX landmark model and
//! replay them as a 2D skeleton animation.
//!
//! Every processed frame produces a [`FrameRecord`] holding two mirrored views of
//! the skeleton:
//!
//! - **raw**: `(-x, -y, z)` for each landmark
//! - **translated**: `(-(x - nose.x), -(y - nose.y), z - nose.z)`, nose at the origin
//!
//! Records are appended to a [`Timeline`] owned by a [`Session`]. Replay is a pure
//! function from a frame index to a list of [`DrawCommand`]s, which a window
//! backend then rasterises at `1000 / fps` milliseconds per frame.
//!
//! ## Quick Start (Library)
//!
//! ```no_run
//! use holistic_replay::{AbsencePolicy, OnnxPoseDetector, ReplayConfig, Session};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ReplayConfig::new("dance.mp4")
//!         .with_absence_policy(AbsencePolicy::RepeatPrevious);
//!
//!     let mut session = Session::open(config)?;
//!     let mut detector = OnnxPoseDetector::load("pose_landmark_full.onnx")?;
//!     let summary = session.extract(&mut detector, None)?;
//!     println!("{} of {} frames recorded", summary.frames_recorded, summary.frames_read);
//!
//!     let animator = session.animator();
//!     let first = animator.render(0)?;
//!     println!("{} draw commands per frame", first.len());
//!     Ok(())
//! }
//! ```
//!
//! ## CLI Usage
//!
//! ```bash
//! # Extract and replay in a loop
//! holistic-replay run --source dance.mp4 --model pose_landmark_full.onnx
//!
//! # Preview frames while extracting, reuse the last pose when detection fails
//! holistic-replay run -s dance.mp4 -m pose_landmark_full.onnx --show --on-missing repeat
//!
//! # Image sequence at 25 fps, played once
//! holistic-replay run -s frames/ -m pose_landmark_full.onnx --fps 25 --no-repeat
//! ```
//!
//! ## Module Overview
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`session`] | [`Session`] owning source, metadata and timeline |
//! | [`extract`] | [`FrameLandmarkExtractor`] and missing-pose policies |
//! | [`animation`] | [`SkeletonAnimator`] and [`DrawCommand`]s |
//! | [`detector`] | [`PoseDetector`] trait and the ONNX backend |
//! | [`record`] | Raw and nose-relative coordinates |
//! | [`source`] | Input source handling ([`Source`], [`SourceIterator`]) |
//! | [`visualizer`] | Bone table, colors, plot canvas and windows |
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `annotate` | Landmark overlays and plot rasterisation (default) |
//! | `visualize` | Preview and replay windows (default) |
//! | `video` | Video file decoding through FFmpeg |

// Modules
pub mod animation;
#[cfg(feature = "annotate")]
pub mod annotate;
pub mod cli;
pub mod config;
pub mod detector;
pub mod error;
pub mod extract;
pub mod landmark;
pub mod preprocessing;
pub mod record;
pub mod session;
pub mod source;
pub mod timeline;
pub mod utils;
pub mod visualizer;

// Re-export main types for convenience
pub use animation::{DrawCommand, PlotWindow, SkeletonAnimator, frame_interval};
pub use config::{DetectorConfig, ReplayConfig};
pub use detector::{Detection, OnnxPoseDetector, PoseDetector};
pub use error::{ReplayError, Result};
pub use extract::{AbsencePolicy, ExtractionSummary, FrameLandmarkExtractor, FramePreview, StopReason};
pub use landmark::{Landmark, POSE_LANDMARK_COUNT, Skeleton};
pub use preprocessing::TensorLayout;
pub use record::{FrameRecord, Point3};
pub use session::Session;
pub use source::{FrameSource, Source, SourceIterator, SourceMeta, VideoMetadata};
pub use timeline::Timeline;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name.
pub const NAME: &str = env!("CARGO_PKG_NAME");
