// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! A replay session: one source, one timeline.
//!
//! The session owns everything a run needs. Extraction fills its timeline, and
//! the animator borrows that timeline read-only afterwards. Two sessions never
//! share landmark state.

use crate::animation::SkeletonAnimator;
use crate::config::ReplayConfig;
use crate::detector::PoseDetector;
use crate::error::Result;
use crate::extract::{ExtractionSummary, FrameLandmarkExtractor, FramePreview};
use crate::source::{FrameSource, Source, SourceIterator, VideoMetadata};
use crate::timeline::Timeline;
use crate::verbose;

/// Owns the frame source, its metadata and the extracted timeline.
///
/// # Example
///
/// ```no_run
/// use holistic_replay::{OnnxPoseDetector, ReplayConfig, Session};
///
/// let mut session = Session::open(ReplayConfig::new("dance.mp4"))?;
/// let mut detector = OnnxPoseDetector::load("pose_landmark_full.onnx")?;
/// let summary = session.extract(&mut detector, None)?;
/// println!("{} frames recorded", summary.frames_recorded);
///
/// let animator = session.animator();
/// for commands in animator.frames() {
///     println!("{} draw commands", commands.len());
/// }
/// # Ok::<(), holistic_replay::ReplayError>(())
/// ```
pub struct Session {
    config: ReplayConfig,
    source: Box<dyn FrameSource>,
    metadata: VideoMetadata,
    timeline: Timeline,
}

impl Session {
    /// Open the source named in `config` and read its metadata.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the source cannot be opened.
    pub fn open(config: ReplayConfig) -> Result<Self> {
        config.validate()?;
        let source = Source::from(config.source.clone());
        verbose!("Opening {}", source.describe());
        let source = SourceIterator::open(source, config.fallback_fps)?;
        Ok(Self::from_source(source, config))
    }

    /// Create a session around an already opened frame source.
    #[must_use]
    pub fn from_source<S: FrameSource + 'static>(source: S, config: ReplayConfig) -> Self {
        let metadata = source.metadata();
        verbose!(
            "Source {}: {} frames at {} fps",
            config.source.display(),
            metadata.frame_count,
            metadata.fps
        );
        Self {
            config,
            source: Box::new(source),
            metadata,
            timeline: Timeline::with_capacity(metadata.frame_count),
        }
    }

    /// Run extraction over the remaining frames of the source.
    ///
    /// Records are appended to the session timeline. When extraction fails the
    /// timeline keeps everything recorded before the failure.
    ///
    /// If the source yields more frames than it announced, the metadata frame
    /// count is raised to the timeline length afterwards.
    ///
    /// # Errors
    ///
    /// See [`FrameLandmarkExtractor::run`].
    pub fn extract<D: PoseDetector + ?Sized>(
        &mut self,
        detector: &mut D,
        preview: Option<&mut dyn FramePreview>,
    ) -> Result<ExtractionSummary> {
        let result = FrameLandmarkExtractor::new(self.config.absence_policy).run(
            self.source.as_mut(),
            detector,
            &mut self.timeline,
            preview,
        );

        if self.timeline.len() > self.metadata.frame_count {
            verbose!(
                "Source announced {} frames but {} were recorded",
                self.metadata.frame_count,
                self.timeline.len()
            );
            self.metadata.frame_count = self.timeline.len();
        }

        result
    }

    /// Session configuration.
    #[must_use]
    pub const fn config(&self) -> &ReplayConfig {
        &self.config
    }

    /// Frame count and rate of the source.
    #[must_use]
    pub const fn metadata(&self) -> VideoMetadata {
        self.metadata
    }

    /// The timeline built so far.
    #[must_use]
    pub const fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    /// Animator replaying the timeline at the source frame rate.
    #[must_use]
    pub fn animator(&self) -> SkeletonAnimator<'_> {
        SkeletonAnimator::new(&self.timeline, self.metadata.fps)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("config", &self.config)
            .field("metadata", &self.metadata)
            .field("frames", &self.timeline.len())
            .finish_non_exhaustive()
    }
}
