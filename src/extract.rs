// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Frame-by-frame landmark extraction.
//!
//! [`FrameLandmarkExtractor`] reads frames from a [`FrameSource`], asks a
//! [`PoseDetector`] for a skeleton in each, and appends a [`FrameRecord`] to a
//! [`Timeline`]. Source exhaustion and read failures end extraction normally.
//! Frames without a pose are handled by the configured [`AbsencePolicy`].

use std::fmt;
use std::str::FromStr;

use image::DynamicImage;

use crate::detector::{Detection, PoseDetector};
use crate::error::{ReplayError, Result};
use crate::landmark::POSE_LANDMARK_COUNT;
use crate::record::FrameRecord;
use crate::source::{FrameSource, SourceMeta};
use crate::timeline::Timeline;
use crate::{verbose, warn};

/// What to do with a frame in which the detector finds no pose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AbsencePolicy {
    /// Drop the frame and continue.
    #[default]
    Skip,
    /// Record the previous frame's skeleton again (skip if there is none yet).
    RepeatPrevious,
    /// Stop extraction with [`ReplayError::DetectionAbsent`].
    Abort,
}

impl fmt::Display for AbsencePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skip => write!(f, "skip"),
            Self::RepeatPrevious => write!(f, "repeat"),
            Self::Abort => write!(f, "abort"),
        }
    }
}

impl FromStr for AbsencePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "skip" => Ok(Self::Skip),
            "repeat" | "repeat-previous" => Ok(Self::RepeatPrevious),
            "abort" => Ok(Self::Abort),
            other => Err(format!(
                "Unknown missing-pose policy: {other} (expected skip, repeat or abort)"
            )),
        }
    }
}

/// Why extraction stopped without an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// The source had no more frames.
    Exhausted,
    /// A frame could not be read; treated as end of stream.
    ReadFailed(String),
    /// The preview window was closed or `q` was pressed.
    Interrupted,
}

/// Counters from one extraction run.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionSummary {
    /// Frames read from the source.
    pub frames_read: usize,
    /// Records appended to the timeline.
    pub frames_recorded: usize,
    /// Frames without a detected pose.
    pub frames_missing: usize,
    /// Records that repeat the previous skeleton.
    pub frames_repeated: usize,
    /// Total detector time in milliseconds.
    pub inference_ms: f64,
    /// How extraction ended.
    pub stop: StopReason,
}

impl ExtractionSummary {
    fn new() -> Self {
        Self {
            frames_read: 0,
            frames_recorded: 0,
            frames_missing: 0,
            frames_repeated: 0,
            inference_ms: 0.0,
            stop: StopReason::Exhausted,
        }
    }

    /// Mean detector time per frame read, in milliseconds.
    #[must_use]
    pub fn mean_inference_ms(&self) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let frames = self.frames_read.max(1) as f64;
        self.inference_ms / frames
    }
}

/// Live display of frames during extraction.
pub trait FramePreview {
    /// Show a frame with its detection.
    ///
    /// Returns `Ok(false)` when the user asked to stop.
    ///
    /// # Errors
    ///
    /// Returns an error if the display fails.
    fn show(&mut self, frame: &DynamicImage, detection: &Detection) -> Result<bool>;
}

/// Turns a frame source into a timeline of landmark records.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameLandmarkExtractor {
    policy: AbsencePolicy,
}

impl FrameLandmarkExtractor {
    /// Create an extractor with the given missing-pose policy.
    #[must_use]
    pub const fn new(policy: AbsencePolicy) -> Self {
        Self { policy }
    }

    /// The missing-pose policy.
    #[must_use]
    pub const fn policy(&self) -> AbsencePolicy {
        self.policy
    }

    /// Extract records from every frame of `source` into `timeline`.
    ///
    /// Records are only appended, so on error `timeline` keeps every frame
    /// processed before the failure.
    ///
    /// # Errors
    ///
    /// Returns an error if the detector fails, if the preview fails, or with
    /// [`ReplayError::DetectionAbsent`] when the policy is [`AbsencePolicy::Abort`]
    /// and a frame has no pose.
    pub fn run<S, D>(
        &self,
        source: &mut S,
        detector: &mut D,
        timeline: &mut Timeline,
        mut preview: Option<&mut dyn FramePreview>,
    ) -> Result<ExtractionSummary>
    where
        S: FrameSource + ?Sized,
        D: PoseDetector + ?Sized,
    {
        let mut summary = ExtractionSummary::new();

        while let Some(item) = source.next() {
            let (frame, meta) = match item {
                Ok(val) => val,
                Err(e) => {
                    warn!("Ignoring unreadable frame, ending extraction: {e}");
                    summary.stop = StopReason::ReadFailed(e.to_string());
                    break;
                }
            };
            summary.frames_read += 1;

            let detection = detector.detect(&frame)?;
            summary.inference_ms += detection.inference_ms;

            match &detection.pose {
                Some(skeleton) => {
                    timeline.push(FrameRecord::from_skeleton(skeleton));
                    summary.frames_recorded += 1;
                    log_frame(&meta, &detection, "");
                }
                None => {
                    summary.frames_missing += 1;
                    match self.policy {
                        AbsencePolicy::Abort => {
                            log_frame(&meta, &detection, "aborting");
                            return Err(ReplayError::DetectionAbsent {
                                frame_idx: meta.frame_idx,
                            });
                        }
                        AbsencePolicy::RepeatPrevious => {
                            if let Some(previous) = timeline.last().cloned() {
                                timeline.push(previous);
                                summary.frames_recorded += 1;
                                summary.frames_repeated += 1;
                                log_frame(&meta, &detection, "repeating previous");
                            } else {
                                log_frame(&meta, &detection, "skipped");
                            }
                        }
                        AbsencePolicy::Skip => log_frame(&meta, &detection, "skipped"),
                    }
                }
            }

            if let Some(preview) = preview.as_deref_mut()
                && !preview.show(&frame, &detection)?
            {
                summary.stop = StopReason::Interrupted;
                break;
            }
        }

        Ok(summary)
    }
}

fn log_frame(meta: &SourceMeta, detection: &Detection, note: &str) {
    let total = meta
        .total_frames
        .map_or_else(|| "?".to_string(), |n| n.to_string());

    let found = detection.pose.as_ref().map_or_else(
        || "no pose".to_string(),
        |skeleton| {
            format!(
                "{POSE_LANDMARK_COUNT} landmarks, shoulder width {:.3}",
                skeleton.shoulder_width()
            )
        },
    );

    let note = if note.is_empty() {
        String::new()
    } else {
        format!(" ({note})")
    };

    verbose!(
        "frame {}/{} {}: {}{}, {:.1}ms",
        meta.frame_idx + 1,
        total,
        meta.path,
        found,
        note,
        detection.inference_ms
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmark::{Landmark, Skeleton};
    use crate::source::VideoMetadata;
    use image::RgbImage;

    struct ScriptedSource {
        frames: usize,
        fail_at: Option<usize>,
        next: usize,
    }

    impl Iterator for ScriptedSource {
        type Item = Result<(DynamicImage, SourceMeta)>;

        fn next(&mut self) -> Option<Self::Item> {
            if self.next >= self.frames {
                return None;
            }
            let idx = self.next;
            self.next += 1;
            if self.fail_at == Some(idx) {
                return Some(Err(ReplayError::VideoError("corrupt packet".to_string())));
            }
            let meta = SourceMeta {
                frame_idx: idx,
                total_frames: Some(self.frames),
                path: "synthetic".to_string(),
            };
            Some(Ok((DynamicImage::ImageRgb8(RgbImage::new(2, 2)), meta)))
        }
    }

    impl FrameSource for ScriptedSource {
        fn metadata(&self) -> VideoMetadata {
            VideoMetadata::new(self.frames, 30)
        }
    }

    /// Returns a pose for every call except the listed ones.
    struct ScriptedDetector {
        missing: Vec<usize>,
        calls: usize,
    }

    impl PoseDetector for ScriptedDetector {
        fn detect(&mut self, _frame: &DynamicImage) -> Result<Detection> {
            let call = self.calls;
            self.calls += 1;
            if self.missing.contains(&call) {
                return Ok(Detection::absent());
            }
            #[allow(clippy::cast_precision_loss)]
            let x = 0.1 * (call + 1) as f32;
            Ok(Detection::with_pose(Skeleton::new(
                [Landmark::new(x, 0.5, 0.0); POSE_LANDMARK_COUNT],
            )))
        }
    }

    struct ClosingPreview {
        shown: usize,
        close_after: usize,
    }

    impl FramePreview for ClosingPreview {
        fn show(&mut self, _frame: &DynamicImage, _detection: &Detection) -> Result<bool> {
            self.shown += 1;
            Ok(self.shown < self.close_after)
        }
    }

    fn source(frames: usize) -> ScriptedSource {
        ScriptedSource {
            frames,
            fail_at: None,
            next: 0,
        }
    }

    fn detector(missing: &[usize]) -> ScriptedDetector {
        ScriptedDetector {
            missing: missing.to_vec(),
            calls: 0,
        }
    }

    #[test]
    fn test_skip_policy_drops_missing_frames() {
        let mut timeline = Timeline::new();
        let summary = FrameLandmarkExtractor::new(AbsencePolicy::Skip)
            .run(&mut source(5), &mut detector(&[1, 3]), &mut timeline, None)
            .unwrap();

        assert_eq!(summary.frames_read, 5);
        assert_eq!(summary.frames_recorded, 3);
        assert_eq!(summary.frames_missing, 2);
        assert_eq!(summary.stop, StopReason::Exhausted);
        assert_eq!(timeline.len(), 3);
    }

    #[test]
    fn test_repeat_policy_duplicates_previous() {
        let mut timeline = Timeline::new();
        let summary = FrameLandmarkExtractor::new(AbsencePolicy::RepeatPrevious)
            .run(&mut source(4), &mut detector(&[0, 2]), &mut timeline, None)
            .unwrap();

        // Frame 0 has nothing to repeat, frame 2 repeats frame 1.
        assert_eq!(summary.frames_repeated, 1);
        assert_eq!(timeline.len(), 3);
        assert_eq!(timeline.get(0), timeline.get(1));
        assert_ne!(timeline.get(1), timeline.get(2));
    }

    #[test]
    fn test_abort_policy_keeps_partial_timeline() {
        let mut timeline = Timeline::new();
        let result = FrameLandmarkExtractor::new(AbsencePolicy::Abort).run(
            &mut source(5),
            &mut detector(&[1]),
            &mut timeline,
            None,
        );

        assert!(matches!(
            result,
            Err(ReplayError::DetectionAbsent { frame_idx: 1 })
        ));
        assert_eq!(timeline.len(), 1);
    }

    #[test]
    fn test_read_failure_ends_extraction() {
        let mut src = ScriptedSource {
            frames: 5,
            fail_at: Some(2),
            next: 0,
        };
        let mut timeline = Timeline::new();
        let summary = FrameLandmarkExtractor::default()
            .run(&mut src, &mut detector(&[]), &mut timeline, None)
            .unwrap();

        assert!(matches!(summary.stop, StopReason::ReadFailed(_)));
        assert_eq!(summary.frames_read, 2);
        assert_eq!(timeline.len(), 2);
    }

    #[test]
    fn test_preview_interrupt() {
        let mut timeline = Timeline::new();
        let mut preview = ClosingPreview {
            shown: 0,
            close_after: 2,
        };
        let summary = FrameLandmarkExtractor::default()
            .run(
                &mut source(10),
                &mut detector(&[]),
                &mut timeline,
                Some(&mut preview),
            )
            .unwrap();

        assert_eq!(summary.stop, StopReason::Interrupted);
        assert_eq!(timeline.len(), 2);
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!("skip".parse::<AbsencePolicy>().unwrap(), AbsencePolicy::Skip);
        assert_eq!(
            "REPEAT".parse::<AbsencePolicy>().unwrap(),
            AbsencePolicy::RepeatPrevious
        );
        assert_eq!("abort".parse::<AbsencePolicy>().unwrap(), AbsencePolicy::Abort);
        assert!("crash".parse::<AbsencePolicy>().is_err());
        assert_eq!(AbsencePolicy::RepeatPrevious.to_string(), "repeat");
    }
}
