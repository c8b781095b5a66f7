// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Integration tests for extraction and replay with in-memory sources.

use holistic_replay::visualizer::skeleton::{BONE_COUNT, BONES, bones_valid};
use holistic_replay::{
    AbsencePolicy, Detection, DrawCommand, Landmark, POSE_LANDMARK_COUNT, PlotWindow,
    PoseDetector, ReplayConfig, ReplayError, Result, Session, Skeleton, Source, SourceIterator,
    StopReason, frame_interval,
};
use image::{DynamicImage, RgbImage};

const EPS: f32 = 1e-6;

/// Nose at (0.5, 0.5, 0), shoulders at (0.3, 0.4, 0) and (0.7, 0.4, 0).
fn shoulder_skeleton() -> Skeleton {
    let mut landmarks = [Landmark::new(0.5, 0.6, 0.0); POSE_LANDMARK_COUNT];
    landmarks[0] = Landmark::new(0.5, 0.5, 0.0);
    landmarks[11] = Landmark::new(0.3, 0.4, 0.0);
    landmarks[12] = Landmark::new(0.7, 0.4, 0.0);
    Skeleton::new(landmarks)
}

/// Deterministic detector: returns a pose derived from the frame's first pixel,
/// or nothing for the listed call indices.
struct PixelDetector {
    missing: Vec<usize>,
    calls: usize,
}

impl PixelDetector {
    fn new(missing: &[usize]) -> Self {
        Self {
            missing: missing.to_vec(),
            calls: 0,
        }
    }
}

impl PoseDetector for PixelDetector {
    fn detect(&mut self, frame: &DynamicImage) -> Result<Detection> {
        let call = self.calls;
        self.calls += 1;
        if self.missing.contains(&call) {
            return Ok(Detection::absent());
        }
        let shade = f32::from(frame.to_rgb8().get_pixel(0, 0)[0]) / 255.0;
        let landmarks = std::array::from_fn(|i| {
            #[allow(clippy::cast_precision_loss)]
            let offset = i as f32 * 0.01;
            Landmark::new(shade + offset, 0.5 - offset, offset)
        });
        Ok(Detection::with_pose(Skeleton::new(landmarks)))
    }
}

struct FixedDetector(Skeleton);

impl PoseDetector for FixedDetector {
    fn detect(&mut self, _frame: &DynamicImage) -> Result<Detection> {
        Ok(Detection::with_pose(self.0.clone()))
    }
}

fn shaded_frames(n: usize) -> Vec<DynamicImage> {
    (0..n)
        .map(|i| {
            let shade = u8::try_from(i * 20).unwrap_or(u8::MAX);
            DynamicImage::ImageRgb8(RgbImage::from_pixel(16, 16, image::Rgb([shade, 0, 0])))
        })
        .collect()
}

fn session(frames: usize, policy: AbsencePolicy) -> Session {
    let source = SourceIterator::open(Source::from(shaded_frames(frames)), 30).unwrap();
    Session::from_source(
        source,
        ReplayConfig::new("memory").with_absence_policy(policy),
    )
}

#[test]
fn test_three_frame_shoulder_scenario() {
    let mut session = session(3, AbsencePolicy::Skip);
    let mut detector = FixedDetector(shoulder_skeleton());
    session.extract(&mut detector, None).unwrap();

    let timeline = session.timeline();
    assert_eq!(timeline.len(), 3);
    for record in timeline {
        let nose = record.translated[0];
        assert!(nose.x.abs() < EPS && nose.y.abs() < EPS && nose.z.abs() < EPS);

        let left = record.translated[11];
        assert!((left.x - 0.2).abs() < EPS);
        assert!((left.y - 0.1).abs() < EPS);
        assert!(left.z.abs() < EPS);

        let right = record.translated[12];
        assert!((right.x + 0.2).abs() < EPS);
        assert!((right.y - 0.1).abs() < EPS);
    }
}

#[test]
fn test_abort_on_second_of_five_frames() {
    let mut session = session(5, AbsencePolicy::Abort);
    let mut detector = PixelDetector::new(&[1]);
    let result = session.extract(&mut detector, None);

    assert!(matches!(
        result,
        Err(ReplayError::DetectionAbsent { frame_idx: 1 })
    ));
    assert_eq!(session.timeline().len(), 1);
    // No frame after the failing one reached the detector.
    assert_eq!(detector.calls, 2);
}

#[test]
fn test_skip_counts_only_detected_frames() {
    let mut session = session(6, AbsencePolicy::Skip);
    let summary = session
        .extract(&mut PixelDetector::new(&[0, 4, 5]), None)
        .unwrap();

    assert_eq!(summary.frames_read, 6);
    assert_eq!(session.timeline().len(), 3);
    assert!(session.timeline().len() <= session.metadata().frame_count);
    assert_eq!(summary.stop, StopReason::Exhausted);
}

#[test]
fn test_repeat_previous_keeps_frame_count() {
    let mut session = session(4, AbsencePolicy::RepeatPrevious);
    session
        .extract(&mut PixelDetector::new(&[2, 3]), None)
        .unwrap();

    let timeline = session.timeline();
    assert_eq!(timeline.len(), 4);
    assert_eq!(timeline.get(1), timeline.get(2));
    assert_eq!(timeline.get(2), timeline.get(3));
}

#[test]
fn test_extraction_is_idempotent() {
    let mut first = session(5, AbsencePolicy::Skip);
    let mut second = session(5, AbsencePolicy::Skip);
    first.extract(&mut PixelDetector::new(&[3]), None).unwrap();
    second.extract(&mut PixelDetector::new(&[3]), None).unwrap();

    assert_eq!(first.timeline(), second.timeline());
    assert_eq!(first.timeline().len(), 4);
}

#[test]
fn test_animation_interval_30fps() {
    let session = session(1, AbsencePolicy::Skip);
    let interval = session.animator().interval();
    let expected = frame_interval(30);
    assert_eq!(interval, expected);
    assert!((expected.as_secs_f64() * 1000.0 - 1000.0 / 30.0).abs() < 1e-6);
}

#[test]
fn test_replay_draw_contract() {
    let mut session = session(2, AbsencePolicy::Skip);
    session.extract(&mut PixelDetector::new(&[]), None).unwrap();

    let animator = session.animator();
    assert_eq!(animator.len(), 2);

    let commands = animator.render(1).unwrap();
    assert_eq!(commands.first(), Some(&DrawCommand::Clear));
    assert_eq!(
        commands.len(),
        1 + 2 * POSE_LANDMARK_COUNT + 2 * BONE_COUNT + 4
    );
    assert_eq!(commands.last(), Some(&DrawCommand::Limits(PlotWindow::default())));

    // Same timeline, same commands.
    assert_eq!(commands, animator.render(1).unwrap());
    assert!(matches!(
        animator.render(2),
        Err(ReplayError::FrameOutOfRange { index: 2, len: 2 })
    ));
}

#[test]
fn test_bone_table_in_range() {
    assert!(bones_valid(&BONES));
    assert!(
        BONES
            .iter()
            .all(|&[i, j]| i < POSE_LANDMARK_COUNT && j < POSE_LANDMARK_COUNT)
    );
}

#[test]
fn test_empty_timeline_replays_nothing() {
    let mut session = session(3, AbsencePolicy::Skip);
    let summary = session
        .extract(&mut PixelDetector::new(&[0, 1, 2]), None)
        .unwrap();

    assert_eq!(summary.frames_recorded, 0);
    assert!(session.animator().is_empty());
    assert_eq!(session.animator().frames().count(), 0);
}
