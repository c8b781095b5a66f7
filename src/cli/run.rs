// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use std::process;

use crate::cli::args::RunArgs;
use crate::cli::logging::set_verbose;
use crate::config::{DetectorConfig, ReplayConfig};
use crate::detector::{OnnxPoseDetector, PoseDetector};
use crate::error::{ReplayError, Result};
use crate::extract::{ExtractionSummary, FramePreview, StopReason};
use crate::session::Session;
use crate::utils::pluralize;
use crate::{VERSION, error, info, section, success, verbose, warn};

/// Run the `run` command, exiting with status 1 on failure.
pub fn run_replay(args: &RunArgs) {
    set_verbose(args.verbose);

    if let Err(e) = try_run(args) {
        error!("{e}");
        process::exit(1);
    }
}

fn try_run(args: &RunArgs) -> Result<()> {
    let config = ReplayConfig::new(&args.source)
        .with_show_video(args.show)
        .with_absence_policy(args.on_missing)
        .with_fallback_fps(args.fps)
        .with_plot_size(args.plot_size)
        .with_repeat(!args.no_repeat);

    let mut detector_config = DetectorConfig::new()
        .with_min_presence(args.min_presence)
        .with_layout(args.layout)
        .with_threads(args.threads);
    if let Some(path) = &args.hand_model {
        detector_config = detector_config.with_hand_model(path);
    }
    if let Some(path) = &args.face_model {
        detector_config = detector_config.with_face_model(path);
    }
    if !args.show && (args.hand_model.is_some() || args.face_model.is_some()) {
        warn!("Hand and face landmarks are only drawn with --show");
    }

    let mut detector = OnnxPoseDetector::load_with_config(&args.model, detector_config)?;
    info!("Holistic Replay {VERSION} 🚀 {}", detector.describe());

    let mut session = Session::open(config)?;
    let metadata = session.metadata();

    section!("Extracting landmarks");
    let mut preview = open_preview(session.config().show_video);
    let preview_ref: Option<&mut dyn FramePreview> = match preview.as_mut() {
        Some(p) => Some(p.as_mut()),
        None => None,
    };

    let summary = match session.extract(&mut detector, preview_ref) {
        Ok(summary) => summary,
        Err(e) => {
            if matches!(e, ReplayError::DetectionAbsent { .. }) {
                warn!(
                    "Aborted with {} recorded",
                    pluralize(session.timeline().len(), "frame")
                );
            }
            return Err(e);
        }
    };
    report(&summary);

    if args.headless {
        verbose!("Headless run, skipping replay");
        return Ok(());
    }

    section!("Replay");
    verbose!(
        "{} at {} fps (source reported {})",
        pluralize(session.timeline().len(), "frame"),
        metadata.fps,
        pluralize(metadata.frame_count, "frame")
    );
    play(&session)
}

fn report(summary: &ExtractionSummary) {
    match &summary.stop {
        StopReason::Exhausted => {}
        StopReason::ReadFailed(reason) => warn!("Source ended early: {reason}"),
        StopReason::Interrupted => warn!("Extraction interrupted by user"),
    }

    verbose!(
        "Speed: {:.1}ms inference per frame",
        summary.mean_inference_ms()
    );
    if summary.frames_missing > 0 {
        verbose!(
            "No pose in {}, {} repeated",
            pluralize(summary.frames_missing, "frame"),
            summary.frames_repeated
        );
    }
    success!(
        "Recorded {} from {} read",
        pluralize(summary.frames_recorded, "frame"),
        summary.frames_read
    );
}

#[cfg(feature = "visualize")]
fn open_preview(show: bool) -> Option<Box<dyn FramePreview>> {
    show.then(|| Box::new(crate::visualizer::WindowPreview::new()) as Box<dyn FramePreview>)
}

#[cfg(not(feature = "visualize"))]
fn open_preview(show: bool) -> Option<Box<dyn FramePreview>> {
    if show {
        warn!("--show requires the 'visualize' feature. Compile with --features visualize to enable it.");
    }
    None
}

#[cfg(feature = "visualize")]
fn play(session: &Session) -> Result<()> {
    let config = session.config();
    let player = crate::visualizer::Player::new(config.plot_size, config.repeat);
    let shown = player.play(&session.animator())?;
    verbose!("Displayed {}", pluralize(shown, "frame"));
    Ok(())
}

#[cfg(not(feature = "visualize"))]
fn play(_session: &Session) -> Result<()> {
    Err(ReplayError::FeatureNotEnabled(
        "Replay requires the 'visualize' feature; use --headless to extract only".to_string(),
    ))
}
