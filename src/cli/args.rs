// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use clap::{Args, Parser, Subcommand};

use crate::config::{DEFAULT_FPS, DEFAULT_PLOT_SIZE};
use crate::extract::AbsencePolicy;
use crate::preprocessing::TensorLayout;

/// CLI arguments parser.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
#[command(after_help = r#"Run Options:
    --source, -s <SOURCE>    Input video, image, directory or glob
    --model, -m <MODEL>      Path to the ONNX pose landmark model
    --hand-model <MODEL>     Hand landmark model drawn on the preview
    --face-model <MODEL>     Face landmark model drawn on the preview
    --show                   Show annotated frames while extracting
    --on-missing <POLICY>    Frames without a pose: skip, repeat or abort [default: skip]
    --fps <FPS>              Frame rate for image sources [default: 30]
    --plot-size <PIXELS>     Animation window size [default: 800]
    --no-repeat              Play the animation once instead of looping
    --headless               Extract only, do not open the animation window
    --verbose <BOOL>         Show per-frame output [default: true]

Examples:
    holistic-replay run --source dance.mp4 --model pose_landmark_full.onnx
    holistic-replay run -s dance.mp4 -m pose_landmark_full.onnx --show --on-missing repeat
    holistic-replay run -s dance.mp4 -m pose_landmark_full.onnx --show --hand-model hand_landmark.onnx
    holistic-replay run -s frames/ -m pose_landmark_full.onnx --fps 25 --no-repeat
    holistic-replay run -s "frames/*.png" -m pose_landmark_full.onnx --headless --verbose false"#)]
pub struct Cli {
    #[command(subcommand)]
    /// Subcommand to execute.
    pub command: Commands,
}

/// Commands for the CLI.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Extract landmarks from a video and replay the skeleton
    Run(RunArgs),
}

/// Arguments for the run command.
#[derive(Args, Debug)]
#[allow(clippy::struct_excessive_bools)]
pub struct RunArgs {
    /// Input source (video, image, directory, or glob)
    #[arg(short, long)]
    pub source: String,

    /// Path to the ONNX pose landmark model
    #[arg(short, long)]
    pub model: String,

    /// Optional ONNX hand landmark model for the preview
    #[arg(long)]
    pub hand_model: Option<String>,

    /// Optional ONNX face landmark model for the preview
    #[arg(long)]
    pub face_model: Option<String>,

    /// Show annotated frames while extracting
    #[arg(long, default_value_t = false)]
    pub show: bool,

    /// What to do with frames without a detected pose (skip, repeat, abort)
    #[arg(long, default_value_t = AbsencePolicy::Skip)]
    pub on_missing: AbsencePolicy,

    /// Frame rate for image sources and videos that report none
    #[arg(long, default_value_t = DEFAULT_FPS)]
    pub fps: u32,

    /// Side length of the animation window in pixels
    #[arg(long, default_value_t = DEFAULT_PLOT_SIZE)]
    pub plot_size: usize,

    /// Play the animation once instead of looping
    #[arg(long, default_value_t = false)]
    pub no_repeat: bool,

    /// Extract only, without the animation window
    #[arg(long, default_value_t = false)]
    pub headless: bool,

    /// Minimum pose presence score
    #[arg(long, default_value_t = 0.5)]
    pub min_presence: f32,

    /// Intra-op threads for ONNX Runtime (0 = automatic)
    #[arg(long, default_value_t = 0)]
    pub threads: usize,

    /// Model input layout (nhwc, nchw)
    #[arg(long, default_value_t = TensorLayout::Nhwc)]
    pub layout: TensorLayout,

    /// Show verbose output
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_args_defaults() {
        let args = Cli::parse_from(["app", "run", "--source", "a.mp4", "--model", "pose.onnx"]);
        match args.command {
            Commands::Run(run_args) => {
                assert_eq!(run_args.source, "a.mp4");
                assert_eq!(run_args.model, "pose.onnx");
                assert_eq!(run_args.on_missing, AbsencePolicy::Skip);
                assert_eq!(run_args.fps, 30);
                assert_eq!(run_args.plot_size, 800);
                assert_eq!(run_args.layout, TensorLayout::Nhwc);
                assert!((run_args.min_presence - 0.5).abs() < f32::EPSILON);
                assert!(!run_args.show);
                assert!(!run_args.no_repeat);
                assert!(!run_args.headless);
                assert!(run_args.verbose);
                assert!(run_args.hand_model.is_none());
                assert!(run_args.face_model.is_none());
            }
        }
    }

    #[test]
    fn test_run_args_custom() {
        let args = Cli::parse_from([
            "app",
            "run",
            "-s",
            "frames/",
            "-m",
            "custom.onnx",
            "--on-missing",
            "abort",
            "--fps",
            "25",
            "--layout",
            "nchw",
            "--no-repeat",
            "--hand-model",
            "hand_landmark.onnx",
            "--verbose",
            "false",
        ]);
        match args.command {
            Commands::Run(run_args) => {
                assert_eq!(run_args.source, "frames/");
                assert_eq!(run_args.on_missing, AbsencePolicy::Abort);
                assert_eq!(run_args.fps, 25);
                assert_eq!(run_args.layout, TensorLayout::Nchw);
                assert!(run_args.no_repeat);
                assert_eq!(run_args.hand_model.as_deref(), Some("hand_landmark.onnx"));
                assert!(!run_args.verbose);
            }
        }
    }

    #[test]
    fn test_run_requires_source() {
        assert!(Cli::try_parse_from(["app", "run", "--model", "pose.onnx"]).is_err());
        assert!(
            Cli::try_parse_from(["app", "run", "-s", "a.mp4", "-m", "p.onnx", "--on-missing", "x"])
                .is_err()
        );
    }
}
