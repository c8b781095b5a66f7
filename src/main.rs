// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use clap::Parser;

use holistic_replay::cli::args::{Cli, Commands};
use holistic_replay::cli::run::run_replay;

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => run_replay(&args),
    }
}
