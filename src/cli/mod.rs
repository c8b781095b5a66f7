// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Command-line interface.
//!
//! This module contains argument parsing, console output macros and the `run`
//! command that extracts landmarks and replays the skeleton.

/// CLI arguments.
pub mod args;

/// Console output macros and verbosity flag.
pub mod logging;

/// Extraction and replay command.
pub mod run;
