// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Drawing tables, rasterisation and windows for preview and replay.

/// Color definitions and palettes.
pub mod color;

/// Landmark connection tables.
pub mod skeleton;

#[cfg(feature = "annotate")]
pub mod canvas;

#[cfg(feature = "visualize")]
pub mod player;

#[cfg(feature = "visualize")]
pub mod preview;

#[cfg(feature = "visualize")]
pub mod viewer;

pub use color::Color;
pub use skeleton::BONES;

#[cfg(feature = "annotate")]
pub use canvas::Canvas;

#[cfg(feature = "visualize")]
pub use player::Player;

#[cfg(feature = "visualize")]
pub use preview::WindowPreview;

#[cfg(feature = "visualize")]
pub use viewer::Viewer;
