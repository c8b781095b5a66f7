// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Skeleton replay as renderer-independent draw commands.
//!
//! [`SkeletonAnimator::render`] maps one timeline frame to an ordered list of
//! [`DrawCommand`]s. The same timeline and bone table always produce the same
//! commands, so replay can be tested without a display.

use std::time::Duration;

use crate::error::Result;
use crate::record::{FrameRecord, SkeletonPoints};
use crate::timeline::Timeline;
use crate::visualizer::color::Color;
use crate::visualizer::skeleton::BONES;

/// Marker shape for a plotted landmark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerShape {
    /// Filled circle.
    Circle,
    /// Filled square.
    Square,
}

/// How a landmark point is drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerStyle {
    /// Marker shape.
    pub shape: MarkerShape,
    /// Fill color.
    pub color: Color,
    /// Marker radius in pixels.
    pub radius: f32,
}

/// How a line is drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineStyle {
    /// Stroke color.
    pub color: Color,
    /// Stroke width in pixels.
    pub width: f32,
    /// Draw dashed instead of solid.
    pub dashed: bool,
}

/// Style of the raw (mirrored) skeleton points.
pub const RAW_MARKER: MarkerStyle = MarkerStyle {
    shape: MarkerShape::Circle,
    color: Color::RED,
    radius: 3.0,
};

/// Style of the nose-relative skeleton points.
pub const TRANSLATED_MARKER: MarkerStyle = MarkerStyle {
    shape: MarkerShape::Square,
    color: Color::GREEN,
    radius: 3.0,
};

/// Style of bone segments.
pub const BONE_LINE: LineStyle = LineStyle {
    color: Color::BLUE,
    width: 1.0,
    dashed: false,
};

/// Style of the reference axes through the origin.
pub const AXIS_LINE: LineStyle = LineStyle {
    color: Color::BLACK,
    width: 0.5,
    dashed: true,
};

/// Fixed visible coordinate range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlotWindow {
    /// `(min, max)` on the horizontal axis.
    pub x: (f32, f32),
    /// `(min, max)` on the vertical axis.
    pub y: (f32, f32),
}

impl Default for PlotWindow {
    fn default() -> Self {
        Self {
            x: (-1.0, 1.0),
            y: (-2.0, 2.0),
        }
    }
}

/// One drawing instruction in plot coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    /// Erase the previous frame.
    Clear,
    /// A single point marker at `(x, y)`.
    Marker {
        /// Point position.
        point: [f32; 2],
        /// Marker style.
        style: MarkerStyle,
    },
    /// A line segment between two points.
    Segment {
        /// Start point.
        from: [f32; 2],
        /// End point.
        to: [f32; 2],
        /// Line style.
        style: LineStyle,
    },
    /// Axis titles.
    AxisLabels {
        /// Horizontal axis title.
        x: String,
        /// Vertical axis title.
        y: String,
    },
    /// A horizontal line across the plot at height `y`.
    HorizontalLine {
        /// Height of the line.
        y: f32,
        /// Line style.
        style: LineStyle,
    },
    /// A vertical line across the plot at `x`.
    VerticalLine {
        /// Position of the line.
        x: f32,
        /// Line style.
        style: LineStyle,
    },
    /// Fix the visible coordinate range.
    Limits(PlotWindow),
}

/// Time between displayed frames at `fps` (`1000 / fps` ms, `fps` clamped to at least 1).
#[must_use]
pub fn frame_interval(fps: u32) -> Duration {
    Duration::from_secs_f64(1.0 / f64::from(fps.max(1)))
}

/// Draw commands for one frame record.
///
/// Order: clear, raw markers, translated markers, then for each bone the raw
/// segment followed by the translated segment, axis labels, the two axes and
/// the plot limits.
#[must_use]
pub fn render_frame(record: &FrameRecord, bones: &[[usize; 2]]) -> Vec<DrawCommand> {
    let mut commands = Vec::with_capacity(1 + 2 * record.raw.len() + 2 * bones.len() + 4);
    commands.push(DrawCommand::Clear);

    push_markers(&mut commands, &record.raw, RAW_MARKER);
    push_markers(&mut commands, &record.translated, TRANSLATED_MARKER);

    for &[i, j] in bones {
        for points in [&record.raw, &record.translated] {
            if let (Some(a), Some(b)) = (points.get(i), points.get(j)) {
                commands.push(DrawCommand::Segment {
                    from: a.xy(),
                    to: b.xy(),
                    style: BONE_LINE,
                });
            }
        }
    }

    commands.push(DrawCommand::AxisLabels {
        x: "X axis".to_string(),
        y: "Y axis".to_string(),
    });
    commands.push(DrawCommand::HorizontalLine {
        y: 0.0,
        style: AXIS_LINE,
    });
    commands.push(DrawCommand::VerticalLine {
        x: 0.0,
        style: AXIS_LINE,
    });
    commands.push(DrawCommand::Limits(PlotWindow::default()));

    commands
}

fn push_markers(commands: &mut Vec<DrawCommand>, points: &SkeletonPoints, style: MarkerStyle) {
    commands.extend(points.iter().map(|p| DrawCommand::Marker {
        point: p.xy(),
        style,
    }));
}

/// Replays a [`Timeline`] frame by frame.
///
/// # Example
///
/// ```rust
/// use holistic_replay::{SkeletonAnimator, Timeline};
///
/// let timeline = Timeline::new();
/// let animator = SkeletonAnimator::new(&timeline, 30);
/// assert!(animator.is_empty());
/// assert!(animator.render(0).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct SkeletonAnimator<'a> {
    timeline: &'a Timeline,
    bones: &'a [[usize; 2]],
    interval: Duration,
}

impl<'a> SkeletonAnimator<'a> {
    /// Create an animator over `timeline` with the standard bone table.
    #[must_use]
    pub fn new(timeline: &'a Timeline, fps: u32) -> Self {
        Self::with_bones(timeline, &BONES, fps)
    }

    /// Create an animator with a custom bone table.
    #[must_use]
    pub fn with_bones(timeline: &'a Timeline, bones: &'a [[usize; 2]], fps: u32) -> Self {
        Self {
            timeline,
            bones,
            interval: frame_interval(fps),
        }
    }

    /// Number of animation frames (one per timeline record).
    #[must_use]
    pub fn len(&self) -> usize {
        self.timeline.len()
    }

    /// Check if there is nothing to replay.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.timeline.is_empty()
    }

    /// Delay between displayed frames.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Draw commands for frame `frame`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::ReplayError::FrameOutOfRange`] if `frame >= len()`.
    pub fn render(&self, frame: usize) -> Result<Vec<DrawCommand>> {
        let record = self.timeline.frame(frame)?;
        Ok(render_frame(record, self.bones))
    }

    /// Draw commands for every frame in order.
    pub fn frames(&self) -> impl Iterator<Item = Vec<DrawCommand>> + '_ {
        self.timeline
            .iter()
            .map(move |record| render_frame(record, self.bones))
    }
}
