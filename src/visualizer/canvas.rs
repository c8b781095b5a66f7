// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Rasterise [`DrawCommand`]s into an RGB image.

#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]

use ab_glyph::{FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{
    draw_filled_circle_mut, draw_filled_rect_mut, draw_line_segment_mut, draw_text_mut,
};
use imageproc::rect::Rect;

use crate::animation::{DrawCommand, LineStyle, MarkerShape, MarkerStyle, PlotWindow};
use crate::visualizer::color::Color;

const DASH_PX: f32 = 6.0;
const GAP_PX: f32 = 4.0;
const LABEL_PX: f32 = 16.0;
const LABEL_MARGIN: i32 = 6;

/// Square or rectangular plot surface in plot coordinates.
pub struct Canvas {
    image: RgbImage,
    window: PlotWindow,
    font: Option<FontVec>,
}

impl Canvas {
    /// Create a white canvas of `width` x `height` pixels.
    #[must_use]
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbImage::from_pixel(width.max(1), height.max(1), Rgb(Color::WHITE.rgb())),
            window: PlotWindow::default(),
            font: None,
        }
    }

    /// Use `font` for axis labels. Without a font labels are skipped.
    #[must_use]
    pub fn with_font(mut self, font: Option<FontVec>) -> Self {
        self.font = font;
        self
    }

    /// The rendered image.
    #[must_use]
    pub const fn image(&self) -> &RgbImage {
        &self.image
    }

    /// Draw one frame's commands.
    ///
    /// The plot window is taken from the frame's `Limits` command before
    /// anything is drawn, so every point uses the same mapping.
    pub fn draw(&mut self, commands: &[DrawCommand]) -> &RgbImage {
        if let Some(window) = commands.iter().rev().find_map(|c| match c {
            DrawCommand::Limits(window) => Some(*window),
            _ => None,
        }) {
            self.window = window;
        }

        for command in commands {
            match command {
                DrawCommand::Clear => self.clear(),
                DrawCommand::Marker { point, style } => self.marker(*point, style),
                DrawCommand::Segment { from, to, style } => self.line(*from, *to, style),
                DrawCommand::AxisLabels { x, y } => self.labels(x, y),
                DrawCommand::HorizontalLine { y, style } => {
                    let (x0, x1) = self.window.x;
                    self.line([x0, *y], [x1, *y], style);
                }
                DrawCommand::VerticalLine { x, style } => {
                    let (y0, y1) = self.window.y;
                    self.line([*x, y0], [*x, y1], style);
                }
                DrawCommand::Limits(_) => {}
            }
        }

        &self.image
    }

    /// Map a plot point to pixel coordinates (y grows upwards in plot space).
    #[must_use]
    pub fn to_pixel(&self, point: [f32; 2]) -> (f32, f32) {
        let (w, h) = self.image.dimensions();
        let (x0, x1) = self.window.x;
        let (y0, y1) = self.window.y;
        let px = (point[0] - x0) / (x1 - x0) * (w - 1) as f32;
        let py = (y1 - point[1]) / (y1 - y0) * (h - 1) as f32;
        (px, py)
    }

    fn clear(&mut self) {
        for pixel in self.image.pixels_mut() {
            *pixel = Rgb(Color::WHITE.rgb());
        }
    }

    fn marker(&mut self, point: [f32; 2], style: &MarkerStyle) {
        let (x, y) = self.to_pixel(point);
        let (x, y) = (x.round() as i32, y.round() as i32);
        let r = style.radius.round().max(1.0) as i32;
        let color = Rgb(style.color.rgb());

        match style.shape {
            MarkerShape::Circle => draw_filled_circle_mut(&mut self.image, (x, y), r, color),
            MarkerShape::Square => {
                let side = (2 * r + 1) as u32;
                draw_filled_rect_mut(
                    &mut self.image,
                    Rect::at(x - r, y - r).of_size(side, side),
                    color,
                );
            }
        }
    }

    fn line(&mut self, from: [f32; 2], to: [f32; 2], style: &LineStyle) {
        let start = self.to_pixel(from);
        let end = self.to_pixel(to);
        let color = Rgb(style.color.rgb());
        let thickness = style.width.round().max(1.0) as i32;

        // Thicker lines are drawn as parallel copies offset across the main direction.
        let (dx, dy) = (end.0 - start.0, end.1 - start.1);
        let across = if dx.abs() >= dy.abs() { (0.0, 1.0) } else { (1.0, 0.0) };

        for t in 0..thickness {
            let offset = (t - thickness / 2) as f32;
            let a = (start.0 + across.0 * offset, start.1 + across.1 * offset);
            let b = (end.0 + across.0 * offset, end.1 + across.1 * offset);
            if style.dashed {
                draw_dashed(&mut self.image, a, b, color);
            } else {
                draw_line_segment_mut(&mut self.image, a, b, color);
            }
        }
    }

    fn labels(&mut self, x_label: &str, y_label: &str) {
        let Some(font) = &self.font else {
            return;
        };
        let (w, h) = self.image.dimensions();
        let scale = PxScale::from(LABEL_PX);
        let color = Rgb(Color::BLACK.rgb());

        let x_pos = (w as i32 / 2 - 3 * LABEL_PX as i32).max(0);
        let y_pos = h as i32 - LABEL_PX as i32 - LABEL_MARGIN;
        draw_text_mut(&mut self.image, color, x_pos, y_pos, scale, font, x_label);
        draw_text_mut(
            &mut self.image,
            color,
            LABEL_MARGIN,
            LABEL_MARGIN,
            scale,
            font,
            y_label,
        );
    }
}

fn draw_dashed(image: &mut RgbImage, start: (f32, f32), end: (f32, f32), color: Rgb<u8>) {
    let (dx, dy) = (end.0 - start.0, end.1 - start.1);
    let length = dx.hypot(dy);
    if length <= f32::EPSILON {
        return;
    }
    let (ux, uy) = (dx / length, dy / length);

    let mut pos = 0.0;
    while pos < length {
        let stop = (pos + DASH_PX).min(length);
        draw_line_segment_mut(
            image,
            (start.0 + ux * pos, start.1 + uy * pos),
            (start.0 + ux * stop, start.1 + uy * stop),
            color,
        );
        pos += DASH_PX + GAP_PX;
    }
}

impl std::fmt::Debug for Canvas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Canvas")
            .field("size", &self.image.dimensions())
            .field("window", &self.window)
            .field("font", &self.font.is_some())
            .finish()
    }
}
