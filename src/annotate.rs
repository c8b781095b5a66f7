// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Landmark overlays for preview frames and font lookup for plot labels.

#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use ab_glyph::FontVec;
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_circle_mut, draw_line_segment_mut};

use crate::detector::Detection;
use crate::landmark::{Landmark, Skeleton};
use crate::visualizer::color::Color;
use crate::visualizer::skeleton::{BONE_COLOR_INDICES, BONES, HAND_CONNECTIONS};
use crate::{verbose, warn};

/// Assets URL for downloading fonts
const ASSETS_URL: &str = "https://github.com/ultralytics/assets/releases/download/v0.0.0";

/// Landmarks with lower visibility are not drawn.
pub const MIN_VISIBILITY: f32 = 0.5;

const LANDMARK_RADIUS: i32 = 4;
const HAND_RADIUS: i32 = 2;
const FACE_RADIUS: i32 = 1;

const LEFT_HAND_COLOR: Color = Color::new(255, 128, 0);
const RIGHT_HAND_COLOR: Color = Color::new(51, 153, 255);
const FACE_COLOR: Color = Color::new(230, 230, 230);

/// Per-user directory holding downloaded fonts.
fn font_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(crate::NAME))
}

/// Check if font exists locally or download it
pub fn check_font(font: &str) -> Option<PathBuf> {
    let font_name = Path::new(font).file_name()?.to_string_lossy();
    let config_dir = font_dir()?;
    let font_path = config_dir.join(font_name.as_ref());

    if font_path.exists() {
        return Some(font_path);
    }

    if let Err(e) = fs::create_dir_all(&config_dir) {
        warn!("Failed to create config directory: {e}");
        return None;
    }

    let url = format!("{ASSETS_URL}/{font_name}");
    verbose!("Downloading {url} to {}", font_path.display());

    match ureq::get(&url).call() {
        Ok(response) => {
            let mut file = match File::create(&font_path) {
                Ok(f) => f,
                Err(e) => {
                    warn!("Failed to create font file: {e}");
                    return None;
                }
            };

            let mut reader = response.into_body().into_reader();
            if let Err(e) = io::copy(&mut reader, &mut file) {
                warn!("Failed to download font: {e}");
                let _ = fs::remove_file(&font_path);
                return None;
            }

            Some(font_path)
        }
        Err(e) => {
            warn!("Failed to download font from {url}: {e}");
            None
        }
    }
}

/// Load a font by file name, downloading it on first use.
///
/// Returns `None` when the font is unavailable; labels are then skipped.
pub fn load_font(font: &str) -> Option<FontVec> {
    let path = check_font(font)?;
    let data = fs::read(path).ok()?;
    FontVec::try_from_vec(data).ok()
}

/// Draw every detected landmark set onto a copy of `image`.
///
/// Pose bones use the pose palette, hands are drawn with their finger
/// connections and face landmarks as small dots.
#[must_use]
pub fn annotate_detection(image: &DynamicImage, detection: &Detection) -> DynamicImage {
    let mut img = image.to_rgb8();

    if let Some(face) = &detection.face {
        for lm in face {
            draw_point(&mut img, lm, FACE_RADIUS, FACE_COLOR);
        }
    }

    if let Some(pose) = &detection.pose {
        draw_pose(&mut img, pose);
    }

    for (hand, color) in [
        (&detection.left_hand, LEFT_HAND_COLOR),
        (&detection.right_hand, RIGHT_HAND_COLOR),
    ] {
        if let Some(hand) = hand {
            draw_connections(&mut img, hand, &HAND_CONNECTIONS, |_| color);
            for lm in hand {
                draw_point(&mut img, lm, HAND_RADIUS, color);
            }
        }
    }

    DynamicImage::ImageRgb8(img)
}

fn draw_pose(img: &mut RgbImage, pose: &Skeleton) {
    draw_connections(img, pose.landmarks(), &BONES, |i| {
        Color::from_pose_index(BONE_COLOR_INDICES[i])
    });

    for lm in pose.landmarks() {
        if lm.visibility >= MIN_VISIBILITY {
            draw_point(img, lm, LANDMARK_RADIUS, Color::RED);
        }
    }
}

fn draw_connections(
    img: &mut RgbImage,
    landmarks: &[Landmark],
    connections: &[[usize; 2]],
    color_of: impl Fn(usize) -> Color,
) {
    let (width, height) = img.dimensions();

    for (k, &[i, j]) in connections.iter().enumerate() {
        let (Some(a), Some(b)) = (landmarks.get(i), landmarks.get(j)) else {
            continue;
        };
        if a.visibility < MIN_VISIBILITY || b.visibility < MIN_VISIBILITY {
            continue;
        }
        draw_line_segment_mut(
            img,
            to_pixel(a, width, height),
            to_pixel(b, width, height),
            Rgb(color_of(k).rgb()),
        );
    }
}

fn draw_point(img: &mut RgbImage, lm: &Landmark, radius: i32, color: Color) {
    let (width, height) = img.dimensions();
    let (x, y) = to_pixel(lm, width, height);
    if x < 0.0 || y < 0.0 || x >= width as f32 || y >= height as f32 {
        return;
    }
    draw_filled_circle_mut(
        img,
        (x.round() as i32, y.round() as i32),
        radius,
        Rgb(color.rgb()),
    );
}

/// Normalized landmark coordinates to pixel coordinates.
fn to_pixel(lm: &Landmark, width: u32, height: u32) -> (f32, f32) {
    (lm.x * width as f32, lm.y * height as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmark::POSE_LANDMARK_COUNT;

    #[test]
    fn test_annotate_keeps_size_and_draws() {
        let frame = DynamicImage::ImageRgb8(RgbImage::new(100, 80));
        let skeleton = Skeleton::new([Landmark::new(0.5, 0.5, 0.0); POSE_LANDMARK_COUNT]);
        let annotated = annotate_detection(&frame, &Detection::with_pose(skeleton));

        let rgb = annotated.to_rgb8();
        assert_eq!(rgb.dimensions(), (100, 80));
        assert_eq!(rgb.get_pixel(50, 40).0, Color::RED.rgb());
    }

    #[test]
    fn test_low_visibility_not_drawn() {
        let frame = DynamicImage::ImageRgb8(RgbImage::new(40, 40));
        let mut lm = Landmark::new(0.5, 0.5, 0.0);
        lm.visibility = 0.1;
        let skeleton = Skeleton::new([lm; POSE_LANDMARK_COUNT]);
        let annotated = annotate_detection(&frame, &Detection::with_pose(skeleton));

        assert!(annotated.to_rgb8().pixels().all(|p| p.0 == [0, 0, 0]));
    }

    #[test]
    fn test_font_dir_named_after_crate() {
        if let Some(dir) = font_dir() {
            assert!(dir.ends_with("holistic-replay"));
        }
    }

    #[test]
    fn test_hands_and_face_drawn() {
        let frame = DynamicImage::ImageRgb8(RgbImage::new(40, 40));
        let detection = Detection {
            left_hand: Some(vec![Landmark::new(0.25, 0.25, 0.0); 21]),
            face: Some(vec![Landmark::new(0.75, 0.75, 0.0)]),
            ..Detection::default()
        };
        let rgb = annotate_detection(&frame, &detection).to_rgb8();

        assert_eq!(rgb.get_pixel(10, 10).0, LEFT_HAND_COLOR.rgb());
        assert_eq!(rgb.get_pixel(30, 30).0, FACE_COLOR.rgb());
    }
}
