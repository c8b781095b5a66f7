// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Image preprocessing for landmark inference.
//!
//! Frames are letterboxed into a square model input (aspect ratio preserved, black
//! padding), normalized to `[0, 1]`, and laid out as NHWC or NCHW. Landmarks coming
//! back from the model are projected from the letterboxed input to normalized
//! coordinates of the original frame.

#![allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]

use std::fmt;
use std::str::FromStr;

use fast_image_resize::{PixelType, ResizeAlg, ResizeOptions, Resizer, images::Image};
use image::{DynamicImage, GenericImageView, RgbImage};
use ndarray::Array4;

use crate::error::{ReplayError, Result};
use crate::landmark::Landmark;

/// Memory layout of the model input tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TensorLayout {
    /// `(1, H, W, 3)`, the layout of converted TFLite landmark models.
    #[default]
    Nhwc,
    /// `(1, 3, H, W)`.
    Nchw,
}

impl fmt::Display for TensorLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Nhwc => write!(f, "nhwc"),
            Self::Nchw => write!(f, "nchw"),
        }
    }
}

impl FromStr for TensorLayout {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "nhwc" => Ok(Self::Nhwc),
            "nchw" => Ok(Self::Nchw),
            other => Err(format!("Unknown tensor layout: {other}")),
        }
    }
}

/// Result of letterboxing a frame, containing the tensor and transform info.
#[derive(Debug, Clone)]
pub struct LetterboxResult {
    /// Normalized input tensor.
    pub tensor: Array4<f32>,
    /// Original image dimensions (height, width).
    pub orig_shape: (u32, u32),
    /// Scale factors applied (`scale_y`, `scale_x`).
    pub scale: (f32, f32),
    /// Padding applied (`pad_top`, `pad_left`).
    pub padding: (f32, f32),
}

/// Letterbox a frame into a square `input_size` tensor.
///
/// # Errors
///
/// Returns an error if the frame is empty or resizing fails.
pub fn letterbox_image(
    image: &DynamicImage,
    input_size: usize,
    layout: TensorLayout,
) -> Result<LetterboxResult> {
    let (orig_width, orig_height) = image.dimensions();
    if orig_width == 0 || orig_height == 0 || input_size == 0 {
        return Err(ReplayError::ImageError(format!(
            "Cannot letterbox {orig_width}x{orig_height} frame into {input_size}x{input_size}"
        )));
    }

    let (new_width, new_height, pad_left, pad_top, scale) =
        calculate_letterbox_params(orig_width, orig_height, input_size);

    let resized = resize_rgb(image, new_width, new_height)?;

    let side = input_size as u32;
    let mut canvas = RgbImage::new(side, side);
    image::imageops::replace(&mut canvas, &resized, i64::from(pad_left), i64::from(pad_top));

    Ok(LetterboxResult {
        tensor: image_to_tensor(&canvas, layout),
        orig_shape: (orig_height, orig_width),
        scale,
        padding: (pad_top as f32, pad_left as f32),
    })
}

/// Calculate letterbox parameters for resizing.
///
/// # Returns
///
/// Tuple containing:
/// 1. `new_width`: Scaled width.
/// 2. `new_height`: Scaled height.
/// 3. `pad_left`: Left padding.
/// 4. `pad_top`: Top padding.
/// 5. `(scale_y, scale_x)`: Scale factors.
fn calculate_letterbox_params(
    orig_width: u32,
    orig_height: u32,
    input_size: usize,
) -> (u32, u32, u32, u32, (f32, f32)) {
    let target = input_size as f32;
    let (orig_h, orig_w) = (orig_height as f32, orig_width as f32);

    let scale = (target / orig_h).min(target / orig_w);

    let new_w = ((orig_w * scale).round() as u32).clamp(1, input_size as u32);
    let new_h = ((orig_h * scale).round() as u32).clamp(1, input_size as u32);

    let pad_left = (input_size as u32).saturating_sub(new_w) / 2;
    let pad_top = (input_size as u32).saturating_sub(new_h) / 2;

    let scale_x = new_w as f32 / orig_w;
    let scale_y = new_h as f32 / orig_h;

    (new_w, new_h, pad_left, pad_top, (scale_y, scale_x))
}

/// Bilinear resize to exactly `width` x `height`.
fn resize_rgb(image: &DynamicImage, width: u32, height: u32) -> Result<RgbImage> {
    let (src_w, src_h) = image.dimensions();
    let src_rgb = image.to_rgb8();
    if (src_w, src_h) == (width, height) {
        return Ok(src_rgb);
    }

    let src_image = Image::from_vec_u8(src_w, src_h, src_rgb.into_raw(), PixelType::U8x3)
        .map_err(|e| ReplayError::ImageError(format!("Failed to wrap frame: {e}")))?;
    let mut dst_image = Image::new(width, height, PixelType::U8x3);

    let mut resizer = Resizer::new();
    let options = ResizeOptions::new().resize_alg(ResizeAlg::Convolution(
        fast_image_resize::FilterType::Bilinear,
    ));
    resizer
        .resize(&src_image, &mut dst_image, Some(&options))
        .map_err(|e| ReplayError::ImageError(format!("Failed to resize frame: {e}")))?;

    RgbImage::from_raw(width, height, dst_image.into_vec())
        .ok_or_else(|| ReplayError::ImageError("Failed to create resized buffer".to_string()))
}

/// Convert an RGB image to a normalized tensor in the requested layout.
fn image_to_tensor(image: &RgbImage, layout: TensorLayout) -> Array4<f32> {
    let (width, height) = image.dimensions();
    let (w, h) = (width as usize, height as usize);
    let pixels = image.as_raw();

    match layout {
        TensorLayout::Nhwc => {
            let mut tensor = Array4::zeros((1, h, w, 3));
            for (dst, &src) in tensor.iter_mut().zip(pixels.iter()) {
                *dst = f32::from(src) / 255.0;
            }
            tensor
        }
        TensorLayout::Nchw => {
            let mut tensor = Array4::zeros((1, 3, h, w));
            for (i, chunk) in pixels.chunks_exact(3).enumerate() {
                let (y, x) = (i / w, i % w);
                tensor[[0, 0, y, x]] = f32::from(chunk[0]) / 255.0;
                tensor[[0, 1, y, x]] = f32::from(chunk[1]) / 255.0;
                tensor[[0, 2, y, x]] = f32::from(chunk[2]) / 255.0;
            }
            tensor
        }
    }
}

/// Project a raw model landmark `[x, y, z, visibility, ..]` back to the original frame.
///
/// `x`, `y` and `z` are in model-input pixels; the result is normalized by the original
/// frame width (`x`, `z`) and height (`y`). Visibility is a logit and goes through a sigmoid.
#[must_use]
pub fn unproject_landmark(raw: &[f32], letterbox: &LetterboxResult) -> Landmark {
    let (scale_y, scale_x) = letterbox.scale;
    let (pad_top, pad_left) = letterbox.padding;
    let (orig_h, orig_w) = (
        letterbox.orig_shape.0 as f32,
        letterbox.orig_shape.1 as f32,
    );

    let x = raw.first().copied().unwrap_or(0.0);
    let y = raw.get(1).copied().unwrap_or(0.0);
    let z = raw.get(2).copied().unwrap_or(0.0);
    let visibility = raw.get(3).map_or(1.0, |&v| sigmoid(v));

    Landmark {
        x: (x - pad_left) / scale_x / orig_w,
        y: (y - pad_top) / scale_y / orig_h,
        z: z / scale_x / orig_w,
        visibility,
    }
}

/// Logistic sigmoid.
#[must_use]
pub fn sigmoid(v: f32) -> f32 {
    1.0 / (1.0 + (-v).exp())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_letterbox_params_square() {
        let (new_w, new_h, pad_left, pad_top, _scale) = calculate_letterbox_params(512, 512, 256);

        assert_eq!(new_w, 256);
        assert_eq!(new_h, 256);
        assert_eq!(pad_left, 0);
        assert_eq!(pad_top, 0);
    }

    #[test]
    fn test_letterbox_params_wide() {
        let (new_w, new_h, pad_left, pad_top, _) = calculate_letterbox_params(1280, 720, 256);

        assert_eq!(new_w, 256);
        assert_eq!(new_h, 144);
        assert_eq!(pad_left, 0);
        assert_eq!(pad_top, 56);
    }

    #[test]
    fn test_letterbox_tensor_layouts() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(64, 32, image::Rgb([255, 0, 0])));

        let nhwc = letterbox_image(&image, 32, TensorLayout::Nhwc).unwrap();
        assert_eq!(nhwc.tensor.shape(), &[1, 32, 32, 3]);
        // Center row is image content, top row is padding.
        assert!((nhwc.tensor[[0, 16, 16, 0]] - 1.0).abs() < 1e-6);
        assert!(nhwc.tensor[[0, 0, 16, 0]].abs() < 1e-6);

        let nchw = letterbox_image(&image, 32, TensorLayout::Nchw).unwrap();
        assert_eq!(nchw.tensor.shape(), &[1, 3, 32, 32]);
        assert!((nchw.tensor[[0, 0, 16, 16]] - 1.0).abs() < 1e-6);
        assert!(nchw.tensor[[0, 1, 16, 16]].abs() < 1e-6);
    }

    #[test]
    fn test_unproject_center() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(1280, 720));
        let letterbox = letterbox_image(&image, 256, TensorLayout::Nhwc).unwrap();

        let lm = unproject_landmark(&[128.0, 128.0, 0.0, 0.0], &letterbox);
        assert!((lm.x - 0.5).abs() < 1e-4);
        assert!((lm.y - 0.5).abs() < 1e-4);
        assert!((lm.visibility - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_empty_frame_rejected() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(0, 0));
        assert!(letterbox_image(&image, 256, TensorLayout::Nhwc).is_err());
    }

    #[test]
    fn test_layout_parse() {
        assert_eq!("NHWC".parse::<TensorLayout>().unwrap(), TensorLayout::Nhwc);
        assert_eq!("nchw".parse::<TensorLayout>().unwrap(), TensorLayout::Nchw);
        assert!("chw".parse::<TensorLayout>().is_err());
    }
}
