// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

//! Input source handling for landmark extraction.
//!
//! This module provides abstractions for the frame sources a session can read:
//! video files, single images, image directories, glob patterns, and in-memory
//! frame lists. Every source reports [`VideoMetadata`] when it is opened.

use std::path::{Path, PathBuf};
use std::time::Duration;

use image::DynamicImage;

use crate::error::{ReplayError, Result};

/// Represents different input sources for extraction.
#[derive(Debug, Clone)]
pub enum Source {
    /// Path to an image file.
    Image(PathBuf),
    /// List of image paths, read in order.
    ImageList(Vec<PathBuf>),
    /// Path to a video file.
    Video(PathBuf),
    /// Directory containing images, read in file name order.
    Directory(PathBuf),
    /// Glob pattern for images.
    Glob(String),
    /// In-memory frames.
    Frames(Vec<DynamicImage>),
}

impl Source {
    /// Check if this source is a video.
    #[must_use]
    pub const fn is_video(&self) -> bool {
        matches!(self, Self::Video(_))
    }

    /// Get the path if this source has one.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Image(p) | Self::Video(p) | Self::Directory(p) => Some(p),
            _ => None,
        }
    }

    /// Short description for log output.
    #[must_use]
    pub fn describe(&self) -> String {
        match self {
            Self::Image(p) | Self::Video(p) | Self::Directory(p) => p.display().to_string(),
            Self::Glob(pattern) => pattern.clone(),
            Self::ImageList(paths) => format!("{} images", paths.len()),
            Self::Frames(frames) => format!("{} in-memory frames", frames.len()),
        }
    }
}

/// Convert from a string path to Source.
impl From<&str> for Source {
    fn from(s: &str) -> Self {
        if s.contains('*') {
            return Self::Glob(s.to_string());
        }

        let path = PathBuf::from(s);

        if path.is_dir() {
            return Self::Directory(path);
        }

        if let Some(ext) = path.extension() {
            let ext = ext.to_string_lossy().to_lowercase();
            if matches!(
                ext.as_str(),
                "mp4" | "avi" | "mov" | "mkv" | "wmv" | "flv" | "webm" | "m4v" | "mpeg" | "mpg"
            ) {
                return Self::Video(path);
            }
        }

        Self::Image(path)
    }
}

impl From<String> for Source {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<PathBuf> for Source {
    fn from(path: PathBuf) -> Self {
        Self::from(path.to_string_lossy().as_ref())
    }
}

impl From<&Path> for Source {
    fn from(path: &Path) -> Self {
        Self::from(path.to_string_lossy().as_ref())
    }
}

impl From<Vec<DynamicImage>> for Source {
    fn from(frames: Vec<DynamicImage>) -> Self {
        Self::Frames(frames)
    }
}

/// Frame count and rate of a source, read once when it is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoMetadata {
    /// Total number of frames the source announces, `0` when unknown.
    ///
    /// For video this is the stream's frame count, or a duration-based estimate
    /// rounded up when the container does not store one.
    pub frame_count: usize,
    /// Frames per second, always positive.
    pub fps: u32,
}

impl VideoMetadata {
    /// Create metadata, clamping the frame rate to at least 1.
    #[must_use]
    pub fn new(frame_count: usize, fps: u32) -> Self {
        Self {
            frame_count,
            fps: fps.max(1),
        }
    }

    /// The frame count, or `None` when the source could not report one.
    #[must_use]
    pub const fn known_frame_count(&self) -> Option<usize> {
        if self.frame_count == 0 {
            None
        } else {
            Some(self.frame_count)
        }
    }

    /// Time between two displayed frames (`1000 / fps` milliseconds).
    #[must_use]
    pub fn frame_interval(&self) -> Duration {
        crate::animation::frame_interval(self.fps)
    }
}

/// Metadata about a source frame.
#[derive(Debug, Clone, Default)]
pub struct SourceMeta {
    /// Frame index, counted from 0.
    pub frame_idx: usize,
    /// Total frames, if the source knows it.
    pub total_frames: Option<usize>,
    /// Source path or identifier.
    pub path: String,
}

/// A sequential frame source with metadata known up front.
///
/// Yields `None` when exhausted. A yielded `Err` is a failed read.
pub trait FrameSource: Iterator<Item = Result<(DynamicImage, SourceMeta)>> {
    /// Frame count and rate of the source.
    fn metadata(&self) -> VideoMetadata;
}

/// Iterator over frames from a source.
pub struct SourceIterator {
    source: Source,
    current_frame: usize,
    image_paths: Vec<PathBuf>,
    metadata: VideoMetadata,
    #[cfg(feature = "video")]
    decoder: Option<video_rs::decode::Decoder>,
}

impl SourceIterator {
    /// Open a source and read its metadata.
    ///
    /// `fallback_fps` is used for image sources and for videos that report no frame rate.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::SourceError`] if the source cannot be opened or contains
    /// no frames, and [`ReplayError::FeatureNotEnabled`] for video without the `video` feature.
    pub fn open(source: Source, fallback_fps: u32) -> Result<Self> {
        let image_paths = match &source {
            Source::Directory(path) => Self::collect_images_from_dir(path)?,
            Source::Glob(pattern) => Self::collect_images_from_glob(pattern)?,
            Source::Image(path) => {
                if !path.is_file() {
                    return Err(ReplayError::SourceError(format!(
                        "Image not found: {}",
                        path.display()
                    )));
                }
                vec![path.clone()]
            }
            Source::ImageList(paths) => paths.clone(),
            Source::Video(_) | Source::Frames(_) => vec![],
        };

        let frame_count = match &source {
            Source::Frames(frames) => frames.len(),
            _ => image_paths.len(),
        };

        let mut iter = Self {
            source,
            current_frame: 0,
            image_paths,
            metadata: VideoMetadata::new(frame_count, fallback_fps),
            #[cfg(feature = "video")]
            decoder: None,
        };

        if iter.source.is_video() {
            iter.open_video(fallback_fps)?;
        }

        Ok(iter)
    }

    /// The source being read.
    #[must_use]
    pub const fn source(&self) -> &Source {
        &self.source
    }

    /// Collect image paths from a directory.
    fn collect_images_from_dir(dir: &Path) -> Result<Vec<PathBuf>> {
        if !dir.is_dir() {
            return Err(ReplayError::SourceError(format!(
                "Not a directory: {}",
                dir.display()
            )));
        }

        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
            .map_err(|e| ReplayError::SourceError(format!("Failed to read {}: {e}", dir.display())))?
            .filter_map(std::result::Result::ok)
            .map(|entry| entry.path())
            .filter(|path| Self::is_image_file(path))
            .collect();

        if paths.is_empty() {
            return Err(ReplayError::SourceError(format!(
                "No images found in {}",
                dir.display()
            )));
        }

        paths.sort();
        Ok(paths)
    }

    /// Collect image paths from a glob pattern.
    ///
    /// Only patterns like "dir/*.png" are supported.
    fn collect_images_from_glob(pattern: &str) -> Result<Vec<PathBuf>> {
        let Some(star_pos) = pattern.find('*') else {
            return Ok(vec![PathBuf::from(pattern)]);
        };

        let dir_part = &pattern[..star_pos];
        let dir = if dir_part.is_empty() {
            Path::new(".")
        } else {
            Path::new(dir_part.trim_end_matches('/').trim_end_matches('\\'))
        };

        // "*.jpg" -> "jpg"
        let ext_filter: Option<String> = pattern[star_pos..]
            .strip_prefix("*.")
            .map(str::to_lowercase);

        if !dir.is_dir() {
            return Err(ReplayError::SourceError(format!(
                "Directory not found: {}",
                dir.display()
            )));
        }

        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
            .map_err(|e| ReplayError::SourceError(format!("Failed to read {}: {e}", dir.display())))?
            .filter_map(std::result::Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                ext_filter.as_ref().map_or_else(
                    || Self::is_image_file(path),
                    |ext| {
                        path.extension()
                            .is_some_and(|e| e.to_string_lossy().to_lowercase() == *ext)
                    },
                )
            })
            .collect();

        if paths.is_empty() {
            return Err(ReplayError::SourceError(format!(
                "No images match {pattern}"
            )));
        }

        paths.sort();
        Ok(paths)
    }

    /// Check if a path is an image file based on extension.
    fn is_image_file(path: &Path) -> bool {
        path.extension().is_some_and(|ext| {
            let ext = ext.to_string_lossy().to_lowercase();
            matches!(
                ext.as_str(),
                "jpg" | "jpeg" | "png" | "bmp" | "webp"
            )
        })
    }

    /// Create the decoder and read frame rate and count.
    #[cfg(feature = "video")]
    fn open_video(&mut self, fallback_fps: u32) -> Result<()> {
        let Source::Video(path) = &self.source else {
            return Ok(());
        };

        if !path.is_file() {
            return Err(ReplayError::SourceError(format!(
                "Video not found: {}",
                path.display()
            )));
        }

        init_video();

        let decoder = video_rs::decode::Decoder::new(path.as_path()).map_err(|e| {
            ReplayError::SourceError(format!("Failed to open video {}: {e}", path.display()))
        })?;

        let rate = decoder.frame_rate();
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let fps = if rate.is_finite() && rate >= 1.0 {
            rate as u32
        } else {
            fallback_fps
        };

        // Prefer the stream's own frame count, the duration estimate is a fallback.
        let frame_count = decoder
            .frames()
            .ok()
            .filter(|&n| n > 0)
            .and_then(|n| usize::try_from(n).ok())
            .or_else(|| {
                decoder
                    .duration()
                    .ok()
                    .and_then(|d| estimate_frame_count(d.as_secs_f64(), f64::from(rate)))
            })
            .unwrap_or(0);
        if frame_count == 0 {
            crate::warn!("{} reports no frame count", path.display());
        }

        self.metadata = VideoMetadata::new(frame_count, fps);
        self.decoder = Some(decoder);
        Ok(())
    }

    #[cfg(not(feature = "video"))]
    #[allow(clippy::unused_self)]
    fn open_video(&mut self, _fallback_fps: u32) -> Result<()> {
        Err(ReplayError::FeatureNotEnabled(
            "Video support requires the 'video' feature".to_string(),
        ))
    }

    fn frame_meta(&self, path: String) -> SourceMeta {
        SourceMeta {
            frame_idx: self.current_frame,
            total_frames: self.metadata.known_frame_count(),
            path,
        }
    }

    /// Get the next image from the path list.
    fn next_image(&mut self) -> Option<Result<(DynamicImage, SourceMeta)>> {
        let path = self.image_paths.get(self.current_frame)?.clone();
        let meta = self.frame_meta(path.to_string_lossy().to_string());
        self.current_frame += 1;

        match image::open(&path) {
            Ok(img) => Some(Ok((img, meta))),
            Err(e) => Some(Err(ReplayError::ImageError(format!(
                "Failed to load {}: {e}",
                path.display()
            )))),
        }
    }

    /// Get the next in-memory frame.
    fn next_buffered(&mut self) -> Option<Result<(DynamicImage, SourceMeta)>> {
        let Source::Frames(frames) = &self.source else {
            return None;
        };
        let frame = frames.get(self.current_frame)?.clone();
        let meta = self.frame_meta(format!("frame{}", self.current_frame));
        self.current_frame += 1;
        Some(Ok((frame, meta)))
    }

    /// Get the next video frame. A decode error is yielded once, then the stream ends.
    #[cfg(feature = "video")]
    fn next_video_frame(&mut self) -> Option<Result<(DynamicImage, SourceMeta)>> {
        let decoder = self.decoder.as_mut()?;
        let frame = match decoder.decode() {
            Ok((_ts, frame)) => frame,
            Err(video_rs::Error::DecodeExhausted) => {
                self.decoder = None;
                return None;
            }
            Err(e) => {
                self.decoder = None;
                return Some(Err(ReplayError::VideoError(format!(
                    "Failed to decode frame {}: {e}",
                    self.current_frame + 1
                ))));
            }
        };

        let path = self
            .source
            .path()
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_default();
        let meta = self.frame_meta(path);
        self.current_frame += 1;

        Some(video_frame_to_image(&frame).map(|img| (img, meta)))
    }

    #[cfg(not(feature = "video"))]
    #[allow(clippy::unused_self)]
    fn next_video_frame(&mut self) -> Option<Result<(DynamicImage, SourceMeta)>> {
        None
    }
}

impl Iterator for SourceIterator {
    type Item = Result<(DynamicImage, SourceMeta)>;

    fn next(&mut self) -> Option<Self::Item> {
        match &self.source {
            Source::Image(_) | Source::Directory(_) | Source::Glob(_) | Source::ImageList(_) => {
                self.next_image()
            }
            Source::Frames(_) => self.next_buffered(),
            Source::Video(_) => self.next_video_frame(),
        }
    }
}

impl FrameSource for SourceIterator {
    fn metadata(&self) -> VideoMetadata {
        self.metadata
    }
}

/// Estimate a frame count from a duration and a frame rate, rounding up.
///
/// Returns `None` unless both values are finite and positive.
#[must_use]
pub fn estimate_frame_count(duration_secs: f64, fps: f64) -> Option<usize> {
    if !duration_secs.is_finite() || !fps.is_finite() || duration_secs <= 0.0 || fps <= 0.0 {
        return None;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let frames = (duration_secs * fps).ceil() as usize;
    Some(frames)
}

/// Initialize `video-rs` once and silence `FFmpeg` logs below error level.
///
/// Safe to call multiple times; a no-op without the `video` feature.
#[allow(clippy::missing_const_for_fn)]
pub fn init_video() {
    #[cfg(feature = "video")]
    {
        use std::sync::Once;

        static INIT: Once = Once::new();
        INIT.call_once(|| {
            if let Err(e) = video_rs::init() {
                crate::warn!("Failed to initialize video-rs: {e}");
            }
        });
    }
}

/// Convert a `video_rs` HWC frame to a `DynamicImage`.
#[cfg(feature = "video")]
fn video_frame_to_image(frame: &video_rs::Frame) -> Result<DynamicImage> {
    let shape = frame.shape();
    let height = u32::try_from(shape[0])
        .map_err(|_| ReplayError::ImageError("Frame height exceeds u32::MAX".to_string()))?;
    let width = u32::try_from(shape[1])
        .map_err(|_| ReplayError::ImageError("Frame width exceeds u32::MAX".to_string()))?;

    let rgb_data: Vec<u8> = frame.as_standard_layout().iter().copied().collect();

    let img_buffer = image::RgbImage::from_raw(width, height, rgb_data).ok_or_else(|| {
        ReplayError::ImageError("Failed to create image from video frame".to_string())
    })?;

    Ok(DynamicImage::ImageRgb8(img_buffer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    fn frames(n: usize) -> Vec<DynamicImage> {
        (0..n)
            .map(|_| DynamicImage::ImageRgb8(RgbImage::new(4, 4)))
            .collect()
    }

    #[test]
    fn test_source_from_string() {
        assert!(matches!(Source::from("image.jpg"), Source::Image(_)));
        assert!(matches!(Source::from("video.mp4"), Source::Video(_)));
        assert!(matches!(Source::from("clip.MOV"), Source::Video(_)));
        assert!(matches!(Source::from("frames/*.png"), Source::Glob(_)));
    }

    #[test]
    fn test_source_checks() {
        let vid = Source::Video(PathBuf::from("test.mp4"));
        assert!(vid.is_video());
        assert_eq!(vid.path(), Some(Path::new("test.mp4")));

        let img = Source::Image(PathBuf::from("test.jpg"));
        assert!(!img.is_video());
    }

    #[test]
    fn test_source_describe() {
        assert_eq!(Source::from("frames/*.png").describe(), "frames/*.png");
        assert_eq!(Source::from(frames(2)).describe(), "2 in-memory frames");
    }

    #[test]
    fn test_in_memory_frames() {
        let mut iter = SourceIterator::open(Source::from(frames(3)), 25).unwrap();
        assert_eq!(iter.metadata(), VideoMetadata::new(3, 25));

        let (_, meta) = iter.next().unwrap().unwrap();
        assert_eq!(meta.frame_idx, 0);
        assert_eq!(meta.total_frames, Some(3));
        assert_eq!(iter.by_ref().count(), 2);
        assert!(iter.next().is_none());
    }

    #[test]
    fn test_missing_image_fails_at_open() {
        let result = SourceIterator::open(Source::Image(PathBuf::from("missing.png")), 30);
        assert!(matches!(result, Err(ReplayError::SourceError(_))));
    }

    #[test]
    fn test_missing_directory_fails_at_open() {
        let result = SourceIterator::open(Source::Directory(PathBuf::from("no/such/dir")), 30);
        assert!(matches!(result, Err(ReplayError::SourceError(_))));
    }

    #[test]
    fn test_frame_interval() {
        let interval = VideoMetadata::new(10, 30).frame_interval();
        assert!((interval.as_secs_f64() * 1000.0 - 1000.0 / 30.0).abs() < 1e-6);

        // A zero rate is clamped instead of dividing by zero.
        assert_eq!(VideoMetadata::new(0, 0).fps, 1);
    }

    #[test]
    fn test_estimate_frame_count_rounds_up() {
        // 90 frames whose container reports slightly less than 3 s.
        assert_eq!(estimate_frame_count(2.999, 30.0), Some(90));
        assert_eq!(estimate_frame_count(3.0, 30.0), Some(90));
        assert_eq!(estimate_frame_count(0.0, 30.0), None);
        assert_eq!(estimate_frame_count(3.0, f64::NAN), None);
    }

    #[test]
    fn test_unknown_frame_count() {
        assert_eq!(VideoMetadata::new(0, 30).known_frame_count(), None);
        assert_eq!(VideoMetadata::new(12, 30).known_frame_count(), Some(12));
    }
}
