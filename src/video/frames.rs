//! Frame extraction via ffmpeg and ordered frame loading.

use crate::error::{LipreadError, Result};
use crate::exec::CommandExecutor;
use image::RgbImage;
use std::path::{Path, PathBuf};

/// Filename pattern ffmpeg writes frames with.
pub const FRAME_PATTERN: &str = "frame_%05d.png";

/// Marker holding the frame rate a directory was extracted at.
///
/// Written only after ffmpeg succeeds, so an interrupted extraction never
/// counts as a cache hit.
pub const FPS_MARKER: &str = ".fps";

/// One decoded video frame.
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// Zero-based position in the clip.
    pub index: usize,
    /// Presentation time derived from the extraction frame rate.
    pub timestamp_ms: u64,
    pub image: RgbImage,
}

impl VideoFrame {
    pub fn new(index: usize, fps: u32, image: RgbImage) -> Self {
        Self {
            index,
            timestamp_ms: frame_timestamp_ms(index, fps),
            image,
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

/// Millisecond timestamp of frame `index` at `fps`.
pub fn frame_timestamp_ms(index: usize, fps: u32) -> u64 {
    if fps == 0 {
        return 0;
    }
    index as u64 * 1000 / fps as u64
}

/// Extracts frames from a video file by running ffmpeg.
pub struct FrameExtractor<E: CommandExecutor> {
    executor: E,
    ffmpeg: String,
    fps: u32,
}

impl<E: CommandExecutor> FrameExtractor<E> {
    pub fn new(executor: E, fps: u32) -> Self {
        Self {
            executor,
            ffmpeg: "ffmpeg".to_string(),
            fps,
        }
    }

    /// Use a different ffmpeg binary.
    pub fn with_ffmpeg(mut self, ffmpeg: impl Into<String>) -> Self {
        self.ffmpeg = ffmpeg.into();
        self
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Write numbered PNG frames of `video` into `out_dir`.
    ///
    /// Returns the frame paths in playback order.
    pub fn extract(&self, video: &Path, out_dir: &Path) -> Result<Vec<PathBuf>> {
        if !video.is_file() {
            return Err(LipreadError::FrameExtraction {
                message: format!("video not found: {}", video.display()),
            });
        }
        if self.fps == 0 {
            return Err(LipreadError::ConfigInvalidValue {
                key: "video.fps".to_string(),
                message: "must be positive".to_string(),
            });
        }
        std::fs::create_dir_all(out_dir)?;
        clear_extracted(out_dir)?;

        let input = video.to_string_lossy();
        let filter = format!("fps={}", self.fps);
        let pattern = out_dir.join(FRAME_PATTERN);
        let pattern = pattern.to_string_lossy();
        let args = [
            "-hide_banner",
            "-loglevel",
            "error",
            "-y",
            "-i",
            input.as_ref(),
            "-vf",
            filter.as_str(),
            pattern.as_ref(),
        ];

        self.executor.execute(&self.ffmpeg, &args)?;

        let frames = list_frame_files(out_dir)?;
        if frames.is_empty() {
            return Err(LipreadError::FrameExtraction {
                message: format!("{} produced no frames for {}", self.ffmpeg, video.display()),
            });
        }
        std::fs::write(out_dir.join(FPS_MARKER), self.fps.to_string())?;
        tracing::info!(
            video = %video.display(),
            frames = frames.len(),
            fps = self.fps,
            "extracted frames"
        );
        Ok(frames)
    }

    /// Frames in `out_dir` if they were fully extracted at this frame rate.
    pub fn cached(&self, out_dir: &Path) -> Result<Option<Vec<PathBuf>>> {
        if extracted_fps(out_dir) != Some(self.fps) {
            return Ok(None);
        }
        let frames = list_frame_files(out_dir)?;
        Ok((!frames.is_empty()).then_some(frames))
    }

    /// Reuse cached frames in `out_dir`, extracting `video` again when the
    /// cache is missing, incomplete or from another frame rate.
    pub fn extract_cached(&self, video: &Path, out_dir: &Path) -> Result<Vec<PathBuf>> {
        if let Some(frames) = self.cached(out_dir)? {
            tracing::debug!(dir = %out_dir.display(), fps = self.fps, "reusing extracted frames");
            return Ok(frames);
        }
        self.extract(video, out_dir)
    }
}

/// Frame rate recorded by the last complete extraction into `dir`.
pub fn extracted_fps(dir: &Path) -> Option<u32> {
    std::fs::read_to_string(dir.join(FPS_MARKER))
        .ok()?
        .trim()
        .parse()
        .ok()
}

/// Remove the marker and frames of an earlier extraction.
fn clear_extracted(dir: &Path) -> Result<()> {
    let marker = dir.join(FPS_MARKER);
    if marker.exists() {
        std::fs::remove_file(&marker)?;
    }
    for frame in list_frame_files(dir)? {
        std::fs::remove_file(frame)?;
    }
    Ok(())
}

/// Numeric index embedded in a frame filename (`frame_00012.png` → 12).
pub fn frame_index(path: &Path) -> Option<usize> {
    let stem = path.file_stem()?.to_str()?;
    let digits: String = stem
        .chars()
        .rev()
        .take_while(|c| c.is_ascii_digit())
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    digits.parse().ok()
}

fn is_frame_image(path: &Path) -> bool {
    matches!(
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .as_deref(),
        Some("png" | "jpg" | "jpeg")
    )
}

/// List frame images in `dir`, ordered by their numeric index.
///
/// Files without a trailing number sort after numbered ones, by name.
pub fn list_frame_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut frames: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && is_frame_image(p))
        .collect();
    frames.sort_by(|a, b| {
        let key = |p: &PathBuf| (frame_index(p).unwrap_or(usize::MAX), p.file_name().map(|n| n.to_owned()));
        key(a).cmp(&key(b))
    });
    Ok(frames)
}

/// Load every frame in `dir` in playback order.
pub fn load_frames(dir: &Path, fps: u32) -> Result<Vec<VideoFrame>> {
    list_frame_files(dir)?
        .iter()
        .enumerate()
        .map(|(i, path)| {
            let image = image::open(path)?.to_rgb8();
            Ok(VideoFrame::new(i, fps, image))
        })
        .collect()
}
