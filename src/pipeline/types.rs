//! Messages passed between pipeline stations.

use crate::video::VideoFrame;
use crate::vision::TrackedFrame;
use std::path::PathBuf;
use std::sync::Arc;

/// Where a clip's frames come from.
#[derive(Debug, Clone)]
pub enum ClipFrames {
    /// Numbered PNG frames on disk, as written by the frame extractor.
    Directory(PathBuf),
    InMemory(Vec<VideoFrame>),
}

/// One clip to transcribe.
#[derive(Debug, Clone)]
pub struct ClipInput {
    pub id: String,
    pub fps: u32,
    pub frames: ClipFrames,
    /// Ground-truth transcript, when known.
    pub reference: Option<String>,
}

impl ClipInput {
    pub fn new(id: impl Into<String>, fps: u32, frames: ClipFrames) -> Self {
        Self {
            id: id.into(),
            fps,
            frames,
            reference: None,
        }
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }
}

/// Closes a clip's frame stream.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipEnd {
    pub clip_id: Arc<str>,
    pub reference: Option<String>,
    /// Frames the source sent for this clip.
    pub frames: usize,
}

#[derive(Debug, Clone)]
pub enum FrameMessage {
    Frame { clip_id: Arc<str>, frame: VideoFrame },
    EndOfClip(ClipEnd),
}

#[derive(Debug, Clone)]
pub enum LandmarkMessage {
    Tracked { clip_id: Arc<str>, tracked: TrackedFrame },
    EndOfClip(ClipEnd),
}

/// A whole clip's feature rows, ready for the recognizer.
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkSequence {
    pub clip_id: Arc<str>,
    pub features: Vec<Vec<f32>>,
    pub reference: Option<String>,
    /// Frames that reused the previous frame's landmarks.
    pub reused_frames: usize,
    /// Frames the source sent, including dropped ones.
    pub source_frames: usize,
}

/// Recognized (and possibly corrected) text for one clip.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipText {
    pub clip_id: String,
    pub text: String,
    /// Recognizer output before correction, when correction changed it.
    pub raw_text: Option<String>,
    pub confidence: f32,
    pub reference: Option<String>,
    pub frames: usize,
}

impl ClipText {
    pub fn new(clip_id: impl Into<String>, text: impl Into<String>, confidence: f32) -> Self {
        Self {
            clip_id: clip_id.into(),
            text: text.into(),
            raw_text: None,
            confidence,
            reference: None,
            frames: 0,
        }
    }

    pub fn was_corrected(&self) -> bool {
        self.raw_text.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_input_builder() {
        let clip = ClipInput::new("s1/bbaf2n", 25, ClipFrames::InMemory(Vec::new()))
            .with_reference("bin blue at f two now");
        assert_eq!(clip.id, "s1/bbaf2n");
        assert_eq!(clip.reference.as_deref(), Some("bin blue at f two now"));
    }

    #[test]
    fn clip_text_defaults_uncorrected() {
        let text = ClipText::new("c", "set red", 0.5);
        assert!(!text.was_corrected());
        assert_eq!(text.frames, 0);
    }
}
