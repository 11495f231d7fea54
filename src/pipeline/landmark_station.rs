//! Frames → landmarks.

use crate::pipeline::error::StationError;
use crate::pipeline::station::Station;
use crate::pipeline::types::{FrameMessage, LandmarkMessage};
use crate::vision::FaceTracker;

/// Runs the face tracker over each clip's frames.
///
/// Frames before the first detected face are absorbed. The tracker is reset
/// at every clip boundary so faces never carry over between clips.
pub struct LandmarkStation {
    tracker: FaceTracker,
}

impl LandmarkStation {
    pub fn new(tracker: FaceTracker) -> Self {
        Self { tracker }
    }
}

impl Station for LandmarkStation {
    type Input = FrameMessage;
    type Output = LandmarkMessage;

    fn process(&mut self, input: FrameMessage) -> Result<Option<LandmarkMessage>, StationError> {
        match input {
            FrameMessage::Frame { clip_id, frame } => {
                let tracked = self.tracker.track(&frame).map_err(|e| {
                    StationError::Recoverable(format!("{clip_id} frame {}: {e}", frame.index))
                })?;
                Ok(tracked.map(|tracked| LandmarkMessage::Tracked { clip_id, tracked }))
            }
            FrameMessage::EndOfClip(end) => {
                self.tracker.reset();
                Ok(Some(LandmarkMessage::EndOfClip(end)))
            }
        }
    }

    fn name(&self) -> &'static str {
        "Landmarks"
    }
}
