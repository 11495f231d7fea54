//! Landmarks → one feature sequence per clip.

use crate::pipeline::error::StationError;
use crate::pipeline::station::Station;
use crate::pipeline::types::{LandmarkMessage, LandmarkSequence};
use std::sync::Arc;

struct Pending {
    clip_id: Arc<str>,
    features: Vec<Vec<f32>>,
    reused_frames: usize,
}

impl Pending {
    fn new(clip_id: Arc<str>) -> Self {
        Self {
            clip_id,
            features: Vec::new(),
            reused_frames: 0,
        }
    }
}

/// Buffers normalized landmark rows until the clip ends.
pub struct SequenceStation {
    mouth_only: bool,
    pending: Option<Pending>,
}

impl SequenceStation {
    pub fn new(mouth_only: bool) -> Self {
        Self {
            mouth_only,
            pending: None,
        }
    }
}

impl Station for SequenceStation {
    type Input = LandmarkMessage;
    type Output = LandmarkSequence;

    fn process(&mut self, input: LandmarkMessage) -> Result<Option<LandmarkSequence>, StationError> {
        match input {
            LandmarkMessage::Tracked { clip_id, tracked } => {
                let mut pending = match self.pending.take() {
                    Some(p) if p.clip_id == clip_id => p,
                    stale => {
                        if let Some(stale) = stale {
                            tracing::warn!(clip = %stale.clip_id, "clip ended without end marker, dropping");
                        }
                        Pending::new(clip_id)
                    }
                };
                pending
                    .features
                    .push(tracked.landmarks.normalized(&tracked.face).features(self.mouth_only));
                pending.reused_frames += usize::from(tracked.interpolated);
                self.pending = Some(pending);
                Ok(None)
            }
            LandmarkMessage::EndOfClip(end) => {
                let pending = self.pending.take().filter(|p| p.clip_id == end.clip_id);
                let Some(pending) = pending else {
                    return Err(StationError::Recoverable(format!(
                        "No face found in {}",
                        end.clip_id
                    )));
                };
                if pending.reused_frames > 0 {
                    tracing::debug!(
                        clip = %end.clip_id,
                        reused = pending.reused_frames,
                        "frames without a detected face"
                    );
                }
                Ok(Some(LandmarkSequence {
                    clip_id: end.clip_id,
                    features: pending.features,
                    reference: end.reference,
                    reused_frames: pending.reused_frames,
                    source_frames: end.frames,
                }))
            }
        }
    }

    fn name(&self) -> &'static str {
        "Sequencer"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::types::ClipEnd;
    use crate::vision::{FaceBox, TrackedFrame, mean_shape};

    fn tracked(clip: &Arc<str>, index: usize, interpolated: bool) -> LandmarkMessage {
        let face = FaceBox::new(0.0, 0.0, 1.0, 1.0);
        LandmarkMessage::Tracked {
            clip_id: clip.clone(),
            tracked: TrackedFrame {
                index,
                face,
                landmarks: mean_shape(),
                interpolated,
            },
        }
    }

    fn end(clip: &Arc<str>, frames: usize) -> LandmarkMessage {
        LandmarkMessage::EndOfClip(ClipEnd {
            clip_id: clip.clone(),
            reference: Some("bin blue".into()),
            frames,
        })
    }

    #[test]
    fn clip_is_emitted_at_end_marker() {
        let mut station = SequenceStation::new(false);
        let clip: Arc<str> = Arc::from("c1");
        assert!(station.process(tracked(&clip, 0, false)).unwrap().is_none());
        assert!(station.process(tracked(&clip, 1, true)).unwrap().is_none());

        let seq = station.process(end(&clip, 3)).unwrap().unwrap();
        assert_eq!(&*seq.clip_id, "c1");
        assert_eq!(seq.features.len(), 2);
        assert_eq!(seq.features[0].len(), 136);
        assert_eq!(seq.reused_frames, 1);
        assert_eq!(seq.source_frames, 3);
        assert_eq!(seq.reference.as_deref(), Some("bin blue"));
    }

    #[test]
    fn mouth_only_rows_are_narrow() {
        let mut station = SequenceStation::new(true);
        let clip: Arc<str> = Arc::from("c1");
        station.process(tracked(&clip, 0, false)).unwrap();
        let seq = station.process(end(&clip, 1)).unwrap().unwrap();
        assert_eq!(seq.features[0].len(), 40);
    }

    #[test]
    fn clip_without_landmarks_is_recoverable_error() {
        let mut station = SequenceStation::new(false);
        let clip: Arc<str> = Arc::from("empty");
        let err = station.process(end(&clip, 5)).unwrap_err();
        assert!(matches!(err, StationError::Recoverable(ref m) if m.contains("empty")));
    }

    #[test]
    fn clips_do_not_mix() {
        let mut station = SequenceStation::new(false);
        let a: Arc<str> = Arc::from("a");
        let b: Arc<str> = Arc::from("b");
        station.process(tracked(&a, 0, false)).unwrap();
        station.process(end(&a, 1)).unwrap();
        station.process(tracked(&b, 0, false)).unwrap();
        station.process(tracked(&b, 1, false)).unwrap();
        let seq = station.process(end(&b, 2)).unwrap().unwrap();
        assert_eq!(seq.features.len(), 2);
    }
}
