use crate::error::{LipreadError, Result};
use crate::video::VideoFrame;
use crate::vision::face::{FaceBox, FaceDetector, primary_face};
use crate::vision::landmarks::{LandmarkPredictor, Landmarks};
use image::imageops;

/// Landmarks for one frame of a clip.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedFrame {
    pub index: usize,
    pub face: FaceBox,
    pub landmarks: Landmarks,
    /// True when no face was detected and the previous frame was reused.
    pub interpolated: bool,
}

/// Runs face detection and landmark prediction frame by frame.
///
/// Frames without a face reuse the last tracked face and landmarks.
/// Faceless frames before the first detection yield nothing.
pub struct FaceTracker {
    detector: Box<dyn FaceDetector>,
    predictor: Box<dyn LandmarkPredictor>,
    last: Option<(FaceBox, Landmarks)>,
}

impl FaceTracker {
    pub fn new(detector: Box<dyn FaceDetector>, predictor: Box<dyn LandmarkPredictor>) -> Self {
        Self {
            detector,
            predictor,
            last: None,
        }
    }

    pub fn predictor_name(&self) -> &str {
        self.predictor.name()
    }

    /// Forget the previous face, e.g. between clips.
    pub fn reset(&mut self) {
        self.last = None;
    }

    pub fn track(&mut self, frame: &VideoFrame) -> Result<Option<TrackedFrame>> {
        let gray = imageops::grayscale(&frame.image);
        let faces = self.detector.detect(gray.as_raw(), gray.width(), gray.height());

        match primary_face(&faces) {
            Some(face) => {
                let landmarks = self.predictor.predict(&gray, &face)?;
                self.last = Some((face, landmarks.clone()));
                Ok(Some(TrackedFrame {
                    index: frame.index,
                    face,
                    landmarks,
                    interpolated: false,
                }))
            }
            None => match &self.last {
                Some((face, landmarks)) => {
                    tracing::debug!(frame = frame.index, "no face, reusing previous landmarks");
                    Ok(Some(TrackedFrame {
                        index: frame.index,
                        face: *face,
                        landmarks: landmarks.clone(),
                        interpolated: true,
                    }))
                }
                None => {
                    tracing::debug!(frame = frame.index, "no face yet, dropping frame");
                    Ok(None)
                }
            },
        }
    }

    /// Track a whole clip. Fails when no frame contains a face.
    pub fn track_all(&mut self, frames: &[VideoFrame], source_name: &str) -> Result<Vec<TrackedFrame>> {
        self.reset();
        let mut tracked = Vec::with_capacity(frames.len());
        for frame in frames {
            if let Some(t) = self.track(frame)? {
                tracked.push(t);
            }
        }
        if tracked.is_empty() {
            return Err(LipreadError::NoFace {
                source_name: source_name.to_string(),
            });
        }
        let reused = tracked.iter().filter(|t| t.interpolated).count();
        if reused > 0 {
            tracing::warn!(source = source_name, reused, "frames without a detected face");
        }
        Ok(tracked)
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use std::sync::Mutex;

    /// Returns scripted detections, one entry per call; repeats the last one.
    pub struct ScriptedDetector {
        script: Mutex<Vec<Vec<FaceBox>>>,
    }

    impl ScriptedDetector {
        pub fn new(mut script: Vec<Vec<FaceBox>>) -> Self {
            script.reverse();
            Self {
                script: Mutex::new(script),
            }
        }

        pub fn always(face: FaceBox) -> Self {
            Self::new(vec![vec![face]])
        }
    }

    impl FaceDetector for ScriptedDetector {
        fn detect(&self, _gray: &[u8], _width: u32, _height: u32) -> Vec<FaceBox> {
            let mut script = self.script.lock().unwrap();
            if script.len() > 1 {
                script.pop().unwrap_or_default()
            } else {
                script.last().cloned().unwrap_or_default()
            }
        }
    }
}
