//! Recognizer seam between landmark features and text.

use crate::error::{LipreadError, Result};

/// Character hypothesis for one clip.
#[derive(Debug, Clone, PartialEq)]
pub struct Recognition {
    pub text: String,
    /// Length-normalized probability in `[0, 1]`.
    pub confidence: f32,
}

/// Trait for turning a clip's frame features into text.
///
/// Features are frame-major: one row of normalized landmark coordinates per frame.
pub trait Recognizer: Send + Sync {
    fn recognize(&self, features: &[Vec<f32>]) -> Result<Recognition>;

    /// Name for logging.
    fn name(&self) -> &str;
}

impl<R: Recognizer + ?Sized> Recognizer for Box<R> {
    fn recognize(&self, features: &[Vec<f32>]) -> Result<Recognition> {
        (**self).recognize(features)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Mock recognizer for testing
///
/// Returns configurable responses without loading a model.
#[derive(Debug, Clone)]
pub struct MockRecognizer {
    name: String,
    response: String,
    confidence: f32,
    should_fail: bool,
    min_frames: usize,
}

impl MockRecognizer {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            response: String::new(),
            confidence: 1.0,
            should_fail: false,
            min_frames: 0,
        }
    }

    pub fn with_response(mut self, response: &str) -> Self {
        self.response = response.to_string();
        self
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }

    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    /// Fail on clips shorter than `frames`.
    pub fn with_min_frames(mut self, frames: usize) -> Self {
        self.min_frames = frames;
        self
    }
}

impl Recognizer for MockRecognizer {
    fn recognize(&self, features: &[Vec<f32>]) -> Result<Recognition> {
        if self.should_fail {
            return Err(LipreadError::Other("mock recognition failure".to_string()));
        }
        if features.len() < self.min_frames {
            return Err(LipreadError::ModelConfig {
                message: format!("clip has {} frames, need {}", features.len(), self.min_frames),
            });
        }
        Ok(Recognition {
            text: self.response.clone(),
            confidence: self.confidence,
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_returns_configured_response() {
        let r = MockRecognizer::new("mock")
            .with_response("bin blue")
            .with_confidence(0.7);
        let out = r.recognize(&[vec![0.0; 40]]).unwrap();
        assert_eq!(out.text, "bin blue");
        assert_eq!(out.confidence, 0.7);
        assert_eq!(r.name(), "mock");
    }

    #[test]
    fn mock_failure_modes() {
        assert!(MockRecognizer::new("m").with_failure().recognize(&[]).is_err());
        let short = MockRecognizer::new("m").with_min_frames(3);
        assert!(short.recognize(&[vec![0.0]]).is_err());
        assert!(short.recognize(&vec![vec![0.0]; 3]).is_ok());
    }

    #[test]
    fn boxed_recognizer_delegates() {
        let boxed: Box<dyn Recognizer> = Box::new(MockRecognizer::new("inner").with_response("x"));
        assert_eq!(boxed.name(), "inner");
        assert_eq!(boxed.recognize(&[]).unwrap().text, "x");
    }
}
