//! Feature sequence → text.

use crate::pipeline::error::StationError;
use crate::pipeline::station::Station;
use crate::pipeline::types::{ClipText, LandmarkSequence};
use crate::recognize::Recognizer;
use std::sync::Arc;
use std::time::Instant;

pub struct RecognizerStation {
    recognizer: Arc<dyn Recognizer>,
}

impl RecognizerStation {
    pub fn new(recognizer: Arc<dyn Recognizer>) -> Self {
        Self { recognizer }
    }
}

impl Station for RecognizerStation {
    type Input = LandmarkSequence;
    type Output = ClipText;

    fn process(&mut self, input: LandmarkSequence) -> Result<Option<ClipText>, StationError> {
        let started = Instant::now();
        let recognition = self
            .recognizer
            .recognize(&input.features)
            .map_err(|e| StationError::Recoverable(format!("{}: {e}", input.clip_id)))?;
        tracing::debug!(
            clip = %input.clip_id,
            recognizer = self.recognizer.name(),
            frames = input.features.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "recognized clip"
        );
        Ok(Some(ClipText {
            clip_id: input.clip_id.to_string(),
            text: recognition.text,
            raw_text: None,
            confidence: recognition.confidence,
            reference: input.reference,
            frames: input.features.len(),
        }))
    }

    fn name(&self) -> &'static str {
        "Recognizer"
    }
}
