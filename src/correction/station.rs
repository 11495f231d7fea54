//! CorrectionStation: character hypothesis → corrected sentence.

use crate::correction::corrector::Corrector;
use crate::pipeline::error::StationError;
use crate::pipeline::station::Station;
use crate::pipeline::types::ClipText;

/// Pipeline station that applies word / sentence correction.
///
/// Falls back to the recognizer's text on error or empty output.
pub struct CorrectionStation {
    corrector: Box<dyn Corrector>,
    enabled: bool,
}

impl CorrectionStation {
    pub fn new(corrector: Box<dyn Corrector>, enabled: bool) -> Self {
        Self { corrector, enabled }
    }
}

impl Station for CorrectionStation {
    type Input = ClipText;
    type Output = ClipText;

    fn process(&mut self, mut input: ClipText) -> Result<Option<ClipText>, StationError> {
        if !self.enabled || input.text.trim().is_empty() {
            return Ok(Some(input));
        }

        match self.corrector.correct(&input.text) {
            Ok(corrected) if !corrected.trim().is_empty() => {
                if corrected != input.text {
                    tracing::debug!(
                        clip = %input.clip_id,
                        corrector = self.corrector.name(),
                        raw = %input.text,
                        %corrected,
                        "corrected hypothesis"
                    );
                    input.raw_text = Some(std::mem::replace(&mut input.text, corrected));
                }
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(
                    clip = %input.clip_id,
                    "{} correction failed: {e}, using raw text",
                    self.corrector.name()
                );
            }
        }

        Ok(Some(input))
    }

    fn name(&self) -> &'static str {
        "Correction"
    }
}
