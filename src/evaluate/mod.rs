//! Character and word error rates of a recognizer over a dataview tier.

pub mod metrics;

pub use metrics::{ErrorCount, char_errors, character_error_rate, word_error_rate, word_errors};

use crate::correction::Corrector;
use crate::dataview::Example;
use crate::recognize::Recognizer;
use serde::Serialize;

/// Score of one example.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExampleScore {
    pub id: String,
    pub reference: String,
    pub hypothesis: String,
    /// Recognizer output before correction, when correction changed it.
    pub raw_hypothesis: Option<String>,
    pub confidence: f32,
    pub cer: f64,
    pub wer: f64,
}

/// Per-example scores plus corpus-level rates.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EvaluationReport {
    pub scores: Vec<ExampleScore>,
    /// Examples the recognizer failed on, with the error message.
    ///
    /// They count towards `chars` and `words` as empty hypotheses.
    pub failures: Vec<(String, String)>,
    pub chars: ErrorCount,
    pub words: ErrorCount,
}

impl EvaluationReport {
    /// Total character edits over total reference characters.
    pub fn cer(&self) -> f64 {
        self.chars.rate()
    }

    pub fn wer(&self) -> f64 {
        self.words.rate()
    }

    /// Mean of the per-example CERs, over scored examples only.
    pub fn mean_cer(&self) -> f64 {
        mean(self.scores.iter().map(|s| s.cer))
    }

    pub fn mean_wer(&self) -> f64 {
        mean(self.scores.iter().map(|s| s.wer))
    }
}

fn mean(values: impl ExactSizeIterator<Item = f64>) -> f64 {
    let n = values.len();
    if n == 0 {
        return 0.0;
    }
    values.sum::<f64>() / n as f64
}

/// Recognize every example and score it against its transcript.
///
/// Recognition errors are collected, not propagated, and score as an empty
/// hypothesis in the corpus rates. Correction errors fall back to the
/// uncorrected hypothesis.
pub fn evaluate_examples(
    examples: &[Example],
    recognizer: &dyn Recognizer,
    mut corrector: Option<&mut dyn Corrector>,
    mouth_only: bool,
) -> EvaluationReport {
    let mut report = EvaluationReport::default();

    for example in examples {
        let recognition = match recognizer.recognize(&example.features(mouth_only)) {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(example = %example.id, "recognition failed: {e}");
                report.failures.push((example.id.clone(), e.to_string()));
                report.chars += char_errors(&example.transcript, "");
                report.words += word_errors(&example.transcript, "");
                continue;
            }
        };

        let (hypothesis, raw_hypothesis) = match corrector.as_deref_mut() {
            Some(c) => match c.correct(&recognition.text) {
                Ok(fixed) if !fixed.trim().is_empty() && fixed != recognition.text => {
                    (fixed, Some(recognition.text))
                }
                Ok(_) => (recognition.text, None),
                Err(e) => {
                    tracing::warn!(example = %example.id, "correction failed: {e}");
                    (recognition.text, None)
                }
            },
            None => (recognition.text, None),
        };

        let chars = char_errors(&example.transcript, &hypothesis);
        let words = word_errors(&example.transcript, &hypothesis);
        report.chars += chars;
        report.words += words;
        tracing::debug!(
            example = %example.id,
            cer = chars.rate(),
            wer = words.rate(),
            "scored example"
        );
        report.scores.push(ExampleScore {
            id: example.id.clone(),
            reference: example.transcript.clone(),
            hypothesis,
            raw_hypothesis,
            confidence: recognition.confidence,
            cer: chars.rate(),
            wer: words.rate(),
        });
    }

    tracing::info!(
        examples = report.scores.len(),
        failures = report.failures.len(),
        cer = report.cer(),
        wer = report.wer(),
        "evaluation finished"
    );
    report
}
