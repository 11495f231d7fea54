use crate::correction::words::{edit_distance, split_words};
use serde::Serialize;

/// Edit distance and reference length, the two halves of an error rate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ErrorCount {
    pub edits: usize,
    pub reference_len: usize,
}

impl ErrorCount {
    /// Errors per reference unit. An empty reference scores 0 against an
    /// empty hypothesis and 1 against anything else.
    pub fn rate(&self) -> f64 {
        if self.reference_len == 0 {
            return if self.edits == 0 { 0.0 } else { 1.0 };
        }
        self.edits as f64 / self.reference_len as f64
    }
}

impl std::ops::AddAssign for ErrorCount {
    fn add_assign(&mut self, other: Self) {
        self.edits += other.edits;
        self.reference_len += other.reference_len;
    }
}

fn canonical_chars(text: &str) -> Vec<char> {
    split_words(&text.to_lowercase()).join(" ").chars().collect()
}

/// Character edits between whitespace-normalized, lowercased sentences.
pub fn char_errors(reference: &str, hypothesis: &str) -> ErrorCount {
    let r = canonical_chars(reference);
    let h = canonical_chars(hypothesis);
    ErrorCount {
        edits: edit_distance(&r, &h),
        reference_len: r.len(),
    }
}

/// Word edits between lowercased sentences.
pub fn word_errors(reference: &str, hypothesis: &str) -> ErrorCount {
    let r = split_words(&reference.to_lowercase());
    let h = split_words(&hypothesis.to_lowercase());
    ErrorCount {
        edits: edit_distance(&r, &h),
        reference_len: r.len(),
    }
}

pub fn character_error_rate(reference: &str, hypothesis: &str) -> f64 {
    char_errors(reference, hypothesis).rate()
}

pub fn word_error_rate(reference: &str, hypothesis: &str) -> f64 {
    word_errors(reference, hypothesis).rate()
}
