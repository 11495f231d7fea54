//! Corrector trait for turning a character hypothesis into a sentence.

use crate::error::Result;

/// Rewrites a recognized sentence.
///
/// Implementations receive the whitespace-normalized character hypothesis
/// and return their best guess at the intended sentence.
pub trait Corrector: Send + 'static {
    fn correct(&mut self, text: &str) -> Result<String>;

    /// Return the name of this corrector for logging.
    fn name(&self) -> &str;
}

impl<C: Corrector + ?Sized> Corrector for Box<C> {
    fn correct(&mut self, text: &str) -> Result<String> {
        (**self).correct(text)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Returns the hypothesis unchanged.
///
/// Used when correction is disabled or no dictionary is installed.
pub struct PassthroughCorrector;

impl Corrector for PassthroughCorrector {
    fn correct(&mut self, text: &str) -> Result<String> {
        Ok(text.to_string())
    }

    fn name(&self) -> &str {
        "passthrough"
    }
}
