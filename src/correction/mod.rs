//! Characters → words → sentence.
//!
//! The recognizer's character hypothesis is split into words, each word is
//! snapped to a dictionary entry (SymSpell), and optionally the sentence is
//! rewritten by a small language model (Flan-T5).

#[cfg(feature = "error-correction")]
pub mod candle_t5;
pub mod chain;
pub mod corrector;
pub mod lm_catalog;
pub mod station;
#[cfg(feature = "symspell")]
pub mod symspell;
pub mod words;

pub use chain::ChainCorrector;
pub use corrector::{Corrector, PassthroughCorrector};
pub use station::CorrectionStation;
pub use words::{edit_distance, normalize_sentence, split_words};

use crate::config::{CorrectionBackend, CorrectionConfig};
use crate::error::Result;
use crate::workspace::Workspace;

/// Build the corrector the configuration asks for.
///
/// A missing dictionary downgrades the word stage to passthrough with a
/// warning rather than failing the run.
pub fn build_corrector(config: &CorrectionConfig, workspace: &Workspace) -> Result<ChainCorrector> {
    if !config.enabled || config.backend == CorrectionBackend::None {
        return Ok(ChainCorrector::new(Vec::new()));
    }

    let mut stages: Vec<Box<dyn Corrector>> = Vec::new();
    if let Some(words) = word_stage(config, workspace)? {
        stages.push(words);
    }
    if config.backend == CorrectionBackend::T5 {
        stages.push(sentence_stage(config)?);
    }
    let chain = ChainCorrector::new(stages);
    tracing::info!(corrector = chain.name(), "correction ready");
    Ok(chain)
}

#[cfg(feature = "symspell")]
fn word_stage(config: &CorrectionConfig, workspace: &Workspace) -> Result<Option<Box<dyn Corrector>>> {
    match crate::dictionary::resolve_dictionary(workspace, config) {
        Some(path) => {
            let corrector = symspell::SymSpellCorrector::from_file(&path, config.max_edit_distance)?;
            Ok(Some(Box::new(corrector)))
        }
        None => {
            tracing::warn!(
                "no SymSpell dictionary found; run `lipread dictionary install` or set correction.dictionary"
            );
            Ok(None)
        }
    }
}

#[cfg(not(feature = "symspell"))]
fn word_stage(_config: &CorrectionConfig, _workspace: &Workspace) -> Result<Option<Box<dyn Corrector>>> {
    tracing::warn!("built without the symspell feature, skipping word correction");
    Ok(None)
}

#[cfg(feature = "error-correction")]
fn sentence_stage(config: &CorrectionConfig) -> Result<Box<dyn Corrector>> {
    let info = lm_catalog::get_sentence_model(&config.lm_model).ok_or_else(|| {
        crate::error::LipreadError::ConfigInvalidValue {
            key: "correction.lm_model".to_string(),
            message: format!("unknown sentence model '{}'", config.lm_model),
        }
    })?;
    Ok(Box::new(candle_t5::CandleT5Corrector::load(info)?))
}

#[cfg(not(feature = "error-correction"))]
fn sentence_stage(_config: &CorrectionConfig) -> Result<Box<dyn Corrector>> {
    Err(crate::error::LipreadError::ConfigInvalidValue {
        key: "correction.backend".to_string(),
        message: "the t5 backend needs a build with the error-correction feature".to_string(),
    })
}
