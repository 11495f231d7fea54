//! Catalog of sentence language models for the T5 rewrite.

/// Metadata for a quantized Flan-T5 model.
#[derive(Debug, Clone, PartialEq)]
pub struct SentenceModelInfo {
    /// Short name used in config and CLI (e.g. "flan-t5-small").
    pub name: &'static str,
    pub display_name: &'static str,
    /// Approximate download size in MB.
    pub size_mb: u32,
    /// HuggingFace repository containing the model.
    pub hf_repo: &'static str,
    /// GGUF model filename within the repository.
    pub hf_filename: &'static str,
    /// JSON config filename within the repository.
    pub config_filename: &'static str,
}

/// All Flan-T5 variants share one tokenizer.
pub const TOKENIZER_FILENAME: &str = "tokenizer.json";

pub const SENTENCE_MODEL_REPO: &str = "lmz/candle-quantized-t5";

/// Ordered by size, smallest first.
pub const SENTENCE_MODELS: &[SentenceModelInfo] = &[
    SentenceModelInfo {
        name: "flan-t5-small",
        display_name: "Flan-T5 Small (64 MB)",
        size_mb: 64,
        hf_repo: SENTENCE_MODEL_REPO,
        hf_filename: "model.gguf",
        config_filename: "config.json",
    },
    SentenceModelInfo {
        name: "flan-t5-base",
        display_name: "Flan-T5 Base (263 MB)",
        size_mb: 263,
        hf_repo: SENTENCE_MODEL_REPO,
        hf_filename: "model-flan-t5-base.gguf",
        config_filename: "config-flan-t5-base.json",
    },
    SentenceModelInfo {
        name: "flan-t5-large",
        display_name: "Flan-T5 Large (852 MB)",
        size_mb: 852,
        hf_repo: SENTENCE_MODEL_REPO,
        hf_filename: "model-flan-t5-large.gguf",
        config_filename: "config-flan-t5-large.json",
    },
];

pub fn get_sentence_model(name: &str) -> Option<&'static SentenceModelInfo> {
    SENTENCE_MODELS.iter().find(|m| m.name == name)
}
