//! Flan-T5 sentence rewrite using candle quantized models.
//!
//! Downloads model artifacts from HuggingFace on first use, then runs
//! greedy T5 decoding over the word-corrected hypothesis.

use crate::correction::corrector::Corrector;
use crate::correction::lm_catalog::{SentenceModelInfo, TOKENIZER_FILENAME};
use crate::correction::words::normalize_sentence;
use crate::error::{LipreadError, Result};

use candle_core::{Device, Tensor};
use candle_transformers::models::quantized_t5::{Config as T5Config, T5ForConditionalGeneration};
use candle_transformers::quantized_var_builder::VarBuilder;
use hf_hub::api::sync::Api;
use tokenizers::Tokenizer;

const MAX_DECODE_TOKENS: usize = 64;

/// T5 end-of-sequence token id.
const EOS_TOKEN: u32 = 1;

const PROMPT_PREFIX: &str = "Fix the errors in this sentence: ";

fn lm_error(context: &str, e: impl std::fmt::Display) -> LipreadError {
    LipreadError::Correction {
        message: format!("{context}: {e}"),
    }
}

pub struct CandleT5Corrector {
    model: T5ForConditionalGeneration,
    tokenizer: Tokenizer,
    device: Device,
    model_name: String,
}

impl CandleT5Corrector {
    /// Load a quantized Flan-T5 model, downloading it into the HuggingFace cache on first use.
    pub fn load(info: &SentenceModelInfo) -> Result<Self> {
        let device = Device::Cpu;
        let api = Api::new().map_err(|e| lm_error("HF Hub API init", e))?;
        let repo = api.model(info.hf_repo.to_string());

        let model_path = repo
            .get(info.hf_filename)
            .map_err(|e| lm_error(&format!("Download model {}", info.hf_filename), e))?;
        let config_path = repo
            .get(info.config_filename)
            .map_err(|e| lm_error(&format!("Download config {}", info.config_filename), e))?;
        let tokenizer_path = repo
            .get(TOKENIZER_FILENAME)
            .map_err(|e| lm_error("Download tokenizer", e))?;

        let config_bytes = std::fs::read(&config_path)?;
        let config: T5Config = serde_json::from_slice(&config_bytes)?;

        let vb = VarBuilder::from_gguf(&model_path, &device)
            .map_err(|e| lm_error(&format!("Load GGUF model {}", model_path.display()), e))?;
        let model = T5ForConditionalGeneration::load(vb, &config)?;
        let tokenizer = Tokenizer::from_file(&tokenizer_path)
            .map_err(|e| lm_error(&format!("Load tokenizer {}", tokenizer_path.display()), e))?;

        tracing::info!(model = info.name, "loaded sentence model");
        Ok(Self {
            model,
            tokenizer,
            device,
            model_name: info.name.to_string(),
        })
    }

    fn generate(&mut self, prompt: &str) -> Result<String> {
        let encoding = self
            .tokenizer
            .encode(prompt, true)
            .map_err(|e| lm_error("Tokenize", e))?;
        let input = Tensor::new(encoding.get_ids(), &self.device)?.unsqueeze(0)?;
        let encoder_output = self.model.encode(&input)?;

        // First step feeds the pad token (0); later steps feed only the new
        // token and rely on the KV cache.
        let mut decoded: Vec<u32> = Vec::new();
        let mut next_input = 0u32;
        for _ in 0..MAX_DECODE_TOKENS {
            let decoder_input = Tensor::new(&[next_input], &self.device)?.unsqueeze(0)?;
            let logits = self.model.decode(&decoder_input, &encoder_output)?;
            let seq_len = logits.dim(1)?;
            let next_token = logits
                .get_on_dim(1, seq_len - 1)?
                .argmax(candle_core::D::Minus1)?
                .reshape(())?
                .to_scalar::<u32>()?;
            if next_token == EOS_TOKEN {
                break;
            }
            decoded.push(next_token);
            next_input = next_token;
        }

        self.tokenizer
            .decode(&decoded, true)
            .map_err(|e| lm_error("Detokenize", e))
    }
}

impl Corrector for CandleT5Corrector {
    fn correct(&mut self, text: &str) -> Result<String> {
        if text.trim().is_empty() {
            return Ok(String::new());
        }
        self.model.clear_kv_cache();
        let rewritten = self.generate(&format!("{PROMPT_PREFIX}{text}"))?;
        Ok(normalize_sentence(&rewritten))
    }

    fn name(&self) -> &str {
        &self.model_name
    }
}
