use crate::config::{DecodeConfig, DecodeStrategy, ModelConfig};
use crate::error::{LipreadError, Result};
use crate::model::ctc::{greedy_decode, prefix_beam_search};
use crate::model::decoder::CharDecodingStep;
use crate::model::encoder::{EncoderConfig, VideoEncoder, log_prob_rows};
use crate::model::vocab::{CTC_BLANK, Vocab};
use crate::recognize::{Recognition, Recognizer};
use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use std::path::Path;

/// Landmark sequence → character hypothesis.
///
/// Weights live under `encoder.*` and, with the attention decoder, `decoder.*`.
pub struct LipReader {
    vocab: Vocab,
    encoder: VideoEncoder,
    decoder: Option<CharDecodingStep>,
    decode: DecodeConfig,
    device: Device,
}

impl LipReader {
    pub fn new(model: &ModelConfig, decode: DecodeConfig, frame_dim: usize, vb: VarBuilder) -> Result<Self> {
        model.validate()?;
        decode.validate_for(model)?;
        let vocab = Vocab::new(&model.alphabet)?;
        let ctc_mask = vocab.ctc_mask();

        let encoder = VideoEncoder::new(
            EncoderConfig {
                frame_dim,
                hidden_size: model.hidden_size,
                rnn_type: model.rnn_type,
                num_layers: model.num_layers,
                bidirectional: model.bidirectional,
                ctc_outputs: model.enable_ctc.then(|| vocab.ctc_len()),
            },
            model.enable_ctc.then_some(ctc_mask.as_slice()),
            vb.pp("encoder"),
        )?;

        let decoder = if model.attention_decoder {
            Some(CharDecodingStep::new(
                &vocab,
                model.char_dim,
                encoder.output_size(),
                model.rnn_type,
                model.num_layers,
                model.attention,
                model.attn_hidden_size,
                vb.pp("decoder"),
            )?)
        } else {
            None
        };

        Ok(Self {
            vocab,
            encoder,
            decoder,
            decode,
            device: vb.device().clone(),
        })
    }

    /// Load trained weights from a safetensors file.
    pub fn load(path: &Path, model: &ModelConfig, decode: DecodeConfig, frame_dim: usize) -> Result<Self> {
        if !path.is_file() {
            return Err(LipreadError::ModelNotFound {
                path: path.display().to_string(),
            });
        }
        let device = Device::Cpu;
        let tensors = candle_core::safetensors::load(path, &device)?;
        let vb = VarBuilder::from_tensors(tensors, DType::F32, &device);
        let reader = Self::new(model, decode, frame_dim, vb)?;
        tracing::info!(
            path = %path.display(),
            strategy = ?reader.decode.strategy,
            "loaded lip reading model"
        );
        Ok(reader)
    }

    pub fn vocab(&self) -> &Vocab {
        &self.vocab
    }

    pub fn strategy(&self) -> DecodeStrategy {
        self.decode.strategy
    }

    fn frames_tensor(&self, features: &[Vec<f32>]) -> Result<Tensor> {
        let frame_dim = self.encoder.config().frame_dim;
        if features.is_empty() {
            return Err(LipreadError::ModelConfig {
                message: "cannot transcribe an empty landmark sequence".to_string(),
            });
        }
        if let Some(row) = features.iter().find(|r| r.len() != frame_dim) {
            return Err(LipreadError::ModelConfig {
                message: format!("frame has {} features, model expects {frame_dim}", row.len()),
            });
        }
        let flat: Vec<f32> = features.iter().flatten().copied().collect();
        Ok(Tensor::from_vec(flat, (features.len(), frame_dim), &self.device)?)
    }

    /// Decode one clip's frame features with the configured strategy.
    pub fn transcribe(&self, features: &[Vec<f32>]) -> Result<Recognition> {
        let frames = self.frames_tensor(features)?;
        let encoded = self.encoder.forward(&frames)?;
        let num_frames = features.len() as f32;

        let (text, log_prob, norm) = match self.decode.strategy {
            DecodeStrategy::CtcGreedy | DecodeStrategy::CtcBeam => {
                let log_probs = encoded.log_probs.as_ref().ok_or_else(|| LipreadError::ModelConfig {
                    message: "model has no CTC head".to_string(),
                })?;
                let rows = log_prob_rows(log_probs)?;
                let best = if self.decode.strategy == DecodeStrategy::CtcGreedy {
                    greedy_decode(&rows, CTC_BLANK)
                } else {
                    prefix_beam_search(&rows, CTC_BLANK, self.decode.beam_width)
                        .into_iter()
                        .next()
                        .unwrap_or_else(|| greedy_decode(&rows, CTC_BLANK))
                };
                (self.vocab.decode_ctc(&best.tokens), best.log_prob, num_frames)
            }
            DecodeStrategy::Attention => {
                let decoder = self.decoder.as_ref().ok_or_else(|| LipreadError::ModelConfig {
                    message: "model has no attention decoder".to_string(),
                })?;
                let (ids, log_prob) = decoder.greedy(
                    &self.vocab,
                    &encoded.hidden_states,
                    encoded.final_state,
                    self.decode.max_chars,
                )?;
                let steps = (ids.len() + 1) as f32;
                (self.vocab.decode(&ids), log_prob, steps)
            }
        };

        tracing::debug!(frames = features.len(), %text, "decoded clip");
        Ok(Recognition {
            text,
            confidence: (log_prob / norm).exp(),
        })
    }
}

impl Recognizer for LipReader {
    fn recognize(&self, features: &[Vec<f32>]) -> Result<Recognition> {
        self.transcribe(features)
    }

    fn name(&self) -> &str {
        match self.decode.strategy {
            DecodeStrategy::CtcGreedy => "ctc-greedy",
            DecodeStrategy::CtcBeam => "ctc-beam",
            DecodeStrategy::Attention => "attention",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AttentionType, RnnType};
    use crate::model::BestCheckpoint;
    use candle_nn::VarMap;
    use tempfile::TempDir;

    fn model_config() -> ModelConfig {
        ModelConfig {
            hidden_size: 8,
            char_dim: 4,
            alphabet: "ab ".to_string(),
            attention_decoder: true,
            attention: AttentionType::Dot,
            ..ModelConfig::default()
        }
    }

    fn decode(strategy: DecodeStrategy) -> DecodeConfig {
        DecodeConfig {
            strategy,
            beam_width: 3,
            max_chars: 6,
        }
    }

    fn features(len: usize) -> Vec<Vec<f32>> {
        (0..len)
            .map(|t| (0..40).map(|i| ((t * 40 + i) as f32 * 0.05).sin()).collect())
            .collect()
    }

    fn reader(varmap: &VarMap, strategy: DecodeStrategy) -> LipReader {
        let vb = VarBuilder::from_varmap(varmap, DType::F32, &Device::Cpu);
        LipReader::new(&model_config(), decode(strategy), 40, vb).unwrap()
    }

    #[test]
    fn every_strategy_yields_alphabet_text() {
        let varmap = VarMap::new();
        for strategy in [
            DecodeStrategy::CtcGreedy,
            DecodeStrategy::CtcBeam,
            DecodeStrategy::Attention,
        ] {
            let r = reader(&varmap, strategy);
            let out = r.recognize(&features(6)).unwrap();
            assert!(out.text.chars().all(|c| "ab ".contains(c)), "{strategy:?}");
            assert!(out.confidence > 0.0 && out.confidence <= 1.0);
            if strategy == DecodeStrategy::Attention {
                assert!(out.text.chars().count() <= 6);
            }
        }
    }

    #[test]
    fn weights_are_shared_by_name() {
        // both readers read the same encoder weights, so CTC outputs agree
        let varmap = VarMap::new();
        let a = reader(&varmap, DecodeStrategy::CtcGreedy).transcribe(&features(5)).unwrap();
        let b = reader(&varmap, DecodeStrategy::CtcGreedy).transcribe(&features(5)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn saved_checkpoint_loads_into_reader() {
        let dir = TempDir::new().unwrap();
        let varmap = VarMap::new();
        let original = reader(&varmap, DecodeStrategy::CtcBeam);
        let path = dir.path().join("weights/lipreader.safetensors");
        BestCheckpoint::new(&path).report(0.3, &varmap).unwrap();

        let loaded =
            LipReader::load(&path, &model_config(), decode(DecodeStrategy::CtcBeam), 40).unwrap();
        let x = features(4);
        assert_eq!(original.transcribe(&x).unwrap(), loaded.transcribe(&x).unwrap());
    }

    #[test]
    fn missing_weights_are_reported() {
        let result = LipReader::load(
            Path::new("/nonexistent/lipreader.safetensors"),
            &model_config(),
            decode(DecodeStrategy::CtcGreedy),
            40,
        );
        assert!(matches!(result, Err(LipreadError::ModelNotFound { .. })));
    }

    #[test]
    fn strategy_must_match_model_heads() {
        let mut config = model_config();
        config.attention_decoder = false;
        let vb = VarBuilder::zeros(DType::F32, &Device::Cpu);
        let result = LipReader::new(&config, decode(DecodeStrategy::Attention), 40, vb);
        assert!(matches!(result, Err(LipreadError::ConfigInvalidValue { .. })));
    }

    #[test]
    fn bad_frames_are_rejected() {
        let varmap = VarMap::new();
        let r = reader(&varmap, DecodeStrategy::CtcGreedy);
        assert!(r.transcribe(&[]).is_err());
        assert!(r.transcribe(&[vec![0.0; 136]]).is_err());
    }

    #[test]
    fn gru_and_vanilla_rnn_models_build() {
        for rnn_type in [RnnType::Gru, RnnType::Rnn] {
            let config = ModelConfig {
                rnn_type,
                num_layers: 2,
                ..model_config()
            };
            let varmap = VarMap::new();
            let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
            let r = LipReader::new(&config, decode(DecodeStrategy::Attention), 40, vb).unwrap();
            r.transcribe(&features(3)).unwrap();
        }
    }
}
