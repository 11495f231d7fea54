//! Attention-based character decoder, one step at a time.

use crate::config::{AttentionType, RnnType};
use crate::error::{LipreadError, Result};
use crate::model::rnn::{CellState, StackedRnn};
use crate::model::vocab::Vocab;
use candle_core::{D, Module, Tensor};
use candle_nn::{Embedding, Linear, VarBuilder, embedding, linear};

/// Attention scoring between the decoder state and encoder states.
#[derive(Debug, Clone)]
pub enum Attention {
    None,
    Dot,
    General(Linear),
    OneLayerNn(Linear),
    Concat(Linear, Linear),
}

impl Attention {
    pub fn new(kind: AttentionType, hidden: usize, attn_hidden: usize, vb: &VarBuilder) -> Result<Self> {
        Ok(match kind {
            AttentionType::None => Attention::None,
            AttentionType::Dot => Attention::Dot,
            AttentionType::General => {
                Attention::General(linear(hidden, hidden, vb.pp("attn_proj_general"))?)
            }
            AttentionType::OneLayerNn => {
                Attention::OneLayerNn(linear(2 * hidden, 1, vb.pp("attn_proj_1_layer_nn"))?)
            }
            AttentionType::Concat => {
                if attn_hidden == 0 {
                    return Err(LipreadError::ModelConfig {
                        message: "concat attention needs attn_hidden_size > 0".to_string(),
                    });
                }
                Attention::Concat(
                    linear(2 * hidden, attn_hidden, vb.pp("attn_proj_layer1"))?,
                    linear(attn_hidden, 1, vb.pp("attn_proj_layer2"))?,
                )
            }
        })
    }

    /// Unnormalized scores `(seq_len,)` of `query` `(1, hidden)` against `keys` `(seq_len, hidden)`.
    pub fn scores(&self, query: &Tensor, keys: &Tensor) -> Result<Option<Tensor>> {
        let scores = match self {
            Attention::None => return Ok(None),
            Attention::Dot => keys.matmul(&query.t()?)?,
            Attention::General(proj) => keys.matmul(&proj.forward(query)?.t()?)?,
            Attention::OneLayerNn(proj) => proj.forward(&pair_with_keys(query, keys)?)?,
            Attention::Concat(layer1, layer2) => {
                let hidden = layer1.forward(&pair_with_keys(query, keys)?)?.tanh()?;
                layer2.forward(&hidden)?
            }
        };
        Ok(Some(scores.squeeze(D::Minus1)?))
    }
}

/// `[keys; query]` per encoder position: `(seq_len, 2 * hidden)`.
fn pair_with_keys(query: &Tensor, keys: &Tensor) -> Result<Tensor> {
    let expanded = query.broadcast_as(keys.shape())?.contiguous()?;
    Ok(Tensor::cat(&[keys, &expanded], D::Minus1)?)
}

/// Softmax over the first `valid` positions; later positions get zero weight.
pub fn masked_softmax(logits: &Tensor, valid: usize) -> Result<Tensor> {
    let len = logits.dims1()?;
    if valid == 0 || valid > len {
        return Err(LipreadError::ModelConfig {
            message: format!("attention over {valid} of {len} positions"),
        });
    }
    let mask: Vec<f32> = (0..len)
        .map(|i| if i < valid { 0.0 } else { f32::NEG_INFINITY })
        .collect();
    let mask = Tensor::from_vec(mask, len, logits.device())?;
    Ok(candle_nn::ops::softmax(&(logits + mask)?, D::Minus1)?)
}

/// Result of one decoding step.
#[derive(Debug, Clone)]
pub struct StepOutput {
    /// `(vocab,)` masked log-probabilities of the next character.
    pub log_probs: Tensor,
    pub state: Vec<CellState>,
    /// `(seq_len,)` attention weights, when attention is enabled.
    pub attention: Option<Tensor>,
}

/// One step of the character decoder.
#[derive(Debug, Clone)]
pub struct CharDecodingStep {
    embedding: Embedding,
    rnn: StackedRnn,
    attention: Attention,
    concat_layer: Option<Linear>,
    output_proj: Linear,
    output_mask: Tensor,
}

impl CharDecodingStep {
    /// `hidden` must equal the encoder output width so encoder states can seed the decoder.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        vocab: &Vocab,
        char_dim: usize,
        hidden: usize,
        rnn_type: RnnType,
        num_layers: usize,
        attention: AttentionType,
        attn_hidden: usize,
        vb: VarBuilder,
    ) -> Result<Self> {
        let embedding = embedding(vocab.len(), char_dim, vb.pp("embedding"))?;
        let rnn = StackedRnn::new(rnn_type, char_dim, hidden, num_layers, false, vb.pp("rnn"))?;
        let attention = Attention::new(attention, hidden, attn_hidden, &vb)?;
        let concat_layer = match attention {
            Attention::None => None,
            _ => Some(linear(2 * hidden, hidden, vb.pp("concat_layer"))?),
        };
        let output_proj = linear(hidden, vocab.len(), vb.pp("output_proj"))?;
        let output_mask = Tensor::from_vec(vocab.attention_mask(), vocab.len(), vb.device())?;
        Ok(Self {
            embedding,
            rnn,
            attention,
            concat_layer,
            output_proj,
            output_mask,
        })
    }

    pub fn num_layers(&self) -> usize {
        self.rnn.num_layers()
    }

    /// Advance by one character.
    ///
    /// `encoder_states` may be padded; only the first `encoder_len` rows are attended.
    pub fn step(
        &self,
        input: usize,
        state: &[CellState],
        encoder_states: &Tensor,
        encoder_len: usize,
    ) -> Result<StepOutput> {
        let ids = Tensor::new(&[input as u32], encoder_states.device())?;
        let embedded = self.embedding.forward(&ids)?;
        let (hidden, next_state) = self.rnn.step(&embedded, state)?;

        let (features, weights) = match self.attention.scores(&hidden, encoder_states)? {
            Some(scores) => {
                let weights = masked_softmax(&scores, encoder_len)?;
                let context = weights.unsqueeze(0)?.matmul(encoder_states)?;
                let joined = Tensor::cat(&[&context, &hidden], D::Minus1)?;
                let combined = match &self.concat_layer {
                    Some(layer) => layer.forward(&joined)?.tanh()?,
                    None => hidden.clone(),
                };
                (combined, Some(weights))
            }
            None => (hidden, None),
        };

        let logits = self.output_proj.forward(&features)?.squeeze(0)?;
        let log_probs = candle_nn::ops::log_softmax(&(logits + &self.output_mask)?, D::Minus1)?;
        Ok(StepOutput {
            log_probs,
            state: next_state,
            attention: weights,
        })
    }

    /// Greedy decoding from `<bos>` until `<eos>` or `max_chars`.
    ///
    /// Returns vocabulary ids (without `<eos>`) and their summed log-probability.
    pub fn greedy(
        &self,
        vocab: &Vocab,
        encoder_states: &Tensor,
        init_state: Vec<CellState>,
        max_chars: usize,
    ) -> Result<(Vec<usize>, f32)> {
        let encoder_len = encoder_states.dims2()?.0;
        let mut state = init_state;
        let mut input = vocab.bos();
        let mut ids = Vec::new();
        let mut total = 0.0f32;
        for _ in 0..max_chars {
            let step = self.step(input, &state, encoder_states, encoder_len)?;
            let best = step.log_probs.argmax(0)?.to_scalar::<u32>()? as usize;
            total += step.log_probs.get(best)?.to_scalar::<f32>()?;
            state = step.state;
            if best == vocab.eos() {
                break;
            }
            ids.push(best);
            input = best;
        }
        Ok((ids, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::{DType, Device};
    use candle_nn::VarMap;

    const HIDDEN: usize = 6;

    fn decoder(varmap: &VarMap, attention: AttentionType) -> (Vocab, CharDecodingStep) {
        let vocab = Vocab::new("ab ").unwrap();
        let vb = VarBuilder::from_varmap(varmap, DType::F32, &Device::Cpu);
        let step =
            CharDecodingStep::new(&vocab, 4, HIDDEN, RnnType::Gru, 1, attention, 5, vb).unwrap();
        (vocab, step)
    }

    fn encoder_states(len: usize) -> Tensor {
        let data: Vec<f32> = (0..len * HIDDEN).map(|i| (i as f32 * 0.3).sin()).collect();
        Tensor::from_vec(data, (len, HIDDEN), &Device::Cpu).unwrap()
    }

    #[test]
    fn every_attention_type_produces_masked_distribution() {
        for kind in [
            AttentionType::None,
            AttentionType::Dot,
            AttentionType::General,
            AttentionType::OneLayerNn,
            AttentionType::Concat,
        ] {
            let varmap = VarMap::new();
            let (vocab, dec) = decoder(&varmap, kind);
            let state = dec.rnn.zero_states(&Device::Cpu).unwrap();
            let out = dec.step(vocab.bos(), &state, &encoder_states(4), 4).unwrap();
            let probs: Vec<f32> = out.log_probs.exp().unwrap().to_vec1().unwrap();
            assert_eq!(probs.len(), vocab.len());
            assert_eq!(probs[vocab.pad()], 0.0, "{kind:?}");
            assert_eq!(probs[vocab.bos()], 0.0, "{kind:?}");
            assert!((probs.iter().sum::<f32>() - 1.0).abs() < 1e-4);
            assert_eq!(out.attention.is_some(), kind != AttentionType::None);
        }
    }

    #[test]
    fn attention_ignores_padded_positions() {
        let varmap = VarMap::new();
        let (vocab, dec) = decoder(&varmap, AttentionType::General);
        let state = dec.rnn.zero_states(&Device::Cpu).unwrap();

        let real = encoder_states(3);
        let noise = Tensor::full(9.0f32, (2, HIDDEN), &Device::Cpu).unwrap();
        let padded = Tensor::cat(&[&real, &noise], 0).unwrap();

        let a = dec.step(vocab.bos(), &state, &real, 3).unwrap();
        let b = dec.step(vocab.bos(), &state, &padded, 3).unwrap();

        let wa: Vec<f32> = a.attention.unwrap().to_vec1().unwrap();
        let wb: Vec<f32> = b.attention.unwrap().to_vec1().unwrap();
        assert_eq!(wb[3], 0.0);
        assert_eq!(wb[4], 0.0);
        for (x, y) in wa.iter().zip(&wb) {
            assert!((x - y).abs() < 1e-6);
        }
        let pa: Vec<f32> = a.log_probs.to_vec1().unwrap();
        let pb: Vec<f32> = b.log_probs.to_vec1().unwrap();
        for (x, y) in pa.iter().zip(&pb).filter(|(x, _)| x.is_finite()) {
            assert!((x - y).abs() < 1e-5);
        }
    }

    #[test]
    fn masked_softmax_rejects_empty_range() {
        let logits = Tensor::zeros(3, DType::F32, &Device::Cpu).unwrap();
        assert!(masked_softmax(&logits, 0).is_err());
        assert!(masked_softmax(&logits, 4).is_err());
        let w: Vec<f32> = masked_softmax(&logits, 2).unwrap().to_vec1().unwrap();
        assert_eq!(w, vec![0.5, 0.5, 0.0]);
    }

    #[test]
    fn greedy_stops_at_max_chars() {
        let varmap = VarMap::new();
        let (vocab, dec) = decoder(&varmap, AttentionType::Dot);
        let init = dec.rnn.zero_states(&Device::Cpu).unwrap();
        let (ids, score) = dec.greedy(&vocab, &encoder_states(5), init, 3).unwrap();
        assert!(ids.len() <= 3);
        assert!(ids.iter().all(|&id| id != vocab.pad() && id != vocab.bos()));
        assert!(score <= 0.0);
    }

    #[test]
    fn concat_without_hidden_size_is_rejected() {
        let vocab = Vocab::new("ab").unwrap();
        let vb = VarBuilder::zeros(DType::F32, &Device::Cpu);
        let result =
            CharDecodingStep::new(&vocab, 4, HIDDEN, RnnType::Lstm, 1, AttentionType::Concat, 0, vb);
        assert!(matches!(result, Err(LipreadError::ModelConfig { .. })));
    }
}
