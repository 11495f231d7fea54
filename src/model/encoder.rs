use crate::config::RnnType;
use crate::dataview::Batch;
use crate::error::{LipreadError, Result};
use crate::model::rnn::{CellState, StackedRnn};
use candle_core::{D, Device, IndexOp, Module, Tensor};
use candle_nn::{Linear, VarBuilder, linear};

/// Encoder settings; the frame dimension comes from the landmark selection.
#[derive(Debug, Clone, PartialEq)]
pub struct EncoderConfig {
    pub frame_dim: usize,
    pub hidden_size: usize,
    pub rnn_type: RnnType,
    pub num_layers: usize,
    pub bidirectional: bool,
    /// CTC head output size (vocabulary plus blank), if enabled.
    pub ctc_outputs: Option<usize>,
}

/// Encoding of one sequence.
#[derive(Debug, Clone)]
pub struct EncoderOutput {
    /// `(seq_len, dirs * hidden)`
    pub hidden_states: Tensor,
    /// Per layer, both directions concatenated.
    pub final_state: Vec<CellState>,
    /// `(seq_len, vocab + 1)` masked log-probabilities of the CTC head.
    pub log_probs: Option<Tensor>,
}

/// Recurrent encoder over flattened landmark frames.
#[derive(Debug, Clone)]
pub struct VideoEncoder {
    config: EncoderConfig,
    rnn: StackedRnn,
    output_proj: Option<Linear>,
    output_mask: Option<Tensor>,
}

impl VideoEncoder {
    /// `ctc_mask` is the additive log-space mask of the CTC head.
    pub fn new(config: EncoderConfig, ctc_mask: Option<&[f32]>, vb: VarBuilder) -> Result<Self> {
        let rnn = StackedRnn::new(
            config.rnn_type,
            config.frame_dim,
            config.hidden_size,
            config.num_layers,
            config.bidirectional,
            vb.pp("rnn"),
        )?;
        let (output_proj, output_mask) = match (config.ctc_outputs, ctc_mask) {
            (Some(outputs), Some(mask)) => {
                if mask.len() != outputs {
                    return Err(LipreadError::ModelConfig {
                        message: format!("CTC mask has {} entries for {} outputs", mask.len(), outputs),
                    });
                }
                let proj = linear(rnn.output_size(), outputs, vb.pp("output_proj"))?;
                let mask = Tensor::from_slice(mask, (1, outputs), vb.device())?;
                (Some(proj), Some(mask))
            }
            (None, _) => (None, None),
            (Some(_), None) => {
                return Err(LipreadError::ModelConfig {
                    message: "CTC head needs an output mask".to_string(),
                });
            }
        };
        Ok(Self {
            config,
            rnn,
            output_proj,
            output_mask,
        })
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Width of the hidden states handed to the decoder.
    pub fn output_size(&self) -> usize {
        self.rnn.output_size()
    }

    pub fn has_ctc(&self) -> bool {
        self.output_proj.is_some()
    }

    /// Encode one unpadded sequence `(seq_len, frame_dim)`.
    pub fn forward(&self, frames: &Tensor) -> Result<EncoderOutput> {
        let (seq_len, frame_dim) = frames.dims2()?;
        if seq_len == 0 {
            return Err(LipreadError::ModelConfig {
                message: "cannot encode an empty sequence".to_string(),
            });
        }
        if frame_dim != self.config.frame_dim {
            return Err(LipreadError::ModelConfig {
                message: format!(
                    "frames have {frame_dim} features, encoder expects {}",
                    self.config.frame_dim
                ),
            });
        }
        let (hidden_states, final_state) = self.rnn.forward(frames)?;
        let log_probs = match (&self.output_proj, &self.output_mask) {
            (Some(proj), Some(mask)) => {
                let logits = proj.forward(&hidden_states)?.broadcast_add(mask)?;
                Some(candle_nn::ops::log_softmax(&logits, D::Minus1)?)
            }
            _ => None,
        };
        Ok(EncoderOutput {
            hidden_states,
            final_state,
            log_probs,
        })
    }

    /// Encode every item of a padded batch at its own length.
    pub fn forward_batch(&self, batch: &Batch, device: &Device) -> Result<Vec<EncoderOutput>> {
        let features = batch.to_tensor(device)?;
        batch
            .lengths
            .iter()
            .enumerate()
            .map(|(b, &len)| self.forward(&features.i(b)?.narrow(0, 0, len)?))
            .collect()
    }
}

/// Copy a `(rows, cols)` log-probability tensor into nested vectors.
pub fn log_prob_rows(log_probs: &Tensor) -> Result<Vec<Vec<f32>>> {
    Ok(log_probs.to_vec2()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataview::Example;
    use crate::model::vocab::Vocab;
    use crate::vision::{FaceBox, mean_shape};
    use candle_core::DType;
    use candle_nn::VarMap;

    fn config(vocab: &Vocab) -> EncoderConfig {
        EncoderConfig {
            frame_dim: 40,
            hidden_size: 8,
            rnn_type: RnnType::Lstm,
            num_layers: 1,
            bidirectional: true,
            ctc_outputs: Some(vocab.ctc_len()),
        }
    }

    fn frames(len: usize) -> Tensor {
        let data: Vec<f32> = (0..len * 40).map(|i| (i as f32 * 0.11).cos()).collect();
        Tensor::from_vec(data, (len, 40), &Device::Cpu).unwrap()
    }

    #[test]
    fn ctc_head_masks_pad_and_bos() {
        let vocab = Vocab::new("abc").unwrap();
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let encoder = VideoEncoder::new(config(&vocab), Some(&vocab.ctc_mask()), vb).unwrap();

        let out = encoder.forward(&frames(5)).unwrap();
        assert_eq!(out.hidden_states.dims(), &[5, 16]);
        let rows = log_prob_rows(out.log_probs.as_ref().unwrap()).unwrap();
        assert_eq!(rows.len(), 5);
        for row in rows {
            assert_eq!(row.len(), vocab.ctc_len());
            assert_eq!(row[vocab.pad() + 1].exp(), 0.0);
            assert_eq!(row[vocab.bos() + 1].exp(), 0.0);
            let total: f32 = row.iter().map(|v| v.exp()).sum();
            assert!((total - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn without_ctc_there_are_no_log_probs() {
        let vocab = Vocab::new("abc").unwrap();
        let mut cfg = config(&vocab);
        cfg.ctc_outputs = None;
        cfg.bidirectional = false;
        let vb = VarBuilder::zeros(DType::F32, &Device::Cpu);
        let encoder = VideoEncoder::new(cfg, None, vb).unwrap();
        let out = encoder.forward(&frames(3)).unwrap();
        assert!(out.log_probs.is_none());
        assert_eq!(encoder.output_size(), 8);
    }

    #[test]
    fn padding_does_not_change_an_items_encoding() {
        let vocab = Vocab::new("abc").unwrap();
        let varmap = VarMap::new();
        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let encoder = VideoEncoder::new(config(&vocab), Some(&vocab.ctc_mask()), vb).unwrap();

        let example = |n: usize| {
            let face = FaceBox::new(0.0, 0.0, 10.0, 10.0);
            let mut landmarks = Vec::new();
            for i in 0..n {
                let shift = FaceBox::new(i as f32 * 0.1, 0.0, 10.0, 10.0);
                landmarks.push(mean_shape().denormalized(&shift));
            }
            Example {
                id: format!("e{n}"),
                transcript: String::new(),
                fps: 25,
                faces: vec![face; n],
                landmarks,
            }
        };
        let short = example(2);
        let batch = Batch::from_examples(&[short.clone(), example(6)], true).unwrap();
        let batched = encoder.forward_batch(&batch, &Device::Cpu).unwrap();

        let alone = Batch::from_examples(&[short], true).unwrap();
        let single = encoder.forward_batch(&alone, &Device::Cpu).unwrap();

        let a: Vec<Vec<f32>> = batched[0].hidden_states.to_vec2().unwrap();
        let b: Vec<Vec<f32>> = single[0].hidden_states.to_vec2().unwrap();
        assert_eq!(a.len(), 2);
        assert_eq!(a, b);
    }

    #[test]
    fn wrong_frame_width_is_rejected() {
        let vocab = Vocab::new("abc").unwrap();
        let vb = VarBuilder::zeros(DType::F32, &Device::Cpu);
        let encoder = VideoEncoder::new(config(&vocab), Some(&vocab.ctc_mask()), vb).unwrap();
        let bad = Tensor::zeros((3, 136), DType::F32, &Device::Cpu).unwrap();
        assert!(encoder.forward(&bad).is_err());
    }
}
