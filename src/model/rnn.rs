//! Recurrent layers over candle tensors.
//!
//! Weights follow the PyTorch naming (`weight_ih_l{k}`, `bias_hh_l{k}_reverse`, ...)
//! so exported checkpoints load without renaming. Sequences are processed one
//! item at a time as `(seq_len, features)` matrices.

use crate::config::RnnType;
use crate::error::Result;
use candle_core::{D, Device, Module, Tensor};
use candle_nn::{Init, Linear, VarBuilder};

/// Hidden state of one layer and direction, each `(1, hidden)`.
#[derive(Debug, Clone)]
pub struct CellState {
    pub h: Tensor,
    /// LSTM cell state.
    pub c: Option<Tensor>,
}

impl CellState {
    /// Concatenate two states along the feature dimension.
    pub fn concat(&self, other: &CellState) -> Result<CellState> {
        let h = Tensor::cat(&[&self.h, &other.h], D::Minus1)?;
        let c = match (&self.c, &other.c) {
            (Some(a), Some(b)) => Some(Tensor::cat(&[a, b], D::Minus1)?),
            _ => None,
        };
        Ok(CellState { h, c })
    }
}

fn gates(kind: RnnType) -> usize {
    match kind {
        RnnType::Lstm => 4,
        RnnType::Gru => 3,
        RnnType::Rnn => 1,
    }
}

/// One recurrent layer in one direction.
#[derive(Debug, Clone)]
pub struct RecurrentLayer {
    kind: RnnType,
    ih: Linear,
    hh: Linear,
    hidden: usize,
}

impl RecurrentLayer {
    pub fn new(
        kind: RnnType,
        in_dim: usize,
        hidden: usize,
        layer: usize,
        reverse: bool,
        vb: &VarBuilder,
    ) -> Result<Self> {
        let suffix = if reverse { "_reverse" } else { "" };
        let rows = gates(kind) * hidden;
        let bound = 1.0 / (hidden as f64).sqrt();
        let init = Init::Uniform {
            lo: -bound,
            up: bound,
        };
        let w_ih = vb.get_with_hints((rows, in_dim), &format!("weight_ih_l{layer}{suffix}"), init)?;
        let w_hh = vb.get_with_hints((rows, hidden), &format!("weight_hh_l{layer}{suffix}"), init)?;
        let b_ih = vb.get_with_hints(rows, &format!("bias_ih_l{layer}{suffix}"), init)?;
        let b_hh = vb.get_with_hints(rows, &format!("bias_hh_l{layer}{suffix}"), init)?;
        Ok(Self {
            kind,
            ih: Linear::new(w_ih, Some(b_ih)),
            hh: Linear::new(w_hh, Some(b_hh)),
            hidden,
        })
    }

    pub fn zero_state(&self, device: &Device) -> Result<CellState> {
        let h = Tensor::zeros((1, self.hidden), candle_core::DType::F32, device)?;
        let c = match self.kind {
            RnnType::Lstm => Some(h.clone()),
            _ => None,
        };
        Ok(CellState { h, c })
    }

    /// Advance one step. `x` is `(1, in_dim)`.
    pub fn step(&self, x: &Tensor, state: &CellState) -> Result<CellState> {
        let gi = self.ih.forward(x)?;
        let gh = self.hh.forward(&state.h)?;
        match self.kind {
            RnnType::Rnn => Ok(CellState {
                h: (gi + gh)?.tanh()?,
                c: None,
            }),
            RnnType::Lstm => {
                let g = (gi + gh)?.chunk(4, D::Minus1)?;
                let i = candle_nn::ops::sigmoid(&g[0])?;
                let f = candle_nn::ops::sigmoid(&g[1])?;
                let cand = g[2].tanh()?;
                let o = candle_nn::ops::sigmoid(&g[3])?;
                let c_prev = match &state.c {
                    Some(c) => c.clone(),
                    None => state.h.zeros_like()?,
                };
                let c = ((f * c_prev)? + (i * cand)?)?;
                let h = (o * c.tanh()?)?;
                Ok(CellState { h, c: Some(c) })
            }
            RnnType::Gru => {
                let gi = gi.chunk(3, D::Minus1)?;
                let gh = gh.chunk(3, D::Minus1)?;
                let r = candle_nn::ops::sigmoid(&(&gi[0] + &gh[0])?)?;
                let z = candle_nn::ops::sigmoid(&(&gi[1] + &gh[1])?)?;
                let n = (&gi[2] + (r * &gh[2])?)?.tanh()?;
                // h' = (1 - z) * n + z * h
                let h = ((z.affine(-1.0, 1.0)? * n)? + (z * &state.h)?)?;
                Ok(CellState { h, c: None })
            }
        }
    }

    /// Run over `xs` (`(seq_len, in_dim)`), optionally back to front.
    ///
    /// Outputs are returned in input order; the final state is the one after
    /// the last processed step.
    pub fn run(&self, xs: &Tensor, reverse: bool, init: Option<CellState>) -> Result<(Tensor, CellState)> {
        let (seq_len, _) = xs.dims2()?;
        let mut state = match init {
            Some(s) => s,
            None => self.zero_state(xs.device())?,
        };
        let mut outputs = Vec::with_capacity(seq_len);
        let order: Box<dyn Iterator<Item = usize>> = if reverse {
            Box::new((0..seq_len).rev())
        } else {
            Box::new(0..seq_len)
        };
        for t in order {
            state = self.step(&xs.narrow(0, t, 1)?, &state)?;
            outputs.push(state.h.clone());
        }
        if reverse {
            outputs.reverse();
        }
        Ok((Tensor::cat(&outputs, 0)?, state))
    }
}

/// Multi-layer, optionally bidirectional recurrent network.
#[derive(Debug, Clone)]
pub struct StackedRnn {
    layers: Vec<(RecurrentLayer, Option<RecurrentLayer>)>,
    hidden: usize,
}

impl StackedRnn {
    pub fn new(
        kind: RnnType,
        in_dim: usize,
        hidden: usize,
        num_layers: usize,
        bidirectional: bool,
        vb: VarBuilder,
    ) -> Result<Self> {
        let dirs = if bidirectional { 2 } else { 1 };
        let mut layers = Vec::with_capacity(num_layers);
        for layer in 0..num_layers {
            let input = if layer == 0 { in_dim } else { dirs * hidden };
            let forward = RecurrentLayer::new(kind, input, hidden, layer, false, &vb)?;
            let backward = if bidirectional {
                Some(RecurrentLayer::new(kind, input, hidden, layer, true, &vb)?)
            } else {
                None
            };
            layers.push((forward, backward));
        }
        Ok(Self { layers, hidden })
    }

    pub fn num_layers(&self) -> usize {
        self.layers.len()
    }

    pub fn num_directions(&self) -> usize {
        match self.layers.first() {
            Some((_, Some(_))) => 2,
            _ => 1,
        }
    }

    /// Width of each output row.
    pub fn output_size(&self) -> usize {
        self.num_directions() * self.hidden
    }

    /// Encode a whole sequence `(seq_len, in_dim)`.
    ///
    /// Returns the top layer outputs `(seq_len, dirs * hidden)` and one final
    /// state per layer with both directions concatenated.
    pub fn forward(&self, xs: &Tensor) -> Result<(Tensor, Vec<CellState>)> {
        let mut input = xs.clone();
        let mut finals = Vec::with_capacity(self.layers.len());
        for (forward, backward) in &self.layers {
            let (out_f, state_f) = forward.run(&input, false, None)?;
            match backward {
                Some(backward) => {
                    let (out_b, state_b) = backward.run(&input, true, None)?;
                    input = Tensor::cat(&[&out_f, &out_b], D::Minus1)?;
                    finals.push(state_f.concat(&state_b)?);
                }
                None => {
                    input = out_f;
                    finals.push(state_f);
                }
            }
        }
        Ok((input, finals))
    }

    /// One step through every layer of a unidirectional stack.
    pub fn step(&self, x: &Tensor, states: &[CellState]) -> Result<(Tensor, Vec<CellState>)> {
        let mut input = x.clone();
        let mut next = Vec::with_capacity(self.layers.len());
        for ((layer, _), state) in self.layers.iter().zip(states) {
            let s = layer.step(&input, state)?;
            input = s.h.clone();
            next.push(s);
        }
        Ok((input, next))
    }

    pub fn zero_states(&self, device: &Device) -> Result<Vec<CellState>> {
        self.layers
            .iter()
            .map(|(layer, _)| layer.zero_state(device))
            .collect()
    }
}
