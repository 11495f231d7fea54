//! Sequence model: landmark frames → characters.
//!
//! A recurrent [`VideoEncoder`] with an optional CTC head, and an optional
//! attention [`CharDecodingStep`] decoder seeded with the encoder's final
//! state. Inference runs on CPU through candle.

pub mod checkpoint;
pub mod ctc;
pub mod decoder;
pub mod encoder;
pub mod lipreader;
pub mod rnn;
pub mod vocab;

pub use checkpoint::BestCheckpoint;
pub use ctc::{CtcHypothesis, greedy_decode, prefix_beam_search};
pub use decoder::{Attention, CharDecodingStep, StepOutput, masked_softmax};
pub use encoder::{EncoderConfig, EncoderOutput, VideoEncoder};
pub use lipreader::LipReader;
pub use rnn::{CellState, RecurrentLayer, StackedRnn};
pub use vocab::{CTC_BLANK, Vocab};
