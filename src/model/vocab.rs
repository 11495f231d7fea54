//! Character vocabulary with special tokens.
//!
//! Layout: `<pad>` = 0, `<bos>` = 1, `<eos>` = 2, then the alphabet in order.
//! The CTC head has one extra output: index 0 is the blank, and vocabulary
//! index `i` is CTC output `i + 1`.

use crate::error::{LipreadError, Result};
use std::collections::HashMap;

pub const PAD: &str = "<pad>";
pub const BOS: &str = "<bos>";
pub const EOS: &str = "<eos>";
pub const CTC_BLANK: usize = 0;

const NUM_SPECIAL: usize = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct Vocab {
    chars: Vec<char>,
    index: HashMap<char, usize>,
}

impl Vocab {
    pub fn new(alphabet: &str) -> Result<Self> {
        let mut chars = Vec::new();
        let mut index = HashMap::new();
        for c in alphabet.chars() {
            if index.insert(c, NUM_SPECIAL + chars.len()).is_some() {
                return Err(LipreadError::ModelConfig {
                    message: format!("alphabet repeats character {c:?}"),
                });
            }
            chars.push(c);
        }
        if chars.is_empty() {
            return Err(LipreadError::ModelConfig {
                message: "alphabet is empty".to_string(),
            });
        }
        Ok(Self { chars, index })
    }

    /// Size including the special tokens.
    pub fn len(&self) -> usize {
        NUM_SPECIAL + self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Output size of the CTC head (vocabulary plus blank).
    pub fn ctc_len(&self) -> usize {
        self.len() + 1
    }

    pub fn pad(&self) -> usize {
        0
    }

    pub fn bos(&self) -> usize {
        1
    }

    pub fn eos(&self) -> usize {
        2
    }

    pub fn char_id(&self, c: char) -> Option<usize> {
        self.index.get(&c).copied()
    }

    pub fn id_char(&self, id: usize) -> Option<char> {
        id.checked_sub(NUM_SPECIAL)
            .and_then(|i| self.chars.get(i))
            .copied()
    }

    /// Token name for display, including special tokens.
    pub fn token(&self, id: usize) -> Option<String> {
        match id {
            0 => Some(PAD.to_string()),
            1 => Some(BOS.to_string()),
            2 => Some(EOS.to_string()),
            _ => self.id_char(id).map(String::from),
        }
    }

    /// Encode text, dropping characters outside the alphabet.
    pub fn encode(&self, text: &str) -> Vec<usize> {
        text.chars().filter_map(|c| self.char_id(c)).collect()
    }

    /// Decode ids, skipping special tokens.
    pub fn decode(&self, ids: &[usize]) -> String {
        ids.iter().filter_map(|&id| self.id_char(id)).collect()
    }

    /// Decode CTC output indices (blank already removed or skipped here).
    pub fn decode_ctc(&self, outputs: &[usize]) -> String {
        outputs
            .iter()
            .filter_map(|&o| o.checked_sub(1))
            .filter_map(|id| self.id_char(id))
            .collect()
    }

    /// Additive log-space mask for the attention decoder: `<pad>` and `<bos>` are never emitted.
    pub fn attention_mask(&self) -> Vec<f32> {
        let mut mask = vec![0.0; self.len()];
        mask[self.pad()] = f32::NEG_INFINITY;
        mask[self.bos()] = f32::NEG_INFINITY;
        mask
    }

    /// Additive log-space mask for the CTC head, shifted by the blank.
    pub fn ctc_mask(&self) -> Vec<f32> {
        let mut mask = vec![0.0; self.ctc_len()];
        mask[self.pad() + 1] = f32::NEG_INFINITY;
        mask[self.bos() + 1] = f32::NEG_INFINITY;
        mask
    }
}
