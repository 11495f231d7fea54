use crate::dataview::example::Example;
use crate::error::{LipreadError, Result};
use candle_core::{Device, Tensor};

/// Zero-padded features of several examples.
///
/// `features` is row-major `(batch, max_len, feature_dim)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    pub ids: Vec<String>,
    pub transcripts: Vec<String>,
    pub features: Vec<f32>,
    pub lengths: Vec<usize>,
    pub max_len: usize,
    pub feature_dim: usize,
}

impl Batch {
    pub fn from_examples(examples: &[Example], mouth_only: bool) -> Result<Self> {
        if examples.is_empty() {
            return Err(LipreadError::Dataview {
                message: "cannot batch zero examples".to_string(),
            });
        }
        let feature_dim = crate::vision::Landmarks::feature_dim(mouth_only);
        let lengths: Vec<usize> = examples.iter().map(Example::num_frames).collect();
        let max_len = lengths.iter().copied().max().unwrap_or(0);

        let mut features = vec![0.0f32; examples.len() * max_len * feature_dim];
        for (b, example) in examples.iter().enumerate() {
            for (t, row) in example.features(mouth_only).into_iter().enumerate() {
                let start = (b * max_len + t) * feature_dim;
                features[start..start + feature_dim].copy_from_slice(&row);
            }
        }

        Ok(Self {
            ids: examples.iter().map(|e| e.id.clone()).collect(),
            transcripts: examples.iter().map(|e| e.transcript.clone()).collect(),
            features,
            lengths,
            max_len,
            feature_dim,
        })
    }

    pub fn len(&self) -> usize {
        self.lengths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lengths.is_empty()
    }

    pub fn to_tensor(&self, device: &Device) -> Result<Tensor> {
        Ok(Tensor::from_slice(
            &self.features,
            (self.len(), self.max_len, self.feature_dim),
            device,
        )?)
    }
}

/// Split `examples` into batches of at most `size`.
pub fn batches(examples: &[Example], size: usize, mouth_only: bool) -> Result<Vec<Batch>> {
    examples
        .chunks(size.max(1))
        .map(|chunk| Batch::from_examples(chunk, mouth_only))
        .collect()
}
