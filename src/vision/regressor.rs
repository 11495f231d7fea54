//! Learned landmark regressor running on candle.
//!
//! A two-layer MLP over a 64×64 grayscale face crop predicts per-point
//! offsets from the mean shape in face-box units.

use crate::defaults::{LANDMARK_CROP_SIZE, NUM_LANDMARKS};
use crate::error::{LipreadError, Result};
use crate::vision::face::FaceBox;
use crate::vision::landmarks::{LandmarkPredictor, Landmarks, mean_shape};
use candle_core::{DType, Device, Module, Tensor};
use candle_nn::{Linear, VarBuilder, linear};
use image::GrayImage;
use image::imageops::{self, FilterType};
use std::path::Path;

const HIDDEN: usize = 256;

pub struct CandleLandmarkPredictor {
    fc1: Linear,
    fc2: Linear,
    mean: Vec<f32>,
    device: Device,
}

impl CandleLandmarkPredictor {
    /// Load regressor weights (`fc1.*`, `fc2.*`) from a safetensors file.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(LipreadError::VisionModelNotFound {
                path: path.display().to_string(),
            });
        }
        let device = Device::Cpu;
        let tensors = candle_core::safetensors::load(path, &device)?;
        let vb = VarBuilder::from_tensors(tensors, DType::F32, &device);
        tracing::debug!(path = %path.display(), "loaded landmark regressor");
        Self::from_var_builder(vb, device)
    }

    pub fn from_var_builder(vb: VarBuilder, device: Device) -> Result<Self> {
        let input = LANDMARK_CROP_SIZE * LANDMARK_CROP_SIZE;
        let fc1 = linear(input, HIDDEN, vb.pp("fc1"))?;
        let fc2 = linear(HIDDEN, NUM_LANDMARKS * 2, vb.pp("fc2"))?;
        Ok(Self {
            fc1,
            fc2,
            mean: mean_shape().features(false),
            device,
        })
    }

    /// Crop the face, resize to the network input and scale pixels to `[0, 1]`.
    fn crop_input(&self, frame: &GrayImage, face: &FaceBox) -> Result<Tensor> {
        let clamped = face.clamp_to(frame.width(), frame.height());
        if clamped.width < 1.0 || clamped.height < 1.0 {
            return Err(LipreadError::NoFace {
                source_name: "face box outside frame".to_string(),
            });
        }
        let crop = imageops::crop_imm(
            frame,
            clamped.x as u32,
            clamped.y as u32,
            clamped.width as u32,
            clamped.height as u32,
        )
        .to_image();
        let size = LANDMARK_CROP_SIZE as u32;
        let resized = imageops::resize(&crop, size, size, FilterType::Triangle);
        let pixels: Vec<f32> = resized.as_raw().iter().map(|&p| p as f32 / 255.0).collect();
        Ok(Tensor::from_vec(
            pixels,
            (1, LANDMARK_CROP_SIZE * LANDMARK_CROP_SIZE),
            &self.device,
        )?)
    }
}

impl LandmarkPredictor for CandleLandmarkPredictor {
    fn predict(&self, frame: &GrayImage, face: &FaceBox) -> Result<Landmarks> {
        let input = self.crop_input(frame, face)?;
        let hidden = self.fc1.forward(&input)?.relu()?;
        let offsets: Vec<f32> = self.fc2.forward(&hidden)?.squeeze(0)?.to_vec1()?;
        let coords: Vec<f32> = self
            .mean
            .iter()
            .zip(offsets.iter())
            .map(|(m, d)| m + d)
            .collect();
        Ok(Landmarks::from_flat(&coords)?.denormalized(face))
    }

    fn name(&self) -> &str {
        "regressor"
    }
}
