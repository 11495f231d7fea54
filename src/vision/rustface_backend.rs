use crate::error::{LipreadError, Result};
use crate::vision::face::{FaceBox, FaceDetector};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Face detector backed by the `rustface` crate (SeetaFace engine).
///
/// The SeetaFace frontal model lives in the workspace `weights/` directory.
pub struct RustfaceDetector {
    model: rustface::Model,
    min_face_size: u32,
}

impl RustfaceDetector {
    /// Load the SeetaFace model from `path`.
    pub fn from_file(path: &Path, min_face_size: u32) -> Result<Self> {
        if !path.is_file() {
            return Err(LipreadError::VisionModelNotFound {
                path: path.display().to_string(),
            });
        }
        let reader = BufReader::new(File::open(path)?);
        let model = rustface::read_model(reader).map_err(|e| LipreadError::Other(format!(
            "Load SeetaFace model {}: {e}",
            path.display()
        )))?;
        tracing::debug!(path = %path.display(), "loaded face detection model");
        Ok(Self {
            model,
            min_face_size,
        })
    }
}

impl FaceDetector for RustfaceDetector {
    fn detect(&self, gray: &[u8], width: u32, height: u32) -> Vec<FaceBox> {
        let mut detector = rustface::create_detector_with_model(self.model.clone());
        detector.set_min_face_size(self.min_face_size);
        detector.set_score_thresh(2.0);
        detector.set_pyramid_scale_factor(0.8);
        detector.set_slide_window_step(4, 4);

        let faces = detector.detect(&rustface::ImageData::new(gray, width, height));

        faces
            .iter()
            .map(|face| {
                let bbox = face.bbox();
                FaceBox {
                    x: bbox.x() as f32,
                    y: bbox.y() as f32,
                    width: bbox.width() as f32,
                    height: bbox.height() as f32,
                    confidence: face.score() as f32,
                }
            })
            .collect()
    }
}
