use crate::error::{LipreadError, Result};
use crate::vision::{FaceBox, Landmarks, TrackedFrame};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One preprocessed clip: per-frame face boxes and landmarks plus its transcript.
///
/// Landmarks are stored in pixel coordinates; [`Example::features`]
/// normalizes them against the frame's face box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Example {
    pub id: String,
    pub transcript: String,
    pub fps: u32,
    pub faces: Vec<FaceBox>,
    pub landmarks: Vec<Landmarks>,
}

impl Example {
    pub fn from_tracked(
        id: impl Into<String>,
        transcript: impl Into<String>,
        fps: u32,
        tracked: Vec<TrackedFrame>,
    ) -> Self {
        let (faces, landmarks) = tracked.into_iter().map(|t| (t.face, t.landmarks)).unzip();
        Self {
            id: id.into(),
            transcript: transcript.into(),
            fps,
            faces,
            landmarks,
        }
    }

    pub fn num_frames(&self) -> usize {
        self.landmarks.len()
    }

    /// Frame-major feature matrix, one normalized row per frame.
    pub fn features(&self, mouth_only: bool) -> Vec<Vec<f32>> {
        self.landmarks
            .iter()
            .zip(&self.faces)
            .map(|(l, face)| l.normalized(face).features(mouth_only))
            .collect()
    }

    fn validate(&self) -> Result<()> {
        if self.faces.len() != self.landmarks.len() {
            return Err(LipreadError::Dataview {
                message: format!(
                    "example {} has {} face boxes for {} landmark frames",
                    self.id,
                    self.faces.len(),
                    self.landmarks.len()
                ),
            });
        }
        Ok(())
    }

    /// File name of this example inside a tier directory.
    pub fn file_name(&self) -> String {
        format!("{}.json", self.id.replace(['/', '\\'], "_"))
    }

    /// Write as pretty JSON into `dir`, returning the file path.
    pub fn save(&self, dir: &Path) -> Result<PathBuf> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(self.file_name());
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json)?;
        Ok(path)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let example: Example = serde_json::from_str(&contents)?;
        example.validate()?;
        Ok(example)
    }
}
