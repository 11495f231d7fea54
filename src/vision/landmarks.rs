//! 68-point facial landmarks (iBUG ordering).
//!
//! | indices | region      |
//! |---------|-------------|
//! | 0–16    | jaw line    |
//! | 17–26   | eyebrows    |
//! | 27–35   | nose        |
//! | 36–47   | eyes        |
//! | 48–59   | outer lip   |
//! | 60–67   | inner lip   |

use crate::defaults::{MOUTH_POINTS, MOUTH_START, NUM_LANDMARKS};
use crate::error::{LipreadError, Result};
use crate::vision::face::FaceBox;
use image::GrayImage;
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Exactly 68 landmark points for one face in one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<[f32; 2]>", into = "Vec<[f32; 2]>")]
pub struct Landmarks {
    points: Vec<Point>,
}

impl Landmarks {
    pub fn new(points: Vec<Point>) -> Result<Self> {
        if points.len() != NUM_LANDMARKS {
            return Err(LipreadError::LandmarkCount {
                expected: NUM_LANDMARKS,
                actual: points.len(),
            });
        }
        Ok(Self { points })
    }

    /// Build from a flat `[x0, y0, x1, y1, ...]` slice.
    pub fn from_flat(coords: &[f32]) -> Result<Self> {
        if coords.len() != NUM_LANDMARKS * 2 {
            return Err(LipreadError::LandmarkCount {
                expected: NUM_LANDMARKS,
                actual: coords.len() / 2,
            });
        }
        Self::new(
            coords
                .chunks_exact(2)
                .map(|c| Point::new(c[0], c[1]))
                .collect(),
        )
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// The 20 lip points (outer then inner contour).
    pub fn mouth(&self) -> &[Point] {
        &self.points[MOUTH_START..MOUTH_START + MOUTH_POINTS]
    }

    /// Express points relative to `face`, so the box spans the unit square.
    pub fn normalized(&self, face: &FaceBox) -> Landmarks {
        let w = if face.width > 0.0 { face.width } else { 1.0 };
        let h = if face.height > 0.0 { face.height } else { 1.0 };
        Landmarks {
            points: self
                .points
                .iter()
                .map(|p| Point::new((p.x - face.x) / w, (p.y - face.y) / h))
                .collect(),
        }
    }

    /// Map unit-square points back into `face` pixel coordinates.
    pub fn denormalized(&self, face: &FaceBox) -> Landmarks {
        Landmarks {
            points: self
                .points
                .iter()
                .map(|p| Point::new(face.x + p.x * face.width, face.y + p.y * face.height))
                .collect(),
        }
    }

    /// Flattened feature vector: all 136 coordinates, or the 40 mouth coordinates.
    pub fn features(&self, mouth_only: bool) -> Vec<f32> {
        let points = if mouth_only {
            self.mouth()
        } else {
            &self.points[..]
        };
        points.iter().flat_map(|p| [p.x, p.y]).collect()
    }

    /// Length of [`Landmarks::features`] for the given selection.
    pub fn feature_dim(mouth_only: bool) -> usize {
        if mouth_only {
            MOUTH_POINTS * 2
        } else {
            NUM_LANDMARKS * 2
        }
    }

    /// Vertical lip opening: mean distance between the inner lip pairs.
    pub fn mouth_opening(&self) -> f32 {
        // inner upper 61..=63 pairs with inner lower 67..=65
        let pairs = [(61, 67), (62, 66), (63, 65)];
        pairs
            .iter()
            .map(|&(a, b)| (self.points[b].y - self.points[a].y).abs())
            .sum::<f32>()
            / pairs.len() as f32
    }
}

impl TryFrom<Vec<[f32; 2]>> for Landmarks {
    type Error = LipreadError;

    fn try_from(raw: Vec<[f32; 2]>) -> Result<Self> {
        Landmarks::new(raw.into_iter().map(|[x, y]| Point::new(x, y)).collect())
    }
}

impl From<Landmarks> for Vec<[f32; 2]> {
    fn from(landmarks: Landmarks) -> Self {
        landmarks.points.into_iter().map(|p| [p.x, p.y]).collect()
    }
}

/// Canonical 68-point face in unit coordinates (the face box is `[0, 1]²`).
pub fn mean_shape() -> Landmarks {
    let mut points = Vec::with_capacity(NUM_LANDMARKS);

    // jaw: lower half ellipse from the left temple to the right temple
    for i in 0..17 {
        let t = PI * i as f32 / 16.0;
        points.push(Point::new(0.5 - 0.5 * t.cos(), 0.3 + 0.62 * t.sin()));
    }
    // eyebrows: shallow arches
    for (start, end) in [(0.12, 0.42), (0.58, 0.88)] {
        for i in 0..5 {
            let f = i as f32 / 4.0;
            points.push(Point::new(start + (end - start) * f, 0.2 - 0.05 * (PI * f).sin()));
        }
    }
    // nose bridge
    for i in 0..4 {
        points.push(Point::new(0.5, 0.3 + 0.08 * i as f32));
    }
    // nostrils
    for i in 0..5 {
        let f = i as f32 / 4.0;
        points.push(Point::new(0.4 + 0.2 * f, 0.6 + 0.02 * (PI * f).sin()));
    }
    // eyes: six points around each ellipse, starting at the outer corner
    for (cx, mirror) in [(0.3f32, 1.0f32), (0.7, -1.0)] {
        for i in 0..6 {
            let t = PI * i as f32 / 3.0;
            let x = cx - mirror * 0.08 * t.cos();
            points.push(Point::new(x, 0.35 - 0.03 * t.sin()));
        }
    }
    // outer lip: 12 points clockwise from the left corner
    for i in 0..12 {
        let t = PI - 2.0 * PI * i as f32 / 12.0;
        points.push(Point::new(0.5 + 0.17 * t.cos(), 0.78 - 0.07 * t.sin()));
    }
    // inner lip: 8 points clockwise from the left corner
    for i in 0..8 {
        let t = PI - 2.0 * PI * i as f32 / 8.0;
        points.push(Point::new(0.5 + 0.12 * t.cos(), 0.78 - 0.03 * t.sin()));
    }

    Landmarks { points }
}

/// Predicts landmarks for a face found in a grayscale frame.
pub trait LandmarkPredictor: Send + Sync {
    fn predict(&self, frame: &GrayImage, face: &FaceBox) -> Result<Landmarks>;

    /// Name for logging.
    fn name(&self) -> &str;
}

/// Places the canonical mean shape inside the detected box.
///
/// Carries no appearance information; useful as a baseline and for
/// pipelines whose landmarks come precomputed.
#[derive(Debug, Clone)]
pub struct MeanShapePredictor {
    shape: Landmarks,
}

impl MeanShapePredictor {
    pub fn new() -> Self {
        Self {
            shape: mean_shape(),
        }
    }
}

impl Default for MeanShapePredictor {
    fn default() -> Self {
        Self::new()
    }
}

impl LandmarkPredictor for MeanShapePredictor {
    fn predict(&self, _frame: &GrayImage, face: &FaceBox) -> Result<Landmarks> {
        Ok(self.shape.denormalized(face))
    }

    fn name(&self) -> &str {
        "mean-shape"
    }
}
