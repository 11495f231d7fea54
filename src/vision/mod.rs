//! Face detection and 68-point landmarking.

pub mod face;
pub mod landmarks;
pub mod regressor;
pub mod rustface_backend;
pub mod tracker;

pub use face::{FaceBox, FaceDetector, primary_face};
pub use landmarks::{LandmarkPredictor, Landmarks, MeanShapePredictor, Point, mean_shape};
pub use regressor::CandleLandmarkPredictor;
pub use rustface_backend::RustfaceDetector;
pub use tracker::{FaceTracker, TrackedFrame};
