//! Error types for lipread.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LipreadError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Flag file errors
    #[error("Flag file not found: {path}")]
    FlagFileNotFound { path: String },

    #[error("Flag file {path} includes itself")]
    FlagFileCycle { path: String },

    // Workspace errors
    #[error("Workspace error: {message}")]
    Workspace { message: String },

    // Video errors
    #[error("Video tool not found: {tool}")]
    VideoToolNotFound { tool: String },

    #[error("Frame extraction failed: {message}")]
    FrameExtraction { message: String },

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    // Vision errors
    #[error("No face found in {source_name}")]
    NoFace { source_name: String },

    #[error("Expected {expected} landmarks, got {actual}")]
    LandmarkCount { expected: usize, actual: usize },

    #[error("Vision model not found at {path}")]
    VisionModelNotFound { path: String },

    // Sequence model errors
    #[error("Model weights not found at {path}")]
    ModelNotFound { path: String },

    #[error("Invalid model configuration: {message}")]
    ModelConfig { message: String },

    #[error("Model error: {0}")]
    Candle(#[from] candle_core::Error),

    // Dataview errors
    #[error("Dataview error: {message}")]
    Dataview { message: String },

    #[error("Dataview format error: {0}")]
    DataviewFormat(#[from] serde_json::Error),

    // Correction errors
    #[error("Correction failed: {message}")]
    Correction { message: String },

    #[error("Download failed: {message}")]
    Download { message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, LipreadError>;
