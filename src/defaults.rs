//! Default configuration constants for lipread.
//!
//! Shared by the config types, the CLI and the pipeline so every entry point
//! agrees on the same values.

/// Number of facial landmarks produced per face per frame (iBUG 68-point scheme).
pub const NUM_LANDMARKS: usize = 68;

/// Coordinates per landmark.
pub const LANDMARK_DIM: usize = 2;

/// First landmark index of the mouth region (outer lip starts here).
pub const MOUTH_START: usize = 48;

/// Number of mouth landmarks (outer and inner lip).
pub const MOUTH_POINTS: usize = 20;

/// Environment variable naming the workspace root.
pub const ROOT_ENV: &str = "LIPREAD_ROOT";

/// Default frame rate used when extracting frames from a video.
///
/// 25 fps matches the GRID and LRS corpora most lip-reading models are trained on.
pub const FRAME_RATE: u32 = 25;

/// Filename of the SeetaFace frontal detection model inside `weights/`.
pub const FACE_MODEL_FILE: &str = "seeta_fd_frontal_v1.0.bin";

/// Filename of the landmark regressor weights inside `weights/`.
pub const LANDMARK_MODEL_FILE: &str = "landmarks.safetensors";

/// Filename of the sequence model weights inside `weights/`.
pub const LIPREADER_MODEL_FILE: &str = "lipreader.safetensors";

/// Side length of the square grayscale face crop fed to the landmark regressor.
pub const LANDMARK_CROP_SIZE: usize = 64;

/// Minimum face size in pixels for the face detector.
pub const MIN_FACE_SIZE: u32 = 20;

/// Default recurrent hidden size of the video encoder.
pub const HIDDEN_SIZE: usize = 256;

/// Default character embedding size of the attention decoder.
pub const CHAR_DIM: usize = 64;

/// Default CTC beam width.
pub const BEAM_WIDTH: usize = 8;

/// Upper bound on characters produced by the attention decoder.
pub const MAX_DECODE_CHARS: usize = 128;

/// Characters the default vocabulary covers, besides the special tokens.
pub const DEFAULT_ALPHABET: &str = " abcdefghijklmnopqrstuvwxyz'";

/// Frame channel buffer for the pipeline.
pub const FRAME_BUFFER: usize = 64;

/// Buffer between the sequence stations (one item per clip).
pub const CLIP_BUFFER: usize = 4;
