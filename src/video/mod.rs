//! Video → frame extraction.

pub mod frames;

pub use frames::{
    FPS_MARKER, FrameExtractor, VideoFrame, extracted_fps, list_frame_files, load_frames,
};
