//! Dataviews: preprocessed, framework-ready landmark sequences.
//!
//! Each raw clip becomes one JSON [`Example`] under `datasets/<tier>/`.

pub mod batch;
pub mod builder;
pub mod example;
pub mod raw;
pub mod store;

pub use batch::{Batch, batches};
pub use builder::{BuildSummary, DataviewBuilder};
pub use example::Example;
pub use raw::{RawClip, discover_clips};
pub use store::{TierStats, example_files, load_tier, tier_stats};
