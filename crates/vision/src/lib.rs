//! Frame attention classification
//!
//! Turns a single webcam snapshot into a raw attentiveness score in [0, 1]:
//! - Face region detection (frontal, with profile fallback)
//! - Eye region detection within the face
//! - Iris-position scoring per eye (darkest-blob centroid vs. eye center)
//!
//! At the `FrameClassifier` seam, decode failures and detection misses are
//! terminal classification outcomes (score 0). `AttentionClassifier` also
//! exposes a fallible path that surfaces decode errors as `VisionError`.

pub mod classifier;
pub mod config;
pub mod detector;
pub mod iris;

pub use classifier::AttentionClassifier;
pub use config::VisionConfig;
pub use detector::{EyeRegionDetector, FrontalFaceDetector, ProfileFaceDetector, Region, RegionDetector};
pub use iris::iris_score;

use thiserror::Error;

/// Vision pipeline error types
#[derive(Debug, Error)]
pub enum VisionError {
    #[error("Image decoding failed: {0}")]
    Decode(#[from] image::ImageError),
}

/// Reduces one encoded snapshot to a raw attentiveness score in [0, 1].
///
/// Implementations must be pure with respect to their input and absorb all
/// internal failures: undecodable bytes and detection misses both map to 0.0.
pub trait FrameClassifier: Send + Sync {
    fn classify(&self, image_bytes: &[u8]) -> f32;
}
