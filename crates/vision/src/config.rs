//! Vision configuration

use serde::{Deserialize, Serialize};

/// Classifier configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisionConfig {
    /// Gaussian blur sigma applied to eye patches before thresholding
    /// (~7x7 kernel equivalent)
    pub eye_blur_sigma: f32,

    /// Inverse-binary intensity cutoff isolating the iris/pupil blob
    pub pupil_threshold: u8,

    /// Minimum intensity variance for the frontal detector to report a face
    pub frontal_variance_floor: f32,

    /// Minimum intensity variance for the profile fallback detector
    pub profile_variance_floor: f32,

    /// Minimum image edge (pixels) below which no detection is attempted
    pub min_image_edge: u32,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            eye_blur_sigma: 1.1,
            pupil_threshold: 50,
            frontal_variance_floor: 150.0,
            profile_variance_floor: 40.0,
            min_image_edge: 24,
        }
    }
}
