//! Frame attention classifier
//!
//! Orchestrates the detector seam and the iris scorer to reduce one encoded
//! snapshot to a raw score in [0, 1].

use image::imageops::crop_imm;
use image::GrayImage;
use imageproc::contrast::equalize_histogram;
use tracing::{debug, trace};

use crate::detector::{EyeRegionDetector, FrontalFaceDetector, ProfileFaceDetector, RegionDetector};
use crate::iris::iris_score;
use crate::{FrameClassifier, VisionConfig, VisionError};

/// Classifier over the full snapshot pipeline:
/// decode, grayscale + histogram equalization, face detection (frontal with
/// profile fallback), per-eye iris scoring, mean of per-eye scores.
pub struct AttentionClassifier {
    config: VisionConfig,
    frontal: Box<dyn RegionDetector>,
    profile: Box<dyn RegionDetector>,
    eyes: Box<dyn RegionDetector>,
}

impl AttentionClassifier {
    /// Create a classifier with the default geometry-prior detectors
    pub fn new(config: VisionConfig) -> Self {
        Self {
            frontal: Box::new(FrontalFaceDetector::new(&config)),
            profile: Box::new(ProfileFaceDetector::new(&config)),
            eyes: Box::new(EyeRegionDetector::new(&config)),
            config,
        }
    }

    /// Create a classifier with explicit detectors (test seam)
    pub fn with_detectors(
        config: VisionConfig,
        frontal: Box<dyn RegionDetector>,
        profile: Box<dyn RegionDetector>,
        eyes: Box<dyn RegionDetector>,
    ) -> Self {
        Self {
            config,
            frontal,
            profile,
            eyes,
        }
    }

    /// Score an already-decoded, equalized grayscale frame
    fn score_frame(&self, gray: &GrayImage) -> f32 {
        let mut faces = self.frontal.detect(gray);
        if faces.is_empty() {
            faces = self.profile.detect(gray);
        }
        // First face in detector output order only, no ranking
        let Some(face) = faces.first().copied() else {
            trace!("no face detected");
            return 0.0;
        };

        let face_img = crop_imm(gray, face.x, face.y, face.width, face.height).to_image();
        let eye_regions = self.eyes.detect(&face_img);

        let mut scores = Vec::new();
        for eye in eye_regions {
            if eye.x + eye.width > face_img.width() || eye.y + eye.height > face_img.height() {
                continue;
            }
            let patch = crop_imm(&face_img, eye.x, eye.y, eye.width, eye.height).to_image();
            if let Some(score) =
                iris_score(&patch, self.config.eye_blur_sigma, self.config.pupil_threshold)
            {
                scores.push(score);
            }
        }

        if scores.is_empty() {
            trace!("face without usable eyes");
            return 0.0;
        }
        scores.iter().sum::<f32>() / scores.len() as f32
    }

    /// Fallible classification: undecodable bytes surface as a decode error
    /// rather than the score-0 absorption the trait performs.
    pub fn try_classify(&self, image_bytes: &[u8]) -> Result<f32, VisionError> {
        let img = image::load_from_memory(image_bytes)?;
        let gray = equalize_histogram(&img.to_luma8());
        Ok(self.score_frame(&gray))
    }
}

impl FrameClassifier for AttentionClassifier {
    fn classify(&self, image_bytes: &[u8]) -> f32 {
        match self.try_classify(image_bytes) {
            Ok(score) => score,
            Err(e) => {
                debug!(error = %e, "snapshot decode failed, scoring 0");
                0.0
            }
        }
    }
}
