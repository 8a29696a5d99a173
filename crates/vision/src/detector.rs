//! Face and eye region detection
//!
//! The pretrained cascade detectors of the reference pipeline are an opaque
//! external capability. `RegionDetector` is the seam; the shipped
//! implementations are deterministic geometry-prior detectors that gate on
//! image contrast, so the pipeline runs without model artifacts and tests can
//! stub the seam.

use image::GrayImage;
use serde::{Deserialize, Serialize};

use crate::VisionConfig;

/// Axis-aligned detection rectangle in pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self { x, y, width, height }
    }

    /// Center of the region along the x axis
    pub fn center_x(&self) -> u32 {
        self.x + self.width / 2
    }

    /// Center of the region along the y axis
    pub fn center_y(&self) -> u32 {
        self.y + self.height / 2
    }
}

/// Locates regions of interest in a grayscale image.
///
/// Returns rectangles in detector output order; callers that only want one
/// region take the first, with no ranking applied.
pub trait RegionDetector: Send + Sync {
    fn detect(&self, image: &GrayImage) -> Vec<Region>;
}

/// Mean and variance of pixel intensities
fn intensity_stats(image: &GrayImage) -> (f32, f32) {
    let n = (image.width() * image.height()) as f32;
    if n == 0.0 {
        return (0.0, 0.0);
    }
    let mut sum = 0.0f64;
    let mut sum_sq = 0.0f64;
    for p in image.pixels() {
        let v = p.0[0] as f64;
        sum += v;
        sum_sq += v * v;
    }
    let mean = sum / n as f64;
    let var = (sum_sq / n as f64 - mean * mean).max(0.0);
    (mean as f32, var as f32)
}

/// Frontal face detector: reports a single centered face window when the
/// frame carries enough contrast to plausibly contain one.
pub struct FrontalFaceDetector {
    variance_floor: f32,
    min_image_edge: u32,
    /// Fraction of each edge excluded from the face window
    margin: f32,
}

impl FrontalFaceDetector {
    pub fn new(config: &VisionConfig) -> Self {
        Self {
            variance_floor: config.frontal_variance_floor,
            min_image_edge: config.min_image_edge,
            margin: 0.125,
        }
    }
}

impl RegionDetector for FrontalFaceDetector {
    fn detect(&self, image: &GrayImage) -> Vec<Region> {
        let (w, h) = image.dimensions();
        if w < self.min_image_edge || h < self.min_image_edge {
            return Vec::new();
        }
        let (_, var) = intensity_stats(image);
        if var < self.variance_floor {
            return Vec::new();
        }
        let mx = (w as f32 * self.margin) as u32;
        let my = (h as f32 * self.margin) as u32;
        vec![Region::new(mx, my, w - 2 * mx, h - 2 * my)]
    }
}

/// Profile-face fallback: same windowing with a lower contrast gate, picking
/// up partial or turned faces the frontal gate rejects.
pub struct ProfileFaceDetector {
    variance_floor: f32,
    min_image_edge: u32,
}

impl ProfileFaceDetector {
    pub fn new(config: &VisionConfig) -> Self {
        Self {
            variance_floor: config.profile_variance_floor,
            min_image_edge: config.min_image_edge,
        }
    }
}

impl RegionDetector for ProfileFaceDetector {
    fn detect(&self, image: &GrayImage) -> Vec<Region> {
        let (w, h) = image.dimensions();
        if w < self.min_image_edge || h < self.min_image_edge {
            return Vec::new();
        }
        let (_, var) = intensity_stats(image);
        if var < self.variance_floor {
            return Vec::new();
        }
        vec![Region::new(0, 0, w, h)]
    }
}

/// Eye region detector: proportional eye bands within a face window.
///
/// Input is the cropped face image; output rectangles are in face-local
/// coordinates, left eye first.
pub struct EyeRegionDetector {
    min_face_edge: u32,
}

impl EyeRegionDetector {
    pub fn new(config: &VisionConfig) -> Self {
        Self {
            min_face_edge: config.min_image_edge,
        }
    }

    fn band(w: u32, h: u32, x_start: f32, x_end: f32) -> Region {
        let x = (w as f32 * x_start) as u32;
        let width = ((w as f32 * (x_end - x_start)) as u32).max(1);
        let y = (h as f32 * 0.22) as u32;
        let height = ((h as f32 * 0.25) as u32).max(1);
        Region::new(x, y, width, height)
    }
}

impl RegionDetector for EyeRegionDetector {
    fn detect(&self, face: &GrayImage) -> Vec<Region> {
        let (w, h) = face.dimensions();
        if w < self.min_face_edge || h < self.min_face_edge {
            return Vec::new();
        }
        vec![
            Self::band(w, h, 0.12, 0.42),
            Self::band(w, h, 0.58, 0.88),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform(w: u32, h: u32, v: u8) -> GrayImage {
        GrayImage::from_pixel(w, h, image::Luma([v]))
    }

    fn checkerboard(w: u32, h: u32) -> GrayImage {
        GrayImage::from_fn(w, h, |x, y| {
            if (x + y) % 2 == 0 {
                image::Luma([200])
            } else {
                image::Luma([255])
            }
        })
    }

    #[test]
    fn flat_frame_has_no_face() {
        let cfg = VisionConfig::default();
        let img = uniform(120, 120, 128);
        assert!(FrontalFaceDetector::new(&cfg).detect(&img).is_empty());
        assert!(ProfileFaceDetector::new(&cfg).detect(&img).is_empty());
    }

    #[test]
    fn tiny_frame_has_no_face() {
        let cfg = VisionConfig::default();
        let img = checkerboard(8, 8);
        assert!(FrontalFaceDetector::new(&cfg).detect(&img).is_empty());
    }

    #[test]
    fn contrasty_frame_yields_one_centered_face() {
        let cfg = VisionConfig::default();
        let img = checkerboard(120, 120);
        let faces = FrontalFaceDetector::new(&cfg).detect(&img);
        assert_eq!(faces.len(), 1);
        let face = faces[0];
        assert!(face.x > 0 && face.y > 0);
        assert!(face.x + face.width <= 120);
        assert!(face.y + face.height <= 120);
    }

    #[test]
    fn low_contrast_frame_falls_through_to_the_profile_detector() {
        let cfg = VisionConfig::default();
        // Variance ~49: below the frontal floor, above the profile floor
        let img = GrayImage::from_fn(120, 120, |x, y| {
            if (x + y) % 2 == 0 {
                image::Luma([200])
            } else {
                image::Luma([214])
            }
        });
        assert!(FrontalFaceDetector::new(&cfg).detect(&img).is_empty());
        let faces = ProfileFaceDetector::new(&cfg).detect(&img);
        assert_eq!(faces.len(), 1);
        assert_eq!(faces[0], Region::new(0, 0, 120, 120));
    }

    #[test]
    fn eye_bands_sit_inside_face_upper_half() {
        let cfg = VisionConfig::default();
        let face = checkerboard(90, 90);
        let eyes = EyeRegionDetector::new(&cfg).detect(&face);
        assert_eq!(eyes.len(), 2);
        for eye in &eyes {
            assert!(eye.x + eye.width <= 90);
            assert!(eye.y + eye.height <= 45);
        }
        // Left band before right band, no overlap
        assert!(eyes[0].x + eyes[0].width <= eyes[1].x);
    }
}
