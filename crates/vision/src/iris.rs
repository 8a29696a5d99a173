//! Iris-position scoring
//!
//! Approximates "looking at camera" as pupil-centered: the darkest contiguous
//! blob in a blurred eye patch stands in for the iris/pupil, and its centroid's
//! horizontal offset from the eye midpoint drives the score.

use std::collections::HashMap;

use image::{GrayImage, Luma};
use imageproc::filter::gaussian_blur_f32;
use imageproc::region_labelling::{connected_components, Connectivity};

/// Score for a normalized horizontal pupil position in [0, 1].
///
/// Peaks at 1.0 for a centered pupil (0.5) and falls linearly to 0.0 at
/// either edge.
pub fn horizontal_score(norm_pos: f32) -> f32 {
    (1.0 - 2.0 * (norm_pos - 0.5).abs()).clamp(0.0, 1.0)
}

/// Scores one grayscale eye patch, or `None` when no usable blob exists.
///
/// Pipeline: Gaussian blur to suppress noise, inverse-binary threshold at
/// `pupil_threshold` to isolate dark pixels, largest connected component,
/// centroid (moment m10/m00 over the filled blob). A zero-area mask yields
/// `None`, contributing no score.
pub fn iris_score(eye: &GrayImage, blur_sigma: f32, pupil_threshold: u8) -> Option<f32> {
    let (width, height) = eye.dimensions();
    if width == 0 || height == 0 {
        return None;
    }

    let blurred = gaussian_blur_f32(eye, blur_sigma);
    let mask = GrayImage::from_fn(width, height, |x, y| {
        if blurred.get_pixel(x, y).0[0] <= pupil_threshold {
            Luma([255u8])
        } else {
            Luma([0u8])
        }
    });

    let labels = connected_components(&mask, Connectivity::Eight, Luma([0u8]));

    // Per-blob area and x-moment; label 0 is background
    let mut blobs: HashMap<u32, (u64, u64)> = HashMap::new();
    for (x, _y, p) in labels.enumerate_pixels() {
        let label = p.0[0];
        if label == 0 {
            continue;
        }
        let entry = blobs.entry(label).or_insert((0, 0));
        entry.0 += 1;
        entry.1 += x as u64;
    }

    let (area, sum_x) = blobs.values().max_by_key(|(area, _)| *area).copied()?;
    if area == 0 {
        return None;
    }

    let centroid_x = sum_x as f32 / area as f32;
    let norm_pos = centroid_x / width as f32;
    Some(horizontal_score(norm_pos))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    /// Bright eye patch with a dark square blob centered at (cx, h/2)
    fn eye_with_pupil(width: u32, height: u32, cx: u32) -> GrayImage {
        GrayImage::from_fn(width, height, |x, y| {
            let dx = (x as i64 - cx as i64).abs();
            let dy = (y as i64 - (height / 2) as i64).abs();
            if dx <= 2 && dy <= 2 {
                Luma([0])
            } else {
                Luma([200])
            }
        })
    }

    #[test]
    fn centered_pupil_scores_one() {
        let eye = eye_with_pupil(40, 20, 20);
        let score = iris_score(&eye, 1.1, 50).expect("blob expected");
        assert!((score - 1.0).abs() < 1e-3, "score = {score}");
    }

    #[test]
    fn edge_pupil_scores_near_zero() {
        let eye = eye_with_pupil(40, 20, 1);
        let score = iris_score(&eye, 1.1, 50).expect("blob expected");
        assert!(score < 0.2, "score = {score}");
    }

    #[test]
    fn score_increases_toward_center() {
        let positions = [4u32, 10, 16, 20];
        let mut last = -1.0f32;
        for cx in positions {
            let eye = eye_with_pupil(40, 20, cx);
            let score = iris_score(&eye, 1.1, 50).expect("blob expected");
            assert!(score > last, "score {score} at cx {cx} not above {last}");
            last = score;
        }
    }

    #[test]
    fn blank_eye_has_no_score() {
        let eye = GrayImage::from_pixel(40, 20, Luma([200]));
        assert!(iris_score(&eye, 1.1, 50).is_none());
    }

    #[test]
    fn largest_blob_wins() {
        // Big blob near the left edge, single dark pixel on the right
        let eye = GrayImage::from_fn(60, 20, |x, y| {
            let in_big = (4..=12).contains(&x) && (6..=14).contains(&y);
            let in_small = x == 55 && y == 10;
            if in_big || in_small {
                Luma([0])
            } else {
                Luma([200])
            }
        });
        let score = iris_score(&eye, 1.1, 50).expect("blob expected");
        // Centroid tracks the big left blob, so the score stays low
        assert!(score < 0.4, "score = {score}");
    }

    proptest! {
        #[test]
        fn horizontal_score_bounds(pos in -1.0f32..2.0) {
            let s = horizontal_score(pos);
            prop_assert!((0.0..=1.0).contains(&s));
        }

        #[test]
        fn horizontal_score_symmetric(offset in 0.0f32..0.5) {
            let left = horizontal_score(0.5 - offset);
            let right = horizontal_score(0.5 + offset);
            prop_assert!((left - right).abs() < 1e-6);
        }
    }
}
