//! Landmark normalization
//!
//! Algorithm:
//!
//! 1. Translate every point so point 0 sits at the origin.
//! 2. Take the largest absolute coordinate over all translated points.
//! 3. Divide every coordinate by it, giving values in `[-1, 1]`.
//! 4. Flatten in point order: `x0, y0, x1, y1, ...`.
//!
//! When every point coincides with point 0 the largest coordinate is zero.
//! The result is then an all-zero vector marked `degenerate` so the caller
//! can decide to skip it.

use super::LandmarkFrame;

/// Flattened, normalized landmark coordinates (length `2 * N`).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FeatureVector(Vec<f32>);

impl FeatureVector {
    pub fn new(values: Vec<f32>) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &f32> {
        self.0.iter()
    }

    pub fn into_inner(self) -> Vec<f32> {
        self.0
    }
}

impl From<Vec<f32>> for FeatureVector {
    fn from(values: Vec<f32>) -> Self {
        Self(values)
    }
}

/// Result of normalizing one landmark frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub features: FeatureVector,
    /// All points coincided with the reference point.
    pub degenerate: bool,
}

/// Convert a landmark frame into a translation- and scale-invariant
/// feature vector.
pub fn normalize(frame: &LandmarkFrame) -> Normalized {
    let origin = frame.origin();

    // i64 keeps the subtraction exact for any pair of i32 coordinates
    let translated: Vec<i64> = frame
        .points()
        .iter()
        .flat_map(|p| {
            [
                p.x as i64 - origin.x as i64,
                p.y as i64 - origin.y as i64,
            ]
        })
        .collect();

    let max_abs = translated.iter().map(|v| v.abs()).max().unwrap_or(0);
    if max_abs == 0 {
        return Normalized {
            features: FeatureVector(vec![0.0; translated.len()]),
            degenerate: true,
        };
    }

    let scale = max_abs as f64;
    let features = translated
        .into_iter()
        .map(|v| (v as f64 / scale) as f32)
        .collect();

    Normalized {
        features: FeatureVector(features),
        degenerate: false,
    }
}
