//! Landmark frame types

use serde::{Deserialize, Serialize};

use crate::error::LandmarkError;

/// A landmark position in image pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PixelPoint {
    pub x: i32,
    pub y: i32,
}

impl PixelPoint {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl From<(i32, i32)> for PixelPoint {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle enclosing a hand, inclusive of both corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingRect {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

impl BoundingRect {
    pub fn width(&self) -> i32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> i32 {
        self.y1 - self.y0
    }
}

/// Ordered landmark points for one detected hand.
///
/// Point 0 is the reference point (the wrist for hand models). A frame always
/// holds at least one point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LandmarkFrame {
    points: Vec<PixelPoint>,
}

impl LandmarkFrame {
    /// Build a frame from pixel points.
    pub fn new(points: Vec<PixelPoint>) -> Result<Self, LandmarkError> {
        if points.is_empty() {
            return Err(LandmarkError::Empty);
        }
        Ok(Self { points })
    }

    /// Build a frame from image-relative coordinates in `[0, 1]`.
    ///
    /// Coordinates are scaled to pixels, truncated, and clamped to the last
    /// valid row/column so points on the image edge stay inside the image.
    pub fn from_relative(
        landmarks: &[(f32, f32)],
        width: u32,
        height: u32,
    ) -> Result<Self, LandmarkError> {
        let max_x = width.saturating_sub(1) as i32;
        let max_y = height.saturating_sub(1) as i32;
        let points = landmarks
            .iter()
            .map(|&(x, y)| {
                PixelPoint::new(
                    ((x * width as f32) as i32).min(max_x),
                    ((y * height as f32) as i32).min(max_y),
                )
            })
            .collect();
        Self::new(points)
    }

    /// Verify the frame has the landmark count a model expects.
    pub fn check_len(&self, expected: usize) -> Result<(), LandmarkError> {
        if self.points.len() != expected {
            return Err(LandmarkError::LengthMismatch {
                expected,
                actual: self.points.len(),
            });
        }
        Ok(())
    }

    pub fn points(&self) -> &[PixelPoint] {
        &self.points
    }

    /// Reference point (index 0).
    pub fn origin(&self) -> PixelPoint {
        self.points[0]
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Smallest rectangle containing every landmark.
    pub fn bounding_rect(&self) -> BoundingRect {
        let first = self.origin();
        self.points.iter().fold(
            BoundingRect {
                x0: first.x,
                y0: first.y,
                x1: first.x,
                y1: first.y,
            },
            |rect, p| BoundingRect {
                x0: rect.x0.min(p.x),
                y0: rect.y0.min(p.y),
                x1: rect.x1.max(p.x),
                y1: rect.y1.max(p.y),
            },
        )
    }
}
