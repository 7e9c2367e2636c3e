//! Hand landmarks and their normalized feature representation.
//!
//! A detector reports one [`LandmarkFrame`] per hand. Before classification
//! the frame goes through [`normalize`], which removes position and scale so
//! the same hand shape yields the same [`FeatureVector`] anywhere in the
//! image and at any distance from the camera.

mod frame;
mod normalize;

pub use frame::{BoundingRect, LandmarkFrame, PixelPoint};
pub use normalize::{normalize, FeatureVector, Normalized};
