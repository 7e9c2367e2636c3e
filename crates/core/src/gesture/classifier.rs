//! Classifier adapter
//!
//! Wraps an external keypoint model and turns its raw class id into a
//! [`Classification`]. Model failures and ids missing from the gesture table
//! both classify as `Unknown`; neither is an error for the caller.

use tracing::{debug, warn};

use super::{GestureId, GestureTable};
use crate::error::ClassifierError;
use crate::landmark::FeatureVector;

/// External gesture model: feature vector in, class id out.
pub trait KeypointModel: Send {
    fn infer(&mut self, features: &FeatureVector) -> Result<usize, ClassifierError>;
}

/// Outcome of classifying one feature vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Gesture(GestureId),
    Unknown,
}

impl Classification {
    pub fn gesture(self) -> Option<GestureId> {
        match self {
            Classification::Gesture(g) => Some(g),
            Classification::Unknown => None,
        }
    }
}

/// Adapter from a [`KeypointModel`] to semantic gestures.
pub struct GestureClassifier {
    model: Box<dyn KeypointModel>,
    table: GestureTable,
}

impl GestureClassifier {
    pub fn new(model: Box<dyn KeypointModel>, table: GestureTable) -> Self {
        Self { model, table }
    }

    pub fn classify(&mut self, features: &FeatureVector) -> Classification {
        let class_id = match self.model.infer(features) {
            Ok(id) => id,
            Err(e) => {
                warn!("Classification failed: {}", e);
                return Classification::Unknown;
            }
        };

        match self.table.lookup(class_id) {
            Some(entry) => Classification::Gesture(entry.gesture),
            None => {
                debug!("Class id {} not in gesture table", class_id);
                Classification::Unknown
            }
        }
    }

    /// Display name for an outcome, as shown in the feedback overlay.
    pub fn label(&self, classification: Classification) -> &str {
        match classification {
            Classification::Gesture(g) => self.table.name_of(g),
            Classification::Unknown => "Unknown",
        }
    }

    pub fn table(&self) -> &GestureTable {
        &self.table
    }
}
