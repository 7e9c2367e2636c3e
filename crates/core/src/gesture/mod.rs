//! Gesture identifiers and classification
//!
//! - [`GestureId`]: the semantic gestures the pilot understands
//! - [`GestureTable`]: configurable mapping from classifier class ids
//! - [`GestureClassifier`]: adapter around an external [`KeypointModel`]

mod classifier;
mod table;

pub use classifier::{Classification, GestureClassifier, KeypointModel};
pub use table::{GestureEntry, GestureTable};

use serde::{Deserialize, Serialize};

use crate::flight::FlightEvent;

/// Semantic hand gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GestureId {
    /// Open palm
    Open,
    /// Closed fist
    Closed,
    /// Index finger pointing
    Pointing,
    /// Thumb and index circle
    Ok,
    /// Index and middle fingers raised
    PeaceSign,
    /// Middle finger raised
    Flip,
    /// Thumb and little finger extended
    Shaka,
}

impl GestureId {
    pub const ALL: [GestureId; 7] = [
        GestureId::Open,
        GestureId::Closed,
        GestureId::Pointing,
        GestureId::Ok,
        GestureId::PeaceSign,
        GestureId::Flip,
        GestureId::Shaka,
    ];

    /// Flight event this gesture requests.
    pub fn event(self) -> FlightEvent {
        match self {
            GestureId::Open => FlightEvent::TakeoffOrAscend,
            GestureId::Closed => FlightEvent::DescendOrLand,
            GestureId::Pointing => FlightEvent::MoveForward,
            GestureId::Ok => FlightEvent::MoveBackward,
            GestureId::PeaceSign => FlightEvent::RotateCw,
            GestureId::Flip => FlightEvent::Flip,
            GestureId::Shaka => FlightEvent::RotateCcw,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GestureId::Open => "open",
            GestureId::Closed => "closed",
            GestureId::Pointing => "pointing",
            GestureId::Ok => "ok",
            GestureId::PeaceSign => "peace_sign",
            GestureId::Flip => "flip",
            GestureId::Shaka => "shaka",
        }
    }
}

impl core::fmt::Display for GestureId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
