//! gesture_pilot_core - Pure control logic for gesture-driven flight
//!
//! This crate contains the platform-agnostic parts of the gesture pilot:
//! everything between a detected hand and a flight command. Camera capture,
//! rendering and the vendor flight SDK are injected through traits so the
//! whole pipeline can be tested on host with mocks.
//!
//! # Modules
//!
//! - [`traits`]: Time abstraction (`TimeSource`, `MonotonicClock`, `MockTime`)
//! - [`landmark`]: Landmark frames and the translation/scale normalizer
//! - [`gesture`]: Gesture identifiers, the class table and classifier adapter
//! - [`flight`]: Flight commands, state and the flight state machine
//! - [`link`]: `DroneLink` capability trait and a recording mock
//! - [`config`]: Flight configuration
//! - [`error`]: Error types shared by the crates of the workspace

pub mod config;
pub mod error;
pub mod flight;
pub mod gesture;
pub mod landmark;
pub mod link;
pub mod traits;

pub use config::FlightConfig;
pub use error::{ClassifierError, LandmarkError, LinkError};
pub use flight::{
    Command, FlightEvent, FlightPhase, FlightState, FlightStateMachine, FlipDirection,
    MovementFrame, Outcome, SkipReason, Velocity,
};
pub use gesture::{Classification, GestureClassifier, GestureId, GestureTable, KeypointModel};
pub use landmark::{normalize, BoundingRect, FeatureVector, LandmarkFrame, Normalized, PixelPoint};
pub use link::DroneLink;
pub use traits::{MockTime, MonotonicClock, TimeSource};
