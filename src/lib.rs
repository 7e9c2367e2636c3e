//! gesture_pilot - Hand-gesture flight control
//!
//! Application layer on top of `gesture_pilot_core`: frame acquisition, the
//! control loop, operator controls and the training workflow.
//!
//! # Modules
//!
//! - [`frame_source`]: Latest-frame acquisition thread
//! - [`control_loop`]: Sample → detect → normalize → classify → dispatch
//! - [`input`]: Key bindings and key sources
//! - [`feedback`]: Operator overlay
//! - [`training_log`]: Labeled sample recording
//! - [`model`]: Nearest-sample keypoint model
//! - [`replay`]: Recorded landmark streams
//! - [`config`]: TOML configuration

pub mod config;
pub mod control_loop;
pub mod error;
pub mod feedback;
pub mod frame_source;
pub mod input;
pub mod model;
pub mod replay;
pub mod training_log;

pub use config::{AppConfig, ControlConfig, FrameSourceConfig};
pub use control_loop::{ControlLoop, ExitReason, HandDetector, RunSummary};
pub use error::{CaptureError, PilotError};
pub use feedback::{FeedbackSink, LogFeedback, Overlay};
pub use frame_source::{FrameCapture, FrameSource, Snapshot, StreamStatus};
pub use input::{ControlInput, KeySource, ScriptedKeys, StdinKeys};
pub use model::NearestSampleModel;
pub use replay::{ReplayCapture, ReplayDetector, ReplayFrame};
pub use training_log::TrainingLog;
