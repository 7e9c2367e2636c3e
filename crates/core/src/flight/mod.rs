//! Flight commands, state and the gesture flight state machine
//!
//! # Contents
//!
//! - [`Command`]: the commands a [`DroneLink`](crate::link::DroneLink) executes
//! - [`FlightState`]: phase plus altitude/yaw estimates and cooldown timestamp
//! - [`FlightStateMachine`]: event → command translation with safety gating

mod command;
mod cooldown;
mod machine;
mod state;

pub use command::{Command, FlipDirection, MovementFrame, Velocity};
pub use cooldown::Cooldown;
pub use machine::{FlightStateMachine, Outcome, SkipReason};
pub use state::{FlightEvent, FlightPhase, FlightState};
