//! Vehicle link capability trait
//!
//! Each vendor SDK is wrapped in one [`DroneLink`] implementation. The flight
//! state machine only talks to this trait, so it never branches on vehicle
//! type.

pub mod mock;

use std::time::Duration;

use async_trait::async_trait;

pub use mock::{LinkCall, RecordingLink};

use crate::error::LinkError;
use crate::flight::{FlipDirection, MovementFrame, Velocity};

/// Capability interface to a physical or simulated vehicle.
///
/// Every call completes only once the vehicle has finished (or rejected) the
/// command, so the caller never has two commands in flight. Timeouts are the
/// backend's responsibility and are passed in where the command has one.
///
/// Implementations must be `Send + Sync` so links can be stored as
/// `Box<dyn DroneLink>`.
#[async_trait]
pub trait DroneLink: Send + Sync {
    /// Short backend identifier for logs (e.g., "sim", "udp").
    fn backend(&self) -> &'static str;

    /// Frame in which this backend interprets horizontal velocities.
    fn movement_frame(&self) -> MovementFrame;

    /// Connect to the vehicle and arm it.
    async fn connect(&mut self) -> Result<(), LinkError>;

    /// Disarm and release the vehicle.
    async fn disconnect(&mut self) -> Result<(), LinkError>;

    async fn takeoff(&mut self, timeout: Duration) -> Result<(), LinkError>;

    async fn land(&mut self, timeout: Duration) -> Result<(), LinkError>;

    /// Hold a velocity for `duration`.
    async fn set_velocity(&mut self, velocity: Velocity, duration: Duration)
        -> Result<(), LinkError>;

    /// Rotate at `rate_dps` (positive clockwise) for `duration`.
    async fn set_yaw_rate(&mut self, rate_dps: f32, duration: Duration) -> Result<(), LinkError>;

    async fn flip(&mut self, direction: FlipDirection) -> Result<(), LinkError>;
}
