//! gesture_pilot_sitl - DroneLink backends
//!
//! - [`SimulatedDrone`]: built-in kinematic multirotor for CI and hardware-free flying
//! - [`UdpCommandLink`]: UDP text-command protocol of small consumer quadcopters

pub mod backend;

pub use backend::{
    BackendConfig, RcChannels, SimulatedConfig, SimulatedDrone, UdpCommandLink, UdpLinkConfig,
};
