pub mod simulated;
pub mod udp;

use serde::Deserialize;

use gesture_pilot_core::DroneLink;

pub use simulated::{SimulatedConfig, SimulatedDrone};
pub use udp::{RcChannels, UdpCommandLink, UdpLinkConfig};

/// Backend selection, as written in the `[backend]` table of a config file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackendConfig {
    Sim(SimulatedConfig),
    Udp(UdpLinkConfig),
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig::Sim(SimulatedConfig::default())
    }
}

impl BackendConfig {
    /// Backend identifier as used on the command line.
    pub fn kind(&self) -> &'static str {
        match self {
            BackendConfig::Sim(_) => "sim",
            BackendConfig::Udp(_) => "udp",
        }
    }

    /// Default configuration for a backend identifier.
    pub fn from_kind(kind: &str) -> Option<Self> {
        match kind {
            "sim" => Some(BackendConfig::Sim(SimulatedConfig::default())),
            "udp" => Some(BackendConfig::Udp(UdpLinkConfig::default())),
            _ => None,
        }
    }

    /// Build the link. Nothing is opened until `connect()`.
    pub fn build(&self) -> Box<dyn DroneLink> {
        match self {
            BackendConfig::Sim(config) => Box::new(SimulatedDrone::new(config.clone())),
            BackendConfig::Udp(config) => Box::new(UdpCommandLink::new(config.clone())),
        }
    }
}
