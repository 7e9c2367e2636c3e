//! Flight command types

use core::fmt;

use serde::{Deserialize, Serialize};

/// Velocity setpoint in m/s.
///
/// `vx`/`vy` are horizontal components in the active [`MovementFrame`];
/// `vz` is vertical with positive meaning up.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Velocity {
    pub vx: f32,
    pub vy: f32,
    pub vz: f32,
}

impl Velocity {
    pub const fn new(vx: f32, vy: f32, vz: f32) -> Self {
        Self { vx, vy, vz }
    }

    pub const fn vertical(vz: f32) -> Self {
        Self { vx: 0.0, vy: 0.0, vz }
    }
}

/// Reference frame for horizontal velocity commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementFrame {
    /// x forward, y right, relative to the vehicle's nose.
    Body,
    /// x/y in the world frame; forward motion is rotated by the tracked yaw.
    World,
}

/// Flip direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlipDirection {
    Front,
    Back,
    Left,
    Right,
}

impl FlipDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            FlipDirection::Front => "front",
            FlipDirection::Back => "back",
            FlipDirection::Left => "left",
            FlipDirection::Right => "right",
        }
    }
}

/// Command issued to the vehicle link.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Takeoff,
    Land,
    SetVelocity(Velocity),
    /// Yaw rate in degrees/s, positive clockwise.
    SetYawRate(f32),
    Flip(FlipDirection),
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::Takeoff => "takeoff",
            Command::Land => "land",
            Command::SetVelocity(_) => "set_velocity",
            Command::SetYawRate(_) => "set_yaw_rate",
            Command::Flip(_) => "flip",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Takeoff => write!(f, "Takeoff"),
            Command::Land => write!(f, "Land"),
            Command::SetVelocity(v) => {
                write!(f, "SetVelocity({:.2}, {:.2}, {:.2})", v.vx, v.vy, v.vz)
            }
            Command::SetYawRate(rate) => write!(f, "SetYawRate({:.1})", rate),
            Command::Flip(dir) => write!(f, "Flip({})", dir.as_str()),
        }
    }
}
