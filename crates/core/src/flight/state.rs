//! Flight state types

/// Whether the vehicle is on the ground or airborne.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlightPhase {
    Grounded,
    Flying,
}

impl FlightPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            FlightPhase::Grounded => "grounded",
            FlightPhase::Flying => "flying",
        }
    }
}

/// Event driving the flight state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlightEvent {
    TakeoffOrAscend,
    DescendOrLand,
    MoveForward,
    MoveBackward,
    RotateCw,
    RotateCcw,
    Flip,
    /// Land immediately, ignoring the cooldown.
    EmergencyStop,
}

impl FlightEvent {
    /// Events that must wait for the shared cooldown.
    ///
    /// Takeoff from the ground is also gated; ascending while flying is not.
    pub fn is_gated(self) -> bool {
        matches!(
            self,
            FlightEvent::MoveForward
                | FlightEvent::MoveBackward
                | FlightEvent::RotateCw
                | FlightEvent::RotateCcw
                | FlightEvent::Flip
        )
    }
}

/// Snapshot of the tracked flight state.
///
/// Altitude and yaw are estimates accumulated from commanded deltas, not
/// sensor readings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlightState {
    pub phase: FlightPhase,
    /// Never negative.
    pub altitude_cm: f32,
    /// Unbounded; see [`FlightState::heading_deg`].
    pub yaw_deg: f32,
    /// Timestamp of the last successful action, `None` before the first.
    pub last_action_us: Option<u64>,
}

impl FlightState {
    pub fn is_flying(&self) -> bool {
        self.phase == FlightPhase::Flying
    }

    /// Yaw wrapped to `[0, 360)`.
    pub fn heading_deg(&self) -> f32 {
        self.yaw_deg.rem_euclid(360.0)
    }
}

impl Default for FlightState {
    fn default() -> Self {
        Self {
            phase: FlightPhase::Grounded,
            altitude_cm: 0.0,
            yaw_deg: 0.0,
            last_action_us: None,
        }
    }
}
