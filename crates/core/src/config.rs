//! Flight configuration
//!
//! Every tunable of the flight state machine lives here instead of in module
//! constants. Defaults reproduce the reference tuning: 1 s cooldown, 50 cm
//! landing threshold, 10 cm altitude steps and 30° rotations.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::flight::{FlipDirection, MovementFrame};

/// Allowed gap between the commanded turn and the yaw estimate increment.
const ROTATION_TOLERANCE_DEG: f32 = 0.01;

/// Flight state machine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightConfig {
    /// Minimum time between two cooldown-gated actions (seconds).
    pub cooldown_s: f32,
    /// Altitude estimate assigned right after takeoff (cm).
    pub initial_altitude_cm: f32,
    /// Altitude estimate added per ascend command (cm).
    pub ascend_delta_cm: f32,
    /// Altitude estimate removed per descend command (cm).
    pub descend_delta_cm: f32,
    /// A descend that leaves the estimate at or below this lands (cm).
    pub landing_threshold_cm: f32,
    /// Yaw estimate change per rotate command (degrees).
    pub rotation_delta_deg: f32,
    /// Commanded yaw rate for rotate commands (degrees/s).
    pub yaw_rate_dps: f32,
    /// Vertical speed for ascend/descend (m/s).
    pub vertical_speed_mps: f32,
    /// Horizontal speed for forward/backward moves (m/s).
    pub horizontal_speed_mps: f32,
    /// Duration of velocity commands (seconds).
    pub move_duration_s: f32,
    /// Duration of yaw rate commands (seconds).
    pub rotate_duration_s: f32,
    pub takeoff_timeout_s: f32,
    pub land_timeout_s: f32,
    pub flip_direction: FlipDirection,
    /// Frame for horizontal moves. `None` uses the frame the link declares.
    pub movement_frame: Option<MovementFrame>,
}

impl Default for FlightConfig {
    fn default() -> Self {
        Self {
            cooldown_s: 1.0,
            initial_altitude_cm: 2.0,
            ascend_delta_cm: 10.0,
            descend_delta_cm: 10.0,
            landing_threshold_cm: 50.0,
            rotation_delta_deg: 30.0,
            yaw_rate_dps: 30.0,
            vertical_speed_mps: 5.0,
            horizontal_speed_mps: 5.0,
            move_duration_s: 2.0,
            rotate_duration_s: 1.0,
            takeoff_timeout_s: 10.0,
            land_timeout_s: 10.0,
            flip_direction: FlipDirection::Front,
            movement_frame: None,
        }
    }
}

impl FlightConfig {
    pub fn cooldown_us(&self) -> u64 {
        secs(self.cooldown_s).as_micros() as u64
    }

    pub fn move_duration(&self) -> Duration {
        secs(self.move_duration_s)
    }

    pub fn rotate_duration(&self) -> Duration {
        secs(self.rotate_duration_s)
    }

    pub fn takeoff_timeout(&self) -> Duration {
        secs(self.takeoff_timeout_s)
    }

    pub fn land_timeout(&self) -> Duration {
        secs(self.land_timeout_s)
    }

    /// Heading change a single rotate command produces on the vehicle.
    pub fn commanded_rotation_deg(&self) -> f32 {
        self.yaw_rate_dps * self.rotate_duration_s
    }

    /// Check that every value is finite and non-negative, and that a rotate
    /// command turns the vehicle by exactly `rotation_delta_deg`.
    pub fn validate(&self) -> Result<(), String> {
        let fields = [
            ("cooldown_s", self.cooldown_s),
            ("initial_altitude_cm", self.initial_altitude_cm),
            ("ascend_delta_cm", self.ascend_delta_cm),
            ("descend_delta_cm", self.descend_delta_cm),
            ("landing_threshold_cm", self.landing_threshold_cm),
            ("rotation_delta_deg", self.rotation_delta_deg),
            ("yaw_rate_dps", self.yaw_rate_dps),
            ("vertical_speed_mps", self.vertical_speed_mps),
            ("horizontal_speed_mps", self.horizontal_speed_mps),
            ("move_duration_s", self.move_duration_s),
            ("rotate_duration_s", self.rotate_duration_s),
            ("takeoff_timeout_s", self.takeoff_timeout_s),
            ("land_timeout_s", self.land_timeout_s),
        ];
        for (name, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("{name} must be a non-negative number, got {value}"));
            }
        }
        let commanded = self.commanded_rotation_deg();
        if (commanded - self.rotation_delta_deg).abs() > ROTATION_TOLERANCE_DEG {
            return Err(format!(
                "yaw_rate_dps * rotate_duration_s turns {commanded}° but rotation_delta_deg is {}°",
                self.rotation_delta_deg
            ));
        }
        Ok(())
    }
}

fn secs(value: f32) -> Duration {
    Duration::try_from_secs_f32(value).unwrap_or(Duration::ZERO)
}
