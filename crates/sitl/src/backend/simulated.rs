//! Simulated multirotor link.
//!
//! Built-in kinematic model with no external dependencies, suitable for CI
//! and for flying gestures without hardware. Commanded velocities are
//! integrated over the command duration; horizontal velocities are
//! interpreted in the world frame.

use std::time::Duration;

use async_trait::async_trait;
use gesture_pilot_core::{DroneLink, FlipDirection, LinkError, MovementFrame, Velocity};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use tracing::{debug, trace};

/// Configuration for the simulated drone.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimulatedConfig {
    /// RNG seed for fault injection. None = random.
    pub seed: Option<u64>,
    /// Probability in [0, 1] that a command is rejected.
    pub fault_rate: f64,
    /// Sleep for each command's duration, as real hardware would take.
    pub realtime: bool,
    /// Integration step size in microseconds.
    pub step_size_us: u64,
    /// Altitude reached by takeoff in meters.
    pub takeoff_altitude_m: f32,
    /// Speed limit applied to each velocity component in m/s.
    pub max_speed_mps: f32,
    /// Vertical speed of the emulated flip pulse in m/s.
    pub flip_speed_mps: f32,
    /// Duration of each half of the emulated flip pulse in seconds.
    pub flip_pulse_s: f32,
}

impl Default for SimulatedConfig {
    fn default() -> Self {
        Self {
            seed: None,
            fault_rate: 0.0,
            realtime: false,
            step_size_us: 10_000, // 100 Hz
            takeoff_altitude_m: 1.0,
            max_speed_mps: 10.0,
            flip_speed_mps: 5.0,
            flip_pulse_s: 0.2,
        }
    }
}

/// Internal vehicle state for kinematics integration.
#[derive(Debug, Clone, Default)]
struct VehicleState {
    /// X position in meters (north).
    x: f32,
    /// Y position in meters (east).
    y: f32,
    /// Altitude above ground in meters.
    altitude: f32,
    /// Heading in degrees, [0, 360), clockwise from north.
    heading_deg: f32,
    airborne: bool,
    flips: u32,
}

/// Simulated drone implementing [`DroneLink`].
pub struct SimulatedDrone {
    config: SimulatedConfig,
    state: VehicleState,
    rng: StdRng,
    sim_time_us: u64,
    connected: bool,
}

impl SimulatedDrone {
    pub fn new(config: SimulatedConfig) -> Self {
        let rng = seeded_rng(config.seed);
        Self {
            config,
            state: VehicleState::default(),
            rng,
            sim_time_us: 0,
            connected: false,
        }
    }

    /// Create with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(SimulatedConfig::default())
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn is_airborne(&self) -> bool {
        self.state.airborne
    }

    /// Position (north, east) in meters.
    pub fn position(&self) -> (f32, f32) {
        (self.state.x, self.state.y)
    }

    pub fn altitude_m(&self) -> f32 {
        self.state.altitude
    }

    pub fn heading_deg(&self) -> f32 {
        self.state.heading_deg
    }

    pub fn flip_count(&self) -> u32 {
        self.state.flips
    }

    /// Total simulated flight time in microseconds.
    pub fn sim_time_us(&self) -> u64 {
        self.sim_time_us
    }

    /// Common preconditions for every command after connect.
    fn check(&mut self, command: &'static str, needs_airborne: bool) -> Result<(), LinkError> {
        if !self.connected {
            return Err(LinkError::NotConnected);
        }
        let rate = self.config.fault_rate.clamp(0.0, 1.0);
        if rate > 0.0 && self.rng.gen_bool(rate) {
            debug!("Injected fault on {}", command);
            return Err(LinkError::Rejected {
                command,
                reason: "injected fault".to_string(),
            });
        }
        if needs_airborne && !self.state.airborne {
            return Err(LinkError::Rejected {
                command,
                reason: "vehicle is not airborne".to_string(),
            });
        }
        Ok(())
    }

    /// Integrate a constant world-frame velocity for `duration`.
    fn integrate(&mut self, velocity: Velocity, duration: Duration) {
        let limit = self.config.max_speed_mps;
        let vx = velocity.vx.clamp(-limit, limit);
        let vy = velocity.vy.clamp(-limit, limit);
        let vz = velocity.vz.clamp(-limit, limit);

        let step_us = self.config.step_size_us.max(1);
        let mut remaining_us = duration.as_micros() as u64;
        while remaining_us > 0 {
            let step = remaining_us.min(step_us);
            let dt = step as f32 / 1_000_000.0;
            self.state.x += vx * dt;
            self.state.y += vy * dt;
            // The ground stops descent
            self.state.altitude = (self.state.altitude + vz * dt).max(0.0);
            self.sim_time_us += step;
            remaining_us -= step;
        }
        trace!(
            "Integrated ({:.2}, {:.2}, {:.2}) for {:?}: pos=({:.2}, {:.2}) alt={:.2}",
            vx,
            vy,
            vz,
            duration,
            self.state.x,
            self.state.y,
            self.state.altitude
        );
    }

    async fn pace(&self, duration: Duration) {
        if self.config.realtime && !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}

impl std::fmt::Debug for SimulatedDrone {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulatedDrone")
            .field("connected", &self.connected)
            .field("airborne", &self.state.airborne)
            .field("altitude", &self.state.altitude)
            .field("sim_time_us", &self.sim_time_us)
            .finish()
    }
}

#[async_trait]
impl DroneLink for SimulatedDrone {
    fn backend(&self) -> &'static str {
        "sim"
    }

    fn movement_frame(&self) -> MovementFrame {
        MovementFrame::World
    }

    async fn connect(&mut self) -> Result<(), LinkError> {
        // Reset state on connect
        self.state = VehicleState::default();
        self.sim_time_us = 0;
        self.rng = seeded_rng(self.config.seed);
        self.connected = true;
        debug!("Simulated drone connected");
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), LinkError> {
        if !self.connected {
            return Err(LinkError::NotConnected);
        }
        self.connected = false;
        self.state.airborne = false;
        self.state.altitude = 0.0;
        Ok(())
    }

    async fn takeoff(&mut self, _timeout: Duration) -> Result<(), LinkError> {
        self.check("takeoff", false)?;
        if self.state.airborne {
            return Err(LinkError::Rejected {
                command: "takeoff",
                reason: "already airborne".to_string(),
            });
        }
        self.state.airborne = true;
        self.state.altitude = self.config.takeoff_altitude_m;
        Ok(())
    }

    async fn land(&mut self, _timeout: Duration) -> Result<(), LinkError> {
        self.check("land", false)?;
        self.state.airborne = false;
        self.state.altitude = 0.0;
        Ok(())
    }

    async fn set_velocity(
        &mut self,
        velocity: Velocity,
        duration: Duration,
    ) -> Result<(), LinkError> {
        self.check("set_velocity", true)?;
        self.integrate(velocity, duration);
        self.pace(duration).await;
        Ok(())
    }

    async fn set_yaw_rate(&mut self, rate_dps: f32, duration: Duration) -> Result<(), LinkError> {
        self.check("set_yaw_rate", true)?;
        let heading = self.state.heading_deg + rate_dps * duration.as_secs_f32();
        self.state.heading_deg = heading.rem_euclid(360.0);
        self.sim_time_us += duration.as_micros() as u64;
        self.pace(duration).await;
        Ok(())
    }

    async fn flip(&mut self, direction: FlipDirection) -> Result<(), LinkError> {
        self.check("flip", true)?;
        // No native flip: a short down/up pulse with zero net altitude change
        let pulse = Duration::try_from_secs_f32(self.config.flip_pulse_s).unwrap_or(Duration::ZERO);
        let speed = self.config.flip_speed_mps;
        let altitude = self.state.altitude;
        self.integrate(Velocity::vertical(-speed), pulse);
        self.integrate(Velocity::vertical(speed), pulse);
        self.state.altitude = altitude;
        self.state.flips += 1;
        debug!("Emulated {} flip", direction.as_str());
        self.pace(pulse * 2).await;
        Ok(())
    }
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}
