//! Flight State Machine
//!
//! Translates flight events into [`DroneLink`] commands.
//!
//! ## Transitions
//!
//! | Event | Guard | Effect |
//! |---|---|---|
//! | TakeoffOrAscend | Grounded, cooldown elapsed | Takeoff, altitude = initial → Flying |
//! | TakeoffOrAscend | Flying | climb, altitude += ascend delta |
//! | DescendOrLand | Flying | sink, altitude -= descend delta; at or below threshold: Land → Grounded |
//! | MoveForward/Backward | Flying, cooldown elapsed | horizontal velocity in the movement frame |
//! | RotateCw/Ccw | Flying, cooldown elapsed | yaw rate, yaw ± rotation delta |
//! | Flip | Flying, cooldown elapsed | Flip |
//! | EmergencyStop | any | Land, altitude = 0 → Grounded |
//!
//! Every successful action resets the single shared cooldown timer.
//!
//! ## Safety
//!
//! - A failed link call leaves the state untouched; the caller keeps running
//! - Emergency landing ignores the cooldown and is never retried
//! - [`FlightStateMachine::shutdown`] consumes the machine, so the link is
//!   disconnected exactly once

use tracing::{debug, error, info, warn};

use super::command::{Command, MovementFrame, Velocity};
use super::cooldown::Cooldown;
use super::state::{FlightEvent, FlightPhase, FlightState};
use crate::config::FlightConfig;
use crate::error::LinkError;
use crate::link::DroneLink;

/// Why an event did not produce a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The shared cooldown has not elapsed.
    CoolingDown,
    /// The event requires the vehicle to be flying.
    NotFlying,
}

/// Result of dispatching one event.
#[derive(Debug)]
pub enum Outcome {
    /// The last command issued for the event completed.
    Executed(Command),
    /// A guard blocked the event; nothing was sent.
    Skipped(SkipReason),
    /// The link reported a failure; state was not advanced.
    Failed(LinkError),
}

impl Outcome {
    pub fn is_executed(&self) -> bool {
        matches!(self, Outcome::Executed(_))
    }
}

/// Gesture flight state machine.
///
/// Owns the vehicle link for the whole session. Create it with
/// [`FlightStateMachine::connect`] and end it with
/// [`FlightStateMachine::shutdown`].
pub struct FlightStateMachine {
    link: Box<dyn DroneLink>,
    config: FlightConfig,
    frame: MovementFrame,
    phase: FlightPhase,
    altitude_cm: f32,
    yaw_deg: f32,
    cooldown: Cooldown,
}

impl FlightStateMachine {
    /// Connect and arm the vehicle, then build the state machine.
    ///
    /// On failure the link is dropped and the error returned; the caller is
    /// expected to continue without a vehicle.
    pub async fn connect(
        mut link: Box<dyn DroneLink>,
        config: FlightConfig,
    ) -> Result<Self, LinkError> {
        info!("Connecting to vehicle via {} link", link.backend());
        link.connect().await?;
        info!("Vehicle connected and armed");
        Ok(Self::new(link, config))
    }

    /// Build the state machine around an already connected link.
    pub fn new(link: Box<dyn DroneLink>, config: FlightConfig) -> Self {
        let frame = config.movement_frame.unwrap_or_else(|| link.movement_frame());
        debug!("Movement frame: {:?}", frame);
        Self {
            link,
            frame,
            cooldown: Cooldown::new(config.cooldown_us()),
            config,
            phase: FlightPhase::Grounded,
            altitude_cm: 0.0,
            yaw_deg: 0.0,
        }
    }

    /// Current state snapshot.
    pub fn state(&self) -> FlightState {
        FlightState {
            phase: self.phase,
            altitude_cm: self.altitude_cm,
            yaw_deg: self.yaw_deg,
            last_action_us: self.cooldown.last_action_us(),
        }
    }

    pub fn movement_frame(&self) -> MovementFrame {
        self.frame
    }

    pub fn config(&self) -> &FlightConfig {
        &self.config
    }

    /// Handle one event at time `now_us`.
    pub async fn dispatch(&mut self, event: FlightEvent, now_us: u64) -> Outcome {
        if event.is_gated() {
            if let Some(reason) = self.gate(now_us) {
                debug!("{:?} skipped: {:?}", event, reason);
                return Outcome::Skipped(reason);
            }
        }

        match event {
            FlightEvent::TakeoffOrAscend => match self.phase {
                FlightPhase::Grounded => self.takeoff(now_us).await,
                FlightPhase::Flying => self.ascend(now_us).await,
            },
            FlightEvent::DescendOrLand => self.descend(now_us).await,
            FlightEvent::MoveForward => self.move_horizontal(1.0, now_us).await,
            FlightEvent::MoveBackward => self.move_horizontal(-1.0, now_us).await,
            FlightEvent::RotateCw => self.rotate(1.0, now_us).await,
            FlightEvent::RotateCcw => self.rotate(-1.0, now_us).await,
            FlightEvent::Flip => {
                let command = Command::Flip(self.config.flip_direction);
                match self.issue(command).await {
                    Ok(()) => self.complete(command, now_us),
                    Err(e) => Outcome::Failed(e),
                }
            }
            FlightEvent::EmergencyStop => self.emergency_stop(now_us).await,
        }
    }

    /// Land immediately regardless of cooldown or phase.
    ///
    /// A failed emergency landing is logged and not retried.
    pub async fn emergency_stop(&mut self, now_us: u64) -> Outcome {
        warn!("Emergency stop: landing immediately");
        match self.issue(Command::Land).await {
            Ok(()) => {
                self.phase = FlightPhase::Grounded;
                self.altitude_cm = 0.0;
                self.complete(Command::Land, now_us)
            }
            Err(e) => {
                error!("Emergency landing failed, not retrying: {}", e);
                Outcome::Failed(e)
            }
        }
    }

    /// End the session: land if still flying, then disconnect.
    ///
    /// Disconnect is attempted even when the landing fails. Returns the
    /// disconnect result.
    pub async fn shutdown(mut self) -> Result<(), LinkError> {
        if self.phase == FlightPhase::Flying {
            warn!("Shutting down while flying; landing first");
            if let Err(e) = self.issue(Command::Land).await {
                error!("Landing before disconnect failed: {}", e);
            }
        }
        self.phase = FlightPhase::Grounded;
        self.altitude_cm = 0.0;

        match self.link.disconnect().await {
            Ok(()) => {
                info!("Vehicle disconnected");
                Ok(())
            }
            Err(e) => {
                error!("Error during disconnection: {}", e);
                Err(e)
            }
        }
    }

    // ------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------

    fn gate(&self, now_us: u64) -> Option<SkipReason> {
        if self.phase != FlightPhase::Flying {
            return Some(SkipReason::NotFlying);
        }
        if !self.cooldown.is_elapsed(now_us) {
            return Some(SkipReason::CoolingDown);
        }
        None
    }

    async fn takeoff(&mut self, now_us: u64) -> Outcome {
        if !self.cooldown.is_elapsed(now_us) {
            debug!(
                "Takeoff skipped: cooldown {} us remaining",
                self.cooldown.remaining_us(now_us)
            );
            return Outcome::Skipped(SkipReason::CoolingDown);
        }
        match self.issue(Command::Takeoff).await {
            Ok(()) => {
                self.phase = FlightPhase::Flying;
                self.altitude_cm = self.config.initial_altitude_cm;
                self.complete(Command::Takeoff, now_us)
            }
            Err(e) => Outcome::Failed(e),
        }
    }

    async fn ascend(&mut self, now_us: u64) -> Outcome {
        let command = Command::SetVelocity(Velocity::vertical(self.config.vertical_speed_mps));
        match self.issue(command).await {
            Ok(()) => {
                self.altitude_cm += self.config.ascend_delta_cm;
                self.complete(command, now_us)
            }
            Err(e) => Outcome::Failed(e),
        }
    }

    async fn descend(&mut self, now_us: u64) -> Outcome {
        if self.phase != FlightPhase::Flying {
            debug!("Descend skipped: not flying");
            return Outcome::Skipped(SkipReason::NotFlying);
        }

        let command = Command::SetVelocity(Velocity::vertical(-self.config.vertical_speed_mps));
        if let Err(e) = self.issue(command).await {
            return Outcome::Failed(e);
        }
        self.altitude_cm = (self.altitude_cm - self.config.descend_delta_cm).max(0.0);
        self.cooldown.reset(now_us);

        if self.altitude_cm > self.config.landing_threshold_cm {
            return Outcome::Executed(command);
        }

        info!(
            "Altitude estimate {:.0} cm within landing threshold, landing",
            self.altitude_cm
        );
        match self.issue(Command::Land).await {
            Ok(()) => {
                self.phase = FlightPhase::Grounded;
                self.altitude_cm = 0.0;
                self.complete(Command::Land, now_us)
            }
            Err(e) => Outcome::Failed(e),
        }
    }

    async fn move_horizontal(&mut self, sign: f32, now_us: u64) -> Outcome {
        let speed = sign * self.config.horizontal_speed_mps;
        let velocity = match self.frame {
            MovementFrame::Body => Velocity::new(speed, 0.0, 0.0),
            MovementFrame::World => {
                let yaw = self.yaw_deg.to_radians();
                Velocity::new(speed * yaw.cos(), speed * yaw.sin(), 0.0)
            }
        };
        let command = Command::SetVelocity(velocity);
        match self.issue(command).await {
            Ok(()) => self.complete(command, now_us),
            Err(e) => Outcome::Failed(e),
        }
    }

    async fn rotate(&mut self, sign: f32, now_us: u64) -> Outcome {
        let command = Command::SetYawRate(sign * self.config.yaw_rate_dps);
        match self.issue(command).await {
            Ok(()) => {
                self.yaw_deg += sign * self.config.rotation_delta_deg;
                self.complete(command, now_us)
            }
            Err(e) => Outcome::Failed(e),
        }
    }

    fn complete(&mut self, command: Command, now_us: u64) -> Outcome {
        self.cooldown.reset(now_us);
        Outcome::Executed(command)
    }

    /// Send one command over the link. Every call site is a fault boundary.
    async fn issue(&mut self, command: Command) -> Result<(), LinkError> {
        let result = match command {
            Command::Takeoff => self.link.takeoff(self.config.takeoff_timeout()).await,
            Command::Land => self.link.land(self.config.land_timeout()).await,
            Command::SetVelocity(v) => self.link.set_velocity(v, self.config.move_duration()).await,
            Command::SetYawRate(rate) => {
                self.link
                    .set_yaw_rate(rate, self.config.rotate_duration())
                    .await
            }
            Command::Flip(direction) => self.link.flip(direction).await,
        };

        match &result {
            Ok(()) => info!(
                "{} ({}, altitude {:.0} cm, yaw {:.0}°)",
                command,
                self.phase.as_str(),
                self.altitude_cm,
                self.yaw_deg
            ),
            Err(e) => warn!("{} failed: {}", command, e),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flight::FlipDirection;
    use crate::link::{LinkCall, RecordingLink};

    const SECOND: u64 = 1_000_000;

    fn machine(frame: MovementFrame) -> (FlightStateMachine, RecordingLink) {
        let link = RecordingLink::new(frame);
        let fsm = FlightStateMachine::new(Box::new(link.clone()), FlightConfig::default());
        (fsm, link)
    }

    async fn airborne(fsm: &mut FlightStateMachine, link: &RecordingLink) {
        assert!(fsm.dispatch(FlightEvent::TakeoffOrAscend, 0).await.is_executed());
        link.clear();
    }

    #[tokio::test]
    async fn test_takeoff_from_grounded() {
        let (mut fsm, link) = machine(MovementFrame::Body);
        let outcome = fsm.dispatch(FlightEvent::TakeoffOrAscend, 0).await;

        assert!(matches!(outcome, Outcome::Executed(Command::Takeoff)));
        let state = fsm.state();
        assert_eq!(state.phase, FlightPhase::Flying);
        assert_eq!(state.altitude_cm, 2.0);
        assert_eq!(state.last_action_us, Some(0));
        assert_eq!(link.calls(), vec![LinkCall::Takeoff]);
    }

    #[tokio::test]
    async fn test_failed_takeoff_stays_grounded() {
        let (mut fsm, link) = machine(MovementFrame::Body);
        link.fail("takeoff");

        let outcome = fsm.dispatch(FlightEvent::TakeoffOrAscend, 0).await;
        assert!(matches!(outcome, Outcome::Failed(_)));
        assert_eq!(fsm.state().phase, FlightPhase::Grounded);
        assert_eq!(fsm.state().altitude_cm, 0.0);
        assert!(fsm.state().last_action_us.is_none());
    }

    #[tokio::test]
    async fn test_ascend_ignores_cooldown() {
        let (mut fsm, link) = machine(MovementFrame::Body);
        airborne(&mut fsm, &link).await;

        let outcome = fsm.dispatch(FlightEvent::TakeoffOrAscend, 100).await;
        assert!(outcome.is_executed());
        assert_eq!(fsm.state().altitude_cm, 12.0);
        assert_eq!(fsm.state().last_action_us, Some(100));
        assert_eq!(
            link.calls(),
            vec![LinkCall::SetVelocity(Velocity::vertical(5.0))]
        );
    }

    #[tokio::test]
    async fn test_takeoff_respects_cooldown_after_landing() {
        let (mut fsm, link) = machine(MovementFrame::Body);
        airborne(&mut fsm, &link).await;
        // 2 cm - 10 cm lands immediately
        fsm.dispatch(FlightEvent::DescendOrLand, 10).await;
        assert_eq!(fsm.state().phase, FlightPhase::Grounded);

        let outcome = fsm.dispatch(FlightEvent::TakeoffOrAscend, 20).await;
        assert!(matches!(outcome, Outcome::Skipped(SkipReason::CoolingDown)));

        let outcome = fsm.dispatch(FlightEvent::TakeoffOrAscend, 10 + SECOND + 1).await;
        assert!(outcome.is_executed());
    }

    #[tokio::test]
    async fn test_descend_to_threshold_lands_once() {
        let (mut fsm, link) = machine(MovementFrame::Body);
        airborne(&mut fsm, &link).await;
        // Climb to threshold + descend delta = 60 cm: 2 + 10 * 5 = 52, then +10 = 62
        for t in 1..=6 {
            fsm.dispatch(FlightEvent::TakeoffOrAscend, t).await;
        }
        assert_eq!(fsm.state().altitude_cm, 62.0);
        fsm.dispatch(FlightEvent::DescendOrLand, 7).await;
        assert_eq!(fsm.state().altitude_cm, 52.0);
        fsm.altitude_cm = 60.0;
        link.clear();

        let outcome = fsm.dispatch(FlightEvent::DescendOrLand, 8).await;
        assert!(matches!(outcome, Outcome::Executed(Command::Land)));
        assert_eq!(fsm.state().phase, FlightPhase::Grounded);
        assert_eq!(fsm.state().altitude_cm, 0.0);
        assert_eq!(link.count("land"), 1);
    }

    #[tokio::test]
    async fn test_descend_above_threshold_keeps_flying() {
        let (mut fsm, link) = machine(MovementFrame::Body);
        airborne(&mut fsm, &link).await;
        fsm.altitude_cm = 100.0;

        let outcome = fsm.dispatch(FlightEvent::DescendOrLand, 5).await;
        assert!(matches!(outcome, Outcome::Executed(Command::SetVelocity(_))));
        assert_eq!(fsm.state().altitude_cm, 90.0);
        assert_eq!(fsm.state().phase, FlightPhase::Flying);
        assert_eq!(link.count("land"), 0);
    }

    #[tokio::test]
    async fn test_descend_while_grounded_is_noop() {
        let (mut fsm, link) = machine(MovementFrame::Body);
        let outcome = fsm.dispatch(FlightEvent::DescendOrLand, 0).await;
        assert!(matches!(outcome, Outcome::Skipped(SkipReason::NotFlying)));
        assert!(link.calls().is_empty());
    }

    #[tokio::test]
    async fn test_failed_land_keeps_altitude_non_negative() {
        let (mut fsm, link) = machine(MovementFrame::Body);
        airborne(&mut fsm, &link).await;
        link.fail("land");

        let outcome = fsm.dispatch(FlightEvent::DescendOrLand, 1).await;
        assert!(matches!(outcome, Outcome::Failed(_)));
        assert_eq!(fsm.state().phase, FlightPhase::Flying);
        assert_eq!(fsm.state().altitude_cm, 0.0);

        fsm.dispatch(FlightEvent::DescendOrLand, 2).await;
        assert!(fsm.state().altitude_cm >= 0.0);
    }

    #[tokio::test]
    async fn test_gated_events_require_flying() {
        let (mut fsm, link) = machine(MovementFrame::Body);
        for event in [
            FlightEvent::MoveForward,
            FlightEvent::MoveBackward,
            FlightEvent::RotateCw,
            FlightEvent::RotateCcw,
            FlightEvent::Flip,
        ] {
            let outcome = fsm.dispatch(event, 10 * SECOND).await;
            assert!(matches!(outcome, Outcome::Skipped(SkipReason::NotFlying)));
        }
        assert!(link.calls().is_empty());
    }

    #[tokio::test]
    async fn test_cooldown_is_shared_between_event_types() {
        let (mut fsm, link) = machine(MovementFrame::Body);
        airborne(&mut fsm, &link).await;

        assert!(fsm.dispatch(FlightEvent::RotateCw, 2 * SECOND).await.is_executed());
        let outcome = fsm.dispatch(FlightEvent::Flip, 2 * SECOND + 500_000).await;
        assert!(matches!(outcome, Outcome::Skipped(SkipReason::CoolingDown)));
        let outcome = fsm.dispatch(FlightEvent::MoveForward, 3 * SECOND).await;
        assert!(matches!(outcome, Outcome::Skipped(SkipReason::CoolingDown)));
        assert!(fsm.dispatch(FlightEvent::Flip, 3 * SECOND + 1).await.is_executed());

        assert_eq!(
            link.calls(),
            vec![
                LinkCall::SetYawRate(30.0),
                LinkCall::Flip(FlipDirection::Front)
            ]
        );
    }

    #[tokio::test]
    async fn test_rotation_tracks_yaw() {
        let (mut fsm, link) = machine(MovementFrame::Body);
        airborne(&mut fsm, &link).await;

        fsm.dispatch(FlightEvent::RotateCcw, 2 * SECOND).await;
        assert_eq!(fsm.state().yaw_deg, -30.0);
        fsm.dispatch(FlightEvent::RotateCw, 4 * SECOND).await;
        fsm.dispatch(FlightEvent::RotateCw, 6 * SECOND).await;
        assert_eq!(fsm.state().yaw_deg, 30.0);
        assert_eq!(link.calls()[0], LinkCall::SetYawRate(-30.0));
    }

    #[tokio::test]
    async fn test_failed_rotation_keeps_yaw_and_timer() {
        let (mut fsm, link) = machine(MovementFrame::Body);
        airborne(&mut fsm, &link).await;
        link.fail("set_yaw_rate");

        let outcome = fsm.dispatch(FlightEvent::RotateCw, 2 * SECOND).await;
        assert!(matches!(outcome, Outcome::Failed(_)));
        assert_eq!(fsm.state().yaw_deg, 0.0);
        assert_eq!(fsm.state().last_action_us, Some(0));
    }

    #[tokio::test]
    async fn test_body_frame_ignores_yaw() {
        let (mut fsm, link) = machine(MovementFrame::Body);
        airborne(&mut fsm, &link).await;
        fsm.yaw_deg = 90.0;

        fsm.dispatch(FlightEvent::MoveBackward, 2 * SECOND).await;
        assert_eq!(
            link.calls(),
            vec![LinkCall::SetVelocity(Velocity::new(-5.0, 0.0, 0.0))]
        );
    }

    #[tokio::test]
    async fn test_world_frame_rotates_by_yaw() {
        let (mut fsm, link) = machine(MovementFrame::World);
        airborne(&mut fsm, &link).await;
        fsm.yaw_deg = 90.0;

        fsm.dispatch(FlightEvent::MoveForward, 2 * SECOND).await;
        let LinkCall::SetVelocity(v) = link.calls()[0] else {
            panic!("expected a velocity command");
        };
        assert!(v.vx.abs() < 1e-5);
        assert!((v.vy - 5.0).abs() < 1e-5);
        assert_eq!(v.vz, 0.0);
    }

    #[tokio::test]
    async fn test_configured_frame_overrides_link() {
        let link = RecordingLink::new(MovementFrame::Body);
        let config = FlightConfig {
            movement_frame: Some(MovementFrame::World),
            ..Default::default()
        };
        let fsm = FlightStateMachine::new(Box::new(link), config);
        assert_eq!(fsm.movement_frame(), MovementFrame::World);
    }

    #[tokio::test]
    async fn test_emergency_stop_bypasses_cooldown() {
        let (mut fsm, link) = machine(MovementFrame::Body);
        airborne(&mut fsm, &link).await;
        fsm.dispatch(FlightEvent::RotateCw, 2 * SECOND).await;
        link.clear();

        let outcome = fsm.dispatch(FlightEvent::EmergencyStop, 2 * SECOND + 10).await;
        assert!(matches!(outcome, Outcome::Executed(Command::Land)));
        assert_eq!(fsm.state().phase, FlightPhase::Grounded);
        assert_eq!(fsm.state().altitude_cm, 0.0);
        assert_eq!(fsm.state().last_action_us, Some(2 * SECOND + 10));
        assert_eq!(link.calls(), vec![LinkCall::Land]);
    }

    #[tokio::test]
    async fn test_emergency_stop_failure_not_retried() {
        let (mut fsm, link) = machine(MovementFrame::Body);
        airborne(&mut fsm, &link).await;
        link.fail("land");

        let outcome = fsm.emergency_stop(5).await;
        assert!(matches!(outcome, Outcome::Failed(_)));
        assert_eq!(link.count("land"), 1);
        assert_eq!(fsm.state().phase, FlightPhase::Flying);
    }

    #[tokio::test]
    async fn test_connect_failure_returns_error() {
        let link = RecordingLink::default();
        link.fail("connect");
        let result = FlightStateMachine::connect(Box::new(link.clone()), FlightConfig::default()).await;
        assert!(matches!(result, Err(e) if e.is_connection()));
        assert_eq!(link.calls(), vec![LinkCall::Connect]);
    }

    #[tokio::test]
    async fn test_shutdown_lands_then_disconnects_once() {
        let (mut fsm, link) = machine(MovementFrame::Body);
        airborne(&mut fsm, &link).await;
        link.fail("land");

        let result = fsm.shutdown().await;
        assert!(result.is_ok());
        assert_eq!(link.calls(), vec![LinkCall::Land, LinkCall::Disconnect]);
    }

    #[tokio::test]
    async fn test_shutdown_when_grounded_only_disconnects() {
        let (fsm, link) = machine(MovementFrame::Body);
        link.fail("disconnect");
        assert!(fsm.shutdown().await.is_err());
        assert_eq!(link.calls(), vec![LinkCall::Disconnect]);
    }
}
