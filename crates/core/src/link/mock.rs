//! Recording link for tests
//!
//! [`RecordingLink`] accepts every command and records it. Clones share the
//! same log, so a test keeps one handle while the state machine owns the
//! other. Failures can be injected per call kind.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;

use super::DroneLink;
use crate::error::LinkError;
use crate::flight::{FlipDirection, MovementFrame, Velocity};

/// A call observed by [`RecordingLink`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LinkCall {
    Connect,
    Disconnect,
    Takeoff,
    Land,
    SetVelocity(Velocity),
    SetYawRate(f32),
    Flip(FlipDirection),
}

impl LinkCall {
    fn kind(&self) -> &'static str {
        match self {
            LinkCall::Connect => "connect",
            LinkCall::Disconnect => "disconnect",
            LinkCall::Takeoff => "takeoff",
            LinkCall::Land => "land",
            LinkCall::SetVelocity(_) => "set_velocity",
            LinkCall::SetYawRate(_) => "set_yaw_rate",
            LinkCall::Flip(_) => "flip",
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    calls: Vec<LinkCall>,
    failing: Vec<&'static str>,
}

/// In-memory [`DroneLink`] that records calls and can inject failures.
#[derive(Debug, Clone)]
pub struct RecordingLink {
    inner: Arc<Mutex<Inner>>,
    frame: MovementFrame,
}

impl RecordingLink {
    pub fn new(frame: MovementFrame) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            frame,
        }
    }

    /// Make every future call of `kind` (e.g. "takeoff") fail.
    ///
    /// Failed calls are still recorded.
    pub fn fail(&self, kind: &'static str) {
        self.lock().failing.push(kind);
    }

    /// Stop injecting failures for `kind`.
    pub fn recover(&self, kind: &'static str) {
        self.lock().failing.retain(|k| *k != kind);
    }

    pub fn calls(&self) -> Vec<LinkCall> {
        self.lock().calls.clone()
    }

    pub fn count(&self, kind: &'static str) -> usize {
        self.lock().calls.iter().filter(|c| c.kind() == kind).count()
    }

    pub fn clear(&self) {
        self.lock().calls.clear();
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // A panicking test thread must not hide the log from the others
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn record(&self, call: LinkCall) -> Result<(), LinkError> {
        let mut inner = self.lock();
        inner.calls.push(call);
        let kind = call.kind();
        if inner.failing.contains(&kind) {
            if kind == "connect" {
                return Err(LinkError::ConnectionFailed("injected failure".into()));
            }
            return Err(LinkError::Rejected {
                command: kind,
                reason: "injected failure".into(),
            });
        }
        Ok(())
    }
}

impl Default for RecordingLink {
    fn default() -> Self {
        Self::new(MovementFrame::Body)
    }
}

#[async_trait]
impl DroneLink for RecordingLink {
    fn backend(&self) -> &'static str {
        "recording"
    }

    fn movement_frame(&self) -> MovementFrame {
        self.frame
    }

    async fn connect(&mut self) -> Result<(), LinkError> {
        self.record(LinkCall::Connect)
    }

    async fn disconnect(&mut self) -> Result<(), LinkError> {
        self.record(LinkCall::Disconnect)
    }

    async fn takeoff(&mut self, _timeout: Duration) -> Result<(), LinkError> {
        self.record(LinkCall::Takeoff)
    }

    async fn land(&mut self, _timeout: Duration) -> Result<(), LinkError> {
        self.record(LinkCall::Land)
    }

    async fn set_velocity(
        &mut self,
        velocity: Velocity,
        _duration: Duration,
    ) -> Result<(), LinkError> {
        self.record(LinkCall::SetVelocity(velocity))
    }

    async fn set_yaw_rate(&mut self, rate_dps: f32, _duration: Duration) -> Result<(), LinkError> {
        self.record(LinkCall::SetYawRate(rate_dps))
    }

    async fn flip(&mut self, direction: FlipDirection) -> Result<(), LinkError> {
        self.record(LinkCall::Flip(direction))
    }
}
