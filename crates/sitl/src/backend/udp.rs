//! UDP text-command link.
//!
//! Speaks the ASCII command protocol used by small consumer quadcopters:
//! one command per datagram, answered with `ok` or `error ...`. Stick
//! commands (`rc lr fb ud yaw`) are not acknowledged; they are held for the
//! requested duration and followed by a neutral `rc 0 0 0 0`.

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use gesture_pilot_core::{DroneLink, FlipDirection, LinkError, MovementFrame, Velocity};
use serde::Deserialize;
use tokio::net::UdpSocket;
use tokio::time::timeout;
use tracing::{debug, trace};

/// Configuration for the UDP command link.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct UdpLinkConfig {
    /// Command address of the vehicle.
    pub drone_addr: SocketAddr,
    /// Local port to bind. 0 picks an ephemeral port.
    pub local_port: u16,
    /// Timeout in milliseconds for replies to `command` and `flip`.
    pub response_timeout_ms: u32,
    /// Stick units per m/s for `rc` commands.
    pub rc_per_mps: f32,
    /// Stick units per degree/s for the `rc` yaw channel.
    pub rc_per_dps: f32,
}

impl Default for UdpLinkConfig {
    fn default() -> Self {
        Self {
            drone_addr: SocketAddr::from(([192, 168, 10, 1], 8889)),
            local_port: 0,
            response_timeout_ms: 1000,
            rc_per_mps: 20.0,
            rc_per_dps: 1.0,
        }
    }
}

/// Stick channels in the range [-100, 100].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RcChannels {
    pub left_right: i32,
    pub forward_back: i32,
    pub up_down: i32,
    pub yaw: i32,
}

impl RcChannels {
    pub fn to_command(self) -> String {
        format!(
            "rc {} {} {} {}",
            self.left_right, self.forward_back, self.up_down, self.yaw
        )
    }
}

/// [`DroneLink`] over the UDP text-command protocol.
pub struct UdpCommandLink {
    config: UdpLinkConfig,
    socket: Option<UdpSocket>,
    recv_buf: Vec<u8>,
}

impl UdpCommandLink {
    pub fn new(config: UdpLinkConfig) -> Self {
        Self {
            config,
            socket: None,
            recv_buf: vec![0u8; 1024],
        }
    }

    /// Create with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(UdpLinkConfig::default())
    }

    pub fn is_connected(&self) -> bool {
        self.socket.is_some()
    }

    /// Map a body-frame velocity (x forward, y right, z up) to stick values.
    pub fn velocity_channels(&self, velocity: Velocity) -> RcChannels {
        let scale = self.config.rc_per_mps;
        RcChannels {
            left_right: stick(velocity.vy * scale),
            forward_back: stick(velocity.vx * scale),
            up_down: stick(velocity.vz * scale),
            yaw: 0,
        }
    }

    pub fn yaw_channels(&self, rate_dps: f32) -> RcChannels {
        RcChannels {
            yaw: stick(rate_dps * self.config.rc_per_dps),
            ..Default::default()
        }
    }

    fn response_timeout(&self) -> Duration {
        Duration::from_millis(self.config.response_timeout_ms as u64)
    }

    async fn send(&self, text: &str) -> Result<(), LinkError> {
        let socket = self.socket.as_ref().ok_or(LinkError::NotConnected)?;
        trace!("-> {}", text);
        socket.send(text.as_bytes()).await?;
        Ok(())
    }

    /// Send a command and wait for its `ok` / `error` reply.
    async fn request(
        &mut self,
        command: &'static str,
        text: &str,
        wait: Duration,
    ) -> Result<(), LinkError> {
        self.send(text).await?;
        let socket = self.socket.as_ref().ok_or(LinkError::NotConnected)?;

        match timeout(wait, socket.recv(&mut self.recv_buf)).await {
            Ok(Ok(len)) => {
                let reply = std::str::from_utf8(&self.recv_buf[..len])
                    .map_err(|e| LinkError::Protocol(format!("Invalid UTF-8 in reply: {e}")))?
                    .trim();
                trace!("<- {}", reply);
                parse_reply(command, reply)
            }
            Ok(Err(e)) => Err(LinkError::Io(e)),
            Err(_) => Err(LinkError::Timeout(command)),
        }
    }

    /// Hold stick values for `duration`, then center the sticks.
    async fn hold(&self, channels: RcChannels, duration: Duration) -> Result<(), LinkError> {
        self.send(&channels.to_command()).await?;
        tokio::time::sleep(duration).await;
        self.send(&RcChannels::default().to_command()).await
    }
}

impl std::fmt::Debug for UdpCommandLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UdpCommandLink")
            .field("drone_addr", &self.config.drone_addr)
            .field("connected", &self.is_connected())
            .finish()
    }
}

#[async_trait]
impl DroneLink for UdpCommandLink {
    fn backend(&self) -> &'static str {
        "udp"
    }

    fn movement_frame(&self) -> MovementFrame {
        MovementFrame::Body
    }

    async fn connect(&mut self) -> Result<(), LinkError> {
        let local_addr: SocketAddr = ([0, 0, 0, 0], self.config.local_port).into();
        let socket = UdpSocket::bind(local_addr).await.map_err(|e| {
            LinkError::ConnectionFailed(format!(
                "Failed to bind command socket on port {}: {e}",
                self.config.local_port
            ))
        })?;
        socket.connect(self.config.drone_addr).await.map_err(|e| {
            LinkError::ConnectionFailed(format!(
                "Failed to connect command socket to {}: {e}",
                self.config.drone_addr
            ))
        })?;
        self.socket = Some(socket);

        // Enter command mode; no reply means nobody is listening
        let wait = self.response_timeout();
        if let Err(e) = self.request("command", "command", wait).await {
            self.socket = None;
            return Err(LinkError::ConnectionFailed(format!(
                "{} did not enter command mode: {e}",
                self.config.drone_addr
            )));
        }
        debug!("Command mode entered on {}", self.config.drone_addr);
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), LinkError> {
        match self.socket.take() {
            Some(_) => Ok(()),
            None => Err(LinkError::NotConnected),
        }
    }

    async fn takeoff(&mut self, timeout: Duration) -> Result<(), LinkError> {
        self.request("takeoff", "takeoff", timeout).await
    }

    async fn land(&mut self, timeout: Duration) -> Result<(), LinkError> {
        self.request("land", "land", timeout).await
    }

    async fn set_velocity(
        &mut self,
        velocity: Velocity,
        duration: Duration,
    ) -> Result<(), LinkError> {
        let channels = self.velocity_channels(velocity);
        self.hold(channels, duration).await
    }

    async fn set_yaw_rate(&mut self, rate_dps: f32, duration: Duration) -> Result<(), LinkError> {
        let channels = self.yaw_channels(rate_dps);
        self.hold(channels, duration).await
    }

    async fn flip(&mut self, direction: FlipDirection) -> Result<(), LinkError> {
        let text = format!("flip {}", flip_code(direction));
        let wait = self.response_timeout();
        self.request("flip", &text, wait).await
    }
}

/// Interpret a command reply.
pub fn parse_reply(command: &'static str, reply: &str) -> Result<(), LinkError> {
    if reply.eq_ignore_ascii_case("ok") {
        return Ok(());
    }
    if let Some(reason) = reply.strip_prefix("error") {
        let reason = reason.trim();
        return Err(LinkError::Rejected {
            command,
            reason: if reason.is_empty() {
                "error".to_string()
            } else {
                reason.to_string()
            },
        });
    }
    Err(LinkError::Protocol(format!(
        "Unexpected reply to {command}: {reply:?}"
    )))
}

fn flip_code(direction: FlipDirection) -> char {
    match direction {
        FlipDirection::Front => 'f',
        FlipDirection::Back => 'b',
        FlipDirection::Left => 'l',
        FlipDirection::Right => 'r',
    }
}

/// Round and clamp a stick value to [-100, 100].
fn stick(value: f32) -> i32 {
    if !value.is_finite() {
        return 0;
    }
    value.round().clamp(-100.0, 100.0) as i32
}
