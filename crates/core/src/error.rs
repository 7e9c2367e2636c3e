//! Error types
//!
//! `LinkError` covers both failure classes of a vehicle link: failing to
//! reach the vehicle at all (connection) and a single command being refused
//! or timing out (action). Callers at a fault boundary use
//! [`LinkError::is_connection`] to tell them apart.

/// Errors reported by a [`DroneLink`](crate::link::DroneLink) backend.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Link is not connected")]
    NotConnected,

    #[error("Command {command} rejected: {reason}")]
    Rejected {
        command: &'static str,
        reason: String,
    },

    #[error("Timeout waiting for {0}")]
    Timeout(&'static str),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LinkError {
    /// True when the vehicle could not be reached, as opposed to a single
    /// command failing on a live link.
    pub fn is_connection(&self) -> bool {
        matches!(
            self,
            LinkError::ConnectionFailed(_) | LinkError::NotConnected | LinkError::Io(_)
        )
    }
}

/// Errors constructing landmark data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LandmarkError {
    #[error("Landmark frame must contain at least one point")]
    Empty,

    #[error("Expected {expected} landmarks, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
}

/// Errors raised by a keypoint classifier model.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClassifierError {
    #[error("Invalid classifier input: {0}")]
    InvalidInput(String),

    #[error("Model error: {0}")]
    Model(String),
}
