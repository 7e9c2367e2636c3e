//! Application error types

use std::path::PathBuf;

/// Errors raised while setting up or running the pilot application.
#[derive(Debug, thiserror::Error)]
pub enum PilotError {
    #[error("Failed to parse configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Dataset error at line {line}: {reason}")]
    Dataset { line: usize, reason: String },

    #[error("Training label {0} is outside 0-9")]
    InvalidLabel(u8),
}

/// Errors raised by a frame capture device.
#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    /// The source has no more frames.
    #[error("End of stream")]
    EndOfStream,

    #[error("Capture device error: {0}")]
    Device(String),

    #[error("Malformed frame: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
