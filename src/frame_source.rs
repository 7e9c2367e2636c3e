//! Latest-frame acquisition on a dedicated thread
//!
//! The acquisition thread overwrites a single mutex-guarded slot; readers
//! clone the `Arc` out of it and never observe a partially written frame.
//! The thread never waits for consumers.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::FrameSourceConfig;
use crate::error::CaptureError;

/// A camera or other frame producer.
///
/// `capture` blocks until the next frame is available. A panic inside it is
/// treated as a device failure. `release` is called exactly once, from the
/// acquisition thread, after the last capture.
pub trait FrameCapture: Send + 'static {
    type Frame: Send + Sync + 'static;

    fn capture(&mut self) -> Result<Self::Frame, CaptureError>;

    fn release(&mut self);
}

/// A captured frame and its position in the stream.
#[derive(Debug)]
pub struct Snapshot<F> {
    pub frame: Arc<F>,
    /// Starts at 1 and increases by one per captured frame.
    pub sequence: u64,
}

impl<F> Clone for Snapshot<F> {
    fn clone(&self) -> Self {
        Self {
            frame: Arc::clone(&self.frame),
            sequence: self.sequence,
        }
    }
}

/// Acquisition status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamStatus {
    Running,
    /// Terminal: the device failed, ran out of frames or was stopped.
    Stopped,
}

struct Shared<F> {
    slot: Mutex<Option<Snapshot<F>>>,
    stopped: AtomicBool,
    stop_requested: AtomicBool,
}

impl<F> Shared<F> {
    fn slot(&self) -> MutexGuard<'_, Option<Snapshot<F>>> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Continuously captures frames and exposes only the most recent one.
pub struct FrameSource<F> {
    shared: Arc<Shared<F>>,
    handle: Option<JoinHandle<()>>,
}

impl<F: Send + Sync + 'static> FrameSource<F> {
    /// Spawn the acquisition thread.
    pub fn start<C>(capture: C, config: &FrameSourceConfig) -> std::io::Result<Self>
    where
        C: FrameCapture<Frame = F>,
    {
        let shared = Arc::new(Shared {
            slot: Mutex::new(None),
            stopped: AtomicBool::new(false),
            stop_requested: AtomicBool::new(false),
        });

        let worker = Arc::clone(&shared);
        let interval = config.min_interval();
        let handle = thread::Builder::new()
            .name(config.thread_name.clone())
            .spawn(move || acquire(capture, &worker, interval))?;

        debug!("Frame source started on thread '{}'", config.thread_name);
        Ok(Self {
            shared,
            handle: Some(handle),
        })
    }

    /// Latest captured frame, or `None` if nothing was captured yet.
    ///
    /// After the source stops this keeps returning the last good frame.
    pub fn read(&self) -> Option<Snapshot<F>> {
        self.shared.slot().clone()
    }

    pub fn status(&self) -> StreamStatus {
        if self.shared.stopped.load(Ordering::Acquire) {
            StreamStatus::Stopped
        } else {
            StreamStatus::Running
        }
    }

    /// Ask the acquisition thread to exit and wait for it.
    ///
    /// Returns once the device has been released. Calling it again is a
    /// no-op.
    pub fn stop(&mut self) {
        self.shared.stop_requested.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Frame acquisition thread panicked");
                self.shared.stopped.store(true, Ordering::Release);
            }
        }
    }
}

impl<F> Drop for FrameSource<F> {
    fn drop(&mut self) {
        self.shared.stop_requested.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn acquire<C: FrameCapture>(mut capture: C, shared: &Shared<C::Frame>, interval: Duration) {
    let mut sequence = 0u64;

    while !shared.stop_requested.load(Ordering::Acquire) {
        match capture_guarded(&mut capture) {
            Ok(frame) => {
                sequence += 1;
                *shared.slot() = Some(Snapshot {
                    frame: Arc::new(frame),
                    sequence,
                });
            }
            Err(CaptureError::EndOfStream) => {
                info!("Frame stream ended after {} frames", sequence);
                break;
            }
            Err(e) => {
                warn!("Frame capture failed, stopping stream: {}", e);
                break;
            }
        }
        if !interval.is_zero() {
            thread::sleep(interval);
        }
    }

    capture.release();
    shared.stopped.store(true, Ordering::Release);
}

/// Run one capture, turning a driver panic into `CaptureError::Device`.
fn capture_guarded<C: FrameCapture>(capture: &mut C) -> Result<C::Frame, CaptureError> {
    panic::catch_unwind(AssertUnwindSafe(|| capture.capture())).unwrap_or_else(|payload| {
        let reason = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        Err(CaptureError::Device(format!("capture panicked: {reason}")))
    })
}
