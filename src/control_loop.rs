//! Gesture control loop
//!
//! Single cooperative task that ties the pipeline together:
//!
//! 1. Poll keys; an emergency stop is handled before anything else
//! 2. End the session if the frame source stopped, after processing its last
//!    unseen frame
//! 3. Once per sampling interval, take the latest unseen frame, detect the
//!    first hand, normalize, log a training row, classify and dispatch
//! 4. Render feedback and sleep for the poll interval
//!
//! Flight commands are awaited inline, so sampling pauses while the vehicle
//! executes a command. No error escapes the loop; on exit the vehicle is
//! shut down (disconnected exactly once) and the frame source stopped.

use gesture_pilot_core::{
    normalize, Classification, FlightEvent, FlightStateMachine, GestureClassifier,
    LandmarkFrame, Outcome, TimeSource,
};
use tracing::{debug, error, info, warn};

use crate::config::ControlConfig;
use crate::feedback::{FeedbackSink, Overlay};
use crate::frame_source::{FrameSource, Snapshot, StreamStatus};
use crate::input::{ControlInput, KeySource};
use crate::training_log::TrainingLog;

/// Hand-pose detector: zero or more hands per frame.
pub trait HandDetector<F> {
    fn detect(&mut self, frame: &F) -> Vec<LandmarkFrame>;
}

/// Why the loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// The operator pressed a quit key.
    Quit,
    /// The frame source stopped.
    StreamEnded,
}

/// Counters reported when the loop ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub exit: ExitReason,
    pub frames_processed: u64,
    pub gestures_dispatched: u64,
    pub emergency_stops: u64,
    pub training_rows: usize,
}

pub struct ControlLoop<F, T> {
    source: FrameSource<F>,
    detector: Box<dyn HandDetector<F>>,
    classifier: Option<GestureClassifier>,
    flight: Option<FlightStateMachine>,
    feedback: Box<dyn FeedbackSink<F>>,
    keys: Box<dyn KeySource>,
    training_log: TrainingLog,
    clock: T,
    config: ControlConfig,

    training: bool,
    pending_label: Option<u8>,
    last_sample_us: Option<u64>,
    last_sequence: u64,
    overlay: Overlay,
    summary: Counters,
}

#[derive(Debug, Default)]
struct Counters {
    frames_processed: u64,
    gestures_dispatched: u64,
    emergency_stops: u64,
}

impl<F: Send + Sync + 'static, T: TimeSource> ControlLoop<F, T> {
    pub fn new(
        source: FrameSource<F>,
        detector: Box<dyn HandDetector<F>>,
        feedback: Box<dyn FeedbackSink<F>>,
        keys: Box<dyn KeySource>,
        clock: T,
        config: ControlConfig,
    ) -> Self {
        let training_log = TrainingLog::new(config.training_log.clone());
        Self {
            source,
            detector,
            classifier: None,
            flight: None,
            feedback,
            keys,
            training_log,
            clock,
            config,
            training: false,
            pending_label: None,
            last_sample_us: None,
            last_sequence: 0,
            overlay: Overlay::default(),
            summary: Counters::default(),
        }
    }

    /// Classify hands with this classifier. Without one, frames are only
    /// normalized and logged for training.
    pub fn with_classifier(mut self, classifier: GestureClassifier) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// Fly this vehicle. Without one, the loop runs detection-only.
    pub fn with_flight(mut self, flight: FlightStateMachine) -> Self {
        self.flight = Some(flight);
        self
    }

    /// Run until the operator quits or the stream ends.
    pub async fn run(mut self) -> RunSummary {
        if self.flight.is_none() {
            warn!("No vehicle link: running detection-only");
        }

        let exit = loop {
            if let Some(exit) = self.poll_keys().await {
                break exit;
            }

            if self.source.status() == StreamStatus::Stopped {
                // The last frame may have landed just before the stream ended
                if let Some(snapshot) = self.next_snapshot() {
                    let now_us = self.clock.now_us();
                    self.process(&snapshot, now_us).await;
                }
                warn!("Frame source stopped, ending session");
                break ExitReason::StreamEnded;
            }

            let now_us = self.clock.now_us();
            if self.sample_due(now_us) {
                self.last_sample_us = Some(now_us);
                if let Some(snapshot) = self.next_snapshot() {
                    self.process(&snapshot, now_us).await;
                }
            }

            self.overlay.training = self.training;
            self.overlay.flight = self.flight.as_ref().map(|f| f.state());
            let latest = self.source.read();
            self.feedback
                .render(latest.as_ref().map(|s| s.frame.as_ref()), &self.overlay);

            tokio::time::sleep(self.config.poll_interval()).await;
        };

        self.finish(exit).await
    }

    /// Drain pending keys. Returns the exit reason when a quit key was seen.
    async fn poll_keys(&mut self) -> Option<ExitReason> {
        let mut quit = false;
        let mut emergency = false;

        while let Some(code) = self.keys.poll() {
            match ControlInput::from_key_code(code) {
                Some(ControlInput::Quit) => quit = true,
                Some(ControlInput::EmergencyStop) => emergency = true,
                Some(ControlInput::ToggleTraining) => {
                    self.training = !self.training;
                    info!(
                        "Training mode {}",
                        if self.training { "on" } else { "off" }
                    );
                }
                Some(ControlInput::Label(label)) => self.pending_label = Some(label),
                None => debug!("Unbound key code {}", code),
            }
            if quit {
                break;
            }
        }

        if emergency {
            self.emergency_stop().await;
        }
        quit.then_some(ExitReason::Quit)
    }

    async fn emergency_stop(&mut self) {
        let now_us = self.clock.now_us();
        match self.flight.as_mut() {
            Some(flight) => {
                self.summary.emergency_stops += 1;
                let outcome = flight.dispatch(FlightEvent::EmergencyStop, now_us).await;
                debug!("Emergency stop outcome: {:?}", outcome);
            }
            None => warn!("Emergency stop ignored: no vehicle link"),
        }
    }

    fn sample_due(&self, now_us: u64) -> bool {
        match self.last_sample_us {
            Some(last) => now_us.saturating_sub(last) >= self.config.sampling_interval_us(),
            None => true,
        }
    }

    /// Latest frame if it has not been processed yet.
    fn next_snapshot(&mut self) -> Option<Snapshot<F>> {
        let snapshot = self.source.read()?;
        if snapshot.sequence == self.last_sequence {
            return None;
        }
        self.last_sequence = snapshot.sequence;
        Some(snapshot)
    }

    async fn process(&mut self, snapshot: &Snapshot<F>, now_us: u64) {
        self.summary.frames_processed += 1;
        let label = self.pending_label.take();
        self.overlay.label = label;

        // Only the first hand is used
        let Some(hand) = self.detector.detect(&snapshot.frame).into_iter().next() else {
            self.overlay.hand = None;
            self.overlay.gesture = None;
            return;
        };
        self.overlay.hand = Some(hand.bounding_rect());

        if let Some(expected) = self.config.landmark_count {
            if let Err(e) = hand.check_len(expected) {
                debug!("Skipping hand: {}", e);
                return;
            }
        }

        let normalized = normalize(&hand);
        if normalized.degenerate {
            debug!("Skipping degenerate hand in frame {}", snapshot.sequence);
            return;
        }

        if self.training {
            if let Some(label) = label {
                if let Err(e) = self.training_log.append(label, &normalized.features) {
                    error!("Failed to write training row: {}", e);
                }
            }
        }

        let Some(classifier) = self.classifier.as_mut() else {
            return;
        };
        let classification = classifier.classify(&normalized.features);
        self.overlay.gesture = Some(classifier.label(classification).to_string());

        let Classification::Gesture(gesture) = classification else {
            return;
        };
        let Some(flight) = self.flight.as_mut() else {
            return;
        };
        match flight.dispatch(gesture.event(), now_us).await {
            Outcome::Executed(command) => {
                self.summary.gestures_dispatched += 1;
                debug!("{} -> {}", gesture, command);
            }
            Outcome::Skipped(reason) => debug!("{} skipped: {:?}", gesture, reason),
            Outcome::Failed(e) => debug!("{} failed: {}", gesture, e),
        }
    }

    async fn finish(mut self, exit: ExitReason) -> RunSummary {
        info!("Control loop exiting: {:?}", exit);

        if let Some(flight) = self.flight.take() {
            if let Err(e) = flight.shutdown().await {
                error!("Vehicle shutdown failed: {}", e);
            }
        }
        self.source.stop();

        let summary = RunSummary {
            exit,
            frames_processed: self.summary.frames_processed,
            gestures_dispatched: self.summary.gestures_dispatched,
            emergency_stops: self.summary.emergency_stops,
            training_rows: self.training_log.rows(),
        };
        info!("Session summary: {:?}", summary);
        summary
    }
}
