use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use gesture_pilot::{
    CaptureError, ControlConfig, ControlLoop, ExitReason, FeedbackSink, FrameCapture,
    FrameSource, FrameSourceConfig, HandDetector, Overlay, ScriptedKeys,
};
use gesture_pilot_core::link::{LinkCall, RecordingLink};
use gesture_pilot_core::{
    ClassifierError, FeatureVector, FlightConfig, FlightStateMachine, GestureClassifier,
    GestureTable, KeypointModel, LandmarkFrame, MonotonicClock, MovementFrame, PixelPoint,
};

/// Numbered frames, `limit` of them, then end of stream.
struct CountingCapture {
    next: u32,
    limit: u32,
    released: Arc<AtomicUsize>,
}

impl FrameCapture for CountingCapture {
    type Frame = u32;

    fn capture(&mut self) -> Result<u32, CaptureError> {
        if self.next >= self.limit {
            return Err(CaptureError::EndOfStream);
        }
        self.next += 1;
        Ok(self.next)
    }

    fn release(&mut self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

/// Every frame shows the same open hand.
struct OneHand;

impl HandDetector<u32> for OneHand {
    fn detect(&mut self, _frame: &u32) -> Vec<LandmarkFrame> {
        let points = vec![
            PixelPoint::new(100, 200),
            PixelPoint::new(120, 150),
            PixelPoint::new(90, 140),
        ];
        vec![LandmarkFrame::new(points).unwrap()]
    }
}

struct FixedModel(usize);

impl KeypointModel for FixedModel {
    fn infer(&mut self, _features: &FeatureVector) -> Result<usize, ClassifierError> {
        Ok(self.0)
    }
}

struct NullFeedback;

impl FeedbackSink<u32> for NullFeedback {
    fn render(&mut self, _frame: Option<&u32>, _overlay: &Overlay) {}
}

struct Harness {
    control: ControlLoop<u32, MonotonicClock>,
    released: Arc<AtomicUsize>,
}

fn harness(frames: u32, keys: ScriptedKeys, log_dir: &Path) -> Harness {
    let released = Arc::new(AtomicUsize::new(0));
    let capture = CountingCapture {
        next: 0,
        limit: frames,
        released: Arc::clone(&released),
    };
    let source_config = FrameSourceConfig {
        thread_name: "test-frames".into(),
        min_interval_ms: 1,
    };
    let source = FrameSource::start(capture, &source_config).unwrap();
    let config = ControlConfig {
        sampling_interval_ms: 0,
        poll_interval_ms: 2,
        landmark_count: None,
        training_log: log_dir.join("model").join("keypoint.csv"),
    };
    let control = ControlLoop::new(
        source,
        Box::new(OneHand),
        Box::new(NullFeedback),
        Box::new(keys),
        MonotonicClock::new(),
        config,
    );
    Harness { control, released }
}

fn flight() -> (FlightStateMachine, RecordingLink) {
    let link = RecordingLink::new(MovementFrame::Body);
    let fsm = FlightStateMachine::new(Box::new(link.clone()), FlightConfig::default());
    (fsm, link)
}

fn classifier(class_id: usize) -> GestureClassifier {
    GestureClassifier::new(Box::new(FixedModel(class_id)), GestureTable::default())
}

fn idle(polls: usize) -> String {
    ".".repeat(polls)
}

#[tokio::test]
async fn unknown_gestures_never_reach_vehicle() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(u32::MAX, ScriptedKeys::from_chars(&idle(30)), dir.path());
    let (fsm, link) = flight();

    let summary = h
        .control
        .with_classifier(classifier(42))
        .with_flight(fsm)
        .run()
        .await;

    assert_eq!(summary.exit, ExitReason::Quit);
    assert!(summary.frames_processed > 0);
    assert_eq!(summary.gestures_dispatched, 0);
    assert_eq!(link.calls(), vec![LinkCall::Disconnect]);
    assert_eq!(h.released.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn stream_end_still_disconnects_once() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(0, ScriptedKeys::from_chars(&idle(100_000)), dir.path());
    let (fsm, link) = flight();

    let summary = h.control.with_flight(fsm).run().await;

    assert_eq!(summary.exit, ExitReason::StreamEnded);
    assert_eq!(summary.frames_processed, 0);
    assert_eq!(link.count("disconnect"), 1);
    assert_eq!(h.released.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn final_frame_is_processed_before_stream_end() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(1, ScriptedKeys::from_chars(&idle(100_000)), dir.path());
    let (fsm, link) = flight();

    let summary = h
        .control
        .with_classifier(classifier(0))
        .with_flight(fsm)
        .run()
        .await;

    assert_eq!(summary.exit, ExitReason::StreamEnded);
    assert_eq!(summary.frames_processed, 1);
    assert_eq!(summary.gestures_dispatched, 1);
    assert_eq!(
        link.calls(),
        vec![LinkCall::Takeoff, LinkCall::Land, LinkCall::Disconnect]
    );
}

#[tokio::test]
async fn open_palm_takes_off_and_lands_on_quit() {
    let dir = tempfile::tempdir().unwrap();
    let h = harness(u32::MAX, ScriptedKeys::from_chars(&idle(30)), dir.path());
    let (fsm, link) = flight();

    let summary = h
        .control
        .with_classifier(classifier(0))
        .with_flight(fsm)
        .run()
        .await;

    let calls = link.calls();
    assert!(summary.gestures_dispatched >= 1);
    assert_eq!(calls.first(), Some(&LinkCall::Takeoff));
    assert_eq!(&calls[calls.len() - 2..], &[LinkCall::Land, LinkCall::Disconnect]);
    assert_eq!(link.count("disconnect"), 1);
}

#[tokio::test]
async fn emergency_key_lands_immediately() {
    let dir = tempfile::tempdir().unwrap();
    let keys = ScriptedKeys::from_chars(&format!(" {}", idle(5)));
    let h = harness(u32::MAX, keys, dir.path());
    let (fsm, link) = flight();

    let summary = h.control.with_flight(fsm).run().await;

    assert_eq!(summary.emergency_stops, 1);
    assert_eq!(link.calls(), vec![LinkCall::Land, LinkCall::Disconnect]);
}

#[tokio::test]
async fn detection_only_without_vehicle() {
    let dir = tempfile::tempdir().unwrap();
    let keys = ScriptedKeys::from_chars(&format!(" {}", idle(20)));
    let h = harness(u32::MAX, keys, dir.path());

    let summary = h.control.with_classifier(classifier(0)).run().await;

    assert_eq!(summary.exit, ExitReason::Quit);
    assert_eq!(summary.gestures_dispatched, 0);
    assert_eq!(summary.emergency_stops, 0);
    assert_eq!(h.released.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn training_rows_need_mode_and_label() {
    let dir = tempfile::tempdir().unwrap();
    // A label without training mode is ignored, then one labeled row
    let keys = ScriptedKeys::from_chars(&format!("5{}t3{}", idle(30), idle(30)));
    let h = harness(u32::MAX, keys, dir.path());

    let summary = h.control.run().await;

    assert_eq!(summary.training_rows, 1);
    let text = fs::read_to_string(dir.path().join("model").join("keypoint.csv")).unwrap();
    let rows: Vec<&str> = text.lines().collect();
    assert_eq!(rows.len(), 1);
    // Label followed by 2N = 6 features, the first point at the origin
    let fields: Vec<&str> = rows[0].split(',').collect();
    assert_eq!(fields.len(), 7);
    assert_eq!(&fields[..3], &["3", "0", "0"]);
}
