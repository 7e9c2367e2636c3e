//! Operator feedback

use gesture_pilot_core::{BoundingRect, FlightState};
use tracing::info;

/// Overlay colour in RGB.
pub type Rgb = [u8; 3];

const NORMAL_COLOUR: Rgb = [0, 0, 255];
const TRAINING_COLOUR: Rgb = [0, 255, 0];

/// Everything drawn on top of a frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overlay {
    /// Display name of the last classification.
    pub gesture: Option<String>,
    pub training: bool,
    /// Training label selected for the last processed frame.
    pub label: Option<u8>,
    /// Rectangle around the hand in the last processed frame.
    pub hand: Option<BoundingRect>,
    /// None in detection-only mode.
    pub flight: Option<FlightState>,
}

impl Overlay {
    /// Blue normally, green in training mode.
    pub fn colour(&self) -> Rgb {
        if self.training {
            TRAINING_COLOUR
        } else {
            NORMAL_COLOUR
        }
    }

    /// One-line status text.
    pub fn status_line(&self) -> String {
        let gesture = self.gesture.as_deref().unwrap_or("-");
        let mut line = format!("gesture: {gesture}");
        if self.training {
            match self.label {
                Some(label) => line.push_str(&format!(" | training (label {label})")),
                None => line.push_str(" | training"),
            }
        }
        match &self.flight {
            Some(state) => line.push_str(&format!(
                " | {} alt {:.0} cm yaw {:.0}°",
                state.phase.as_str(),
                state.altitude_cm,
                state.heading_deg()
            )),
            None => line.push_str(" | detection only"),
        }
        line
    }
}

/// Renders feedback for the operator once per loop iteration.
pub trait FeedbackSink<F> {
    /// `frame` is the latest frame, if any has been captured.
    fn render(&mut self, frame: Option<&F>, overlay: &Overlay);
}

/// Writes the status line to the log whenever it changes.
#[derive(Debug, Default)]
pub struct LogFeedback {
    last: Option<String>,
}

impl LogFeedback {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<F> FeedbackSink<F> for LogFeedback {
    fn render(&mut self, _frame: Option<&F>, overlay: &Overlay) {
        let line = overlay.status_line();
        if self.last.as_deref() != Some(line.as_str()) {
            info!("{}", line);
            self.last = Some(line);
        }
    }
}
