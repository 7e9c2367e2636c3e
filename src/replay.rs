//! Recorded landmark replay
//!
//! Stands in for a camera plus hand-pose detector. Each line of a replay
//! file is one frame:
//!
//! ```json
//! {"width": 960, "height": 540, "hands": [[[0.51, 0.62], [0.48, 0.55]]]}
//! ```
//!
//! Hand coordinates are image-relative in `[0, 1]`, as a pose detector
//! reports them. An empty `hands` array is a frame without a hand.

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

use gesture_pilot_core::LandmarkFrame;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::control_loop::HandDetector;
use crate::error::CaptureError;
use crate::frame_source::FrameCapture;

/// One recorded frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayFrame {
    pub width: u32,
    pub height: u32,
    #[serde(default)]
    pub hands: Vec<Vec<[f32; 2]>>,
}

/// [`FrameCapture`] reading a replay file line by line.
pub struct ReplayCapture<R = BufReader<File>> {
    lines: Lines<R>,
    line: usize,
}

impl ReplayCapture {
    pub fn open(path: &Path) -> Result<Self, CaptureError> {
        let file = File::open(path)?;
        Ok(Self::from_reader(BufReader::new(file)))
    }
}

impl<R: BufRead> ReplayCapture<R> {
    pub fn from_reader(reader: R) -> Self {
        Self {
            lines: reader.lines(),
            line: 0,
        }
    }
}

impl<R: BufRead + Send + 'static> FrameCapture for ReplayCapture<R> {
    type Frame = ReplayFrame;

    fn capture(&mut self) -> Result<ReplayFrame, CaptureError> {
        loop {
            let Some(line) = self.lines.next() else {
                return Err(CaptureError::EndOfStream);
            };
            let line = line?;
            self.line += 1;
            if line.trim().is_empty() {
                continue;
            }
            return serde_json::from_str(&line)
                .map_err(|e| CaptureError::Parse(format!("line {}: {e}", self.line)));
        }
    }

    fn release(&mut self) {
        debug!("Replay released after {} lines", self.line);
    }
}

/// [`HandDetector`] for replay frames: converts recorded hands to pixels.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReplayDetector;

impl HandDetector<ReplayFrame> for ReplayDetector {
    fn detect(&mut self, frame: &ReplayFrame) -> Vec<LandmarkFrame> {
        frame
            .hands
            .iter()
            .filter_map(|hand| {
                let points: Vec<(f32, f32)> = hand.iter().map(|&[x, y]| (x, y)).collect();
                LandmarkFrame::from_relative(&points, frame.width, frame.height).ok()
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gesture_pilot_core::PixelPoint;
    use std::io::Cursor;

    const REPLAY: &str = r#"{"width": 100, "height": 50, "hands": [[[0.5, 0.5], [1.0, 1.0]]]}

{"width": 100, "height": 50, "hands": []}
{"width": 100, "height": 50}
"#;

    #[test]
    fn test_reads_frames_until_end() {
        let mut capture = ReplayCapture::from_reader(Cursor::new(REPLAY));

        let first = capture.capture().unwrap();
        assert_eq!(first.hands.len(), 1);
        assert_eq!(capture.capture().unwrap().hands.len(), 0);
        assert!(capture.capture().unwrap().hands.is_empty());
        assert!(matches!(capture.capture(), Err(CaptureError::EndOfStream)));
    }

    #[test]
    fn test_malformed_line_is_parse_error() {
        let mut capture = ReplayCapture::from_reader(Cursor::new("{\"width\": 1}\n"));
        match capture.capture() {
            Err(CaptureError::Parse(msg)) => assert!(msg.starts_with("line 1")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_detector_converts_to_pixels() {
        let frame = ReplayFrame {
            width: 100,
            height: 50,
            hands: vec![vec![[0.5, 0.5], [1.0, 1.0]], vec![]],
        };
        let hands = ReplayDetector.detect(&frame);

        // The empty hand is dropped
        assert_eq!(hands.len(), 1);
        assert_eq!(
            hands[0].points(),
            &[PixelPoint::new(50, 25), PixelPoint::new(99, 49)]
        );
    }
}
