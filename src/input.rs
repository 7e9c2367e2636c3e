//! Interactive controls

use std::collections::VecDeque;
use std::io::BufRead;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use tracing::debug;

const KEY_ESCAPE: u32 = 27;
const KEY_SPACE: u32 = 32;

/// A recognized control key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlInput {
    Quit,
    ToggleTraining,
    /// Digit key selecting the training label.
    Label(u8),
    EmergencyStop,
}

impl ControlInput {
    /// Decode a raw key code. Unbound keys yield `None`.
    pub fn from_key_code(code: u32) -> Option<Self> {
        match code {
            KEY_ESCAPE => Some(ControlInput::Quit),
            KEY_SPACE => Some(ControlInput::EmergencyStop),
            c if c == u32::from(b'q') => Some(ControlInput::Quit),
            c if c == u32::from(b't') => Some(ControlInput::ToggleTraining),
            c if (u32::from(b'0')..=u32::from(b'9')).contains(&c) => {
                Some(ControlInput::Label((c - u32::from(b'0')) as u8))
            }
            _ => None,
        }
    }
}

/// Source of raw key codes, polled once per loop iteration.
pub trait KeySource {
    /// Next pending key code, or `None` when no key is waiting.
    fn poll(&mut self) -> Option<u32>;
}

/// Key codes from a fixed script, one entry per poll.
///
/// `None` entries are polls without a key press. Once the script runs out
/// every poll returns escape, so a scripted session always ends.
#[derive(Debug, Clone, Default)]
pub struct ScriptedKeys {
    script: VecDeque<Option<u32>>,
}

impl ScriptedKeys {
    pub fn new(script: impl IntoIterator<Item = Option<u32>>) -> Self {
        Self {
            script: script.into_iter().collect(),
        }
    }

    /// Script from characters; `.` is a poll without a key.
    pub fn from_chars(keys: &str) -> Self {
        Self::new(keys.chars().map(|c| match c {
            '.' => None,
            c => Some(c as u32),
        }))
    }
}

impl KeySource for ScriptedKeys {
    fn poll(&mut self) -> Option<u32> {
        match self.script.pop_front() {
            Some(entry) => entry,
            None => Some(KEY_ESCAPE),
        }
    }
}

/// Keys typed on standard input, one line at a time.
///
/// A reader thread forwards every character of each line; an empty line
/// stands for the space bar. Closing stdin does not quit.
pub struct StdinKeys {
    rx: Receiver<u32>,
}

impl StdinKeys {
    pub fn spawn() -> std::io::Result<Self> {
        let (tx, rx) = mpsc::channel();
        thread::Builder::new()
            .name("stdin-keys".to_string())
            .spawn(move || {
                let stdin = std::io::stdin();
                for line in stdin.lock().lines() {
                    let Ok(line) = line else { break };
                    let codes: Vec<u32> = if line.is_empty() {
                        vec![KEY_SPACE]
                    } else {
                        line.chars().map(|c| c as u32).collect()
                    };
                    for code in codes {
                        if tx.send(code).is_err() {
                            return;
                        }
                    }
                }
                debug!("stdin closed");
            })?;
        Ok(Self { rx })
    }
}

impl KeySource for StdinKeys {
    fn poll(&mut self) -> Option<u32> {
        match self.rx.try_recv() {
            Ok(code) => Some(code),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }
}
