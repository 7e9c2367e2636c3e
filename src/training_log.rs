//! Append-only log of labeled feature vectors
//!
//! One row per sample: `label,f0,f1,...,f(2N-1)`. The file and its parent
//! directories are created on the first write.

use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use gesture_pilot_core::FeatureVector;
use tracing::debug;

use crate::error::PilotError;

/// Highest label a digit key can select.
pub const MAX_LABEL: u8 = 9;

pub struct TrainingLog {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    rows: usize,
}

impl TrainingLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            writer: None,
            rows: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Rows written by this instance.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Append one labeled sample and flush it.
    pub fn append(&mut self, label: u8, features: &FeatureVector) -> Result<(), PilotError> {
        if label > MAX_LABEL {
            return Err(PilotError::InvalidLabel(label));
        }

        let mut row = label.to_string();
        for value in features.iter() {
            row.push(',');
            row.push_str(&value.to_string());
        }

        let writer = self.writer()?;
        writeln!(writer, "{row}")?;
        writer.flush()?;
        self.rows += 1;
        debug!("Logged training sample with label {}", label);
        Ok(())
    }

    fn writer(&mut self) -> Result<&mut BufWriter<File>, PilotError> {
        if self.writer.is_none() {
            if let Some(parent) = self.path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent)?;
                }
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)?;
            self.writer = Some(BufWriter::new(file));
        }
        self.writer
            .as_mut()
            .ok_or_else(|| PilotError::InvalidConfig("training log not open".to_string()))
    }
}

impl std::fmt::Debug for TrainingLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrainingLog")
            .field("path", &self.path)
            .field("open", &self.writer.is_some())
            .field("rows", &self.rows)
            .finish()
    }
}
