//! Nearest-sample keypoint model
//!
//! Classifies a feature vector with the label of the closest row of a
//! training log (squared Euclidean distance). There is no training step:
//! recording more rows with training mode is the whole workflow.

use std::path::Path;

use gesture_pilot_core::{ClassifierError, FeatureVector, KeypointModel};
use tracing::info;

use crate::error::PilotError;

#[derive(Debug, Clone, PartialEq)]
struct Sample {
    label: usize,
    features: Vec<f32>,
}

/// 1-nearest-neighbour model over labeled samples.
#[derive(Debug, Clone, Default)]
pub struct NearestSampleModel {
    samples: Vec<Sample>,
}

impl NearestSampleModel {
    /// Parse rows in the training log format.
    pub fn parse(text: &str) -> Result<Self, PilotError> {
        let mut samples = Vec::new();
        for (index, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            samples.push(parse_row(line).map_err(|reason| PilotError::Dataset {
                line: index + 1,
                reason,
            })?);
        }
        Ok(Self { samples })
    }

    pub fn load(path: &Path) -> Result<Self, PilotError> {
        let text = std::fs::read_to_string(path).map_err(|source| PilotError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let model = Self::parse(&text)?;
        info!(
            "Loaded {} reference samples from {}",
            model.len(),
            path.display()
        );
        Ok(model)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

impl KeypointModel for NearestSampleModel {
    fn infer(&mut self, features: &FeatureVector) -> Result<usize, ClassifierError> {
        if self.samples.is_empty() {
            return Err(ClassifierError::Model("no reference samples".to_string()));
        }

        let input = features.as_slice();
        let nearest = self
            .samples
            .iter()
            .filter(|s| s.features.len() == input.len())
            .map(|s| (s.label, squared_distance(&s.features, input)))
            .min_by(|a, b| a.1.total_cmp(&b.1));

        match nearest {
            Some((label, _)) => Ok(label),
            None => Err(ClassifierError::InvalidInput(format!(
                "no reference sample has {} features",
                input.len()
            ))),
        }
    }
}

fn parse_row(line: &str) -> Result<Sample, String> {
    let mut fields = line.split(',').map(str::trim);
    let label = fields
        .next()
        .ok_or("empty row")?
        .parse::<usize>()
        .map_err(|e| format!("invalid label: {e}"))?;
    let features = fields
        .map(|f| f.parse::<f32>().map_err(|e| format!("invalid feature {f:?}: {e}")))
        .collect::<Result<Vec<_>, _>>()?;
    if features.is_empty() {
        return Err("row has no features".to_string());
    }
    Ok(Sample { label, features })
}

fn squared_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}
