//! Class id to gesture mapping table

use serde::{Deserialize, Serialize};

use super::GestureId;

/// One row of the gesture table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GestureEntry {
    /// Class id produced by the keypoint model.
    pub class_id: usize,
    pub gesture: GestureId,
    /// Display name shown in the feedback overlay.
    pub name: String,
}

/// Mapping from classifier output to semantic gestures.
///
/// Loaded from configuration; class ids not in the table classify as
/// unknown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GestureTable {
    entries: Vec<GestureEntry>,
}

impl GestureTable {
    pub fn new(entries: Vec<GestureEntry>) -> Self {
        Self { entries }
    }

    pub fn lookup(&self, class_id: usize) -> Option<&GestureEntry> {
        self.entries.iter().find(|e| e.class_id == class_id)
    }

    /// Display name for a gesture, falling back to its identifier.
    pub fn name_of(&self, gesture: GestureId) -> &str {
        self.entries
            .iter()
            .find(|e| e.gesture == gesture)
            .map(|e| e.name.as_str())
            .unwrap_or(gesture.as_str())
    }

    pub fn entries(&self) -> &[GestureEntry] {
        &self.entries
    }

    /// Rejects tables that map the same class id twice.
    pub fn validate(&self) -> Result<(), String> {
        for (i, entry) in self.entries.iter().enumerate() {
            if self.entries[..i].iter().any(|e| e.class_id == entry.class_id) {
                return Err(format!("class id {} mapped more than once", entry.class_id));
            }
        }
        Ok(())
    }
}

impl Default for GestureTable {
    fn default() -> Self {
        let rows = [
            (0, GestureId::Open, "Open"),
            (1, GestureId::Closed, "Closed fist"),
            (2, GestureId::Pointing, "Pointer"),
            (3, GestureId::Ok, "OK"),
            (4, GestureId::PeaceSign, "Peace sign"),
            (5, GestureId::Flip, "F Finger"),
            (6, GestureId::Shaka, "Shaka"),
        ];
        Self {
            entries: rows
                .into_iter()
                .map(|(class_id, gesture, name)| GestureEntry {
                    class_id,
                    gesture,
                    name: name.to_string(),
                })
                .collect(),
        }
    }
}
