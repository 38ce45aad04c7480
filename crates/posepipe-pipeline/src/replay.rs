//! Estimator that replays recorded results.
//!
//! The recording is a JSON array with one entry per frame. An entry is either
//! a landmark set (an array of `{"x", "y", "z"}` objects, empty for "no pose")
//! or a scripted failure:
//!
//! ```json
//! [
//!   [{"x": 0.1, "y": 0.2, "z": -0.3}],
//!   [],
//!   {"error": "transient", "message": "motion blur"}
//! ]
//! ```

use std::path::Path;

use posepipe_wire::{LandmarkSet, RawFrame};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::estimator::{EstimatorError, PoseEstimator};

/// One recorded estimator result.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ReplayEntry {
    Landmarks(LandmarkSet),
    Failure {
        error: ReplayFailure,
        #[serde(default)]
        message: String,
    },
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReplayFailure {
    Transient,
    Fatal,
}

/// Replays recorded landmark sets, one per frame.
///
/// When the recording runs out it either starts over (`looping`) or reports
/// no pose for every further frame.
#[derive(Debug, Clone)]
pub struct ReplayEstimator {
    entries: Vec<ReplayEntry>,
    position: usize,
    looping: bool,
    exhausted_logged: bool,
}

impl ReplayEstimator {
    pub fn new(entries: Vec<ReplayEntry>) -> Self {
        Self {
            entries,
            position: 0,
            looping: false,
            exhausted_logged: false,
        }
    }

    /// Load a recording from a JSON file.
    ///
    /// A missing or unparsable file is a fatal estimator error, the same as a
    /// model that fails to load.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, EstimatorError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|err| {
            EstimatorError::fatal(format!("failed reading {}: {err}", path.display()))
        })?;
        let estimator = Self::from_json(&text).map_err(|err| match err {
            EstimatorError::Fatal(msg) => {
                EstimatorError::fatal(format!("{}: {msg}", path.display()))
            }
            other => other,
        })?;
        debug!(?path, entries = estimator.entries.len(), "loaded replay recording");
        Ok(estimator)
    }

    /// Parse a recording from JSON text.
    pub fn from_json(text: &str) -> Result<Self, EstimatorError> {
        let entries: Vec<ReplayEntry> = serde_json::from_str(text)
            .map_err(|err| EstimatorError::fatal(format!("invalid replay recording: {err}")))?;
        Ok(Self::new(entries))
    }

    /// Restart from the first entry when the recording runs out.
    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn next_entry(&mut self) -> Option<&ReplayEntry> {
        if self.position >= self.entries.len() {
            if !self.looping || self.entries.is_empty() {
                return None;
            }
            self.position = 0;
        }
        let entry = self.entries.get(self.position);
        self.position += 1;
        entry
    }
}

impl PoseEstimator for ReplayEstimator {
    fn estimate(&mut self, frame: &RawFrame) -> Result<LandmarkSet, EstimatorError> {
        match self.next_entry().cloned() {
            Some(ReplayEntry::Landmarks(set)) => Ok(set),
            Some(ReplayEntry::Failure { error, message }) => Err(match error {
                ReplayFailure::Transient => EstimatorError::Transient(message),
                ReplayFailure::Fatal => EstimatorError::Fatal(message),
            }),
            None => {
                if !self.exhausted_logged {
                    warn!(frame = frame.index(), "replay recording exhausted; reporting no pose");
                    self.exhausted_logged = true;
                }
                Ok(LandmarkSet::empty())
            }
        }
    }

    fn name(&self) -> &str {
        "replay"
    }
}
