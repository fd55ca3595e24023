//! Per-question progress: scheduling state, rolling score and persistence.
//!
//! The whole mapping is held in memory and written back as one JSON value
//! under [`PROGRESS_KEY`] after every mutation. Entries are created the first
//! time a question is graded and only disappear on a full reset or import.

use crate::clock::Clock;
use crate::scheduler::{DEFAULT_EF, Scheduler, SchedulingState};
use crate::storage::KeyValueStore;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Storage key holding the serialized progress mapping
pub const PROGRESS_KEY: &str = "jit_progress_v1";

/// Question id → progress record, kept as raw JSON so imports round-trip
pub type ProgressMap = Map<String, Value>;

/// Full progress record for one question
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProgressRecord {
    pub ef: f64,
    pub interval: i64,
    pub reps: i64,
    /// Next review, epoch ms
    pub due: i64,
    pub score_avg: f64,
    /// Last review, epoch ms
    pub last: i64,
}

impl Default for ProgressRecord {
    fn default() -> Self {
        Self {
            ef: DEFAULT_EF,
            interval: 0,
            reps: 0,
            due: 0,
            score_avg: 0.0,
            last: 0,
        }
    }
}

impl ProgressRecord {
    pub fn scheduling(&self) -> SchedulingState {
        SchedulingState {
            ef: self.ef,
            interval: self.interval,
            reps: self.reps,
            due: self.due,
        }
    }

    fn from_review(state: SchedulingState, score_avg: f64, last: i64) -> Self {
        Self {
            ef: state.ef,
            interval: state.interval,
            reps: state.reps,
            due: state.due,
            score_avg,
            last,
        }
    }
}

/// Why a progress payload could not be used
#[derive(Debug, Error)]
pub enum ProgressError {
    #[error("not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("expected a JSON object at the top level, found {0}")]
    NotAnObject(&'static str),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// What happened when the persisted mapping was read at startup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Nothing had been saved yet
    Empty,
    /// Loaded this many entries
    Loaded(usize),
    /// Persisted data was unusable and replaced by an empty mapping
    Recovered(String),
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Parse a progress mapping, accepting any JSON object without per-entry checks
pub fn parse_mapping(text: &str) -> Result<ProgressMap, ProgressError> {
    match serde_json::from_str::<Value>(text)? {
        Value::Object(map) => Ok(map),
        other => Err(ProgressError::NotAnObject(json_kind(&other))),
    }
}

/// Round to two decimals, halves rounding up. Values too large to scale are
/// returned as-is.
fn round2(value: f64) -> f64 {
    let scaled = value * 100.0;
    if !scaled.is_finite() {
        return value;
    }
    (scaled + 0.5).floor() / 100.0
}

/// Progress for every question, persisted through a key-value store
pub struct ProgressStore<S: KeyValueStore, C: Clock> {
    kv: S,
    scheduler: Scheduler<C>,
    progress: ProgressMap,
    outcome: LoadOutcome,
}

impl<S: KeyValueStore, C: Clock> ProgressStore<S, C> {
    /// Load progress from `kv`. Unreadable or malformed data yields an empty store.
    pub fn open(kv: S, clock: C) -> Self {
        let (progress, outcome) = match Self::load(&kv) {
            Ok(Some(map)) => {
                let count = map.len();
                info!(entries = count, "loaded progress");
                (map, LoadOutcome::Loaded(count))
            }
            Ok(None) => (ProgressMap::new(), LoadOutcome::Empty),
            Err(e) => {
                warn!(error = %e, "discarding unreadable progress");
                (ProgressMap::new(), LoadOutcome::Recovered(e.to_string()))
            }
        };

        Self {
            kv,
            scheduler: Scheduler::new(clock),
            progress,
            outcome,
        }
    }

    fn load(kv: &S) -> Result<Option<ProgressMap>, ProgressError> {
        match kv.get(PROGRESS_KEY)? {
            Some(text) => parse_mapping(&text).map(Some),
            None => Ok(None),
        }
    }

    pub fn load_outcome(&self) -> &LoadOutcome {
        &self.outcome
    }

    pub fn now_ms(&self) -> i64 {
        self.scheduler.now_ms()
    }

    /// Number of questions with stored progress
    pub fn len(&self) -> usize {
        self.progress.len()
    }

    /// Stored record for `id`, or the unseen default
    pub fn get_meta(&self, id: &str) -> ProgressRecord {
        match self.progress.get(id) {
            Some(value) => ProgressRecord::deserialize(value).unwrap_or_else(|e| {
                debug!(id, error = %e, "unusable progress entry, treating as unseen");
                ProgressRecord::default()
            }),
            None => ProgressRecord::default(),
        }
    }

    /// Grade a review of `id` and persist the result.
    ///
    /// Scheduling clamps the grade to 0..=5, but the score average is fed the
    /// grade exactly as given.
    pub fn record_grade(&mut self, id: &str, grade: i64) -> Result<ProgressRecord> {
        let previous = self.get_meta(id);
        let next = self.scheduler.schedule(grade, &previous.scheduling());
        let score_avg = round2(previous.score_avg * 0.7 + grade as f64 * 0.3);
        let record = ProgressRecord::from_review(next, score_avg, self.scheduler.now_ms());

        let replaced = self
            .progress
            .insert(id.to_string(), serde_json::to_value(record)?);
        if let Err(e) = self.persist() {
            match replaced {
                Some(value) => self.progress.insert(id.to_string(), value),
                None => self.progress.remove(id),
            };
            return Err(e);
        }

        debug!(
            id,
            grade,
            interval = record.interval,
            reps = record.reps,
            ef = record.ef,
            "recorded grade"
        );
        Ok(record)
    }

    /// Forget all progress
    pub fn reset_all(&mut self) -> Result<()> {
        self.replace_all(ProgressMap::new())?;
        info!("progress reset");
        Ok(())
    }

    /// Replace all progress with `mapping` as-is. On a failed write the
    /// previous mapping stays in place.
    pub fn replace_all(&mut self, mapping: ProgressMap) -> Result<()> {
        let previous = std::mem::replace(&mut self.progress, mapping);
        if let Err(e) = self.persist() {
            self.progress = previous;
            return Err(e);
        }
        Ok(())
    }

    /// Replace all progress from a JSON document. Anything but a top-level
    /// object is rejected and the current progress is left untouched.
    pub fn import_json(&mut self, text: &str) -> Result<usize, ProgressError> {
        let mapping = parse_mapping(text)?;
        let count = mapping.len();
        self.replace_all(mapping)?;
        info!(entries = count, "imported progress");
        Ok(count)
    }

    /// Pretty-printed JSON of the whole mapping
    pub fn export_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.progress)?)
    }

    /// How many of `ids` are due at `now_ms`
    pub fn due_count(&self, ids: &[&str], now_ms: i64) -> usize {
        ids.iter()
            .filter(|id| self.get_meta(id).due <= now_ms)
            .count()
    }

    /// Mean score average over `ids`, 0 when empty
    pub fn average_score(&self, ids: &[&str]) -> f64 {
        if ids.is_empty() {
            return 0.0;
        }
        let total: f64 = ids.iter().map(|id| self.get_meta(id).score_avg).sum();
        total / ids.len() as f64
    }

    fn persist(&mut self) -> Result<()> {
        let text = serde_json::to_string(&self.progress)?;
        self.kv.set(PROGRESS_KEY, &text)
    }
}
