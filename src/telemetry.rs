//! Named telemetry fields reported by the simulation alongside each frame.
//!
//! The backend watches a handful of RAM addresses (round timer, per-fighter
//! health, win tallies, status words) and reports them as a flat map of named
//! integers. [`Telemetry`] wraps that map and provides the typed accessors
//! the actionable-frame filter and the win bookkeeping rely on; everything
//! else stays reachable through [`Telemetry::get`] for player
//! implementations that want more signal.

use std::collections::HashMap;

use crate::error::MatchError;

/// Key of the round countdown timer field.
pub const ROUND_TIMER: &str = "round_timer";

const HEALTH_KEYS: [&str; 2] = ["player1_health", "player2_health"];
const WINS_KEYS: [&str; 2] = ["player1_matches_won", "player2_matches_won"];
const STATUS_KEYS: [&str; 2] = ["player1_status", "player2_status"];

/// Snapshot of the named telemetry fields for one frame.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Telemetry(HashMap<String, i64>);

impl Telemetry {
    /// Creates an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets one field, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: i64) {
        self.0.insert(key.into(), value);
    }

    /// Builder-style [`Telemetry::set`].
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: i64) -> Self {
        self.set(key, value);
        self
    }

    /// Raw read of any field.
    pub fn get(&self, key: &str) -> Option<i64> {
        self.0.get(key).copied()
    }

    /// Number of fields in the snapshot.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when the snapshot carries no fields at all.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Value of the round countdown timer.
    pub fn round_timer(&self) -> Result<i64, MatchError> {
        self.require(ROUND_TIMER)
    }

    /// Health of the fighter in `slot` (0 or 1). Negative once defeated.
    pub fn health(&self, slot: usize) -> Result<i64, MatchError> {
        self.require(HEALTH_KEYS[slot])
    }

    /// Rounds won so far within this match by the fighter in `slot`.
    pub fn wins(&self, slot: usize) -> Result<i64, MatchError> {
        self.require(WINS_KEYS[slot])
    }

    /// Raw status word of the fighter in `slot`, when the backend reports one.
    pub fn status(&self, slot: usize) -> Option<i64> {
        self.get(STATUS_KEYS[slot])
    }

    fn require(&self, field: &'static str) -> Result<i64, MatchError> {
        self.get(field)
            .ok_or(MatchError::MissingTelemetry { field })
    }
}

impl FromIterator<(String, i64)> for Telemetry {
    fn from_iter<I: IntoIterator<Item = (String, i64)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}
