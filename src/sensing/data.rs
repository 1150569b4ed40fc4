//! Data structures for bin readings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Position of the lid, as last commanded to the servo.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LidState {
    Open,
    Closed,
}

impl LidState {
    /// Lid state wanted for a presence sensor level (active-high).
    pub fn from_presence(present: bool) -> Self {
        if present {
            LidState::Open
        } else {
            LidState::Closed
        }
    }

    pub fn is_open(self) -> bool {
        self == LidState::Open
    }
}

impl fmt::Display for LidState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LidState::Open => f.write_str("open"),
            LidState::Closed => f.write_str("closed"),
        }
    }
}

/// One polling cycle's measurement, forwarded to the sinks and then dropped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Reading {
    /// Correlates the history entry, the alert and the log lines of one cycle
    pub id: Uuid,
    /// Distance from the sensor to the bin contents in centimeters
    pub distance_cm: f64,
    /// Estimated fill level (0.0 to 100.0)
    pub fill_percentage: f64,
    /// Lid position commanded this cycle
    pub lid_state: LidState,
    /// Whether the distance is a substitute for a timed-out echo
    #[serde(default)]
    pub out_of_range: bool,
    /// When the distance was measured
    pub timestamp: DateTime<Utc>,
}

impl Reading {
    /// Create a new reading stamped with the current time.
    pub fn new(distance_cm: f64, fill_percentage: f64, lid_state: LidState) -> Self {
        Self {
            id: Uuid::new_v4(),
            distance_cm,
            fill_percentage,
            lid_state,
            out_of_range: false,
            timestamp: Utc::now(),
        }
    }

    /// Mark the distance as a substitute for a missing echo.
    pub fn with_out_of_range(mut self, out_of_range: bool) -> Self {
        self.out_of_range = out_of_range;
        self
    }

    /// Whether this reading is at or above the given threshold.
    pub fn is_at_or_above(&self, threshold_pct: f64) -> bool {
        self.fill_percentage >= threshold_pct
    }
}
