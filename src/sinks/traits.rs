//! Traits for the outbound side of the controller.

use crate::error::Result;
use crate::sensing::Reading;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Receives every reading: a "current state" record plus a history entry.
#[async_trait]
pub trait DataSink: Send + Sync {
    /// Short name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Store `reading` as the current state and append it to the history.
    async fn record(&self, reading: &Reading) -> Result<()>;
}

/// Notified when the bin is at or above its alert threshold.
#[async_trait]
pub trait AlertSink: Send + Sync {
    /// Short name used in logs and errors.
    fn name(&self) -> &'static str;

    async fn notify(&self, alert: &BinAlert) -> Result<()>;
}

/// Payload describing a nearly full bin.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BinAlert {
    /// Always `"bin_full"`
    pub event: String,
    pub bin_id: String,
    pub reading_id: Uuid,
    pub fill_percentage: f64,
    pub distance_cm: f64,
    pub threshold_pct: f64,
    pub recorded_at: DateTime<Utc>,
}

impl BinAlert {
    pub const EVENT: &'static str = "bin_full";

    /// Build the alert for `reading`.
    pub fn new(bin_id: impl Into<String>, reading: &Reading, threshold_pct: f64) -> Self {
        Self {
            event: Self::EVENT.to_string(),
            bin_id: bin_id.into(),
            reading_id: reading.id,
            fill_percentage: reading.fill_percentage,
            distance_cm: reading.distance_cm,
            threshold_pct,
            recorded_at: reading.timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensing::LidState;

    #[test]
    fn test_alert_copies_reading() {
        let reading = Reading::new(4.4, 80.0, LidState::Closed);
        let alert = BinAlert::new("kitchen", &reading, 80.0);
        assert_eq!(alert.event, "bin_full");
        assert_eq!(alert.bin_id, "kitchen");
        assert_eq!(alert.reading_id, reading.id);
        assert_eq!(alert.fill_percentage, 80.0);
        assert_eq!(alert.recorded_at, reading.timestamp);
    }
}
