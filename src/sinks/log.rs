//! Sinks that only write to the log, used when nothing remote is configured.

use super::traits::{AlertSink, BinAlert, DataSink};
use crate::error::Result;
use crate::sensing::Reading;
use async_trait::async_trait;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

#[async_trait]
impl DataSink for LogSink {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn record(&self, reading: &Reading) -> Result<()> {
        info!(
            reading = %reading.id,
            distance_cm = reading.distance_cm,
            fill_percentage = reading.fill_percentage,
            lid = %reading.lid_state,
            "reading recorded"
        );
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LogAlertSink;

#[async_trait]
impl AlertSink for LogAlertSink {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn notify(&self, alert: &BinAlert) -> Result<()> {
        warn!(
            bin = %alert.bin_id,
            reading = %alert.reading_id,
            "Bin is {:.2}% full (threshold {:.0}%)",
            alert.fill_percentage,
            alert.threshold_pct
        );
        Ok(())
    }
}
