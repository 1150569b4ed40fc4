//! Where readings and alerts go.
//!
//! The controller writes every reading to a [`DataSink`] and hands
//! above-threshold readings to an [`AlertSink`]. Remote sinks are built from the
//! configuration; when a remote is not configured its log-only counterpart is
//! used instead.

pub mod firebase;
pub mod log;
pub mod memory;
pub mod traits;
pub mod webhook;

pub use firebase::FirebaseSink;
pub use log::{LogAlertSink, LogSink};
pub use memory::{MemoryAlertSink, MemorySink};
pub use traits::{AlertSink, BinAlert, DataSink};
pub use webhook::WebhookAlertSink;

use crate::config::ControllerConfig;
use crate::error::Result;
use std::time::Duration;

/// Build the data sink described by `config`.
pub fn data_sink(config: &ControllerConfig) -> Result<Box<dyn DataSink>> {
    match &config.database {
        Some(db) => Ok(Box::new(FirebaseSink::new(db.clone())?)),
        None => Ok(Box::new(LogSink)),
    }
}

/// Build the alert sink described by `config`.
pub fn alert_sink(config: &ControllerConfig) -> Result<Box<dyn AlertSink>> {
    match &config.alert.webhook_url {
        Some(url) => Ok(Box::new(WebhookAlertSink::new(
            url.clone(),
            Duration::from_millis(config.alert.timeout_ms),
        )?)),
        None => Ok(Box::new(LogAlertSink)),
    }
}
