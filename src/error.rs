//! Error handling for the smart bin controller.

use std::time::Duration;

/// A specialized `Result` type for smart bin operations.
pub type Result<T> = std::result::Result<T, BinError>;

/// The main error type for smart bin operations.
///
/// Only [`BinError::HardwareInit`] and [`BinError::Config`] are fatal; everything
/// raised inside a polling cycle is contained by the controller.
#[derive(Debug, thiserror::Error)]
pub enum BinError {
    /// The ultrasonic echo did not arrive (or did not end) within the bounded wait
    #[error("Ultrasonic echo not received within {0:?}")]
    SensorTimeout(Duration),

    /// A sensor or actuator failed while the loop was running
    #[error("Device error: {0}")]
    Device(String),

    /// The data sink or alert sink could not be reached or rejected the request
    #[error("{sink} unavailable: {reason}")]
    SinkUnavailable { sink: &'static str, reason: String },

    /// GPIO or actuator setup failed at startup
    #[error("Hardware initialization failed: {0}")]
    HardwareInit(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration file could not be parsed
    #[error("Failed to parse configuration: {0}")]
    Toml(#[from] toml::de::Error),
}

impl BinError {
    /// Create a new device error
    pub fn device_error(msg: impl Into<String>) -> Self {
        Self::Device(msg.into())
    }

    /// Create a new sink error for the named sink
    pub fn sink_error(sink: &'static str, reason: impl Into<String>) -> Self {
        Self::SinkUnavailable {
            sink,
            reason: reason.into(),
        }
    }

    /// Create a new hardware initialization error
    pub fn hardware_error(msg: impl Into<String>) -> Self {
        Self::HardwareInit(msg.into())
    }

    /// Create a new configuration error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether this error must stop the process before the loop starts.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::HardwareInit(_) | Self::Config(_) | Self::Toml(_))
    }
}
