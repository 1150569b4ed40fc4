//! # Smart Bin - Raspberry Pi Trash Bin Controller
//!
//! A small controller for a "smart" trash bin on a Raspberry Pi. Every cycle it
//! measures the fill level with an HC-SR04 ultrasonic sensor, opens or closes the
//! lid with a servo depending on an infrared presence sensor, reports the reading
//! to a Firebase Realtime Database and calls an alert webhook when the bin is
//! nearly full.
//!
//! ## Features
//!
//! - **Bounded ultrasonic ranging**: echo waits never hang the loop
//! - **Clamped fill estimation**: always within 0-100%
//! - **Lid control**: stateless by default, optional debounce window
//! - **Alert policies**: every cycle, once per crossing, or with a cool-down
//! - **GPIO feature gate**: builds and simulates on machines without GPIO
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use smart_bin::{hardware, sinks, BinController, ControllerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ControllerConfig::default();
//!     let hardware = hardware::acquire(&config)?;
//!     let mut controller = BinController::new(
//!         config.clone(),
//!         hardware,
//!         sinks::data_sink(&config)?,
//!         sinks::alert_sink(&config)?,
//!     )?;
//!
//!     controller.run(async { tokio::signal::ctrl_c().await.ok(); }).await?;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod controller;
pub mod error;
pub mod hardware;
pub mod sensing;
pub mod sinks;

// Re-export public API
pub use config::{AlertPolicy, BinConfig, ControllerConfig, DatabaseConfig};
pub use controller::{AlertOutcome, BinController, CycleReport, CycleStats};
pub use error::{BinError, Result};
pub use hardware::{Hardware, LidActuator, PresenceSensor, RangeSensor};
pub use sensing::{estimate, FillEstimator, LidState, Reading};
pub use sinks::{AlertSink, BinAlert, DataSink};

/// The default polling interval in milliseconds
pub const DEFAULT_INTERVAL_MS: u64 = 500;

/// The default distance from the sensor to the bin floor in centimeters
pub const DEFAULT_MAX_CAPACITY_CM: f64 = 22.0;

/// The default alert threshold in percent
pub const DEFAULT_ALERT_THRESHOLD_PCT: f64 = 80.0;

/// Speed of sound in air at room temperature, in centimeters per second
pub const SPEED_OF_SOUND_CM_S: f64 = 34300.0;
