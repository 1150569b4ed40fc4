//! Sensor and actuator access.
//!
//! The controller only sees the traits in [`traits`]. Real devices live in
//! [`gpio`] behind the `gpio` feature; [`mock`] provides simulated ones.

pub mod mock;
pub mod traits;

#[cfg(feature = "gpio")]
pub mod gpio;

use crate::config::ControllerConfig;
use crate::error::Result;
use std::time::Duration;

pub use mock::{
    simulated, RecordingLid, SimulatedEcho, SimulatedHandles, SimulatedPresence,
    SimulatedRangeSensor,
};
pub use traits::{LidActuator, PresenceSensor, RangeSensor};

/// PWM period for standard hobby servos (50 Hz).
pub const SERVO_PERIOD: Duration = Duration::from_millis(20);

/// Pulse width at 0 degrees.
const SERVO_MIN_PULSE_US: f64 = 500.0;

/// Pulse width at 180 degrees.
const SERVO_MAX_PULSE_US: f64 = 2500.0;

/// Pulse width that holds a servo at `angle` degrees (clamped to 0-180).
pub fn servo_pulse_width(angle: f64) -> Duration {
    let angle = angle.clamp(0.0, 180.0);
    let us = SERVO_MIN_PULSE_US + angle / 180.0 * (SERVO_MAX_PULSE_US - SERVO_MIN_PULSE_US);
    Duration::from_micros(us.round() as u64)
}

/// The devices owned by one controller.
pub struct Hardware {
    pub range: Box<dyn RangeSensor>,
    pub presence: Box<dyn PresenceSensor>,
    pub lid: Box<dyn LidActuator>,
}

/// Acquire the real devices described by `config`.
#[cfg(feature = "gpio")]
pub fn acquire(config: &ControllerConfig) -> Result<Hardware> {
    gpio::acquire(config)
}

/// Acquire the real devices described by `config`.
///
/// Always fails on builds without the `gpio` feature.
#[cfg(not(feature = "gpio"))]
pub fn acquire(_config: &ControllerConfig) -> Result<Hardware> {
    Err(crate::error::BinError::hardware_error(
        "GPIO support not compiled in (build with --features gpio, or run with --simulate)",
    ))
}
