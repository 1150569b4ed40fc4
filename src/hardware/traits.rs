//! Traits for the bin's sensors and actuator.

use crate::error::Result;
use crate::sensing::LidState;

/// Produces the distance from the sensor to the bin contents.
pub trait RangeSensor: Send {
    /// Measure the distance in centimeters.
    ///
    /// Returns [`crate::BinError::SensorTimeout`] when no echo arrives within the
    /// sensor's bounded wait.
    fn measure(&mut self) -> Result<f64>;
}

/// Detects a hand or object near the lid opening.
pub trait PresenceSensor: Send {
    /// Whether presence is detected right now.
    fn is_present(&mut self) -> Result<bool>;
}

/// Moves the lid between its two positions.
pub trait LidActuator: Send {
    /// Command the lid to `state`.
    fn set_lid(&mut self, state: LidState) -> Result<()>;

    /// The last position commanded, if any.
    fn last_commanded(&self) -> Option<LidState>;

    /// Stop driving the actuator and give the line back.
    ///
    /// Called once on shutdown; commanding the lid afterwards is an error.
    fn release(&mut self) -> Result<()>;
}
