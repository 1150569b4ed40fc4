//! Fill-level sensing.
//!
//! Turns echo timings into distances and distances into bounded fill
//! percentages, and defines the [`Reading`] that each polling cycle produces.

pub mod data;
pub mod fill;
pub mod ultrasonic;

// Re-export commonly used items
pub use data::{LidState, Reading};
pub use fill::{clamp_percentage, estimate, FillEstimator};
pub use ultrasonic::{echo_to_distance_cm, EchoPins, Ultrasonic};
