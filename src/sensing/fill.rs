//! Distance to fill-percentage conversion.

use crate::config::BinConfig;

/// Clamp a percentage into `[0, 100]`. NaN counts as an empty bin.
pub fn clamp_percentage(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 100.0)
    }
}

/// Estimate how full the bin is from the measured distance.
///
/// The sensor hangs above the bin looking down, so a shorter distance means more
/// contents. Distances at or below `full_distance_cm` map to 100%, distances at or
/// beyond `max_capacity_cm` map to 0%, and noise outside that span is clamped
/// rather than reported as an error.
pub fn estimate(distance_cm: f64, config: &BinConfig) -> f64 {
    if distance_cm <= config.full_distance_cm {
        return 100.0;
    }
    if distance_cm >= config.max_capacity_cm {
        return 0.0;
    }
    let span = config.max_capacity_cm - config.full_distance_cm;
    clamp_percentage((config.max_capacity_cm - distance_cm) / span * 100.0)
}

/// Fill estimator bound to one bin calibration.
#[derive(Debug, Clone, Copy)]
pub struct FillEstimator {
    config: BinConfig,
}

impl FillEstimator {
    pub fn new(config: BinConfig) -> Self {
        Self { config }
    }

    /// See [`estimate`].
    pub fn estimate(&self, distance_cm: f64) -> f64 {
        estimate(distance_cm, &self.config)
    }

    pub fn config(&self) -> &BinConfig {
        &self.config
    }
}
