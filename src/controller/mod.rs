//! The polling loop.
//!
//! One [`BinController`] owns the devices and sinks. Each cycle measures the
//! distance, estimates the fill level, moves the lid to match the presence
//! sensor, records the reading and raises an alert when the bin is at or above
//! its threshold. Failures inside a cycle are logged and the loop carries on.

pub mod alert;
pub mod lid;

pub use alert::AlertState;
pub use lid::LidDebouncer;

use crate::config::ControllerConfig;
use crate::error::{BinError, Result};
use crate::hardware::Hardware;
use crate::sensing::{FillEstimator, LidState, Reading};
use crate::sinks::{AlertSink, BinAlert, DataSink};
use std::future::Future;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// What happened to the alert check in one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertOutcome {
    BelowThreshold,
    Sent,
    /// Above threshold, but the alert policy held it back
    Suppressed,
    Failed,
}

/// Result of one completed cycle.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub reading: Reading,
    /// Whether the data sink accepted the reading
    pub recorded: bool,
    pub alert: AlertOutcome,
}

/// Counters kept over the controller's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleStats {
    pub cycles: u64,
    pub failed_cycles: u64,
    pub sensor_timeouts: u64,
    pub sink_failures: u64,
    pub alerts_sent: u64,
}

/// Smart bin polling loop.
pub struct BinController {
    config: ControllerConfig,
    estimator: FillEstimator,
    hardware: Hardware,
    data_sink: Box<dyn DataSink>,
    alert_sink: Box<dyn AlertSink>,
    lid: LidDebouncer,
    alerts: AlertState,
    stats: CycleStats,
    released: bool,
}

impl BinController {
    /// Create a controller; the configuration is validated here.
    pub fn new(
        config: ControllerConfig,
        hardware: Hardware,
        data_sink: Box<dyn DataSink>,
        alert_sink: Box<dyn AlertSink>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            estimator: FillEstimator::new(config.bin),
            lid: LidDebouncer::new(config.lid.debounce_cycles),
            alerts: AlertState::from_config(&config.alert),
            config,
            hardware,
            data_sink,
            alert_sink,
            stats: CycleStats::default(),
            released: false,
        })
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    pub fn stats(&self) -> CycleStats {
        self.stats
    }

    /// Measure the distance, substituting the empty-bin distance on echo timeout.
    ///
    /// Returns the distance and whether it was substituted.
    fn measure_distance(&mut self) -> Result<(f64, bool)> {
        match self.hardware.range.measure() {
            Ok(distance_cm) => Ok((distance_cm, false)),
            Err(BinError::SensorTimeout(waited)) => {
                self.stats.sensor_timeouts += 1;
                let distance_cm = self.config.bin.no_echo_distance_cm();
                warn!(
                    "No echo within {:?}, treating as {:.1} cm",
                    waited, distance_cm
                );
                Ok((distance_cm, true))
            }
            Err(e) => Err(e),
        }
    }

    /// Take a reading without moving the lid or contacting any sink.
    pub fn sample(&mut self) -> Result<Reading> {
        let (distance_cm, out_of_range) = self.measure_distance()?;
        let fill = self.estimator.estimate(distance_cm);
        let present = self.hardware.presence.is_present()?;
        Ok(Reading::new(distance_cm, fill, LidState::from_presence(present))
            .with_out_of_range(out_of_range))
    }

    /// Run one measure-act-report cycle.
    ///
    /// Sink failures are contained here and show up in the report; an `Err` means
    /// the cycle was abandoned before anything was reported.
    pub async fn cycle(&mut self) -> Result<CycleReport> {
        // Echo timing spins on this worker thread, at most two echo timeouts.
        let (distance_cm, out_of_range) = self.measure_distance()?;
        let fill = self.estimator.estimate(distance_cm);
        info!("Measured distance: {:.1} cm", distance_cm);
        info!("Percentage filled: {:.2}%", fill);

        let present = self.hardware.presence.is_present()?;
        let lid_state = self.lid.update(LidState::from_presence(present));
        let previous = self.hardware.lid.last_commanded();
        self.hardware.lid.set_lid(lid_state)?;
        if previous != Some(lid_state) {
            debug!(present, "Lid {}", lid_state);
        }

        let reading = Reading::new(distance_cm, fill, lid_state).with_out_of_range(out_of_range);

        let recorded = match self.data_sink.record(&reading).await {
            Ok(()) => true,
            Err(e) => {
                self.stats.sink_failures += 1;
                error!(reading = %reading.id, "Failed to record reading: {}", e);
                false
            }
        };

        let alert = self.check_alert(&reading).await;

        self.stats.cycles += 1;
        Ok(CycleReport {
            reading,
            recorded,
            alert,
        })
    }

    async fn check_alert(&mut self, reading: &Reading) -> AlertOutcome {
        let threshold = self.config.bin.alert_threshold_pct;
        let above = reading.is_at_or_above(threshold);
        let now = Instant::now();

        if !self.alerts.should_send(above, now) {
            return if above {
                debug!("Alert suppressed by {:?} policy", self.config.alert.policy);
                AlertOutcome::Suppressed
            } else {
                AlertOutcome::BelowThreshold
            };
        }

        let alert = BinAlert::new(self.config.bin_id.clone(), reading, threshold);
        match self.alert_sink.notify(&alert).await {
            Ok(()) => {
                self.alerts.mark_sent(now);
                self.stats.alerts_sent += 1;
                info!(reading = %reading.id, "Notification sent via {}", self.alert_sink.name());
                AlertOutcome::Sent
            }
            Err(e) => {
                self.stats.sink_failures += 1;
                error!(reading = %reading.id, "Failed to send notification: {}", e);
                AlertOutcome::Failed
            }
        }
    }

    /// Run cycles every configured interval until `shutdown` resolves, then
    /// release the hardware.
    ///
    /// `shutdown` is checked before each cycle and raced against the sleep
    /// between cycles; a cycle that has started always completes. A failed
    /// release is logged and does not turn the stop into an error.
    pub async fn run<F>(&mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let interval = self.config.interval();
        info!(
            "Controller running: interval {}ms, threshold {:.0}%, data sink {}, alert sink {}",
            self.config.interval_ms,
            self.config.bin.alert_threshold_pct,
            self.data_sink.name(),
            self.alert_sink.name()
        );

        loop {
            let stop = tokio::select! {
                biased;
                _ = &mut shutdown => true,
                _ = std::future::ready(()) => false,
            };
            if stop {
                break;
            }

            if let Err(e) = self.cycle().await {
                self.stats.failed_cycles += 1;
                error!("Cycle failed: {}", e);
            }

            let stop = tokio::select! {
                _ = &mut shutdown => true,
                _ = tokio::time::sleep(interval) => false,
            };
            if stop {
                break;
            }
        }

        info!("Measurement stopped by user");
        if let Err(e) = self.shutdown() {
            error!("Failed to release hardware: {}", e);
        }
        Ok(())
    }

    /// Release the actuator. Safe to call more than once.
    pub fn shutdown(&mut self) -> Result<()> {
        if self.released {
            return Ok(());
        }
        self.released = true;
        self.hardware.lid.release()?;
        info!(
            "Hardware released after {} cycles ({} failed, {} alerts sent)",
            self.stats.cycles, self.stats.failed_cycles, self.stats.alerts_sent
        );
        Ok(())
    }
}

impl Drop for BinController {
    fn drop(&mut self) {
        if let Err(e) = self.shutdown() {
            warn!("Failed to release hardware: {}", e);
        }
    }
}
