//! HC-SR04 style ultrasonic ranging.
//!
//! The transceiver is driven through two digital lines: a 10 µs pulse on the
//! trigger line starts a burst, and the echo line is held high for as long as the
//! sound took to come back. Both waits on the echo line are bounded so a
//! disconnected sensor cannot stall the control loop.

use crate::error::{BinError, Result};
use crate::hardware::traits::RangeSensor;
use std::thread;
use std::time::{Duration, Instant};

/// Width of the trigger pulse.
pub const TRIGGER_PULSE: Duration = Duration::from_micros(10);

/// Low time before the trigger pulse so the line starts from a clean edge.
const TRIGGER_SETTLE: Duration = Duration::from_micros(2);

/// Convert the echo pulse width into a one-way distance in centimeters.
pub fn echo_to_distance_cm(echo: Duration, speed_of_sound_cm_s: f64) -> f64 {
    // round trip, so halve it
    echo.as_secs_f64() * speed_of_sound_cm_s / 2.0
}

/// The two lines an ultrasonic transceiver is wired to.
pub trait EchoPins: Send {
    fn set_trigger(&mut self, high: bool);
    fn echo_is_high(&self) -> bool;
}

/// Range sensor that times echo pulses on a pair of [`EchoPins`].
pub struct Ultrasonic<P: EchoPins> {
    pins: P,
    timeout: Duration,
    speed_of_sound_cm_s: f64,
}

impl<P: EchoPins> Ultrasonic<P> {
    pub fn new(mut pins: P, timeout: Duration, speed_of_sound_cm_s: f64) -> Self {
        pins.set_trigger(false);
        Self {
            pins,
            timeout,
            speed_of_sound_cm_s,
        }
    }

    fn pulse_trigger(&mut self) {
        self.pins.set_trigger(false);
        thread::sleep(TRIGGER_SETTLE);
        self.pins.set_trigger(true);
        thread::sleep(TRIGGER_PULSE);
        self.pins.set_trigger(false);
    }

    /// Spin until the echo line reaches `level`, giving up at `deadline`.
    fn wait_for_echo(&self, level: bool, deadline: Instant) -> Result<Instant> {
        loop {
            let now = Instant::now();
            if self.pins.echo_is_high() == level {
                return Ok(now);
            }
            if now >= deadline {
                return Err(BinError::SensorTimeout(self.timeout));
            }
            std::hint::spin_loop();
        }
    }

    fn deadline(&self, from: Instant) -> Result<Instant> {
        from.checked_add(self.timeout).ok_or_else(|| {
            BinError::device_error(format!("echo timeout {:?} is out of range", self.timeout))
        })
    }

    /// Measure the raw echo pulse width.
    pub fn measure_echo(&mut self) -> Result<Duration> {
        let deadline = self.deadline(Instant::now())?;
        self.pulse_trigger();
        let rise = self.wait_for_echo(true, deadline)?;
        let fall = self.wait_for_echo(false, self.deadline(rise)?)?;
        Ok(fall.duration_since(rise))
    }
}

impl<P: EchoPins> RangeSensor for Ultrasonic<P> {
    fn measure(&mut self) -> Result<f64> {
        let echo = self.measure_echo()?;
        Ok(echo_to_distance_cm(echo, self.speed_of_sound_cm_s))
    }
}
