//! Simulated devices for hosts without GPIO and for tests.
//!
//! Each device plays back a script and keeps its state behind an `Arc` so a
//! test (or the `--simulate` CLI mode) can keep a handle after the device has
//! been boxed into the controller.

use super::traits::{LidActuator, PresenceSensor, RangeSensor};
use super::Hardware;
use crate::error::{BinError, Result};
use crate::sensing::LidState;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// One scripted range measurement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SimulatedEcho {
    /// Echo returned at this distance in centimeters
    Distance(f64),
    /// No echo within the bounded wait
    Timeout,
    /// The sensor itself failed
    Fault,
}

/// Range sensor that replays scripted echoes and then repeats the last one.
#[derive(Debug, Clone)]
pub struct SimulatedRangeSensor {
    script: Arc<Mutex<VecDeque<SimulatedEcho>>>,
    last: Arc<Mutex<SimulatedEcho>>,
}

impl SimulatedRangeSensor {
    pub fn new(script: impl IntoIterator<Item = SimulatedEcho>) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into_iter().collect())),
            last: Arc::new(Mutex::new(SimulatedEcho::Timeout)),
        }
    }

    /// A sensor that always reports `distance_cm`.
    pub fn fixed(distance_cm: f64) -> Self {
        Self::new([SimulatedEcho::Distance(distance_cm)])
    }

    /// Queue more echoes behind the current script.
    pub fn push(&self, echo: SimulatedEcho) {
        lock(&self.script).push_back(echo);
    }
}

impl RangeSensor for SimulatedRangeSensor {
    fn measure(&mut self) -> Result<f64> {
        let echo = match lock(&self.script).pop_front() {
            Some(echo) => {
                *lock(&self.last) = echo;
                echo
            }
            None => *lock(&self.last),
        };
        match echo {
            SimulatedEcho::Distance(cm) => Ok(cm),
            SimulatedEcho::Timeout => Err(BinError::SensorTimeout(Duration::from_millis(40))),
            SimulatedEcho::Fault => Err(BinError::device_error("simulated sensor fault")),
        }
    }
}

/// Presence sensor whose level is set from outside.
#[derive(Debug, Clone, Default)]
pub struct SimulatedPresence {
    script: Arc<Mutex<VecDeque<bool>>>,
    level: Arc<Mutex<bool>>,
}

impl SimulatedPresence {
    /// Replay `levels` one per read, then hold the last one.
    pub fn new(levels: impl IntoIterator<Item = bool>) -> Self {
        Self {
            script: Arc::new(Mutex::new(levels.into_iter().collect())),
            level: Arc::new(Mutex::new(false)),
        }
    }

    /// Drive the level directly, dropping any remaining script.
    pub fn set(&self, present: bool) {
        lock(&self.script).clear();
        *lock(&self.level) = present;
    }
}

impl PresenceSensor for SimulatedPresence {
    fn is_present(&mut self) -> Result<bool> {
        if let Some(level) = lock(&self.script).pop_front() {
            *lock(&self.level) = level;
        }
        Ok(*lock(&self.level))
    }
}

#[derive(Debug, Default)]
struct LidLog {
    commands: Vec<LidState>,
    released: bool,
    release_fails: bool,
}

/// Lid actuator that records every command it receives.
#[derive(Debug, Clone, Default)]
pub struct RecordingLid {
    log: Arc<Mutex<LidLog>>,
}

impl RecordingLid {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every command received, in order.
    pub fn commands(&self) -> Vec<LidState> {
        lock(&self.log).commands.clone()
    }

    pub fn is_released(&self) -> bool {
        lock(&self.log).released
    }

    /// Make the next release attempts fail, as a jammed servo would.
    pub fn set_release_failing(&self, failing: bool) {
        lock(&self.log).release_fails = failing;
    }
}

impl LidActuator for RecordingLid {
    fn set_lid(&mut self, state: LidState) -> Result<()> {
        let mut log = lock(&self.log);
        if log.released {
            return Err(BinError::device_error("lid actuator already released"));
        }
        log.commands.push(state);
        Ok(())
    }

    fn last_commanded(&self) -> Option<LidState> {
        lock(&self.log).commands.last().copied()
    }

    fn release(&mut self) -> Result<()> {
        let mut log = lock(&self.log);
        if log.release_fails {
            return Err(BinError::device_error("servo did not release"));
        }
        log.released = true;
        Ok(())
    }
}

/// Handles to the simulated devices inside a [`Hardware`] bundle.
#[derive(Debug, Clone)]
pub struct SimulatedHandles {
    pub range: SimulatedRangeSensor,
    pub presence: SimulatedPresence,
    pub lid: RecordingLid,
}

/// Build a simulated device set and keep handles to drive and inspect it.
pub fn simulated(
    range: SimulatedRangeSensor,
    presence: SimulatedPresence,
) -> (Hardware, SimulatedHandles) {
    let lid = RecordingLid::new();
    let handles = SimulatedHandles {
        range: range.clone(),
        presence: presence.clone(),
        lid: lid.clone(),
    };
    let hardware = Hardware {
        range: Box::new(range),
        presence: Box::new(presence),
        lid: Box::new(lid),
    };
    (hardware, handles)
}
