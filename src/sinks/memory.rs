//! In-memory sinks that keep everything they receive.
//!
//! Clones share storage, so a handle kept outside the controller sees what the
//! controller wrote. Either sink can be switched into a failing mode to
//! exercise the controller's error containment.

use super::traits::{AlertSink, BinAlert, DataSink};
use crate::error::{BinError, Result};
use crate::sensing::Reading;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Debug)]
struct Stored<T> {
    items: Mutex<Vec<T>>,
    failing: AtomicBool,
}

impl<T> Default for Stored<T> {
    fn default() -> Self {
        Self {
            items: Mutex::new(Vec::new()),
            failing: AtomicBool::new(false),
        }
    }
}

impl<T: Clone> Stored<T> {
    fn push(&self, sink: &'static str, item: T) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(BinError::sink_error(sink, "simulated outage"));
        }
        lock(&self.items).push(item);
        Ok(())
    }

    fn snapshot(&self) -> Vec<T> {
        lock(&self.items).clone()
    }
}

/// Data sink that appends readings to a shared vector.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    inner: Arc<Stored<Reading>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent writes fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.inner.failing.store(failing, Ordering::SeqCst);
    }

    /// The history: every reading stored so far.
    pub fn history(&self) -> Vec<Reading> {
        self.inner.snapshot()
    }

    /// The current-state record: the most recent reading.
    pub fn current(&self) -> Option<Reading> {
        lock(&self.inner.items).last().cloned()
    }
}

#[async_trait]
impl DataSink for MemorySink {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn record(&self, reading: &Reading) -> Result<()> {
        self.inner.push("memory", reading.clone())
    }
}

/// Alert sink that appends alerts to a shared vector.
#[derive(Debug, Clone, Default)]
pub struct MemoryAlertSink {
    inner: Arc<Stored<BinAlert>>,
}

impl MemoryAlertSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.inner.failing.store(failing, Ordering::SeqCst);
    }

    pub fn alerts(&self) -> Vec<BinAlert> {
        self.inner.snapshot()
    }
}

#[async_trait]
impl AlertSink for MemoryAlertSink {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn notify(&self, alert: &BinAlert) -> Result<()> {
        self.inner.push("memory", alert.clone())
    }
}
