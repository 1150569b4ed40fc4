//! Alert re-arm and cool-down bookkeeping.

use crate::config::{AlertConfig, AlertPolicy};
use std::time::{Duration, Instant};

/// Decides whether an above-threshold reading should produce an alert.
///
/// State only advances through [`AlertState::mark_sent`], so a delivery that
/// failed is retried on the next qualifying cycle.
#[derive(Debug, Clone)]
pub struct AlertState {
    policy: AlertPolicy,
    cooldown: Duration,
    armed: bool,
    last_sent_at: Option<Instant>,
}

impl AlertState {
    pub fn new(policy: AlertPolicy, cooldown: Duration) -> Self {
        Self {
            policy,
            cooldown,
            armed: true,
            last_sent_at: None,
        }
    }

    pub fn from_config(config: &AlertConfig) -> Self {
        Self::new(config.policy, Duration::from_secs(config.cooldown_secs))
    }

    /// Feed one cycle's threshold check; returns true if an alert is due.
    pub fn should_send(&mut self, above_threshold: bool, now: Instant) -> bool {
        if !above_threshold {
            self.armed = true;
            return false;
        }
        match self.policy {
            AlertPolicy::Always => true,
            AlertPolicy::Rearm => self.armed,
            AlertPolicy::Cooldown => self
                .last_sent_at
                .map_or(true, |sent| now.saturating_duration_since(sent) >= self.cooldown),
        }
    }

    /// Record a successful delivery.
    pub fn mark_sent(&mut self, now: Instant) {
        self.last_sent_at = Some(now);
        self.armed = false;
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn last_sent_at(&self) -> Option<Instant> {
        self.last_sent_at
    }
}
