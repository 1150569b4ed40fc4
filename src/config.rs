//! Controller configuration.
//!
//! Everything the controller needs is carried in one [`ControllerConfig`] that is
//! built once at startup (defaults, then an optional TOML file, then CLI/env
//! overrides) and passed by reference to the constructors that need it.

use crate::error::{BinError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable that overrides `database.auth_token`.
pub const DB_AUTH_ENV: &str = "SMART_BIN_DB_AUTH";

/// Upper bound for `sensor.echo_timeout_ms`. An HC-SR04 echo never lasts longer
/// than about 38 ms.
pub const MAX_ECHO_TIMEOUT_MS: u64 = 1000;

/// Calibration of the bin itself.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BinConfig {
    /// Distance the sensor reads when the bin is empty, in centimeters.
    /// Substituted for the reading when the echo times out, never below
    /// `max_capacity_cm`.
    pub empty_distance_cm: f64,
    /// Distance at or below which the bin counts as completely full
    pub full_distance_cm: f64,
    /// Distance from the sensor to the bin floor, in centimeters
    pub max_capacity_cm: f64,
    /// Fill percentage at or above which the alert sink is notified
    pub alert_threshold_pct: f64,
}

impl Default for BinConfig {
    fn default() -> Self {
        Self {
            empty_distance_cm: crate::DEFAULT_MAX_CAPACITY_CM,
            full_distance_cm: 0.0,
            max_capacity_cm: crate::DEFAULT_MAX_CAPACITY_CM,
            alert_threshold_pct: crate::DEFAULT_ALERT_THRESHOLD_PCT,
        }
    }
}

impl BinConfig {
    /// Create a bin calibration with the given capacity and default threshold.
    pub fn new(max_capacity_cm: f64) -> Self {
        Self {
            empty_distance_cm: max_capacity_cm,
            max_capacity_cm,
            ..Default::default()
        }
    }

    /// Set the alert threshold percentage.
    pub fn with_threshold(mut self, alert_threshold_pct: f64) -> Self {
        self.alert_threshold_pct = alert_threshold_pct;
        self
    }

    /// Set the sensor floor distance.
    pub fn with_full_distance(mut self, full_distance_cm: f64) -> Self {
        self.full_distance_cm = full_distance_cm;
        self
    }

    /// Distance reported when no echo came back: the far end of the range.
    pub fn no_echo_distance_cm(&self) -> f64 {
        self.empty_distance_cm.max(self.max_capacity_cm)
    }

    fn validate(&self) -> Result<()> {
        if !(self.max_capacity_cm.is_finite() && self.max_capacity_cm > 0.0) {
            return Err(BinError::config_error(format!(
                "bin.max_capacity_cm must be positive, got {}",
                self.max_capacity_cm
            )));
        }
        if !(self.full_distance_cm >= 0.0 && self.full_distance_cm < self.max_capacity_cm) {
            return Err(BinError::config_error(format!(
                "bin.full_distance_cm must be in [0, {}), got {}",
                self.max_capacity_cm, self.full_distance_cm
            )));
        }
        if !(self.empty_distance_cm.is_finite() && self.empty_distance_cm >= self.full_distance_cm) {
            return Err(BinError::config_error(format!(
                "bin.empty_distance_cm must be at least {}, got {}",
                self.full_distance_cm, self.empty_distance_cm
            )));
        }
        if !(self.alert_threshold_pct > 0.0 && self.alert_threshold_pct <= 100.0) {
            return Err(BinError::config_error(format!(
                "bin.alert_threshold_pct must be in (0, 100], got {}",
                self.alert_threshold_pct
            )));
        }
        Ok(())
    }
}

/// BCM pin numbers of the attached devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PinConfig {
    pub trigger: u8,
    pub echo: u8,
    pub presence: u8,
    pub servo: u8,
}

impl Default for PinConfig {
    fn default() -> Self {
        Self {
            trigger: 23,
            echo: 24,
            presence: 27,
            servo: 17,
        }
    }
}

impl PinConfig {
    fn validate(&self) -> Result<()> {
        let pins = [self.trigger, self.echo, self.presence, self.servo];
        if let Some(&pin) = pins.iter().find(|&&pin| pin > 27) {
            return Err(BinError::config_error(format!(
                "BCM pin {} is outside the header range 0-27",
                pin
            )));
        }
        for (i, a) in pins.iter().enumerate() {
            if pins[i + 1..].contains(a) {
                return Err(BinError::config_error(format!(
                    "BCM pin {} is assigned to more than one device",
                    a
                )));
            }
        }
        Ok(())
    }
}

/// Ultrasonic ranging parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    /// Upper bound on each echo wait, in milliseconds
    pub echo_timeout_ms: u64,
    /// Speed of sound used for the round-trip conversion, in cm/s
    pub speed_of_sound_cm_s: f64,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            echo_timeout_ms: 40,
            speed_of_sound_cm_s: crate::SPEED_OF_SOUND_CM_S,
        }
    }
}

impl SensorConfig {
    /// The echo wait bound as a [`Duration`].
    pub fn echo_timeout(&self) -> Duration {
        Duration::from_millis(self.echo_timeout_ms)
    }
}

/// Servo angles and lid chatter suppression.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LidConfig {
    pub open_angle: f64,
    pub closed_angle: f64,
    /// Extra consecutive cycles a new presence state must hold before the lid moves.
    /// Zero re-evaluates the lid from the presence pin on every cycle.
    pub debounce_cycles: u32,
}

impl Default for LidConfig {
    fn default() -> Self {
        Self {
            open_angle: 90.0,
            closed_angle: 0.0,
            debounce_cycles: 0,
        }
    }
}

/// Realtime database connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Base URL, e.g. `https://your-project-id.firebaseio.com`
    pub url: String,
    /// Database secret or ID token sent as the `auth` query parameter
    pub auth_token: Option<String>,
    /// Path of the "current state" record
    pub state_path: String,
    /// Path of the history collection
    pub history_path: String,
    pub timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            auth_token: None,
            state_path: "bin_data".to_string(),
            history_path: "bin_data_history".to_string(),
            timeout_ms: 5000,
        }
    }
}

impl DatabaseConfig {
    /// Create a database configuration for the given base URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }
}

/// When an above-threshold reading produces an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AlertPolicy {
    /// Every cycle at or above the threshold alerts
    #[default]
    Always,
    /// Alert once per crossing; re-arm after the fill drops below the threshold
    Rearm,
    /// Alert at most once per cool-down interval
    Cooldown,
}

/// Alert delivery settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlertConfig {
    /// Webhook to POST to; alerts are only logged when unset
    pub webhook_url: Option<String>,
    pub policy: AlertPolicy,
    /// Only used by [`AlertPolicy::Cooldown`]
    pub cooldown_secs: u64,
    pub timeout_ms: u64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            policy: AlertPolicy::Always,
            cooldown_secs: 300,
            timeout_ms: 5000,
        }
    }
}

/// Complete controller configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Identifier sent with alerts
    pub bin_id: String,
    /// Delay between polling cycles in milliseconds
    pub interval_ms: u64,
    pub bin: BinConfig,
    pub pins: PinConfig,
    pub sensor: SensorConfig,
    pub lid: LidConfig,
    /// Data sink; readings are only logged when unset
    pub database: Option<DatabaseConfig>,
    pub alert: AlertConfig,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            bin_id: "smart-bin".to_string(),
            interval_ms: crate::DEFAULT_INTERVAL_MS,
            bin: BinConfig::default(),
            pins: PinConfig::default(),
            sensor: SensorConfig::default(),
            lid: LidConfig::default(),
            database: None,
            alert: AlertConfig::default(),
        }
    }
}

impl ControllerConfig {
    /// Load configuration from a TOML file. Missing sections take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            BinError::config_error(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&text)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Apply the database auth token from the environment, if present.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(token) = std::env::var(DB_AUTH_ENV) {
            if let Some(db) = self.database.as_mut() {
                db.auth_token = Some(token);
            }
        }
        self
    }

    /// Set the polling interval.
    pub fn with_interval_ms(mut self, interval_ms: u64) -> Self {
        self.interval_ms = interval_ms;
        self
    }

    /// Set the bin calibration.
    pub fn with_bin(mut self, bin: BinConfig) -> Self {
        self.bin = bin;
        self
    }

    /// Set the alert threshold percentage.
    pub fn with_threshold(mut self, alert_threshold_pct: f64) -> Self {
        self.bin.alert_threshold_pct = alert_threshold_pct;
        self
    }

    /// Set the lid debounce window in cycles.
    pub fn with_debounce_cycles(mut self, cycles: u32) -> Self {
        self.lid.debounce_cycles = cycles;
        self
    }

    /// Set the alert policy.
    pub fn with_alert_policy(mut self, policy: AlertPolicy) -> Self {
        self.alert.policy = policy;
        self
    }

    /// Set the data sink.
    pub fn with_database(mut self, database: Option<DatabaseConfig>) -> Self {
        self.database = database;
        self
    }

    /// Set the alert webhook URL.
    pub fn with_webhook(mut self, url: Option<String>) -> Self {
        self.alert.webhook_url = url;
        self
    }

    /// The polling interval as a [`Duration`].
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// Check the configuration for values the controller cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.interval_ms == 0 {
            return Err(BinError::config_error("interval_ms must be greater than zero"));
        }
        if !(1..=MAX_ECHO_TIMEOUT_MS).contains(&self.sensor.echo_timeout_ms) {
            return Err(BinError::config_error(format!(
                "sensor.echo_timeout_ms must be in 1-{}, got {}",
                MAX_ECHO_TIMEOUT_MS, self.sensor.echo_timeout_ms
            )));
        }
        if !(self.sensor.speed_of_sound_cm_s > 0.0) {
            return Err(BinError::config_error(
                "sensor.speed_of_sound_cm_s must be positive",
            ));
        }
        for (name, angle) in [
            ("lid.open_angle", self.lid.open_angle),
            ("lid.closed_angle", self.lid.closed_angle),
        ] {
            if !(0.0..=180.0).contains(&angle) {
                return Err(BinError::config_error(format!(
                    "{} must be within 0-180 degrees, got {}",
                    name, angle
                )));
            }
        }
        if let Some(db) = &self.database {
            if !(db.url.starts_with("http://") || db.url.starts_with("https://")) {
                return Err(BinError::config_error(format!(
                    "database.url must be an http(s) URL, got {:?}",
                    db.url
                )));
            }
        }
        if let Some(url) = &self.alert.webhook_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(BinError::config_error(format!(
                    "alert.webhook_url must be an http(s) URL, got {:?}",
                    url
                )));
            }
        }
        if self.alert.policy == AlertPolicy::Cooldown && self.alert.cooldown_secs == 0 {
            return Err(BinError::config_error(
                "alert.cooldown_secs must be greater than zero for the cooldown policy",
            ));
        }
        self.bin.validate()?;
        self.pins.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_wiring() {
        let config = ControllerConfig::default();
        assert_eq!(config.interval_ms, 500);
        assert_eq!(config.bin.max_capacity_cm, 22.0);
        assert_eq!(config.bin.alert_threshold_pct, 80.0);
        assert_eq!(config.pins.trigger, 23);
        assert_eq!(config.pins.echo, 24);
        assert_eq!(config.pins.presence, 27);
        assert_eq!(config.pins.servo, 17);
        assert_eq!(config.alert.policy, AlertPolicy::Always);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ControllerConfig::from_toml_str(
            r#"
            interval_ms = 1000

            [bin]
            max_capacity_cm = 40.0

            [alert]
            policy = "rearm"
            webhook_url = "https://example.com/hook"

            [database]
            url = "https://bin.firebaseio.com"
            "#,
        )
        .unwrap();

        assert_eq!(config.interval_ms, 1000);
        assert_eq!(config.bin.max_capacity_cm, 40.0);
        assert_eq!(config.bin.alert_threshold_pct, 80.0);
        assert_eq!(config.alert.policy, AlertPolicy::Rearm);
        let db = config.database.as_ref().unwrap();
        assert_eq!(db.state_path, "bin_data");
        assert_eq!(db.history_path, "bin_data_history");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = ControllerConfig::from_toml_str("interval_ms = \"fast\"").unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_echo_timeout_is_bounded() {
        let mut config = ControllerConfig::default();
        config.sensor.echo_timeout_ms = MAX_ECHO_TIMEOUT_MS;
        assert!(config.validate().is_ok());

        for timeout_ms in [0, MAX_ECHO_TIMEOUT_MS + 1, u64::MAX] {
            config.sensor.echo_timeout_ms = timeout_ms;
            assert!(matches!(config.validate(), Err(BinError::Config(_))));
        }
    }

    #[test]
    fn test_no_echo_distance_is_never_inside_the_bin() {
        let mut bin = BinConfig::new(22.0);
        assert_eq!(bin.no_echo_distance_cm(), 22.0);

        bin.empty_distance_cm = 2.0;
        assert_eq!(bin.no_echo_distance_cm(), 22.0);

        bin.empty_distance_cm = 30.0;
        assert_eq!(bin.no_echo_distance_cm(), 30.0);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let zero_interval = ControllerConfig::default().with_interval_ms(0);
        assert!(zero_interval.validate().is_err());

        let bad_threshold = ControllerConfig::default().with_threshold(0.0);
        assert!(bad_threshold.validate().is_err());

        let bad_floor = ControllerConfig::default()
            .with_bin(BinConfig::new(22.0).with_full_distance(22.0));
        assert!(bad_floor.validate().is_err());

        let mut shared_pin = ControllerConfig::default();
        shared_pin.pins.presence = shared_pin.pins.echo;
        assert!(shared_pin.validate().is_err());

        let bad_url = ControllerConfig::default().with_webhook(Some("ftp://x".to_string()));
        assert!(bad_url.validate().is_err());
    }

    #[test]
    fn test_echo_timeout_duration() {
        assert_eq!(
            SensorConfig::default().echo_timeout(),
            Duration::from_millis(40)
        );
    }
}
