//! Firebase Realtime Database sink over its REST API.

use super::traits::DataSink;
use crate::config::DatabaseConfig;
use crate::error::{BinError, Result};
use crate::sensing::Reading;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

const SINK_NAME: &str = "firebase";

/// Writes readings to a Realtime Database.
///
/// The current state is merged into `{url}/{state_path}.json` with `PATCH` and
/// each reading is appended to `{url}/{history_path}.json` with `POST`, which
/// lets the database generate the push key.
pub struct FirebaseSink {
    client: reqwest::Client,
    config: DatabaseConfig,
}

impl FirebaseSink {
    /// Create a sink for the configured database.
    pub fn new(config: DatabaseConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| BinError::config_error(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    /// REST endpoint for a database path.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}.json",
            self.config.url.trim_end_matches('/'),
            path.trim_matches('/')
        )
    }

    /// JSON body written for one reading.
    ///
    /// `timestamp` is the server-side timestamp placeholder, resolved by the
    /// database when the write lands.
    pub fn record_body(reading: &Reading) -> Value {
        json!({
            "id": reading.id,
            "distance_cm": reading.distance_cm,
            "fill_percentage": reading.fill_percentage,
            "lid_state": reading.lid_state,
            "out_of_range": reading.out_of_range,
            "recorded_at": reading.timestamp,
            "timestamp": { ".sv": "timestamp" },
        })
    }

    async fn send(&self, request: reqwest::RequestBuilder, body: &Value) -> Result<()> {
        let request = match &self.config.auth_token {
            Some(token) => request.query(&[("auth", token)]),
            None => request,
        };
        request
            .json(body)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| BinError::sink_error(SINK_NAME, e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl DataSink for FirebaseSink {
    fn name(&self) -> &'static str {
        SINK_NAME
    }

    async fn record(&self, reading: &Reading) -> Result<()> {
        let body = Self::record_body(reading);

        let state = self
            .send(self.client.patch(self.endpoint(&self.config.state_path)), &body)
            .await;
        // the history append is attempted even when the state update failed
        let history = self
            .send(self.client.post(self.endpoint(&self.config.history_path)), &body)
            .await;

        state.and(history)
    }
}
