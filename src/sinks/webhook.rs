//! Alert delivery to a generic HTTP webhook.

use super::traits::{AlertSink, BinAlert};
use crate::error::{BinError, Result};
use async_trait::async_trait;
use std::time::Duration;

const SINK_NAME: &str = "webhook";

/// POSTs each [`BinAlert`] as JSON; any non-2xx answer counts as a failure.
pub struct WebhookAlertSink {
    client: reqwest::Client,
    url: String,
}

impl WebhookAlertSink {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BinError::config_error(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl AlertSink for WebhookAlertSink {
    fn name(&self) -> &'static str {
        SINK_NAME
    }

    async fn notify(&self, alert: &BinAlert) -> Result<()> {
        self.client
            .post(&self.url)
            .json(alert)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| BinError::sink_error(SINK_NAME, e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensing::{LidState, Reading};

    #[tokio::test]
    async fn test_unreachable_webhook_is_sink_error() {
        let sink = WebhookAlertSink::new("http://127.0.0.1:1/hook", Duration::from_secs(1)).unwrap();
        let reading = Reading::new(2.0, 90.9, LidState::Closed);
        let err = sink
            .notify(&BinAlert::new("bin", &reading, 80.0))
            .await
            .unwrap_err();
        assert!(matches!(err, BinError::SinkUnavailable { sink: "webhook", .. }));
    }
}
