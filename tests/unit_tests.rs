use smart_bin::{
    config::{AlertPolicy, BinConfig, ControllerConfig, DatabaseConfig},
    estimate,
    hardware::{simulated, SimulatedEcho, SimulatedPresence, SimulatedRangeSensor},
    sinks::{
        AlertSink, BinAlert, DataSink, FirebaseSink, MemoryAlertSink, MemorySink,
        WebhookAlertSink,
    },
    AlertOutcome, BinController, BinError, LidState, Reading,
};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

/// A request captured by the stub HTTP server
#[derive(Debug)]
struct CapturedRequest {
    method: String,
    target: String,
    body: serde_json::Value,
}

/// Start an HTTP server that answers every request with `status` and reports
/// what it received.
async fn stub_server(status: u16) -> (String, mpsc::UnboundedReceiver<CapturedRequest>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                return;
            };
            let tx = tx.clone();
            tokio::spawn(async move {
                let mut buf = Vec::new();
                let mut chunk = [0u8; 1024];
                let header_end = loop {
                    let n = socket.read(&mut chunk).await.unwrap();
                    if n == 0 {
                        return;
                    }
                    buf.extend_from_slice(&chunk[..n]);
                    if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                        break pos + 4;
                    }
                };

                let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
                let content_length = head
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                while buf.len() < header_end + content_length {
                    let n = socket.read(&mut chunk).await.unwrap();
                    if n == 0 {
                        break;
                    }
                    buf.extend_from_slice(&chunk[..n]);
                }

                let mut request_line = head.lines().next().unwrap_or_default().split(' ');
                let method = request_line.next().unwrap_or_default().to_string();
                let target = request_line.next().unwrap_or_default().to_string();
                let body = serde_json::from_slice(&buf[header_end..]).unwrap_or_default();
                let _ = tx.send(CapturedRequest {
                    method,
                    target,
                    body,
                });

                let response = format!(
                    "HTTP/1.1 {} Stub\r\ncontent-length: 2\r\nconnection: close\r\n\r\n{{}}",
                    status
                );
                let _ = socket.write_all(response.as_bytes()).await;
            });
        }
    });

    (format!("http://{}", addr), rx)
}

/// Test the reference fill scenarios for a 22 cm bin
#[test]
fn test_reference_fill_scenarios() {
    let bin = BinConfig::new(22.0);
    assert_eq!(estimate(22.0, &bin), 0.0);
    assert_eq!(estimate(0.0, &bin), 100.0);
    assert_eq!(estimate(4.4, &bin), 80.0);
    assert_eq!(estimate(-3.0, &bin), 100.0);
    assert_eq!(estimate(1000.0, &bin), 0.0);
}

/// Test that Reading serializes with lowercase lid state
#[test]
fn test_reading_serialization() {
    let reading = Reading::new(11.0, 50.0, LidState::Open);
    let json: serde_json::Value = serde_json::to_value(&reading).unwrap();

    assert_eq!(json["distance_cm"], 11.0);
    assert_eq!(json["fill_percentage"], 50.0);
    assert_eq!(json["lid_state"], "open");
    assert!(json.get("timestamp").is_some());

    let back: Reading = serde_json::from_value(json).unwrap();
    assert_eq!(back, reading);
}

/// Test BinError formatting
#[test]
fn test_bin_error_types() {
    let sink = BinError::sink_error("webhook", "HTTP status 500");
    assert!(format!("{}", sink).contains("HTTP status 500"));

    let hw = BinError::hardware_error("Failed to initialize GPIO");
    assert!(format!("{}", hw).contains("Failed to initialize GPIO"));
    assert!(hw.is_fatal());

    let timeout = BinError::SensorTimeout(Duration::from_millis(40));
    assert!(format!("{}", timeout).contains("40ms"));
}

/// Test ControllerConfig builder pattern
#[test]
fn test_controller_config_builder() {
    let config = ControllerConfig::default()
        .with_interval_ms(1000)
        .with_threshold(75.0)
        .with_debounce_cycles(2)
        .with_alert_policy(AlertPolicy::Cooldown)
        .with_webhook(Some("https://hooks.example.com/bin".to_string()));

    assert_eq!(config.interval(), Duration::from_millis(1000));
    assert_eq!(config.bin.alert_threshold_pct, 75.0);
    assert_eq!(config.lid.debounce_cycles, 2);
    assert_eq!(config.alert.policy, AlertPolicy::Cooldown);
    assert!(config.validate().is_ok());
}

/// Test the firebase sink writes the current state and appends history
#[tokio::test]
async fn test_firebase_sink_requests() {
    let (url, mut requests) = stub_server(200).await;
    let mut db = DatabaseConfig::new(url);
    db.auth_token = Some("secret".to_string());
    let sink = FirebaseSink::new(db).unwrap();

    let reading = Reading::new(4.4, 80.0, LidState::Closed);
    sink.record(&reading).await.unwrap();

    let state = requests.recv().await.unwrap();
    assert_eq!(state.method, "PATCH");
    assert_eq!(state.target, "/bin_data.json?auth=secret");
    assert_eq!(state.body["fill_percentage"], 80.0);
    assert_eq!(state.body["lid_state"], "closed");

    let history = requests.recv().await.unwrap();
    assert_eq!(history.method, "POST");
    assert_eq!(history.target, "/bin_data_history.json?auth=secret");
    assert_eq!(history.body["id"], reading.id.to_string());
}

/// Test a rejected database write surfaces as SinkUnavailable
#[tokio::test]
async fn test_firebase_sink_error_status() {
    let (url, _requests) = stub_server(401).await;
    let sink = FirebaseSink::new(DatabaseConfig::new(url)).unwrap();
    let err = sink
        .record(&Reading::new(10.0, 54.5, LidState::Closed))
        .await
        .unwrap_err();
    assert!(matches!(err, BinError::SinkUnavailable { .. }));
}

/// Test the webhook payload
#[tokio::test]
async fn test_webhook_alert_payload() {
    let (url, mut requests) = stub_server(200).await;
    let sink = WebhookAlertSink::new(format!("{}/notify", url), Duration::from_secs(2)).unwrap();

    let reading = Reading::new(2.2, 90.0, LidState::Closed);
    sink.notify(&BinAlert::new("kitchen", &reading, 80.0))
        .await
        .unwrap();

    let request = requests.recv().await.unwrap();
    assert_eq!(request.method, "POST");
    assert_eq!(request.target, "/notify");
    assert_eq!(request.body["event"], "bin_full");
    assert_eq!(request.body["bin_id"], "kitchen");
    assert_eq!(request.body["fill_percentage"], 90.0);
    assert_eq!(request.body["threshold_pct"], 80.0);
}

/// Test a full loop against simulated devices and a failing-then-recovering sink
#[tokio::test]
async fn test_controller_loop_end_to_end() {
    let (hardware, devices) = simulated(
        SimulatedRangeSensor::new([
            SimulatedEcho::Distance(20.0),
            SimulatedEcho::Distance(4.4),
        ]),
        SimulatedPresence::new([false, true]),
    );
    let data = MemorySink::new();
    let alerts = MemoryAlertSink::new();
    let config = ControllerConfig::default()
        .with_interval_ms(5)
        .with_alert_policy(AlertPolicy::Rearm);

    let mut controller = BinController::new(
        config,
        hardware,
        Box::new(data.clone()),
        Box::new(alerts.clone()),
    )
    .unwrap();

    data.set_failing(true);
    let first = controller.cycle().await.unwrap();
    assert!(!first.recorded);
    assert_eq!(first.alert, AlertOutcome::BelowThreshold);
    data.set_failing(false);

    let second = controller.cycle().await.unwrap();
    assert!(second.recorded);
    assert_eq!(second.alert, AlertOutcome::Sent);
    assert_eq!(second.reading.lid_state, LidState::Open);

    controller
        .run(tokio::time::sleep(Duration::from_millis(50)))
        .await
        .unwrap();

    // rearm policy: the bin never dropped below threshold again
    assert_eq!(alerts.alerts().len(), 1);
    assert!(data.history().len() >= 2);
    assert_eq!(data.current().unwrap().fill_percentage, 80.0);
    assert_eq!(devices.lid.commands()[0], LidState::Closed);
    assert!(devices.lid.is_released());
}

/// Test the controller keeps going when the alert webhook is unreachable
#[tokio::test]
async fn test_unreachable_alert_sink_does_not_stop_loop() {
    let (hardware, _devices) = simulated(
        SimulatedRangeSensor::fixed(1.0),
        SimulatedPresence::default(),
    );
    let webhook = WebhookAlertSink::new("http://127.0.0.1:1/hook", Duration::from_secs(1)).unwrap();
    let mut controller = BinController::new(
        ControllerConfig::default().with_interval_ms(5),
        hardware,
        Box::new(MemorySink::new()),
        Box::new(webhook),
    )
    .unwrap();

    for _ in 0..2 {
        let report = controller.cycle().await.unwrap();
        assert_eq!(report.alert, AlertOutcome::Failed);
        assert!(report.recorded);
    }
    assert_eq!(controller.stats().cycles, 2);
}
