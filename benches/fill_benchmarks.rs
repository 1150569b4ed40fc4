use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use smart_bin::{
    config::{BinConfig, ControllerConfig},
    estimate,
    hardware::{simulated, SimulatedPresence, SimulatedRangeSensor},
    sensing::echo_to_distance_cm,
    sinks::{FirebaseSink, LogAlertSink, LogSink},
    BinController, LidState, Reading,
};
use std::time::Duration;

/// Benchmark fill estimation across the bin's range
fn bench_fill_estimation(c: &mut Criterion) {
    let bin = BinConfig::new(22.0);

    for distance in [-1.0, 4.4, 11.0, 22.0, 400.0].iter() {
        c.bench_with_input(
            BenchmarkId::new("fill_estimation", distance),
            distance,
            |b, &distance| b.iter(|| estimate(black_box(distance), &bin)),
        );
    }
}

/// Benchmark echo pulse conversion
fn bench_echo_conversion(c: &mut Criterion) {
    c.bench_function("echo_to_distance", |b| {
        b.iter(|| echo_to_distance_cm(black_box(Duration::from_micros(1283)), 34300.0))
    });
}

/// Benchmark building the database record body
fn bench_record_body(c: &mut Criterion) {
    let reading = Reading::new(4.4, 80.0, LidState::Closed);

    c.bench_function("record_body_json", |b| {
        b.iter(|| FirebaseSink::record_body(black_box(&reading)).to_string())
    });
}

/// Benchmark one full cycle against simulated devices and in-memory sinks
fn bench_controller_cycle(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().expect("Should create tokio runtime");
    let (hardware, _devices) = simulated(
        SimulatedRangeSensor::fixed(4.4),
        SimulatedPresence::new([true, false]),
    );
    let mut controller = BinController::new(
        ControllerConfig::default(),
        hardware,
        Box::new(LogSink),
        Box::new(LogAlertSink),
    )
    .expect("Should create controller");

    c.bench_function("controller_cycle", |b| {
        b.iter(|| rt.block_on(controller.cycle()).expect("Should complete cycle"))
    });
}

criterion_group!(
    benches,
    bench_fill_estimation,
    bench_echo_conversion,
    bench_record_body,
    bench_controller_cycle
);
criterion_main!(benches);
