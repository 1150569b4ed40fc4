//! Smart Bin - Raspberry Pi trash bin controller binary
//!
//! Runs the polling loop in the foreground until Ctrl-C (or SIGTERM).

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use smart_bin::hardware::{
    self, Hardware, SimulatedEcho, SimulatedPresence, SimulatedRangeSensor,
};
use smart_bin::sinks::{self, LogAlertSink, LogSink};
use smart_bin::{BinController, ControllerConfig, Reading};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "smart_bin")]
#[command(about = "Smart trash bin controller for Raspberry Pi")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = "Measures fill level, drives the lid servo and reports to the cloud")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file (TOML)
    #[arg(short, long, env = "SMART_BIN_CONFIG")]
    config: Option<PathBuf>,

    /// Polling interval in milliseconds (overrides the config file)
    #[arg(short, long)]
    interval: Option<u64>,

    /// Alert threshold in percent (overrides the config file)
    #[arg(short, long)]
    threshold: Option<f64>,

    /// Use simulated devices instead of GPIO
    #[arg(long)]
    simulate: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the control loop (default)
    Run,

    /// Take a single reading and exit
    Once(OnceArgs),

    /// Show the effective configuration
    Info,
}

#[derive(Args)]
struct OnceArgs {
    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Pretty)]
    format: OutputFormat,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Pretty,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(&cli)?;

    let config = load_config(&cli)?;

    match &cli.command {
        Some(Commands::Run) | None => run_command(config, cli.simulate).await,
        Some(Commands::Once(args)) => once_command(config, cli.simulate, args),
        Some(Commands::Info) => info_command(&config),
    }
}

fn init_logging(cli: &Cli) -> anyhow::Result<()> {
    let level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else {
        "warn"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}

fn load_config(cli: &Cli) -> anyhow::Result<ControllerConfig> {
    let mut config = match &cli.config {
        Some(path) => ControllerConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ControllerConfig::default(),
    }
    .with_env_overrides();

    if let Some(interval) = cli.interval {
        config = config.with_interval_ms(interval);
    }
    if let Some(threshold) = cli.threshold {
        config = config.with_threshold(threshold);
    }

    config.validate().context("invalid configuration")?;
    Ok(config)
}

/// A bin that fills up over a minute of cycles while someone walks past now and then.
fn simulated_hardware(config: &ControllerConfig) -> Hardware {
    let capacity = config.bin.max_capacity_cm;
    let mut echoes: Vec<SimulatedEcho> = (0..120)
        .map(|i| SimulatedEcho::Distance(capacity - capacity * 0.9 * i as f64 / 119.0))
        .collect();
    echoes.insert(10, SimulatedEcho::Timeout);

    let presence = (0..120).map(|i| i % 20 >= 16);

    let (hardware, _handles) = hardware::simulated(
        SimulatedRangeSensor::new(echoes),
        SimulatedPresence::new(presence),
    );
    hardware
}

fn acquire_hardware(config: &ControllerConfig, simulate: bool) -> anyhow::Result<Hardware> {
    if simulate {
        info!("Using simulated devices");
        return Ok(simulated_hardware(config));
    }
    Ok(hardware::acquire(config)?)
}

async fn run_command(config: ControllerConfig, simulate: bool) -> anyhow::Result<()> {
    info!("Starting smart bin controller...");

    let hardware = acquire_hardware(&config, simulate)?;
    let data_sink = sinks::data_sink(&config)?;
    let alert_sink = sinks::alert_sink(&config)?;

    let mut controller = BinController::new(config, hardware, data_sink, alert_sink)?;
    controller.run(shutdown_signal()).await?;

    Ok(())
}

fn once_command(config: ControllerConfig, simulate: bool, args: &OnceArgs) -> anyhow::Result<()> {
    let hardware = acquire_hardware(&config, simulate)?;
    let mut controller =
        BinController::new(config, hardware, Box::new(LogSink), Box::new(LogAlertSink))?;
    let reading = controller.sample()?;
    let threshold = controller.config().bin.alert_threshold_pct;

    match args.format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&reading)?);
        }
        OutputFormat::Pretty => {
            print_pretty_reading(&reading, threshold);
        }
    }

    Ok(())
}

fn info_command(config: &ControllerConfig) -> anyhow::Result<()> {
    let mut shown = config.clone();
    if let Some(db) = shown.database.as_mut() {
        if db.auth_token.is_some() {
            db.auth_token = Some("********".to_string());
        }
    }

    println!("Smart Bin Configuration");
    println!("=======================");
    println!();
    println!("{}", toml::to_string_pretty(&shown)?);

    println!("Features compiled:");
    #[cfg(feature = "gpio")]
    println!("  - GPIO support: ✓");
    #[cfg(not(feature = "gpio"))]
    println!("  - GPIO support: ✗ (use --simulate)");

    Ok(())
}

fn print_pretty_reading(reading: &Reading, threshold: f64) {
    println!(
        "Bin Reading ({})",
        reading.timestamp.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!("==========================================");
    if reading.out_of_range {
        println!("  Distance: {:.1} cm (no echo, assumed empty)", reading.distance_cm);
    } else {
        println!("  Distance: {:.1} cm", reading.distance_cm);
    }
    println!("  Filled: {:.2}%", reading.fill_percentage);
    println!("  Presence: {}", if reading.lid_state.is_open() { "yes" } else { "no" });
    if reading.is_at_or_above(threshold) {
        println!("  Status: FULL (threshold {:.0}%)", threshold);
    } else {
        println!("  Status: OK");
    }
}

/// Resolves on Ctrl-C, or on SIGTERM where available.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
