//! Geobeacon CLI - Command-line interface
//!
//! This binary provides a command-line interface to the geobeacon library:
//! run the tracking service against a UDP GPS forwarder, inspect the
//! configuration file, or send a one-shot report for wiring checks.

mod error;

use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use tokio::sync::broadcast;

use error::CliError;
use geobeacon::config::ConfigFile;
use geobeacon::events::TrackerEvent;
use geobeacon::logging::init_logging_full;
use geobeacon::position::UdpGpsSource;
use geobeacon::relay::{CollectorClient, CollectorConfig, HttpCollectorClient, LocationReport};
use geobeacon::service::{LocationTracker, TrackerConfig};

#[derive(Parser)]
#[command(name = "geobeacon")]
#[command(about = "Background position tracking and relay", long_about = None)]
#[command(version = geobeacon::VERSION)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Track positions and relay them to the collector
    Run(RunArgs),
    /// Show the configuration file, creating it if missing
    Config,
    /// Send a single position report to the collector
    Send(SendArgs),
}

#[derive(Args)]
struct RunArgs {
    /// Collector endpoint URL (overrides the config file)
    #[arg(long)]
    collector_url: Option<String>,

    /// Tracking token attached to every delivered sample
    #[arg(long)]
    token: Option<String>,

    /// Sampling interval in milliseconds (overrides the config file)
    #[arg(long)]
    interval_ms: Option<u64>,

    /// UDP port to listen on for GPS forwarder datagrams
    #[arg(long)]
    udp_port: Option<u16>,

    /// Path to the configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

#[derive(Args)]
struct SendArgs {
    /// Latitude in decimal degrees
    #[arg(long)]
    lat: f64,

    /// Longitude in decimal degrees
    #[arg(long)]
    lon: f64,

    /// Collector endpoint URL (overrides the config file)
    #[arg(long)]
    collector_url: Option<String>,

    /// Tracking token attached to the report
    #[arg(long)]
    token: Option<String>,

    /// Path to the configuration file
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Run(args) => run(args).await,
        Command::Config => show_config(),
        Command::Send(args) => send(args).await,
    };

    if let Err(e) = result {
        e.exit();
    }
}

/// Run the tracking service until Ctrl-C.
async fn run(args: RunArgs) -> Result<(), CliError> {
    let config = load_config(args.config.as_deref())?;

    let (log_dir, log_file) = split_log_path(&config.logging.file);
    let _guard = init_logging_full(&log_dir, &log_file, true, args.debug)
        .map_err(|e| CliError::LoggingInit(e.to_string()))?;

    tracing::info!(version = geobeacon::VERSION, "geobeacon starting");

    let collector_url = args.collector_url.unwrap_or(config.collector.url);
    let collector = CollectorConfig::new(collector_url)
        .with_timeout(Duration::from_secs(config.collector.timeout_secs));
    let interval = Duration::from_millis(args.interval_ms.unwrap_or(config.position.interval_ms));
    let udp_port = args.udp_port.unwrap_or(config.position.udp_port);

    let source = Arc::new(UdpGpsSource::new(udp_port));
    let tracker = LocationTracker::with_http_collector(
        TrackerConfig::new().with_sample_interval(interval),
        source,
        &collector,
    )
    .map_err(CliError::ServiceCreation)?;

    let mut events = tracker.subscribe();
    let printer = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(TrackerEvent::StatusChanged { active }) => {
                    println!("status: {}", if active { "tracking" } else { "stopped" });
                }
                Ok(TrackerEvent::SampleCaptured(sample)) => {
                    println!(
                        "sample: {:.5}, {:.5} @ {}",
                        sample.latitude,
                        sample.longitude,
                        sample.captured_at.format("%H:%M:%S")
                    );
                }
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    eprintln!("warning: dropped {} events", missed);
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    tracker.start(args.token).map_err(CliError::Start)?;
    println!(
        "listening for GPS datagrams on udp/{}  (Ctrl-C to stop)",
        udp_port
    );

    tokio::signal::ctrl_c().await.map_err(CliError::Signal)?;

    tracker.stop();
    // Give queued samples and in-flight deliveries a moment to settle
    tokio::time::sleep(Duration::from_millis(200)).await;

    let stats = tracker.relay_stats();
    println!(
        "delivered {}/{} samples ({} failed)",
        stats.delivered, stats.dispatched, stats.failed
    );

    printer.abort();
    Ok(())
}

/// Print the config file path and contents, creating defaults if missing.
fn show_config() -> Result<(), CliError> {
    let path = ConfigFile::ensure_exists()?;
    let contents =
        std::fs::read_to_string(&path).map_err(|e| CliError::Config(e.to_string()))?;

    println!("{}", path.display());
    println!();
    print!("{}", contents);
    Ok(())
}

/// Deliver a single report to the collector.
async fn send(args: SendArgs) -> Result<(), CliError> {
    if args.lat.abs() > 90.0 || args.lon.abs() > 180.0 {
        eprintln!("Error: coordinates out of range (|lat| <= 90, |lon| <= 180)");
        process::exit(1);
    }

    let config = load_config(args.config.as_deref())?;
    let collector_url = args.collector_url.unwrap_or(config.collector.url);
    let collector = CollectorConfig::new(collector_url)
        .with_timeout(Duration::from_secs(config.collector.timeout_secs));

    let client = HttpCollectorClient::new(&collector).map_err(CliError::Delivery)?;
    let report = LocationReport {
        latitude: args.lat,
        longitude: args.lon,
        token: args.token,
    };

    client.deliver(&report).await.map_err(CliError::Delivery)?;
    println!("delivered to {}", client.endpoint());
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<ConfigFile, CliError> {
    let config = match path {
        Some(path) => ConfigFile::load_from(path)?,
        None => ConfigFile::load()?,
    };
    Ok(config)
}

/// Split a log file path into the (directory, filename) pair the logging
/// initializer expects.
fn split_log_path(log_path: &Path) -> (String, String) {
    let log_dir = log_path
        .parent()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|| ".".to_string());
    let log_file = log_path
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "geobeacon.log".to_string());
    (log_dir, log_file)
}
