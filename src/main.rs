mod config;
mod network;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use config::{AppConfig, Settings};

/// Environment variable consulted when no interface argument is given
const INTERFACE_ENV: &str = "ROAMU_INTERFACE";

/// Interface used when neither the argument nor the environment names one
const DEFAULT_INTERFACE: &str = "wlan0";

#[derive(Parser, Debug)]
#[command(name = "roamu")]
#[command(version = "0.1.0")]
#[command(about = "An auto-connect daemon for open Wi-Fi networks")]
struct Args {
    /// Wireless interface to manage (falls back to $ROAMU_INTERFACE, then wlan0)
    interface: Option<String>,

    /// Logging level (RUST_LOG overrides this)
    #[arg(short = 'l', long, value_enum, default_value = "info")]
    log_level: LogLevel,

    /// Log line format
    #[arg(short = 'f', long, value_enum, default_value = "full")]
    log_format: LogFormat,

    /// Print current connectivity status as JSON (for waybar) and exit
    #[arg(short, long)]
    status: bool,

    /// Scan once, print discovered networks as JSON, and exit
    #[arg(long)]
    scan: bool,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum LogFormat {
    Full,
    Compact,
    Pretty,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.log_level, args.log_format);

    let interface = args
        .interface
        .clone()
        .or_else(|| std::env::var(INTERFACE_ENV).ok())
        .unwrap_or_else(|| DEFAULT_INTERFACE.to_string());

    let app_config = AppConfig::load()?;
    let settings = Settings::resolve(interface, &app_config);

    // Handle one-shot commands
    if args.status {
        return print_status(&settings).await;
    }

    if args.scan {
        return print_scan(&settings).await;
    }

    network::monitor::start_monitoring(settings).await
}

/// Logs go to stderr so the one-shot JSON commands keep stdout clean.
fn init_logging(level: LogLevel, format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.directive()));

    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Full => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Compact => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_writer(std::io::stderr),
            )
            .init(),
        LogFormat::Pretty => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}

async fn print_status(settings: &Settings) -> Result<()> {
    let ip = network::interface_address(&settings.interface).await;

    let latency = match ip {
        Some(_) => {
            network::probe::probe(&settings.interface, &settings.probe_host, settings.probe_count)
                .await
        }
        None => -1,
    };
    let online = ip.is_some() && latency >= 0;

    // "degraded" means an address without working internet, so the user
    // notices a captive portal or dead uplink
    let class = if online {
        "connected"
    } else if ip.is_some() {
        "degraded"
    } else {
        "disconnected"
    };

    let tooltip = match (&ip, online) {
        (Some(addr), true) => format!("{}\n{} ({} ms)", settings.interface, addr, latency),
        (Some(addr), false) => format!("{}\n{} (no internet)", settings.interface, addr),
        (None, _) => format!("{} has no address", settings.interface),
    };

    let output = serde_json::json!({
        "text": if online { settings.interface.clone() } else { String::new() },
        "tooltip": tooltip,
        "class": class,
        "alt": class,
        "interface": settings.interface,
        "ip": ip,
        "latency_ms": if latency >= 0 { Some(latency) } else { None },
        "connected": online,
    });

    println!("{}", serde_json::to_string(&output)?);
    Ok(())
}

async fn print_scan(settings: &Settings) -> Result<()> {
    let networks = network::scan::scan(&settings.interface).await;
    println!("{}", serde_json::to_string_pretty(&networks)?);
    Ok(())
}
