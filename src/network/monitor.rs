//! Connection selection and the supervisory loop
//!
//! The daemon polls the interface on a fixed interval. While it is online
//! nothing happens; once connectivity is gone the selection policy scans,
//! walks the open networks in descending signal order, and keeps the first
//! one whose join survives a bounded reachability check. Networks that
//! fail are remembered for the rest of the run.

use anyhow::Result;
use std::collections::HashSet;
use tokio::time::{interval, sleep};

use crate::config::Settings;

use super::{connect, interface_address, probe, scan, WifiNetwork};

/// SSIDs that failed to yield connectivity this run.
///
/// Append-only for the process lifetime: a transiently failing network
/// stays blacklisted until restart. Owned by the supervisory loop and
/// handed to the selection policy each cycle.
#[derive(Debug, Default)]
pub struct FailureMemory {
    failed: HashSet<String>,
}

impl FailureMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, ssid: &str) {
        if self.failed.insert(ssid.to_string()) {
            tracing::debug!("recorded failed network: {}", ssid);
        }
    }

    pub fn contains(&self, ssid: &str) -> bool {
        self.failed.contains(ssid)
    }
}

/// Backend seam for the selection policy. Production code drives the real
/// system tools; tests script the answers.
pub trait WifiControl {
    async fn scan(&mut self, interface: &str) -> Vec<WifiNetwork>;
    async fn join(&mut self, network: &WifiNetwork, password: &str) -> bool;
    async fn probe(&mut self, interface: &str, host: &str, count: u32) -> i64;
}

/// Backend that shells out to nmcli / ping.
pub struct SystemControl;

impl WifiControl for SystemControl {
    async fn scan(&mut self, interface: &str) -> Vec<WifiNetwork> {
        scan::scan(interface).await
    }

    async fn join(&mut self, network: &WifiNetwork, password: &str) -> bool {
        connect::join(network, password).await
    }

    async fn probe(&mut self, interface: &str, host: &str, count: u32) -> i64 {
        probe::probe(interface, host, count).await
    }
}

/// State carried across supervision cycles
struct MonitorState {
    failed: FailureMemory,
    was_online: bool,
}

/// Try open networks in descending signal order until one yields internet.
///
/// Returns the network we ended up on, or `None` when every candidate was
/// skipped or failed; the caller retries next interval. A join only counts
/// once a reachability probe comes back non-negative; association without
/// internet is recorded as a failure like any other.
pub async fn try_connect<C: WifiControl>(
    control: &mut C,
    settings: &Settings,
    failed: &mut FailureMemory,
) -> Option<WifiNetwork> {
    let networks = control.scan(&settings.interface).await;
    let open: Vec<WifiNetwork> = networks.into_iter().filter(|n| n.is_open()).collect();
    tracing::debug!("found {} open networks...", open.len());

    for network in open {
        if network.signal <= settings.min_signal {
            tracing::debug!("{}: skipping (weak signal)", network.ssid);
            continue;
        }
        if failed.contains(&network.ssid) {
            tracing::debug!("{}: skipping (previously failed)", network.ssid);
            continue;
        }

        // Open networks only, so no credential is ever supplied
        if !control.join(&network, "").await {
            failed.record(&network.ssid);
            continue;
        }

        tracing::info!("{}: connection appeared to succeed; checking ping...", network.ssid);
        let mut latency = -1;
        for attempt in 0..settings.verify_attempts {
            latency = control
                .probe(&settings.interface, &settings.probe_host, settings.probe_count)
                .await;
            if latency >= 0 {
                break;
            }
            if attempt + 1 < settings.verify_attempts {
                sleep(settings.verify_pause).await;
            }
        }

        if latency < 0 {
            tracing::warn!("{}: connection failed (unable to ping)", network.ssid);
            failed.record(&network.ssid);
            continue;
        }

        tracing::info!("{}: successfully connected; ping: {}", network.ssid, latency);
        return Some(network);
    }

    None
}

/// Run the supervisory loop forever.
///
/// Each tick is isolated: a failure in one cycle is logged and the next
/// tick starts fresh. The loop has no shutdown path of its own; the
/// process is stopped by signal.
pub async fn start_monitoring(settings: Settings) -> Result<()> {
    let mut ticker = interval(settings.poll_interval);
    let mut control = SystemControl;
    let mut state = MonitorState {
        failed: FailureMemory::new(),
        was_online: false,
    };

    tracing::info!(
        "Starting roamu daemon on {} (poll interval {}s)",
        settings.interface,
        settings.poll_interval.as_secs()
    );

    loop {
        ticker.tick().await;

        if let Err(e) = run_cycle(&mut control, &settings, &mut state).await {
            tracing::error!("Supervision cycle error: {}", e);
        }
    }
}

/// One supervision cycle: probe the current connection, reconnect if needed.
async fn run_cycle<C: WifiControl>(
    control: &mut C,
    settings: &Settings,
    state: &mut MonitorState,
) -> Result<()> {
    let mut latency = -1;
    if let Some(ip) = interface_address(&settings.interface).await {
        latency = control
            .probe(&settings.interface, &settings.probe_host, settings.probe_count)
            .await;
        if latency >= 0 {
            tracing::info!("already connected; ip: {}; ping: {}", ip, latency);
        } else {
            tracing::info!("already connected, but no internet connection");
        }
    }

    if latency >= 0 {
        state.was_online = true;
        return Ok(());
    }

    if state.was_online {
        state.was_online = false;
        if settings.notifications {
            notify_offline(&settings.interface);
        }
    }

    match try_connect(control, settings, &mut state.failed).await {
        Some(network) => {
            state.was_online = true;
            if settings.notifications {
                notify_connected(&network);
            }
        }
        None => {
            tracing::debug!("no usable open network this cycle");
        }
    }

    Ok(())
}

// Notification helpers
fn notify_connected(network: &WifiNetwork) {
    let _ = notify_rust::Notification::new()
        .summary("roamu")
        .body(&format!("Connected to {}", network.ssid))
        .icon("network-wireless")
        .show();
}

fn notify_offline(interface: &str) {
    let _ = notify_rust::Notification::new()
        .summary("roamu")
        .body(&format!("{} lost internet connectivity", interface))
        .icon("network-wireless-disconnected")
        .show();
}
