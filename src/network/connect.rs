//! Joining networks via nmcli
//!
//! nmcli exits zero for some association failures, so success is judged by
//! an empty diagnostic stream rather than the exit status.

use std::time::Duration;

use super::{run_command, WifiNetwork};

/// Timeout for one join attempt; association plus DHCP can be slow.
const JOIN_TIMEOUT: Duration = Duration::from_secs(45);

/// Attempt to join a network, passing the credential only when non-empty.
///
/// One best-effort attempt with no internal retry; retry policy belongs to
/// the selection loop.
pub async fn join(network: &WifiNetwork, password: &str) -> bool {
    tracing::info!("{}: attempting to connect...", network.ssid);

    let mut args = vec![
        "nmcli",
        "device",
        "wifi",
        "connect",
        network.ssid.as_str(),
        "ifname",
        network.interface.as_str(),
    ];
    if !password.is_empty() {
        args.push("password");
        args.push(password);
    }

    let output = match run_command("sudo", &args, JOIN_TIMEOUT).await {
        Ok(output) => output,
        Err(e) => {
            tracing::warn!("{}: connection attempt failed: {}", network.ssid, e);
            return false;
        }
    };

    let err = String::from_utf8_lossy(&output.stderr);
    let err = err.trim();
    if err.is_empty() {
        return true;
    }

    tracing::warn!("{}: connection error: {}", network.ssid, err);
    false
}
