//! Wi-Fi scanning via nmcli
//!
//! Scanning is best-effort: a failed or empty invocation yields an empty
//! list, never an error, and malformed rows degrade instead of aborting.

use std::time::Duration;

use super::{run_command, WifiNetwork, NO_SECURITY};

/// Timeout for one nmcli scan
const SCAN_TIMEOUT: Duration = Duration::from_secs(15);

/// Scan for visible networks on an interface.
///
/// Returns records sorted by descending signal strength; ties keep nmcli's
/// output order. Rows are dropped outright when they are empty, the header
/// row, or end in the bare `--` placeholder nmcli leaves on malformed rows.
pub async fn scan(interface: &str) -> Vec<WifiNetwork> {
    let output = match run_command(
        "nmcli",
        &[
            "-f",
            "SIGNAL,SECURITY,SSID",
            "dev",
            "wifi",
            "list",
            "ifname",
            interface,
        ],
        SCAN_TIMEOUT,
    )
    .await
    {
        Ok(output) => output,
        Err(e) => {
            tracing::warn!("scan failed: {}", e);
            return Vec::new();
        }
    };

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        tracing::warn!("nmcli scan exited with error: {}", stderr.trim());
        return Vec::new();
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let mut networks = parse_scan_output(interface, &stdout);

    networks.sort_by_key(|n| std::cmp::Reverse(n.signal));
    networks
}

/// Parse nmcli's tabular output into records.
fn parse_scan_output(interface: &str, stdout: &str) -> Vec<WifiNetwork> {
    let mut networks = Vec::new();

    for line in stdout.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.is_empty() || parts[0] == "SIGNAL" || parts[parts.len() - 1] == NO_SECURITY {
            continue;
        }
        networks.push(WifiNetwork::parse(interface, &parts));
    }

    networks
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
SIGNAL  SECURITY        SSID
5       --              Lobby Guest
42      WPA2            HomeNet
17                      Park
";

    #[test]
    fn test_sorted_descending_by_signal() {
        let mut networks = parse_scan_output("wlan0", SAMPLE);
        networks.sort_by_key(|n| std::cmp::Reverse(n.signal));
        let signals: Vec<i64> = networks.iter().map(|n| n.signal).collect();
        assert_eq!(signals, vec![42, 17, 5]);
    }

    #[test]
    fn test_header_row_excluded() {
        let networks = parse_scan_output("wlan0", SAMPLE);
        assert!(networks.iter().all(|n| n.ssid != "SSID"));
        assert_eq!(networks.len(), 3);
    }

    #[test]
    fn test_trailing_placeholder_row_excluded() {
        let out = "70  WPA2  HomeNet\n80  CafeWifi  --\n";
        let networks = parse_scan_output("wlan0", out);
        assert_eq!(networks.len(), 1);
        assert_eq!(networks[0].ssid, "HomeNet");
    }

    #[test]
    fn test_empty_output_yields_no_networks() {
        assert!(parse_scan_output("wlan0", "").is_empty());
        assert!(parse_scan_output("wlan0", "\n\n").is_empty());
    }

    #[test]
    fn test_open_and_secured_records() {
        let networks = parse_scan_output("wlan0", SAMPLE);
        let home = networks.iter().find(|n| n.ssid == "HomeNet").unwrap();
        assert!(!home.is_open());
        let park = networks.iter().find(|n| n.ssid == "Park").unwrap();
        assert!(park.is_open());
        // "--" in the SECURITY column is consumed, leaving an open record
        let lobby = networks.iter().find(|n| n.ssid == "Lobby Guest").unwrap();
        assert!(lobby.is_open());
        assert_eq!(lobby.signal, 5);
    }
}
