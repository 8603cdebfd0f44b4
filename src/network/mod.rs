pub mod connect;
pub mod monitor;
pub mod probe;
pub mod scan;

use serde::{Deserialize, Serialize};
use std::process::{Command, Output};
use std::time::Duration;
use tokio::time::timeout;

/// Security labels nmcli prints in its SECURITY column. `--` is the
/// tool's "none" placeholder: consumed during parsing, never recorded.
pub const SECURITY_TYPES: &[&str] = &["WPA1", "WPA2", "802.1X", "--"];

/// nmcli's placeholder for an empty column.
pub const NO_SECURITY: &str = "--";

/// Timeout for `ip` address reads
const ADDR_TIMEOUT: Duration = Duration::from_secs(10);

/// One network discovered on a scan. Rebuilt on every scan, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WifiNetwork {
    pub interface: String,
    pub ssid: String,
    /// Signal strength, higher is better. -1 when the scan row carried a
    /// non-integer value; such records never pass the selection threshold.
    pub signal: i64,
    /// Recognized security labels in scan order. Empty means open.
    pub security: Vec<String>,
}

impl WifiNetwork {
    /// Parse one scan row that has already been tokenized on whitespace.
    ///
    /// Layout is SIGNAL, zero or more security labels, then the SSID, which
    /// may itself contain spaces. Security labels are consumed from the
    /// front only while more than one token remains, so the SSID can never
    /// be eaten even if it collides with a label name.
    pub fn parse(interface: &str, tokens: &[&str]) -> Self {
        let (sigval, mut rest) = match tokens.split_first() {
            Some((first, rest)) => (*first, rest),
            None => ("", &[][..]),
        };

        let mut security = Vec::new();
        while rest.len() > 1 && SECURITY_TYPES.contains(&rest[0]) {
            if rest[0] != NO_SECURITY {
                security.push(rest[0].to_string());
            }
            rest = &rest[1..];
        }

        let ssid = rest.join(" ");

        let signal = match sigval.parse::<i64>() {
            Ok(v) => v,
            Err(_) => {
                tracing::error!("{}: signal was not an integer: {}", ssid, sigval);
                -1
            }
        };

        tracing::debug!("{}: signal: {} security: {:?}", ssid, signal, security);

        Self {
            interface: interface.to_string(),
            ssid,
            signal,
            security,
        }
    }

    /// True when the network advertises no recognized security scheme.
    pub fn is_open(&self) -> bool {
        self.security.is_empty()
    }
}

/// Failures from the bounded subprocess runner.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("failed to run {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{command} timed out after {timeout_secs}s")]
    Timeout { command: String, timeout_secs: u64 },
    #[error("{command}: worker task failed: {source}")]
    Worker {
        command: String,
        #[source]
        source: tokio::task::JoinError,
    },
}

/// Run an external command with a bounded timeout so a wedged tool can
/// never stall the daemon.
pub async fn run_command(
    cmd: &str,
    args: &[&str],
    limit: Duration,
) -> Result<Output, CommandError> {
    let display = format!("{} {}", cmd, args.join(" "));
    let cmd = cmd.to_string();
    let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();

    let result = timeout(
        limit,
        tokio::task::spawn_blocking(move || Command::new(&cmd).args(&args).output()),
    )
    .await;

    match result {
        Ok(Ok(Ok(output))) => Ok(output),
        Ok(Ok(Err(e))) => Err(CommandError::Spawn {
            command: display,
            source: e,
        }),
        Ok(Err(e)) => Err(CommandError::Worker {
            command: display,
            source: e,
        }),
        Err(_) => Err(CommandError::Timeout {
            command: display,
            timeout_secs: limit.as_secs(),
        }),
    }
}

/// Read the interface's IPv4 address, if it has one.
///
/// Parses `ip -4 addr show`: the `inet` line's second token holds the
/// address with its prefix length (`192.168.1.7/24`).
pub async fn interface_address(interface: &str) -> Option<String> {
    let output = match run_command("ip", &["-4", "addr", "show", interface], ADDR_TIMEOUT).await {
        Ok(output) => output,
        Err(e) => {
            tracing::debug!("address read failed: {}", e);
            return None;
        }
    };

    if !output.status.success() {
        return None;
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    for line in stdout.lines() {
        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.first() == Some(&"inet") {
            if let Some(addr) = parts.get(1) {
                let addr = addr.split('/').next().unwrap_or(addr);
                return Some(addr.to_string());
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ssid_reconstruction() {
        let n = WifiNetwork::parse("wlan0", &["30", "WPA2", "Coffee", "Shop"]);
        assert_eq!(n.signal, 30);
        assert_eq!(n.security, vec!["WPA2"]);
        assert_eq!(n.ssid, "Coffee Shop");
    }

    #[test]
    fn test_open_network_has_empty_security() {
        let n = WifiNetwork::parse("wlan0", &["72", "CafeWifi"]);
        assert!(n.is_open());
        assert_eq!(n.ssid, "CafeWifi");
        assert_eq!(n.signal, 72);
    }

    #[test]
    fn test_non_integer_signal_degrades_to_sentinel() {
        let n = WifiNetwork::parse("wlan0", &["abc", "SomeNet"]);
        assert_eq!(n.signal, -1);
        assert_eq!(n.ssid, "SomeNet");
    }

    #[test]
    fn test_none_placeholder_consumed_but_not_recorded() {
        let n = WifiNetwork::parse("wlan0", &["55", "--", "Library"]);
        assert!(n.is_open());
        assert_eq!(n.ssid, "Library");
    }

    #[test]
    fn test_multiple_security_labels() {
        let n = WifiNetwork::parse("wlan0", &["88", "WPA1", "WPA2", "802.1X", "Office"]);
        assert_eq!(n.security, vec!["WPA1", "WPA2", "802.1X"]);
        assert_eq!(n.ssid, "Office");
        assert!(!n.is_open());
    }

    #[test]
    fn test_security_never_consumes_last_token() {
        // An SSID that happens to equal a security label must survive
        let n = WifiNetwork::parse("wlan0", &["40", "WPA2", "WPA2"]);
        assert_eq!(n.security, vec!["WPA2"]);
        assert_eq!(n.ssid, "WPA2");
    }
}
