//! Reachability probing
//!
//! A successful round trip through `ping` is the proxy for "has usable
//! internet"; interface binding via `-I` makes sure the probe exercises the
//! link under test and not whatever route happens to be default.

use std::time::Duration;

use super::run_command;

/// Host probed when the caller has no preference
pub const DEFAULT_PROBE_HOST: &str = "google.com";

/// Packets per probe when the caller has no preference
pub const DEFAULT_PROBE_COUNT: u32 = 5;

/// No parseable statistics line in the ping output.
pub const PROBE_NO_STATS: i64 = -1;

/// Statistics line found but its final token lacked the `ms` suffix.
pub const PROBE_BAD_UNIT: i64 = -2;

/// Measure round-trip latency through an interface.
///
/// Returns total time in milliseconds (non-negative), or a negative code on
/// failure. Callers only branch on sign; the distinct codes exist for
/// diagnostics.
pub async fn probe(interface: &str, host: &str, count: u32) -> i64 {
    // ping itself runs about one second per packet; leave slack on top
    let limit = Duration::from_secs(u64::from(count) + 25);
    let count_arg = count.to_string();

    let output = match run_command(
        "ping",
        &["-I", interface, "-c", &count_arg, host],
        limit,
    )
    .await
    {
        Ok(output) => output,
        Err(e) => {
            tracing::debug!("probe invocation failed: {}", e);
            return PROBE_NO_STATS;
        }
    };

    let stdout = String::from_utf8_lossy(&output.stdout);
    tracing::debug!("interface {} ping for {}: {}", interface, host, stdout.trim());

    parse_ping_output(&stdout)
}

/// Extract the total-time milliseconds from ping's summary line.
///
/// The summary looks like
/// `5 packets transmitted, 5 received, 0% packet loss, time 4004ms`;
/// the trailing token must carry the `ms` unit.
fn parse_ping_output(stdout: &str) -> i64 {
    let stats = stdout
        .lines()
        .filter(|line| line.contains("packets transmitted"))
        .last();

    let line = match stats {
        Some(line) => line,
        None => return PROBE_NO_STATS,
    };

    let ms_token = match line.split_whitespace().last() {
        Some(token) => token,
        None => return PROBE_NO_STATS,
    };

    let digits = match ms_token.strip_suffix("ms") {
        Some(digits) => digits,
        None => return PROBE_BAD_UNIT,
    };

    digits.parse::<i64>().unwrap_or(PROBE_BAD_UNIT)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PING_OK: &str = "\
PING google.com (142.250.74.78) 56(84) bytes of data.
64 bytes from muc11s01: icmp_seq=1 ttl=115 time=2.33 ms

--- google.com ping statistics ---
5 packets transmitted, 5 received, 0% packet loss, time 12ms
";

    #[test]
    fn test_latency_parsed_from_summary_line() {
        assert_eq!(parse_ping_output(PING_OK), 12);
    }

    #[test]
    fn test_missing_unit_suffix() {
        let out = "5 packets transmitted, 5 received, 0% packet loss, time 12";
        assert_eq!(parse_ping_output(out), PROBE_BAD_UNIT);
    }

    #[test]
    fn test_no_statistics_line() {
        assert_eq!(parse_ping_output(""), PROBE_NO_STATS);
        assert_eq!(
            parse_ping_output("ping: connect: Network is unreachable\n"),
            PROBE_NO_STATS
        );
    }

    #[test]
    fn test_non_integer_milliseconds() {
        let out = "5 packets transmitted, 5 received, 0% packet loss, time 4.1ms";
        assert_eq!(parse_ping_output(out), PROBE_BAD_UNIT);
    }

    #[test]
    fn test_failure_codes_are_negative() {
        assert!(PROBE_NO_STATS < 0);
        assert!(PROBE_BAD_UNIT < 0);
        assert_ne!(PROBE_NO_STATS, PROBE_BAD_UNIT);
    }
}
