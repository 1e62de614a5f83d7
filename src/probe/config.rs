//! Engine configuration
//!
//! These are the OS-level socket timeouts. They are not part of a
//! [`RequestSpec`](super::RequestSpec) and are not echoed in results.

use std::time::Duration;

/// Default TCP connect timeout
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default socket read/write timeout (also bounds the TLS handshake)
pub const DEFAULT_IO_TIMEOUT: Duration = Duration::from_secs(10);

/// Probe engine configuration (immutable once handed to a `Prober`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeConfig {
    pub connect_timeout: Duration,
    pub io_timeout: Duration,
}

impl ProbeConfig {
    pub fn new() -> Self {
        ProbeConfig {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            io_timeout: DEFAULT_IO_TIMEOUT,
        }
    }

    /// Read timeouts from `RAWPROBE_CONNECT_TIMEOUT` and `RAWPROBE_IO_TIMEOUT`
    ///
    /// Values look like `5s`, `3000ms` or a bare number of seconds. Unset or
    /// unparsable variables fall back to the defaults.
    pub fn from_env() -> Self {
        ProbeConfig {
            connect_timeout: duration_env("RAWPROBE_CONNECT_TIMEOUT", DEFAULT_CONNECT_TIMEOUT),
            io_timeout: duration_env("RAWPROBE_IO_TIMEOUT", DEFAULT_IO_TIMEOUT),
        }
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn io_timeout(mut self, timeout: Duration) -> Self {
        self.io_timeout = timeout;
        self
    }
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self::new()
    }
}

fn duration_env(key: &str, default: Duration) -> Duration {
    std::env::var(key)
        .ok()
        .and_then(|v| parse_duration(&v))
        .unwrap_or(default)
}

/// Parse `5s`, `3000ms` or `7` (seconds). Zero is rejected since socket
/// timeouts cannot be zero.
pub fn parse_duration(value: &str) -> Option<Duration> {
    let value = value.trim();
    let duration = if let Some(ms) = value.strip_suffix("ms") {
        ms.trim().parse::<u64>().ok().map(Duration::from_millis)
    } else if let Some(secs) = value.strip_suffix('s') {
        secs.trim().parse::<u64>().ok().map(Duration::from_secs)
    } else {
        value.parse::<u64>().ok().map(Duration::from_secs)
    }?;

    if duration.is_zero() {
        None
    } else {
        Some(duration)
    }
}
