//! Process-wide configuration for the relay coordinator.
//!
//! Follows the same `...Config::default()` + targeted env overrides idiom
//! used for the rest of this codebase's connection configuration.

use std::net::SocketAddr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct CoreConfig {
    /// Address the WebSocket/HTTP transport binds to.
    pub bind_addr: SocketAddr,

    /// Staleness cutoff for the liveness monitor.
    pub liveness_window: Duration,

    /// Period between liveness sweeps.
    pub liveness_sweep_interval: Duration,

    /// Chunk-inactivity cutoff before a transfer is judged failed.
    pub transfer_idle_timeout: Duration,

    /// Hard deadline for a single outbound send.
    pub outbound_send_deadline: Duration,

    /// Delay before the second, settle, roster broadcast after a registration.
    pub roster_settle_delay: Duration,

    /// Delay before a completed transfer is removed from the table.
    pub completion_grace_period: Duration,

    /// Hard per-envelope byte ceiling enforced by the codec.
    pub max_message_bytes: usize,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:7878".parse().unwrap(),
            liveness_window: Duration::from_secs(300),
            liveness_sweep_interval: Duration::from_secs(120),
            transfer_idle_timeout: Duration::from_secs(600),
            outbound_send_deadline: Duration::from_secs(10),
            roster_settle_delay: Duration::from_millis(300),
            completion_grace_period: Duration::from_secs(30),
            // 1.5x the largest chunk size we expect a sender to declare (1 MiB),
            // leaving headroom for base64 expansion and envelope overhead.
            max_message_bytes: (1024 * 1024 * 3) / 2,
        }
    }
}

impl CoreConfig {
    /// Layer environment variable overrides on top of the documented defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(v) = std::env::var("CORE_BIND_ADDR") {
            if let Ok(addr) = v.parse() {
                config.bind_addr = addr;
            } else {
                tracing::warn!(value = %v, "ignoring invalid CORE_BIND_ADDR");
            }
        }

        Self::override_secs(&mut config.liveness_window, "CORE_LIVENESS_WINDOW_SECONDS");
        Self::override_secs(
            &mut config.liveness_sweep_interval,
            "CORE_LIVENESS_SWEEP_SECONDS",
        );
        Self::override_secs(
            &mut config.transfer_idle_timeout,
            "CORE_TRANSFER_IDLE_SECONDS",
        );
        Self::override_secs(
            &mut config.completion_grace_period,
            "CORE_COMPLETION_GRACE_SECONDS",
        );
        Self::override_millis(
            &mut config.outbound_send_deadline,
            "CORE_OUTBOUND_SEND_DEADLINE_MS",
        );
        Self::override_millis(&mut config.roster_settle_delay, "CORE_ROSTER_SETTLE_MS");

        if let Ok(v) = std::env::var("CORE_MAX_CHUNK_BYTES") {
            match v.parse::<usize>() {
                Ok(n) => config.max_message_bytes = n,
                Err(_) => tracing::warn!(value = %v, "ignoring invalid CORE_MAX_CHUNK_BYTES"),
            }
        }

        config
    }

    fn override_secs(field: &mut Duration, var: &str) {
        if let Ok(v) = std::env::var(var) {
            match v.parse::<u64>() {
                Ok(n) => *field = Duration::from_secs(n),
                Err(_) => tracing::warn!(value = %v, var, "ignoring invalid duration override"),
            }
        }
    }

    fn override_millis(field: &mut Duration, var: &str) {
        if let Ok(v) = std::env::var(var) {
            match v.parse::<u64>() {
                Ok(n) => *field = Duration::from_millis(n),
                Err(_) => tracing::warn!(value = %v, var, "ignoring invalid duration override"),
            }
        }
    }
}
