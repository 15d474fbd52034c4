use std::{path::Path, time::Duration};

use serde::Deserialize;

use crate::lib::errors::ConfigError;

pub const DEFAULT_KEEPALIVE_INTERVAL_SECS: u32 = 60;
pub const DEFAULT_READY_TIMEOUT_SECS: u32 = 60;
pub const DEFAULT_SHUTDOWN_GRACE_SECS: u32 = 5;

/// SSH tunnel supervision settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TunnelSection {
    pub keepalive_interval_secs: u32,
    pub ready_timeout_secs: u32,
    pub shutdown_grace_secs: u32,
}

impl TunnelSection {
    pub fn ready_timeout(&self) -> Duration {
        Duration::from_secs(u64::from(self.ready_timeout_secs))
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(u64::from(self.shutdown_grace_secs))
    }
}

impl Default for TunnelSection {
    fn default() -> Self {
        Self {
            keepalive_interval_secs: DEFAULT_KEEPALIVE_INTERVAL_SECS,
            ready_timeout_secs: DEFAULT_READY_TIMEOUT_SECS,
            shutdown_grace_secs: DEFAULT_SHUTDOWN_GRACE_SECS,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct RawTunnelSection {
    pub keepalive_interval_secs: Option<u32>,
    pub ready_timeout_secs: Option<u32>,
    pub shutdown_grace_secs: Option<u32>,
}

pub fn parse_tunnel_section(
    raw: Option<RawTunnelSection>,
    path: &Path,
) -> Result<TunnelSection, ConfigError> {
    let raw = raw.unwrap_or_default();

    let keepalive_interval_secs = raw
        .keepalive_interval_secs
        .unwrap_or(DEFAULT_KEEPALIVE_INTERVAL_SECS);
    if keepalive_interval_secs == 0 {
        return Err(ConfigError::invalid(
            path,
            "tunnel.keepalive_interval_secs",
            "Specify a keep-alive interval of at least 1 second",
        ));
    }

    let ready_timeout_secs = raw.ready_timeout_secs.unwrap_or(DEFAULT_READY_TIMEOUT_SECS);
    if !(1..=3600).contains(&ready_timeout_secs) {
        return Err(ConfigError::invalid(
            path,
            "tunnel.ready_timeout_secs",
            "Specify a value between 1 and 3600 seconds",
        ));
    }

    let shutdown_grace_secs = raw
        .shutdown_grace_secs
        .unwrap_or(DEFAULT_SHUTDOWN_GRACE_SECS);
    if shutdown_grace_secs > 60 {
        return Err(ConfigError::invalid(
            path,
            "tunnel.shutdown_grace_secs",
            "Specify a value between 0 and 60 seconds",
        ));
    }

    Ok(TunnelSection {
        keepalive_interval_secs,
        ready_timeout_secs,
        shutdown_grace_secs,
    })
}
