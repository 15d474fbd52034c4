use tracing::{debug, info};

use super::{TunnelConfig, CONFIG_ENV_KEY};

pub fn log_env_source(path: &std::path::Path, from_env: bool) {
    if from_env {
        info!(
            target: "pgtunnel::config",
            path = %path.display(),
            "Loading configuration using PGTUNNEL_CONFIG environment variable"
        );
    } else {
        debug!(
            target: "pgtunnel::config",
            path = %path.display(),
            env = CONFIG_ENV_KEY,
            "PGTUNNEL_CONFIG not set; using the default location"
        );
    }
}

pub fn log_loaded(config: &TunnelConfig) {
    debug!(
        target: "pgtunnel::config",
        path = %config.source_path.display(),
        profiles = config.databases.len(),
        ssh = %config.commands.ssh.display(),
        sql_client = %config.commands.sql_client.display(),
        secret_store = %config.commands.secret_store.display(),
        keepalive_interval_secs = config.tunnel.keepalive_interval_secs,
        ready_timeout_secs = config.tunnel.ready_timeout_secs,
        "Configuration file loaded successfully"
    );
}
