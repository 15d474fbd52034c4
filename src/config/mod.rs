//! Load and validate the tunnels configuration file.
use std::{collections::BTreeMap, fs, path::PathBuf};

use serde::Deserialize;
use tracing::{error, info};

use crate::lib::errors::{ConfigError, ProfileNotFound};

pub mod client;
pub mod commands;
pub mod database;
pub mod telemetry;
pub mod tunnel;

pub use client::{parse_client_section, ClientSection, RawClientSection, DEFAULT_PASSWORD_ENV};
pub use commands::{
    parse_commands_section, CommandsSection, RawCommandsSection, DEFAULT_SECRET_STORE_PROGRAM,
    DEFAULT_SQL_CLIENT_PROGRAM, DEFAULT_SSH_PROGRAM,
};
pub use database::{parse_databases_section, DatabaseProfile, RawDatabaseProfile};
pub use tunnel::{
    parse_tunnel_section, RawTunnelSection, TunnelSection, DEFAULT_KEEPALIVE_INTERVAL_SECS,
    DEFAULT_READY_TIMEOUT_SECS, DEFAULT_SHUTDOWN_GRACE_SECS,
};

pub const CONFIG_ENV_KEY: &str = "PGTUNNEL_CONFIG";

/// Top-level configuration container.
#[derive(Debug, Clone)]
pub struct TunnelConfig {
    pub databases: BTreeMap<String, DatabaseProfile>,
    pub commands: CommandsSection,
    pub tunnel: TunnelSection,
    pub client: ClientSection,
    pub source_path: PathBuf,
}

#[derive(Debug, Deserialize)]
struct RawTunnelConfig {
    databases: Option<BTreeMap<String, RawDatabaseProfile>>,
    commands: Option<RawCommandsSection>,
    tunnel: Option<RawTunnelSection>,
    client: Option<RawClientSection>,
}

impl TunnelConfig {
    /// Load configuration from a specific path. The file is always read as YAML.
    pub fn load_from_path(path: PathBuf) -> Result<Self, ConfigError> {
        info!(
            target: "pgtunnel::config",
            path = %path.display(),
            "Starting configuration load"
        );

        if !path.is_file() {
            let error = ConfigError::NotFound { path: path.clone() };
            error!(
                target: "pgtunnel::config",
                path = %path.display(),
                reason = %error,
                "Configuration file is missing"
            );
            return Err(error);
        }

        let text = fs::read_to_string(&path).map_err(|err| {
            let error = ConfigError::from_io_error(path.clone(), err);
            error!(
                target: "pgtunnel::config",
                path = %path.display(),
                reason = %error,
                "Failed to read configuration file"
            );
            error
        })?;

        let builder = config::Config::builder()
            .add_source(config::File::from_str(&text, config::FileFormat::Yaml));
        let document = builder.build().map_err(|err| {
            let error = ConfigError::from_syntax_error(path.clone(), err);
            error!(
                target: "pgtunnel::config",
                path = %path.display(),
                reason = %error,
                "Configuration file is not valid YAML"
            );
            error
        })?;

        let raw: RawTunnelConfig = document.try_deserialize().map_err(|err| {
            let error = ConfigError::from_parse_error(path.clone(), err);
            error!(
                target: "pgtunnel::config",
                path = %path.display(),
                reason = %error,
                "Failed to parse configuration file"
            );
            error
        })?;

        let config = Self::from_raw(raw, path.clone()).map_err(|err| {
            error!(
                target: "pgtunnel::config",
                path = %path.display(),
                reason = %err,
                "Failed to validate configuration file"
            );
            err
        })?;

        telemetry::log_loaded(&config);
        Ok(config)
    }

    fn from_raw(raw: RawTunnelConfig, path: PathBuf) -> Result<Self, ConfigError> {
        let databases = parse_databases_section(raw.databases, &path)?;
        let commands = parse_commands_section(raw.commands, &path)?;
        let tunnel = parse_tunnel_section(raw.tunnel, &path)?;
        let client = parse_client_section(raw.client, &path)?;

        Ok(Self {
            databases,
            commands,
            tunnel,
            client,
            source_path: path,
        })
    }

    /// Look up a profile by name. Names are case-sensitive.
    pub fn profile(&self, name: &str) -> Result<&DatabaseProfile, ProfileNotFound> {
        self.databases.get(name).ok_or_else(|| ProfileNotFound {
            name: name.to_string(),
            path: self.source_path.clone(),
            available: self.profile_names(),
        })
    }

    /// Sorted profile names.
    pub fn profile_names(&self) -> Vec<String> {
        self.databases.keys().cloned().collect()
    }
}
