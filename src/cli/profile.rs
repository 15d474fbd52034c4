//! LaunchProfile and config path resolution.
use std::{env, path::PathBuf};

use anyhow::{anyhow, Context, Result};

use crate::{
    config::{telemetry, CONFIG_ENV_KEY},
    lib::{paths, secret::SecretValue},
};

/// What the invocation asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    /// Open the tunnel and launch the SQL client.
    Connect { profile: String },
    /// Print the commands that `Connect` would run.
    DryRun { profile: String },
    /// Print the configured profiles.
    List,
}

impl RunMode {
    pub fn profile(&self) -> Option<&str> {
        match self {
            RunMode::Connect { profile } | RunMode::DryRun { profile } => Some(profile),
            RunMode::List => None,
        }
    }
}

/// Resolved launch profile.
#[derive(Debug, Clone)]
pub struct LaunchProfile {
    pub config_path: PathBuf,
    pub mode: RunMode,
    pub store_secret: Option<SecretValue>,
}

/// Resolve config path in the order: CLI override → env var → `$HOME/code/tunnels/config.yaml`.
pub fn resolve_config_path(override_path: Option<PathBuf>) -> Result<PathBuf> {
    let path = match override_path {
        Some(path) => path,
        None => match env::var_os(CONFIG_ENV_KEY).filter(|value| !value.is_empty()) {
            Some(value) => {
                let path = PathBuf::from(value);
                telemetry::log_env_source(&path, true);
                path
            }
            None => {
                let path = paths::default_config_path().map_err(|reason| {
                    anyhow!("cannot locate the default configuration file: {reason}")
                })?;
                telemetry::log_env_source(&path, false);
                path
            }
        },
    };

    if path.is_absolute() {
        return Ok(path);
    }

    let cwd = env::current_dir().context("failed to obtain current directory")?;
    Ok(cwd.join(path))
}
