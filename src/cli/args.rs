//! CLI argument definitions and `LaunchProfile` construction.
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::Parser;

use super::{resolve_config_path, LaunchProfile, RunMode};
use crate::lib::secret::SecretValue;

/// Command-line arguments.
#[derive(Debug, Clone, Parser)]
#[command(
    author,
    version,
    about = "Open an SSH tunnel to a configured database and launch psql through it",
    long_about = None,
    after_help = "Examples:\n  pgtunnel db1\n  pgtunnel -p 'new-password' db1\n  \
                  pgtunnel --dry-run db1"
)]
pub struct LaunchArgs {
    /// Store SECRET at the profile's `password_pass_path` before connecting.
    #[arg(
        short = 'p',
        long = "store-secret",
        value_name = "SECRET",
        allow_hyphen_values = true,
        value_parser = parse_secret
    )]
    pub store_secret: Option<SecretValue>,
    /// Path to config.yaml (overrides PGTUNNEL_CONFIG).
    #[arg(long = "config", value_name = "PATH")]
    pub config_override: Option<PathBuf>,
    /// Print the ssh and client command lines without running anything.
    #[arg(long, default_value_t = false, conflicts_with = "list")]
    pub dry_run: bool,
    /// List configured database profiles and exit.
    #[arg(long, default_value_t = false, conflicts_with = "store_secret")]
    pub list: bool,
    /// Database profile name (a key under `databases`).
    #[arg(value_name = "PROFILE", required_unless_present = "list")]
    pub profile: Option<String>,
}

impl LaunchArgs {
    /// Resolve CLI args and environment into a `LaunchProfile`.
    pub fn into_command(self) -> Result<LaunchProfile> {
        let config_path = resolve_config_path(self.config_override)?;

        let mode = if self.list {
            RunMode::List
        } else {
            let profile = self
                .profile
                .filter(|name| !name.trim().is_empty())
                .ok_or_else(|| anyhow!("a database profile name is required"))?;
            if self.dry_run {
                RunMode::DryRun { profile }
            } else {
                RunMode::Connect { profile }
            }
        };

        Ok(LaunchProfile {
            config_path,
            mode,
            store_secret: self.store_secret,
        })
    }
}

fn parse_secret(raw: &str) -> Result<SecretValue, String> {
    if raw.is_empty() {
        return Err("the secret cannot be empty".to_string());
    }
    Ok(SecretValue::new(raw.to_string()))
}
