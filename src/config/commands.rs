use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::lib::errors::ConfigError;

pub const DEFAULT_SSH_PROGRAM: &str = "ssh";
pub const DEFAULT_SQL_CLIENT_PROGRAM: &str = "psql";
pub const DEFAULT_SECRET_STORE_PROGRAM: &str = "pass";

/// External executables the connection sequence drives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandsSection {
    pub ssh: PathBuf,
    pub sql_client: PathBuf,
    pub secret_store: PathBuf,
}

impl Default for CommandsSection {
    fn default() -> Self {
        Self {
            ssh: PathBuf::from(DEFAULT_SSH_PROGRAM),
            sql_client: PathBuf::from(DEFAULT_SQL_CLIENT_PROGRAM),
            secret_store: PathBuf::from(DEFAULT_SECRET_STORE_PROGRAM),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct RawCommandsSection {
    pub ssh: Option<PathBuf>,
    pub sql_client: Option<PathBuf>,
    pub secret_store: Option<PathBuf>,
}

pub fn parse_commands_section(
    raw: Option<RawCommandsSection>,
    path: &Path,
) -> Result<CommandsSection, ConfigError> {
    let raw = raw.unwrap_or_default();
    let ssh = program_or_default(raw.ssh, DEFAULT_SSH_PROGRAM, "commands.ssh", path)?;
    let sql_client = program_or_default(
        raw.sql_client,
        DEFAULT_SQL_CLIENT_PROGRAM,
        "commands.sql_client",
        path,
    )?;
    let secret_store = program_or_default(
        raw.secret_store,
        DEFAULT_SECRET_STORE_PROGRAM,
        "commands.secret_store",
        path,
    )?;
    Ok(CommandsSection {
        ssh,
        sql_client,
        secret_store,
    })
}

fn program_or_default(
    value: Option<PathBuf>,
    default: &str,
    field: &'static str,
    path: &Path,
) -> Result<PathBuf, ConfigError> {
    let program = value.unwrap_or_else(|| PathBuf::from(default));
    if program.as_os_str().is_empty() {
        return Err(ConfigError::invalid(
            path,
            field,
            "Provide a program name or path",
        ));
    }
    Ok(program)
}
