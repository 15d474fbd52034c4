use std::{collections::BTreeMap, path::Path};

use serde::Deserialize;

use crate::lib::errors::ConfigError;

/// One named entry of the `databases` mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseProfile {
    pub name: String,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub ssh_jump_host: String,
    pub ssh_jump_port: Option<u16>,
    pub local_port: u16,
    /// Path of the password inside the secret store.
    pub secret_path: String,
}

#[derive(Debug, Deserialize)]
pub struct RawDatabaseProfile {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub ssh_jump_host: Option<String>,
    pub ssh_jump_port: Option<u16>,
    pub local_port: Option<u16>,
    pub password_pass_path: Option<String>,
}

pub fn parse_databases_section(
    raw: Option<BTreeMap<String, RawDatabaseProfile>>,
    path: &Path,
) -> Result<BTreeMap<String, DatabaseProfile>, ConfigError> {
    let raw = raw.ok_or_else(|| ConfigError::missing(path, "databases"))?;
    raw.into_iter()
        .map(|(name, profile)| {
            let parsed = parse_database_profile(&name, profile, path)?;
            Ok((name, parsed))
        })
        .collect()
}

fn parse_database_profile(
    name: &str,
    raw: RawDatabaseProfile,
    path: &Path,
) -> Result<DatabaseProfile, ConfigError> {
    if name.trim().is_empty() {
        return Err(ConfigError::invalid(
            path,
            "databases",
            "Profile names cannot be empty",
        ));
    }

    let host = required_token(raw.host, name, "host", path)?;
    let port = required_port(raw.port, name, "port", path)?;
    let user = required_token(raw.user, name, "user", path)?;
    let ssh_jump_host = required_token(raw.ssh_jump_host, name, "ssh_jump_host", path)?;
    let ssh_jump_port = match raw.ssh_jump_port {
        Some(port) => Some(validate_port(port, name, "ssh_jump_port", path)?),
        None => None,
    };
    let local_port = required_port(raw.local_port, name, "local_port", path)?;
    let secret_path = required_text(raw.password_pass_path, name, "password_pass_path", path)?;

    Ok(DatabaseProfile {
        name: name.to_string(),
        host,
        port,
        user,
        ssh_jump_host,
        ssh_jump_port,
        local_port,
        secret_path,
    })
}

fn field_name(profile: &str, field: &str) -> String {
    format!("databases.{profile}.{field}")
}

fn required_text(
    value: Option<String>,
    profile: &str,
    field: &str,
    path: &Path,
) -> Result<String, ConfigError> {
    let value = value.ok_or_else(|| ConfigError::missing(path, field_name(profile, field)))?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::invalid(
            path,
            field_name(profile, field),
            "Value cannot be empty",
        ));
    }
    Ok(trimmed.to_string())
}

/// Host and user names end up inside ssh arguments, so they must be a single token
/// that ssh cannot mistake for an option.
fn required_token(
    value: Option<String>,
    profile: &str,
    field: &str,
    path: &Path,
) -> Result<String, ConfigError> {
    let value = required_text(value, profile, field, path)?;
    if value.chars().any(char::is_whitespace) {
        return Err(ConfigError::invalid(
            path,
            field_name(profile, field),
            "Value must be a single token",
        ));
    }
    if value.starts_with('-') {
        return Err(ConfigError::invalid(
            path,
            field_name(profile, field),
            "Value cannot start with '-'",
        ));
    }
    Ok(value)
}

fn required_port(
    value: Option<u16>,
    profile: &str,
    field: &str,
    path: &Path,
) -> Result<u16, ConfigError> {
    let port = value.ok_or_else(|| ConfigError::missing(path, field_name(profile, field)))?;
    validate_port(port, profile, field, path)
}

fn validate_port(port: u16, profile: &str, field: &str, path: &Path) -> Result<u16, ConfigError> {
    if port == 0 {
        return Err(ConfigError::invalid(
            path,
            field_name(profile, field),
            "Use a port in the range 1-65535",
        ));
    }
    Ok(port)
}
