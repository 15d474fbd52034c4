use std::path::Path;

use serde::Deserialize;

use crate::lib::errors::ConfigError;

pub const DEFAULT_PASSWORD_ENV: &str = "PGPASSWORD";

/// SQL client settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSection {
    /// Environment variable that carries the password into the client process.
    pub password_env: String,
}

impl Default for ClientSection {
    fn default() -> Self {
        Self {
            password_env: DEFAULT_PASSWORD_ENV.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct RawClientSection {
    pub password_env: Option<String>,
}

pub fn parse_client_section(
    raw: Option<RawClientSection>,
    path: &Path,
) -> Result<ClientSection, ConfigError> {
    let raw = raw.unwrap_or_default();
    let password_env = raw
        .password_env
        .unwrap_or_else(|| DEFAULT_PASSWORD_ENV.to_string());
    if password_env.is_empty() || password_env.contains(['=', '\0']) {
        return Err(ConfigError::invalid(
            path,
            "client.password_env",
            "Provide a non-empty variable name without `=` or NUL",
        ));
    }
    Ok(ClientSection { password_env })
}
