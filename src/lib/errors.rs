use std::{io, path::PathBuf, process::ExitCode};

use config::ConfigError as ConfigLoaderError;
use thiserror::Error;

/// Errors that can occur while loading or validating the tunnels configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file does not exist.
    #[error("Configuration file {path} not found")]
    NotFound { path: PathBuf },
    /// The file exists but could not be read (permissions, I/O).
    #[error("Failed to read configuration file {path}: {source}")]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    /// The file content is not a YAML document.
    #[error("Configuration file {path} is not valid YAML: {source}")]
    Syntax {
        path: PathBuf,
        #[source]
        source: ConfigLoaderError,
    },
    /// Failed to deserialize YAML into a struct.
    #[error("Failed to parse configuration file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: ConfigLoaderError,
    },
    /// Required field is missing.
    #[error("Configuration file {path} is missing `{field}`")]
    MissingField { path: PathBuf, field: String },
    /// Field failed validation.
    #[error("Configuration file {path} has invalid `{field}`: {message}")]
    InvalidField {
        path: PathBuf,
        field: String,
        message: String,
    },
}

impl ConfigError {
    /// A missing file stays `NotFound`; every other I/O failure is `Unreadable`.
    pub fn from_io_error(path: PathBuf, source: io::Error) -> Self {
        match source.kind() {
            io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Unreadable { path, source },
        }
    }

    /// Helper to wrap `config::ConfigError` as a YAML syntax failure.
    pub fn from_syntax_error(path: PathBuf, source: ConfigLoaderError) -> Self {
        Self::Syntax { path, source }
    }

    /// Helper to wrap `config::ConfigError` as a parse failure.
    pub fn from_parse_error(path: PathBuf, source: ConfigLoaderError) -> Self {
        Self::Parse { path, source }
    }

    pub fn missing(path: &std::path::Path, field: impl Into<String>) -> Self {
        Self::MissingField {
            path: path.to_path_buf(),
            field: field.into(),
        }
    }

    pub fn invalid(
        path: &std::path::Path,
        field: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidField {
            path: path.to_path_buf(),
            field: field.into(),
            message: message.into(),
        }
    }
}

/// The requested profile is not a key of `databases`.
#[derive(Debug, Error)]
#[error("Database profile `{name}` not found in {path} (available: {})", display_names(.available))]
pub struct ProfileNotFound {
    pub name: String,
    pub path: PathBuf,
    pub available: Vec<String>,
}

fn display_names(names: &[String]) -> String {
    if names.is_empty() {
        "none".to_string()
    } else {
        names.join(", ")
    }
}

/// Failures talking to the external secret store.
#[derive(Debug, Error)]
pub enum SecretError {
    #[error("Failed to fetch secret `{path}` with `{program}`: {reason}")]
    Fetch {
        program: String,
        path: String,
        reason: String,
    },
    #[error("Failed to store secret `{path}` with `{program}`: {reason}")]
    Write {
        program: String,
        path: String,
        reason: String,
    },
}

/// Failures while opening, supervising, or closing the SSH tunnel.
#[derive(Debug, Error)]
pub enum TunnelError {
    #[error("Local port {port} cannot be bound: {source}")]
    PortUnavailable {
        port: u16,
        #[source]
        source: io::Error,
    },
    #[error("Failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error(
        "ssh exited before the port forward on {port} was ready ({})",
        describe_exit(.exit_code)
    )]
    ExitedEarly { port: u16, exit_code: Option<i32> },
    #[error("Port forward on {port} was not ready after {timeout_secs} seconds")]
    NotReady { port: u16, timeout_secs: u64 },
    #[error("Failed to wait for ssh: {source}")]
    Wait {
        #[source]
        source: io::Error,
    },
    #[error("Failed to install signal handlers: {source}")]
    Signals {
        #[source]
        source: io::Error,
    },
}

/// Failures while running the SQL client.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("`{program}` exited with an error ({})", describe_exit(.exit_code))]
    Exited {
        program: String,
        exit_code: Option<i32>,
    },
    #[error("Failed to wait for `{program}`: {source}")]
    Wait {
        program: String,
        #[source]
        source: io::Error,
    },
}

fn describe_exit(exit_code: &Option<i32>) -> String {
    match exit_code {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    }
}

/// Taxonomy of fatal outcomes, one per failing step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ConfigNotFound,
    ConfigParseError,
    ProfileNotFound,
    SecretFetchError,
    SecretWriteError,
    TunnelError,
    ClientError,
    Interrupted,
}

impl ErrorKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ConfigNotFound => "config_not_found",
            ErrorKind::ConfigParseError => "config_parse_error",
            ErrorKind::ProfileNotFound => "profile_not_found",
            ErrorKind::SecretFetchError => "secret_fetch_error",
            ErrorKind::SecretWriteError => "secret_write_error",
            ErrorKind::TunnelError => "tunnel_error",
            ErrorKind::ClientError => "client_error",
            ErrorKind::Interrupted => "interrupted",
        }
    }

    /// Process exit code reported for this kind.
    pub const fn exit_code_value(&self) -> u8 {
        match self {
            ErrorKind::ConfigNotFound => 3,
            ErrorKind::ConfigParseError => 4,
            ErrorKind::ProfileNotFound => 5,
            ErrorKind::SecretWriteError => 6,
            ErrorKind::SecretFetchError => 7,
            ErrorKind::TunnelError => 8,
            ErrorKind::ClientError => 9,
            ErrorKind::Interrupted => 130,
        }
    }
}

/// Any fatal error raised by the connection sequence.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    ProfileNotFound(#[from] ProfileNotFound),
    #[error(transparent)]
    Secret(#[from] SecretError),
    #[error(transparent)]
    Tunnel(#[from] TunnelError),
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("Interrupted by {signal}")]
    Interrupted { signal: &'static str },
}

impl RunError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RunError::Config(ConfigError::NotFound { .. } | ConfigError::Unreadable { .. }) => {
                ErrorKind::ConfigNotFound
            }
            RunError::Config(_) => ErrorKind::ConfigParseError,
            RunError::ProfileNotFound(_) => ErrorKind::ProfileNotFound,
            RunError::Secret(SecretError::Fetch { .. }) => ErrorKind::SecretFetchError,
            RunError::Secret(SecretError::Write { .. }) => ErrorKind::SecretWriteError,
            RunError::Tunnel(_) => ErrorKind::TunnelError,
            RunError::Client(_) => ErrorKind::ClientError,
            RunError::Interrupted { .. } => ErrorKind::Interrupted,
        }
    }

    /// Name of the orchestrator step that produced the error.
    pub fn step(&self) -> &'static str {
        match self.kind() {
            ErrorKind::ConfigNotFound | ErrorKind::ConfigParseError => "load_config",
            ErrorKind::ProfileNotFound => "lookup_profile",
            ErrorKind::SecretWriteError => "store_secret",
            ErrorKind::SecretFetchError => "fetch_secret",
            ErrorKind::TunnelError => "open_tunnel",
            ErrorKind::ClientError => "launch_client",
            ErrorKind::Interrupted => "interrupted",
        }
    }

    /// Exit code for the process. A failing client's own exit code is passed through.
    pub fn exit_code(&self) -> ExitCode {
        match self {
            RunError::Client(ClientError::Exited {
                exit_code: Some(code),
                ..
            }) if (1..=255).contains(code) => ExitCode::from(*code as u8),
            _ => ExitCode::from(self.kind().exit_code_value()),
        }
    }
}
