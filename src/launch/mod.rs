//! Executors for the three external programs: secret store, ssh, and the SQL client.
use std::{os::unix::process::ExitStatusExt, process::ExitStatus};

pub mod client;
pub mod secret_store;
pub mod tunnel;

#[cfg(test)]
pub(crate) mod stubs;

pub use client::{ClientLauncher, ClientSession};
pub use secret_store::SecretStore;
pub use tunnel::{TunnelHandle, TunnelLauncher};

/// Human-readable exit description for error messages.
pub(crate) fn describe_status(status: ExitStatus) -> String {
    match (status.code(), status.signal()) {
        (Some(code), _) => format!("exited with status code {code}"),
        (None, Some(signal)) => format!("terminated by signal {signal}"),
        (None, None) => "exited abnormally".to_string(),
    }
}
