//! Interactive SQL client launched against the forwarded local port.
use std::path::Path;

use tokio::process::Child;
use tracing::info;

use crate::{
    config::{ClientSection, DatabaseProfile},
    lib::{
        commands::{build_client_command, client_args, render_command_line},
        errors::ClientError,
        secret::SecretValue,
    },
};

/// Builds and spawns the SQL client for a profile.
pub struct ClientLauncher<'a> {
    program: &'a Path,
    settings: &'a ClientSection,
}

impl<'a> ClientLauncher<'a> {
    pub fn new(program: &'a Path, settings: &'a ClientSection) -> Self {
        Self { program, settings }
    }

    pub fn command_line(&self, profile: &DatabaseProfile) -> String {
        render_command_line(self.program, &client_args(profile))
    }

    /// Spawn the client. The secret is consumed and wiped once the child exists.
    pub fn launch(
        &self,
        profile: &DatabaseProfile,
        secret: SecretValue,
    ) -> Result<ClientSession, ClientError> {
        let mut command = build_client_command(self.program, profile, self.settings, &secret);
        info!(
            target: "pgtunnel::client",
            profile = %profile.name,
            command = %self.command_line(profile),
            password_env = %self.settings.password_env,
            "Launching SQL client"
        );
        let spawned = command.spawn();
        drop(command);
        drop(secret);

        let child = spawned.map_err(|source| ClientError::Spawn {
            program: self.program.display().to_string(),
            source,
        })?;
        Ok(ClientSession {
            child,
            program: self.program.display().to_string(),
        })
    }
}

/// Running SQL client.
#[derive(Debug)]
pub struct ClientSession {
    child: Child,
    program: String,
}

impl ClientSession {
    /// Wait for the client to exit; a non-zero exit is an error. Cancel safe.
    pub async fn wait(&mut self) -> Result<(), ClientError> {
        let status = self.child.wait().await.map_err(|source| ClientError::Wait {
            program: self.program.clone(),
            source,
        })?;
        if status.success() {
            return Ok(());
        }
        Err(ClientError::Exited {
            program: self.program.clone(),
            exit_code: status.code(),
        })
    }

    /// Kill the client and reap it.
    pub async fn terminate(&mut self) {
        if self.child.start_kill().is_ok() {
            let _ = self.child.wait().await;
        }
    }
}
