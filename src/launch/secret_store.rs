//! Read and write credentials through the external secret store (`pass`).
use std::path::PathBuf;

use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::lib::{
    commands::{build_secret_insert_command, build_secret_show_command},
    errors::SecretError,
    secret::SecretValue,
};

use super::describe_status;

/// Handle on the secret-store executable.
#[derive(Debug, Clone)]
pub struct SecretStore {
    program: PathBuf,
}

impl SecretStore {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// Run `show <secret_path>` and return stdout with trailing whitespace removed.
    pub async fn fetch(&self, secret_path: &str) -> Result<SecretValue, SecretError> {
        let mut command = build_secret_show_command(&self.program, secret_path);
        debug!(
            target: "pgtunnel::secret",
            program = %self.program.display(),
            secret_path,
            "Fetching secret"
        );

        let output = command
            .output()
            .await
            .map_err(|err| self.fetch_error(secret_path, format!("failed to start: {err}")))?;
        let stdout = Zeroizing::new(output.stdout);
        if !output.status.success() {
            return Err(self.fetch_error(secret_path, describe_status(output.status)));
        }

        let text = std::str::from_utf8(&stdout)
            .map_err(|_| self.fetch_error(secret_path, "output is not valid UTF-8".into()))?;
        let trimmed = text.trim_end();
        if trimmed.is_empty() {
            return Err(self.fetch_error(secret_path, "printed an empty secret".into()));
        }
        Ok(SecretValue::new(trimmed.to_string()))
    }

    /// Run `insert -m -f <secret_path>` and feed exactly `value` on stdin.
    pub async fn store(&self, secret_path: &str, value: &SecretValue) -> Result<(), SecretError> {
        let mut command = build_secret_insert_command(&self.program, secret_path);
        info!(
            target: "pgtunnel::secret",
            program = %self.program.display(),
            secret_path,
            "Storing secret"
        );

        let mut child = command
            .spawn()
            .map_err(|err| self.write_error(secret_path, format!("failed to start: {err}")))?;
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| self.write_error(secret_path, "stdin was not captured".into()))?;
        let write_result = stdin.write_all(value.expose().as_bytes()).await;
        drop(stdin);

        let status = child
            .wait()
            .await
            .map_err(|err| self.write_error(secret_path, format!("failed to wait: {err}")))?;
        if !status.success() {
            return Err(self.write_error(secret_path, describe_status(status)));
        }
        write_result.map_err(|err| {
            self.write_error(secret_path, format!("failed to write stdin: {err}"))
        })
    }

    fn fetch_error(&self, secret_path: &str, reason: String) -> SecretError {
        SecretError::Fetch {
            program: self.program.display().to_string(),
            path: secret_path.to_string(),
            reason,
        }
    }

    fn write_error(&self, secret_path: &str, reason: String) -> SecretError {
        SecretError::Write {
            program: self.program.display().to_string(),
            path: secret_path.to_string(),
            reason,
        }
    }
}
