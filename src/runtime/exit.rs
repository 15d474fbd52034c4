use std::process::ExitCode;

use anyhow::Error;
use tracing::debug;

use crate::lib::errors::RunError;

/// Bundles a runtime error message with an exit code.
#[derive(Debug)]
pub struct RuntimeExit {
    message: String,
    exit_code: ExitCode,
}

impl RuntimeExit {
    /// Diagnostic naming the failing step, exit code chosen by error kind.
    pub fn from_run_error(err: RunError) -> Self {
        debug!(
            target: "pgtunnel::runtime",
            kind = err.kind().as_str(),
            step = err.step(),
            "Run failed"
        );
        let message = match &err {
            RunError::Interrupted { signal } => format!("pgtunnel: interrupted by {signal}"),
            _ => format!("pgtunnel: {} failed: {err}", err.step()),
        };
        Self {
            message,
            exit_code: err.exit_code(),
        }
    }

    pub fn from_error(err: impl Into<Error>) -> Self {
        let err = err.into();
        Self {
            message: format!("pgtunnel: {err:#}"),
            exit_code: ExitCode::FAILURE,
        }
    }

    pub fn report(self) -> ExitCode {
        eprintln!("{}", self.message);
        self.exit_code
    }

    pub fn exit_code(&self) -> ExitCode {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<RunError> for RuntimeExit {
    fn from(err: RunError) -> Self {
        Self::from_run_error(err)
    }
}
