//! Telemetry initialization and orchestrator step span helpers.

use std::time::Instant;

use anyhow::Result;
use tracing::{info, info_span, warn, Span};
use tracing_subscriber::{fmt, EnvFilter};

/// Initialize `tracing` and format operator-facing logs on stderr.
pub fn init_tracing() -> Result<()> {
    if tracing::dispatcher::has_been_set() {
        return Ok(());
    }

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!("failed to initialize tracing: {err}"))
}

/// Span helper to record start and finish of one step of the connection sequence.
pub struct StepSpan {
    span: Span,
    started_at: Instant,
    step: &'static str,
}

impl StepSpan {
    /// Start a step span.
    pub fn start(profile: &str, step: &'static str) -> Self {
        let span = info_span!(target: "pgtunnel::runtime", "step", profile, step);
        Self {
            span,
            started_at: Instant::now(),
            step,
        }
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Close the span as succeeded.
    pub fn succeed(self) {
        let elapsed_ms = self.started_at.elapsed().as_millis();
        let _entered = self.span.enter();
        info!(
            target: "pgtunnel::runtime",
            step = self.step,
            status = "succeeded",
            elapsed_ms = elapsed_ms,
            "Completed step"
        );
    }

    /// Close the span while recording the failure reason.
    pub fn fail(self, reason: &dyn std::fmt::Display) {
        let elapsed_ms = self.started_at.elapsed().as_millis();
        let _entered = self.span.enter();
        warn!(
            target: "pgtunnel::runtime",
            step = self.step,
            status = "failed",
            elapsed_ms = elapsed_ms,
            reason = %reason,
            "Step failed"
        );
    }

    /// Record the outcome of `result` and pass it through.
    pub fn finish<T, E: std::fmt::Display>(self, result: Result<T, E>) -> Result<T, E> {
        match &result {
            Ok(_) => self.succeed(),
            Err(err) => self.fail(err),
        }
        result
    }
}
