//! Orchestration of the connection sequence and process exit handling.
mod exit;
mod sequence;
mod signals;

pub use exit::RuntimeExit;
pub use sequence::{run, RunOutcome};
pub use signals::{ShutdownSignal, ShutdownSignals};
