//! Entry point for pgtunnel.
use std::process::ExitCode;

use clap::Parser;
use pgtunnel::{
    cli::LaunchArgs,
    lib::telemetry,
    runtime::{self, RunOutcome, RuntimeExit},
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    match bootstrap().await {
        Ok(_) => ExitCode::SUCCESS,
        Err(exit) => exit.report(),
    }
}

async fn bootstrap() -> Result<(), RuntimeExit> {
    telemetry::init_tracing().map_err(RuntimeExit::from_error)?;
    let args = LaunchArgs::parse();
    let profile = args.into_command().map_err(RuntimeExit::from_error)?;

    match runtime::run(profile).await? {
        RunOutcome::Connected => Ok(()),
        RunOutcome::Report(message) => {
            println!("{message}");
            Ok(())
        }
    }
}
