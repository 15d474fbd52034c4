//! The connection sequence:
//! load config → lookup profile → [store secret] → fetch secret → open tunnel →
//! wait ready → launch client → supervise → close tunnel.
use serde_json::json;
use tracing::{debug, info, warn, Instrument};

use crate::{
    cli::{LaunchProfile, RunMode},
    config::{DatabaseProfile, TunnelConfig},
    launch::{describe_status, ClientLauncher, SecretStore, TunnelHandle, TunnelLauncher},
    lib::{
        errors::{ClientError, RunError, TunnelError},
        secret::SecretValue,
        telemetry::StepSpan,
    },
};

use super::signals::{ShutdownSignal, ShutdownSignals};

/// Successful outcome of a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The client session ended cleanly.
    Connected,
    /// Text to print on stdout (`--list`, `--dry-run`).
    Report(String),
}

/// Execute the launch profile. The first failing step aborts the run.
pub async fn run(launch: LaunchProfile) -> Result<RunOutcome, RunError> {
    let LaunchProfile {
        config_path,
        mode,
        store_secret,
    } = launch;

    let step = StepSpan::start(mode.profile().unwrap_or("-"), "load_config");
    let config = step.finish(TunnelConfig::load_from_path(config_path))?;

    match mode {
        RunMode::List => Ok(RunOutcome::Report(list_profiles(&config))),
        RunMode::DryRun { profile } => {
            let profile = lookup(&config, &profile)?;
            Ok(RunOutcome::Report(plan(&config, profile, store_secret.is_some())))
        }
        RunMode::Connect { profile } => {
            let profile = lookup(&config, &profile)?;
            connect(&config, profile, store_secret).await?;
            Ok(RunOutcome::Connected)
        }
    }
}

fn lookup<'a>(config: &'a TunnelConfig, name: &str) -> Result<&'a DatabaseProfile, RunError> {
    let step = StepSpan::start(name, "lookup_profile");
    Ok(step.finish(config.profile(name))?)
}

async fn connect(
    config: &TunnelConfig,
    profile: &DatabaseProfile,
    store_secret: Option<SecretValue>,
) -> Result<(), RunError> {
    let secrets = SecretStore::new(&config.commands.secret_store);

    if let Some(value) = store_secret {
        let step = StepSpan::start(&profile.name, "store_secret");
        let span = step.span().clone();
        let stored = secrets
            .store(&profile.secret_path, &value)
            .instrument(span)
            .await;
        drop(value);
        step.finish(stored)?;
    }

    let step = StepSpan::start(&profile.name, "fetch_secret");
    let span = step.span().clone();
    let secret = step.finish(
        secrets
            .fetch(&profile.secret_path)
            .instrument(span)
            .await,
    )?;

    let mut signals =
        ShutdownSignals::install().map_err(|source| TunnelError::Signals { source })?;

    let step = StepSpan::start(&profile.name, "open_tunnel");
    let tunnel = step.finish(open_tunnel(config, profile, &mut signals).await)?;
    info!(
        target: "pgtunnel::tunnel",
        "Tunnel established: localhost:{} -> {}:{}",
        profile.local_port,
        profile.host,
        profile.port
    );

    let step = StepSpan::start(&profile.name, "launch_client");
    let client_result = supervise_client(config, profile, secret, tunnel, &mut signals).await;
    step.finish(client_result)
}

async fn open_tunnel(
    config: &TunnelConfig,
    profile: &DatabaseProfile,
    signals: &mut ShutdownSignals,
) -> Result<TunnelHandle, RunError> {
    let mut tunnel = TunnelLauncher::new(&config.commands.ssh, &config.tunnel).open(profile)?;

    let readiness = tokio::select! {
        ready = tunnel.wait_ready(config.tunnel.ready_timeout()) => Ok(ready),
        signal = signals.recv() => Err(signal),
    };

    match readiness {
        Ok(Ok(())) => Ok(tunnel),
        Ok(Err(err)) => {
            close_tunnel(tunnel, config).await;
            Err(err.into())
        }
        Err(signal) => {
            close_tunnel(tunnel, config).await;
            Err(RunError::Interrupted {
                signal: signal.as_str(),
            })
        }
    }
}

enum SupervisorEvent {
    ClientExited(Result<(), ClientError>),
    TunnelExited(Result<std::process::ExitStatus, TunnelError>),
    Signal(ShutdownSignal),
}

/// Run the client in the foreground while the tunnel stays up; tear the tunnel down afterwards.
async fn supervise_client(
    config: &TunnelConfig,
    profile: &DatabaseProfile,
    secret: SecretValue,
    mut tunnel: TunnelHandle,
    signals: &mut ShutdownSignals,
) -> Result<(), RunError> {
    let launched =
        ClientLauncher::new(&config.commands.sql_client, &config.client).launch(profile, secret);
    let mut session = match launched {
        Ok(session) => session,
        Err(err) => {
            close_tunnel(tunnel, config).await;
            return Err(err.into());
        }
    };

    let mut tunnel_alive = true;
    let client_result = loop {
        let event = tokio::select! {
            result = session.wait() => SupervisorEvent::ClientExited(result),
            result = tunnel.wait(), if tunnel_alive => SupervisorEvent::TunnelExited(result),
            signal = signals.recv() => SupervisorEvent::Signal(signal),
        };

        match event {
            SupervisorEvent::ClientExited(result) => break result,
            SupervisorEvent::TunnelExited(result) => {
                tunnel_alive = false;
                let detail = match result {
                    Ok(status) => describe_status(status),
                    Err(err) => err.to_string(),
                };
                warn!(
                    target: "pgtunnel::tunnel",
                    local_port = tunnel.local_port(),
                    detail = %detail,
                    "SSH tunnel exited while the client is still running"
                );
            }
            SupervisorEvent::Signal(ShutdownSignal::Interrupt) => {
                debug!(
                    target: "pgtunnel::runtime",
                    "SIGINT belongs to the SQL client; keeping the tunnel open"
                );
            }
            SupervisorEvent::Signal(signal) => {
                warn!(
                    target: "pgtunnel::runtime",
                    signal = signal.as_str(),
                    "Terminating client and tunnel"
                );
                session.terminate().await;
                close_tunnel(tunnel, config).await;
                return Err(RunError::Interrupted {
                    signal: signal.as_str(),
                });
            }
        }
    };

    close_tunnel(tunnel, config).await;
    client_result.map_err(RunError::from)
}

async fn close_tunnel(tunnel: TunnelHandle, config: &TunnelConfig) {
    let local_port = tunnel.local_port();
    match tunnel.shutdown(config.tunnel.shutdown_grace()).await {
        Ok(status) => debug!(
            target: "pgtunnel::tunnel",
            local_port,
            status = %describe_status(status),
            "SSH tunnel closed"
        ),
        Err(err) => warn!(
            target: "pgtunnel::tunnel",
            local_port,
            reason = %err,
            "Failed to close SSH tunnel"
        ),
    }
}

fn list_profiles(config: &TunnelConfig) -> String {
    let profiles: Vec<_> = config
        .databases
        .values()
        .map(|profile| {
            json!({
                "name": profile.name,
                "host": profile.host,
                "port": profile.port,
                "user": profile.user,
                "ssh_jump_host": profile.ssh_jump_host,
                "ssh_jump_port": profile.ssh_jump_port,
                "local_port": profile.local_port,
            })
        })
        .collect();
    let payload = json!({
        "config_path": config.source_path.to_string_lossy(),
        "profiles": profiles,
    });
    serde_json::to_string_pretty(&payload).unwrap_or_else(|_| payload.to_string())
}

fn plan(config: &TunnelConfig, profile: &DatabaseProfile, store_secret: bool) -> String {
    let tunnel = TunnelLauncher::new(&config.commands.ssh, &config.tunnel);
    let client = ClientLauncher::new(&config.commands.sql_client, &config.client);
    let payload = json!({
        "status": "planned",
        "profile": profile.name,
        "secret_store": config.commands.secret_store.to_string_lossy(),
        "secret_path": profile.secret_path,
        "store_secret": store_secret,
        "tunnel_command": tunnel.command_line(profile),
        "client_command": client.command_line(profile),
        "password_env": config.client.password_env,
        "message": "dry-run: nothing was executed"
    });
    serde_json::to_string_pretty(&payload).unwrap_or_else(|_| payload.to_string())
}
