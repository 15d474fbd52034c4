//! Background SSH port forward: spawn, readiness probe, and teardown.
use std::{
    net::{Ipv4Addr, TcpListener},
    path::Path,
    process::ExitStatus,
    time::Duration,
};

use tokio::{
    net::TcpStream,
    process::Child,
    time::{self, Instant},
};
use tracing::{debug, info, warn};

use crate::{
    config::{DatabaseProfile, TunnelSection},
    lib::{
        commands::{build_tunnel_command, render_command_line, tunnel_args},
        errors::TunnelError,
    },
};

const READY_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Builds and spawns the `ssh -L` process for a profile.
pub struct TunnelLauncher<'a> {
    program: &'a Path,
    settings: &'a TunnelSection,
}

impl<'a> TunnelLauncher<'a> {
    pub fn new(program: &'a Path, settings: &'a TunnelSection) -> Self {
        Self { program, settings }
    }

    /// Argument vector passed to ssh.
    pub fn args(&self, profile: &DatabaseProfile) -> Vec<String> {
        tunnel_args(profile, self.settings)
    }

    pub fn command_line(&self, profile: &DatabaseProfile) -> String {
        render_command_line(self.program, &self.args(profile))
    }

    /// Spawn ssh in the background. The returned handle kills it on drop.
    pub fn open(&self, profile: &DatabaseProfile) -> Result<TunnelHandle, TunnelError> {
        ensure_port_available(profile.local_port)?;

        let mut command = build_tunnel_command(self.program, profile, self.settings);
        info!(
            target: "pgtunnel::tunnel",
            profile = %profile.name,
            command = %self.command_line(profile),
            "Starting SSH tunnel"
        );
        let child = command.spawn().map_err(|source| TunnelError::Spawn {
            program: self.program.display().to_string(),
            source,
        })?;

        Ok(TunnelHandle {
            child,
            local_port: profile.local_port,
        })
    }
}

fn ensure_port_available(port: u16) -> Result<(), TunnelError> {
    TcpListener::bind((Ipv4Addr::LOCALHOST, port))
        .map(drop)
        .map_err(|source| TunnelError::PortUnavailable { port, source })
}

/// Running ssh child process.
#[derive(Debug)]
pub struct TunnelHandle {
    child: Child,
    local_port: u16,
}

impl TunnelHandle {
    pub fn local_port(&self) -> u16 {
        self.local_port
    }

    /// Poll the forwarded port until it accepts a connection, ssh exits, or `timeout` elapses.
    pub async fn wait_ready(&mut self, timeout: Duration) -> Result<(), TunnelError> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(status) = self
                .child
                .try_wait()
                .map_err(|source| TunnelError::Wait { source })?
            {
                return Err(TunnelError::ExitedEarly {
                    port: self.local_port,
                    exit_code: status.code(),
                });
            }

            let probe = time::timeout(
                READY_POLL_INTERVAL,
                TcpStream::connect((Ipv4Addr::LOCALHOST, self.local_port)),
            )
            .await;
            if let Ok(Ok(_stream)) = probe {
                debug!(
                    target: "pgtunnel::tunnel",
                    local_port = self.local_port,
                    "Port forward accepted a probe connection"
                );
                return Ok(());
            }

            if Instant::now() >= deadline {
                return Err(TunnelError::NotReady {
                    port: self.local_port,
                    timeout_secs: timeout.as_secs(),
                });
            }
            time::sleep(READY_POLL_INTERVAL).await;
        }
    }

    /// Wait for ssh to exit on its own. Cancel safe.
    pub async fn wait(&mut self) -> Result<ExitStatus, TunnelError> {
        self.child
            .wait()
            .await
            .map_err(|source| TunnelError::Wait { source })
    }

    /// Send SIGTERM, give ssh `grace` to exit, then kill it.
    pub async fn shutdown(mut self, grace: Duration) -> Result<ExitStatus, TunnelError> {
        if let Some(status) = self
            .child
            .try_wait()
            .map_err(|source| TunnelError::Wait { source })?
        {
            return Ok(status);
        }

        if let Some(pid) = self.child.id().and_then(|id| libc::pid_t::try_from(id).ok()) {
            // SAFETY: `pid` belongs to a child we have not reaped yet.
            unsafe {
                libc::kill(pid, libc::SIGTERM);
            }
        }

        match time::timeout(grace, self.child.wait()).await {
            Ok(result) => result.map_err(|source| TunnelError::Wait { source }),
            Err(_) => {
                warn!(
                    target: "pgtunnel::tunnel",
                    local_port = self.local_port,
                    grace_secs = grace.as_secs(),
                    "ssh ignored SIGTERM; killing it"
                );
                self.child
                    .start_kill()
                    .map_err(|source| TunnelError::Wait { source })?;
                self.child
                    .wait()
                    .await
                    .map_err(|source| TunnelError::Wait { source })
            }
        }
    }
}
