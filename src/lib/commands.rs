//! Shared helpers for building the `ssh`, `psql`, and `pass` commands.

use std::{path::Path, process::Stdio};

use tokio::process::Command;

use crate::{
    config::{ClientSection, DatabaseProfile, TunnelSection},
    lib::secret::SecretValue,
};

/// Host the SQL client connects to; the forward always listens on loopback.
pub const CLIENT_HOST: &str = "localhost";

/// Arguments for `ssh` that forward `local_port` to `host:port` through the jump host.
pub fn tunnel_args(profile: &DatabaseProfile, tunnel: &TunnelSection) -> Vec<String> {
    let mut args = vec![
        "-N".to_string(),
        "-o".to_string(),
        "StrictHostKeyChecking=no".to_string(),
        "-o".to_string(),
        "UserKnownHostsFile=/dev/null".to_string(),
        "-o".to_string(),
        format!("ServerAliveInterval={}", tunnel.keepalive_interval_secs),
        "-o".to_string(),
        "ExitOnForwardFailure=yes".to_string(),
    ];
    if let Some(jump_port) = profile.ssh_jump_port {
        args.push("-p".to_string());
        args.push(jump_port.to_string());
    }
    args.push(format!(
        "-L{}:{}:{}",
        profile.local_port, profile.host, profile.port
    ));
    args.push(format!("{}@{}", profile.user, profile.ssh_jump_host));
    args
}

/// Build the background `ssh` command. Stdio is shared with the terminal so prompts work.
pub fn build_tunnel_command(
    program: &Path,
    profile: &DatabaseProfile,
    tunnel: &TunnelSection,
) -> Command {
    let mut command = Command::new(program);
    command.kill_on_drop(true);
    command.args(tunnel_args(profile, tunnel));
    command
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());
    // SIGINT from the terminal belongs to the SQL client. ssh keeps an
    // inherited SIG_IGN instead of installing its own handler.
    // SAFETY: `signal` is async-signal-safe and touches no other state.
    unsafe {
        command.pre_exec(|| {
            libc::signal(libc::SIGINT, libc::SIG_IGN);
            Ok(())
        });
    }
    command
}

/// Arguments for the SQL client. The password never appears here.
pub fn client_args(profile: &DatabaseProfile) -> Vec<String> {
    vec![
        "-h".to_string(),
        CLIENT_HOST.to_string(),
        "-p".to_string(),
        profile.local_port.to_string(),
        "-U".to_string(),
        profile.user.clone(),
    ]
}

/// Build the SQL client command with the secret placed in the child's environment only.
pub fn build_client_command(
    program: &Path,
    profile: &DatabaseProfile,
    client: &ClientSection,
    secret: &SecretValue,
) -> Command {
    let mut command = Command::new(program);
    command.kill_on_drop(true);
    command.args(client_args(profile));
    command.env(&client.password_env, secret.expose());
    command
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());
    command
}

/// `pass show <path>`: stdout carries the secret.
pub fn build_secret_show_command(program: &Path, secret_path: &str) -> Command {
    let mut command = Command::new(program);
    command.arg("show").arg(secret_path);
    command
        .stdin(Stdio::inherit())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit());
    command
}

/// `pass insert -m -f <path>`: stdin carries the secret.
pub fn build_secret_insert_command(program: &Path, secret_path: &str) -> Command {
    let mut command = Command::new(program);
    command.args(["insert", "-m", "-f"]).arg(secret_path);
    command
        .stdin(Stdio::piped())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit());
    command
}

/// Render a command line for logs and `--dry-run` output.
pub fn render_command_line(program: &Path, args: &[String]) -> String {
    std::iter::once(program.display().to_string())
        .chain(args.iter().cloned())
        .collect::<Vec<_>>()
        .join(" ")
}
