use std::{process::Command, time::Duration};

use crate::common::{
    eventually, fixture, process_alive, send_signal, stderr_of, Sandbox, BINARY_PATH,
};

fn client_never_ran(sandbox: &Sandbox) -> bool {
    sandbox
        .invocations()
        .iter()
        .all(|line| !line.starts_with("psql "))
}

#[test]
fn client_exit_code_is_passed_through() {
    let sandbox = Sandbox::new();
    let mut stubs = sandbox.default_stubs();
    stubs.sql_client = sandbox.write_recording_stub("psql-failing", "psql", "exit 3");
    let config = sandbox.write_config(&stubs);

    let output = sandbox.run_with_forward(sandbox.command(&config, &["db1"]));

    assert_eq!(output.status.code(), Some(3), "stderr: {}", stderr_of(&output));
    assert!(stderr_of(&output).contains("launch_client failed"));
}

#[test]
fn tunnel_that_exits_early_never_launches_client() {
    let sandbox = Sandbox::new();
    let mut stubs = sandbox.default_stubs();
    stubs.ssh = sandbox.write_recording_stub("ssh-failing", "ssh", "exit 255");
    let config = sandbox.write_config(&stubs);

    let output = sandbox
        .command(&config, &["db1"])
        .output()
        .expect("launcher should run");

    assert_eq!(output.status.code(), Some(8), "stderr: {}", stderr_of(&output));
    assert!(stderr_of(&output).contains("open_tunnel failed"));
    assert!(client_never_ran(&sandbox), "{:?}", sandbox.invocations());
}

#[test]
fn tunnel_that_never_forwards_times_out() {
    let sandbox = Sandbox::new();
    let stubs = sandbox.default_stubs();
    let config = sandbox.write_config_with(&stubs, 1);

    let output = sandbox
        .command(&config, &["db1"])
        .output()
        .expect("launcher should run");

    assert_eq!(output.status.code(), Some(8), "stderr: {}", stderr_of(&output));
    let stderr = stderr_of(&output);
    assert!(stderr.contains("was not ready after 1 seconds"), "stderr: {stderr}");
    assert!(client_never_ran(&sandbox), "{:?}", sandbox.invocations());
    let ssh = sandbox.wait_for_pid("ssh");
    assert!(!process_alive(ssh), "ssh must be torn down after the timeout");
}

#[test]
fn secret_fetch_failure_stops_before_tunnel() {
    let sandbox = Sandbox::new();
    let mut stubs = sandbox.default_stubs();
    stubs.secret_store = sandbox.write_recording_stub(
        "pass-failing",
        "pass",
        "echo 'Error: databases/db1 is not in the password store.' >&2\nexit 1",
    );
    let config = sandbox.write_config(&stubs);

    let output = sandbox
        .command(&config, &["db1"])
        .output()
        .expect("launcher should run");

    assert_eq!(output.status.code(), Some(7), "stderr: {}", stderr_of(&output));
    assert_eq!(sandbox.invocations(), vec!["pass show databases/db1".to_string()]);
}

fn assert_signal_stops_client_and_tunnel(signal: libc::c_int, name: &str) {
    let sandbox = Sandbox::new();
    let mut stubs = sandbox.default_stubs();
    stubs.sql_client = sandbox.write_recording_stub("psql-slow", "psql", "exec sleep 30");
    let config = sandbox.write_config(&stubs);

    let launched = sandbox.spawn_with_forward(sandbox.command(&config, &["db1"]));
    let psql = sandbox.wait_for_pid("psql");
    let ssh = sandbox.wait_for_pid("ssh");
    launched.signal(signal);
    let output = launched.finish();

    assert_eq!(output.status.code(), Some(130), "stderr: {}", stderr_of(&output));
    let stderr = stderr_of(&output);
    assert!(
        stderr.contains(&format!("pgtunnel: interrupted by {name}")),
        "stderr: {stderr}"
    );
    assert!(!process_alive(psql), "client must be killed on {name}");
    assert!(!process_alive(ssh), "tunnel must be torn down on {name}");
}

#[test]
fn sigterm_stops_client_and_tunnel() {
    assert_signal_stops_client_and_tunnel(libc::SIGTERM, "SIGTERM");
}

#[test]
fn sighup_stops_client_and_tunnel() {
    assert_signal_stops_client_and_tunnel(libc::SIGHUP, "SIGHUP");
}

#[test]
fn signal_during_readiness_wait_aborts_before_client() {
    let sandbox = Sandbox::new();
    let stubs = sandbox.default_stubs();
    let config = sandbox.write_config(&stubs);

    let launched = sandbox.spawn(sandbox.command(&config, &["db1"]));
    let ssh = sandbox.wait_for_pid("ssh");
    launched.signal(libc::SIGINT);
    let output = launched.finish();

    assert_eq!(output.status.code(), Some(130), "stderr: {}", stderr_of(&output));
    assert!(stderr_of(&output).contains("pgtunnel: interrupted by SIGINT"));
    assert!(client_never_ran(&sandbox), "{:?}", sandbox.invocations());
    assert!(!process_alive(ssh), "tunnel must be torn down");
}

#[test]
fn tunnel_exit_mid_session_leaves_client_running() {
    let sandbox = Sandbox::new();
    let mut stubs = sandbox.default_stubs();
    let release = sandbox.path("release");
    stubs.sql_client = sandbox.write_recording_stub(
        "psql-waiting",
        "psql",
        &format!("while [ ! -f \"{}\" ]; do sleep 0.1; done", release.display()),
    );
    let config = sandbox.write_config(&stubs);

    let launched = sandbox.spawn_with_forward(sandbox.command(&config, &["db1"]));
    let psql = sandbox.wait_for_pid("psql");
    let ssh = sandbox.wait_for_pid("ssh");
    send_signal(ssh, libc::SIGKILL);

    // The launcher reaps ssh as soon as it notices the exit.
    assert!(
        eventually(Duration::from_secs(10), || !process_alive(ssh)),
        "ssh was never reaped"
    );
    assert!(process_alive(psql), "client must keep running without the tunnel");
    std::fs::write(&release, "").expect("can release the client");
    let output = launched.finish();

    assert!(output.status.success(), "stderr: {}", stderr_of(&output));
    let stderr = stderr_of(&output);
    assert!(
        stderr.contains("SSH tunnel exited while the client is still running"),
        "stderr: {stderr}"
    );
}

#[test]
fn missing_config_exits_with_config_not_found() {
    let output = Command::new(BINARY_PATH)
        .args(["--config", &fixture("tests/fixtures/does_not_exist.yaml"), "db1"])
        .env_remove("PGTUNNEL_CONFIG")
        .output()
        .expect("launcher should run");

    assert_eq!(output.status.code(), Some(3), "stderr: {}", stderr_of(&output));
    assert!(stderr_of(&output).contains("load_config failed"));
}

#[test]
fn malformed_config_exits_with_parse_error() {
    let output = Command::new(BINARY_PATH)
        .args(["--config", &fixture("tests/fixtures/config_malformed.yaml"), "db1"])
        .env_remove("PGTUNNEL_CONFIG")
        .output()
        .expect("launcher should run");

    assert_eq!(output.status.code(), Some(4), "stderr: {}", stderr_of(&output));
}

#[test]
fn missing_profile_argument_is_a_usage_error() {
    let output = Command::new(BINARY_PATH)
        .args(["--config", &fixture("tests/fixtures/config_valid.yaml")])
        .env_remove("PGTUNNEL_CONFIG")
        .output()
        .expect("launcher should run");

    assert_eq!(output.status.code(), Some(2));
}
