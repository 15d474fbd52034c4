use std::process::Command;

use serde_json::Value;

use crate::common::{fixture, stderr_of, stdout_of, Sandbox, BINARY_PATH};

#[test]
fn list_prints_profiles_as_json() {
    let output = Command::new(BINARY_PATH)
        .args(["--config", &fixture("tests/fixtures/config_valid.yaml"), "--list"])
        .env_remove("PGTUNNEL_CONFIG")
        .output()
        .expect("launcher should run");

    assert!(output.status.success(), "stderr: {}", stderr_of(&output));
    let payload: Value = serde_json::from_str(&stdout_of(&output)).expect("list prints JSON");
    let profiles = payload["profiles"].as_array().expect("profiles array");
    assert_eq!(profiles.len(), 2);
    assert_eq!(profiles[0]["name"].as_str(), Some("db1"));
    assert_eq!(profiles[0]["local_port"].as_u64(), Some(5433));
    assert_eq!(profiles[1]["name"].as_str(), Some("reporting"));
    assert!(profiles[1]["ssh_jump_port"].is_null());
}

#[test]
fn dry_run_describes_commands_without_running_them() {
    let sandbox = Sandbox::new();
    let stubs = sandbox.default_stubs();
    let config = sandbox.write_config(&stubs);

    let output = sandbox
        .command(&config, &["--dry-run", "-p", "hunter2", "db1"])
        .output()
        .expect("launcher should run");

    assert!(output.status.success(), "stderr: {}", stderr_of(&output));
    let stdout = stdout_of(&output);
    assert!(!stdout.contains("hunter2"), "{stdout}");
    let payload: Value = serde_json::from_str(&stdout).expect("dry-run prints JSON");
    assert_eq!(
        payload["client_command"].as_str(),
        Some(
            format!(
                "{} -h localhost -p {} -U alice",
                stubs.sql_client.display(),
                sandbox.local_port
            )
            .as_str()
        )
    );
    assert_eq!(payload["password_env"].as_str(), Some("PGPASSWORD"));
    assert!(!sandbox.log_path().exists(), "{:?}", sandbox.invocations());
}
