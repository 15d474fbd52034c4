use crate::common::{stderr_of, Sandbox, FETCHED_SECRET};

fn expected_ssh_line(local_port: u16) -> String {
    format!(
        "ssh -N -o StrictHostKeyChecking=no -o UserKnownHostsFile=/dev/null \
         -o ServerAliveInterval=60 -o ExitOnForwardFailure=yes -p 2222 \
         -L{local_port}:db.internal:5432 alice@jump.example.com"
    )
}

#[test]
fn connect_runs_secret_tunnel_client_in_order() {
    let sandbox = Sandbox::new();
    let stubs = sandbox.default_stubs();
    let config = sandbox.write_config(&stubs);

    let output = sandbox.run_with_forward(sandbox.command(&config, &["db1"]));

    assert!(output.status.success(), "stderr: {}", stderr_of(&output));
    assert_eq!(
        sandbox.invocations(),
        vec![
            "pass show databases/db1".to_string(),
            expected_ssh_line(sandbox.local_port),
            format!("psql -h localhost -p {} -U alice", sandbox.local_port),
        ]
    );
    let stderr = stderr_of(&output);
    assert!(
        stderr.contains(&format!(
            "Tunnel established: localhost:{} -> db.internal:5432",
            sandbox.local_port
        )),
        "stderr: {stderr}"
    );
}

#[test]
fn client_receives_secret_only_through_env() {
    let sandbox = Sandbox::new();
    let stubs = sandbox.default_stubs();
    let config = sandbox.write_config(&stubs);

    let output = sandbox.run_with_forward(sandbox.command(&config, &["db1"]));

    assert!(output.status.success(), "stderr: {}", stderr_of(&output));
    assert_eq!(sandbox.read("client_env").as_deref(), Some(FETCHED_SECRET));
    assert!(
        sandbox
            .invocations()
            .iter()
            .all(|line| !line.contains(FETCHED_SECRET)),
        "secret leaked into argv: {:?}",
        sandbox.invocations()
    );
    assert!(!stderr_of(&output).contains(FETCHED_SECRET));
}

#[test]
fn store_secret_inserts_before_fetching() {
    let sandbox = Sandbox::new();
    let stubs = sandbox.default_stubs();
    let config = sandbox.write_config(&stubs);

    let output = sandbox.run_with_forward(sandbox.command(&config, &["-p", "hunter2", "db1"]));

    assert!(output.status.success(), "stderr: {}", stderr_of(&output));
    assert_eq!(
        sandbox.invocations(),
        vec![
            "pass insert -m -f databases/db1".to_string(),
            "pass show databases/db1".to_string(),
            expected_ssh_line(sandbox.local_port),
            format!("psql -h localhost -p {} -U alice", sandbox.local_port),
        ]
    );
    assert_eq!(sandbox.read("inserted").as_deref(), Some("hunter2"));
    assert!(!stderr_of(&output).contains("hunter2"));
}
