//! Shell-script stand-ins for external programs used by unit tests.
use std::{
    fs,
    os::unix::fs::PermissionsExt,
    path::{Path, PathBuf},
};

use tokio::sync::{Mutex, MutexGuard};

static SPAWN_LOCK: Mutex<()> = Mutex::const_new(());

/// Serialize tests that write and execute stubs so no fork inherits an open
/// write handle to a script (ETXTBSY).
pub(crate) async fn spawn_guard() -> MutexGuard<'static, ()> {
    SPAWN_LOCK.lock().await
}

/// Write an executable `/bin/sh` script named `name` into `dir`.
pub(crate) fn write_stub(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("can write stub script");
    let mut permissions = fs::metadata(&path)
        .expect("stub metadata")
        .permissions();
    permissions.set_mode(0o755);
    fs::set_permissions(&path, permissions).expect("can mark stub executable");
    path
}
