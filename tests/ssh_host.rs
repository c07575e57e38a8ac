//! Integration test: run commands and sync a directory on a real
//! host over SSH.
//!
//! Requires `ssh`, `rsync` and a reachable host given by
//! `DOCKHAND_TEST_HOST`, `DOCKHAND_TEST_USER` and
//! `DOCKHAND_TEST_KEY`. Skipped in normal `cargo test` runs unless
//! the `integration` feature is enabled.

#![cfg(feature = "integration")]

use std::path::PathBuf;

use dockhand::remote::RemoteShell;
use dockhand::{RemoteTarget, SshSession};

fn session() -> (SshSession, String) {
    let var = |name: &str| std::env::var(name).unwrap_or_else(|_| panic!("{name} not set"));
    let user = var("DOCKHAND_TEST_USER");
    let target = RemoteTarget {
        host: var("DOCKHAND_TEST_HOST"),
        user: user.clone(),
        key_path: PathBuf::from(var("DOCKHAND_TEST_KEY")),
    };
    (SshSession::new(target), user)
}

#[test]
fn probe_exec_and_upload() {
    let (shell, user) = session();
    shell.probe().expect("host unreachable");

    let out = shell.exec("cat", Some("hello\n")).unwrap();
    assert!(out.success());
    assert_eq!(out.stdout, "hello\n");

    let local = tempfile::tempdir().unwrap();
    std::fs::write(local.path().join("Dockerfile"), "FROM alpine\n").unwrap();
    let remote_dir = format!("/tmp/dockhand-it-{user}");

    shell.exec(&format!("mkdir -p {remote_dir}"), None).unwrap();
    shell.upload_dir(local.path(), &remote_dir).unwrap();
    let listing = shell.exec(&format!("ls {remote_dir}"), None).unwrap();
    shell.exec(&format!("rm -rf {remote_dir}"), None).unwrap();

    assert!(listing.stdout.contains("Dockerfile"));
}
