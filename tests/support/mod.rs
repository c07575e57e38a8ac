#![allow(dead_code)]

use std::cell::RefCell;
use std::path::Path;

use dockhand::config::Secret;
use dockhand::error::{DeployError, DeployResult};
use dockhand::remote::{RemoteOutput, RemoteShell};
use dockhand::DeploymentConfig;

/// A [`RemoteShell`] that answers from canned rules and records
/// every call in order.
pub struct RecordingShell {
    host: String,
    sudo: bool,
    rules: Vec<(String, RemoteOutput)>,
    reachable: bool,
    calls: RefCell<Vec<String>>,
    stdin: RefCell<Vec<(String, String)>>,
}

impl RecordingShell {
    pub fn new() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            sudo: true,
            rules: Vec::new(),
            reachable: true,
            calls: RefCell::new(Vec::new()),
            stdin: RefCell::new(Vec::new()),
        }
    }

    /// A host where the deployed `name` container runs, is healthy
    /// and answers HTTP 200.
    pub fn healthy(name: &str) -> Self {
        Self::new()
            .rule("docker ps", RemoteOutput::ok(&format!("{name}\n")))
            .rule(
                "docker inspect",
                RemoteOutput::ok(r#"{"Status":"running","Health":{"Status":"healthy"}}"#),
            )
            .rule("curl", RemoteOutput::ok("200"))
    }

    /// Commands containing `needle` get `output`. First match wins.
    pub fn rule(mut self, needle: &str, output: RemoteOutput) -> Self {
        self.rules.push((needle.to_string(), output));
        self
    }

    pub fn unreachable(mut self) -> Self {
        self.reachable = false;
        self
    }

    pub fn as_root(mut self) -> Self {
        self.sudo = false;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    /// Content written through stdin, keyed by command.
    pub fn written(&self) -> Vec<(String, String)> {
        self.stdin.borrow().clone()
    }

    /// Index of the first call containing `needle`.
    pub fn position(&self, needle: &str) -> Option<usize> {
        self.calls.borrow().iter().position(|c| c.contains(needle))
    }

    /// Index of the last call containing `needle`.
    pub fn last_position(&self, needle: &str) -> Option<usize> {
        self.calls.borrow().iter().rposition(|c| c.contains(needle))
    }

    pub fn ran(&self, needle: &str) -> bool {
        self.position(needle).is_some()
    }
}

impl RemoteShell for RecordingShell {
    fn host(&self) -> &str {
        &self.host
    }

    fn needs_sudo(&self) -> bool {
        self.sudo
    }

    fn exec(&self, command: &str, stdin: Option<&str>) -> DeployResult<RemoteOutput> {
        self.calls.borrow_mut().push(command.to_string());
        if let Some(data) = stdin {
            self.stdin
                .borrow_mut()
                .push((command.to_string(), data.to_string()));
        }

        Ok(self
            .rules
            .iter()
            .find(|(needle, _)| command.contains(needle.as_str()))
            .map_or_else(|| RemoteOutput::ok(""), |(_, out)| out.clone()))
    }

    fn upload_dir(&self, local: &Path, remote_dir: &str) -> DeployResult<()> {
        self.calls
            .borrow_mut()
            .push(format!("<upload {} -> {remote_dir}>", local.display()));
        Ok(())
    }

    fn probe(&self) -> DeployResult<()> {
        self.calls.borrow_mut().push("<probe>".to_string());
        if self.reachable {
            Ok(())
        } else {
            Err(DeployError::UnreachableHost {
                host: self.host.clone(),
                reason: "Connection timed out".to_string(),
            })
        }
    }
}

/// A valid configuration whose key file lives in `key_dir`.
pub fn config(key_dir: &Path) -> DeploymentConfig {
    let key = key_dir.join("id_ed25519");
    std::fs::write(&key, "not really a key").unwrap();

    DeploymentConfig::new(
        "https://github.com/acme/Shop-App.git",
        "ubuntu",
        "127.0.0.1",
        key,
        3000,
    )
    .token(Secret::new("ghp_testtoken"))
}

/// A checked-out tree containing the given files.
pub fn tree(files: &[(&str, &str)]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    for (name, content) in files {
        std::fs::write(dir.path().join(name), content).unwrap();
    }
    dir
}
