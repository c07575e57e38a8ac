use std::path::Path;

use crate::cmd;
use crate::config::RemoteTarget;
use crate::error::{DeployError, DeployResult};
use crate::remote::{RemoteOutput, RemoteShell, quote};

/// Seconds the reachability probe waits for a connection.
pub const CONNECT_TIMEOUT_SECS: u32 = 10;

/// Runs commands and transfers files over the system `ssh` and
/// `rsync` clients. Every call spawns a fresh process.
pub struct SshSession {
    target: RemoteTarget,
}

impl SshSession {
    #[must_use]
    pub const fn new(target: RemoteTarget) -> Self {
        Self { target }
    }

    fn destination(&self) -> String {
        format!("{}@{}", self.target.user, self.target.host)
    }

    /// `user@host:dir/` for rsync. IPv6 literals are bracketed so
    /// rsync does not split the address at its first colon.
    fn rsync_destination(&self, remote_dir: &str) -> String {
        let host = &self.target.host;
        if host.contains(':') {
            format!("{}@[{host}]:{remote_dir}/", self.target.user)
        } else {
            format!("{}@{host}:{remote_dir}/", self.target.user)
        }
    }

    fn key(&self) -> String {
        self.target.key_path.to_string_lossy().to_string()
    }

    /// Options shared by `ssh` and the `rsync -e` transport.
    fn ssh_base_args(&self) -> Vec<String> {
        vec![
            "-i".to_string(),
            self.key(),
            "-o".to_string(),
            "StrictHostKeyChecking=accept-new".to_string(),
            "-o".to_string(),
            "BatchMode=yes".to_string(),
        ]
    }

    fn build_ssh_args(&self, extra: &[String], command: &str) -> Vec<String> {
        let mut args = self.ssh_base_args();
        args.extend(extra.iter().cloned());
        args.push(self.destination());
        args.push(command.to_string());
        args
    }

    /// The `-e` value handed to rsync.
    fn rsync_transport(&self) -> String {
        let mut parts = vec!["ssh".to_string()];
        parts.extend(self.ssh_base_args().iter().map(|a| quote(a)));
        parts.join(" ")
    }
}

impl RemoteShell for SshSession {
    fn host(&self) -> &str {
        &self.target.host
    }

    fn needs_sudo(&self) -> bool {
        self.target.user != "root"
    }

    fn exec(&self, command: &str, stdin: Option<&str>) -> DeployResult<RemoteOutput> {
        let args = self.build_ssh_args(&[], command);
        let refs: Vec<&str> = args.iter().map(String::as_str).collect();
        let output = cmd::output("ssh", &refs, stdin.map(str::as_bytes))?;

        // ssh reserves 255 for its own failures.
        if output.status.code() == Some(255) {
            return Err(DeployError::UnreachableHost {
                host: self.target.host.clone(),
                reason: output.stderr.trim().to_string(),
            });
        }

        Ok(RemoteOutput {
            code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }

    fn upload_dir(&self, local: &Path, remote_dir: &str) -> DeployResult<()> {
        // Trailing slash: copy the directory's contents, not the
        // directory itself.
        let source = format!("{}/", local.to_string_lossy().trim_end_matches('/'));
        let dest = self.rsync_destination(remote_dir);
        let transport = self.rsync_transport();

        tracing::info!("Syncing {} to {dest}", local.display());
        cmd::run(
            "rsync",
            &[
                "-az",
                "--delete",
                "--exclude",
                ".git",
                "-e",
                &transport,
                &source,
                &dest,
            ],
        )?;
        Ok(())
    }

    fn probe(&self) -> DeployResult<()> {
        let extra = [
            "-o".to_string(),
            format!("ConnectTimeout={CONNECT_TIMEOUT_SECS}"),
        ];
        let args = self.build_ssh_args(&extra, "true");
        let refs: Vec<&str> = args.iter().map(String::as_str).collect();
        let output = cmd::output("ssh", &refs, None)?;

        if output.success() {
            Ok(())
        } else {
            Err(DeployError::UnreachableHost {
                host: self.target.host.clone(),
                reason: output.stderr.trim().to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn session(user: &str) -> SshSession {
        SshSession::new(RemoteTarget {
            host: "203.0.113.10".into(),
            user: user.into(),
            key_path: PathBuf::from("/keys/id_ed25519"),
        })
    }

    #[test]
    fn ssh_args_carry_key_and_destination() {
        let args = session("ubuntu").build_ssh_args(&[], "true");

        assert_eq!(args[0], "-i");
        assert_eq!(args[1], "/keys/id_ed25519");
        assert!(args.contains(&"BatchMode=yes".to_string()));
        assert_eq!(args[args.len() - 2], "ubuntu@203.0.113.10");
        assert_eq!(args[args.len() - 1], "true");
    }

    #[test]
    fn rsync_transport_quotes_options() {
        let transport = session("ubuntu").rsync_transport();

        assert!(transport.starts_with("ssh '-i' '/keys/id_ed25519'"));
    }

    #[test]
    fn rsync_destination_for_hostname_and_ipv4() {
        assert_eq!(
            session("ubuntu").rsync_destination("/home/ubuntu/shop-app"),
            "ubuntu@203.0.113.10:/home/ubuntu/shop-app/"
        );
    }

    #[test]
    fn rsync_destination_brackets_ipv6() {
        let session = SshSession::new(RemoteTarget {
            host: "2001:db8::1".into(),
            user: "ubuntu".into(),
            key_path: PathBuf::from("/keys/id_ed25519"),
        });

        assert_eq!(
            session.rsync_destination("/home/ubuntu/shop-app"),
            "ubuntu@[2001:db8::1]:/home/ubuntu/shop-app/"
        );
        assert_eq!(session.destination(), "ubuntu@2001:db8::1");
    }

    #[test]
    fn root_needs_no_sudo() {
        assert!(!session("root").needs_sudo());
        assert!(session("deploy").needs_sudo());
    }
}
