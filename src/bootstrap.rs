use crate::error::{DeployError, DeployResult};
use crate::remote::{self, Outcome, RemoteOp, RemoteShell};

/// Fail early on hosts without `apt-get`. The Nginx layout used
/// later (`sites-available`/`sites-enabled`) is the Debian one.
pub fn require_apt(shell: &dyn RemoteShell) -> DeployResult<()> {
    if shell
        .exec("command -v apt-get >/dev/null 2>&1", None)?
        .success()
    {
        Ok(())
    } else {
        Err(DeployError::Other(format!(
            "{} has no apt-get; only Debian and Ubuntu hosts are supported",
            shell.host()
        )))
    }
}

/// Shell command installing `packages`. The index is refreshed
/// first since a fresh host usually has none.
#[must_use]
pub fn install(packages: &[&str], sudo: bool) -> String {
    let s = if sudo { "sudo " } else { "" };
    format!(
        "{s}apt-get update -y && \
         {s}env DEBIAN_FRONTEND=noninteractive apt-get install -y {}",
        packages.join(" ")
    )
}

/// Compose plugin, with the standalone binary as fallback for
/// releases that do not package the plugin.
fn compose_install(sudo: bool) -> String {
    format!(
        "{} || {}",
        install(&["docker-compose-plugin"], sudo),
        install(&["docker-compose"], sudo)
    )
}

/// The installation steps, in order. Each one is skipped when its
/// executable is already present.
#[must_use]
pub fn plan(user: &str, sudo: bool) -> Vec<RemoteOp> {
    vec![
        RemoteOp::EnsureTool {
            tool: "docker".to_string(),
            check: "command -v docker >/dev/null 2>&1".to_string(),
            install: install(&["docker.io"], sudo),
        },
        RemoteOp::EnsureTool {
            tool: "docker compose".to_string(),
            check: "docker compose version >/dev/null 2>&1 || \
                    command -v docker-compose >/dev/null 2>&1"
                .to_string(),
            install: compose_install(sudo),
        },
        RemoteOp::EnsureTool {
            tool: "nginx".to_string(),
            check: "command -v nginx >/dev/null 2>&1".to_string(),
            install: install(&["nginx"], sudo),
        },
        RemoteOp::EnableService("docker".to_string()),
        RemoteOp::EnableService("nginx".to_string()),
        RemoteOp::AddUserToGroup {
            user: user.to_string(),
            group: "docker".to_string(),
        },
    ]
}

/// Install Docker, Compose and Nginx where missing, start their
/// services and let `user` talk to the Docker daemon.
pub fn run(shell: &dyn RemoteShell, user: &str) -> DeployResult<()> {
    require_apt(shell)?;

    for op in plan(user, shell.needs_sudo()) {
        match remote::apply(shell, &op)? {
            Outcome::Applied(_) => tracing::info!("{op}: done"),
            Outcome::Skipped => {}
            Outcome::Tolerated(reason) => tracing::warn!("{op}: {reason}"),
        }
    }

    Ok(())
}
