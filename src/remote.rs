//! Typed remote operations.
//!
//! Every change made on the target host is one [`RemoteOp`]. An
//! operation renders to a single shell command whose dynamic parts
//! are single-quoted, and carries a [`Tolerance`] saying whether a
//! non-zero exit aborts the run or is expected (stopping a container
//! that is not running, removing a file that is already gone).

use std::fmt;
use std::path::Path;

use crate::error::{DeployError, DeployResult};

/// Result of one remote command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl RemoteOutput {
    #[must_use]
    pub fn ok(stdout: &str) -> Self {
        Self {
            code: Some(0),
            stdout: stdout.to_string(),
            stderr: String::new(),
        }
    }

    #[must_use]
    pub fn failed(code: i32, stderr: &str) -> Self {
        Self {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.to_string(),
        }
    }

    #[must_use]
    pub const fn success(&self) -> bool {
        matches!(self.code, Some(0))
    }
}

/// Transport to the target host. Each call is independent; no
/// session state is shared between calls.
pub trait RemoteShell {
    /// Host name for log messages.
    fn host(&self) -> &str;

    /// Whether privileged commands need a `sudo` prefix.
    fn needs_sudo(&self) -> bool;

    /// Run a shell command, optionally feeding `stdin`. Only
    /// transport failures are errors; a non-zero exit is reported
    /// in the output.
    fn exec(&self, command: &str, stdin: Option<&str>) -> DeployResult<RemoteOutput>;

    /// Mirror a local directory into `remote_dir`.
    fn upload_dir(&self, local: &Path, remote_dir: &str) -> DeployResult<()>;

    /// Cheap authenticated no-op with a bounded connect timeout.
    fn probe(&self) -> DeployResult<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tolerance {
    Fatal,
    TolerateFailure,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The command ran and succeeded; holds its stdout.
    Applied(String),
    /// The precondition showed the host is already in the desired
    /// state.
    Skipped,
    /// The command failed but the failure is expected; holds stderr.
    Tolerated(String),
}

/// Single-quote `value` for a POSIX shell.
///
/// ```
/// use dockhand::remote::quote;
///
/// assert_eq!(quote("it's"), r"'it'\''s'");
/// ```
#[must_use]
pub fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "'\\''"))
}

/// Picks `docker compose` when the plugin is there and falls back
/// to the standalone binary.
const COMPOSE: &str =
    "$(docker compose version >/dev/null 2>&1 && echo 'docker compose' || echo docker-compose)";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteOp {
    /// Run `install` unless `check` succeeds.
    EnsureTool {
        tool: String,
        check: String,
        install: String,
    },
    AddUserToGroup { user: String, group: String },
    EnableService(String),
    MakeDir(String),
    StopContainer(String),
    RemoveContainer(String),
    RemoveImage(String),
    /// `remove_images` also deletes the images the stack built.
    ComposeDown {
        dir: String,
        file: String,
        project: String,
        remove_images: bool,
    },
    ComposeUp { dir: String, file: String, project: String },
    BuildImage { tag: String, dir: String },
    RunContainer { name: String, image: String, port: u16 },
    WriteFile { path: String, content: String },
    /// Point `link` at `target`, replacing any previous link.
    Symlink { target: String, link: String },
    RemoveFile(String),
    RemoveDir(String),
    ValidateNginx,
    ReloadService(String),
    ServiceActive(String),
    ContainerRunning(String),
    ComposeRunning { dir: String, file: String, project: String },
    /// Prints the container state as JSON.
    InspectState(String),
    /// Prints the HTTP status code of `http://localhost:<port>/`.
    HttpProbe(u16),
}

impl RemoteOp {
    #[must_use]
    pub const fn default_tolerance(&self) -> Tolerance {
        match self {
            Self::AddUserToGroup { .. }
            | Self::StopContainer(_)
            | Self::RemoveContainer(_)
            | Self::RemoveImage(_)
            | Self::ComposeDown { .. }
            | Self::RemoveFile(_)
            | Self::RemoveDir(_) => Tolerance::TolerateFailure,
            _ => Tolerance::Fatal,
        }
    }

    /// Command whose success means there is nothing to do.
    #[must_use]
    pub fn precondition(&self) -> Option<String> {
        match self {
            Self::EnsureTool { check, .. } => Some(check.clone()),
            _ => None,
        }
    }

    /// Render the shell command. `sudo` prefixes privileged
    /// commands.
    #[must_use]
    pub fn command(&self, sudo: bool) -> String {
        let s = if sudo { "sudo " } else { "" };
        match self {
            Self::EnsureTool { install, .. } => install.clone(),
            Self::AddUserToGroup { user, group } => {
                format!("{s}usermod -aG {} {}", quote(group), quote(user))
            }
            Self::EnableService(unit) => {
                format!("{s}systemctl enable --now {}", quote(unit))
            }
            Self::MakeDir(dir) => format!("mkdir -p {}", quote(dir)),
            Self::StopContainer(name) => format!("{s}docker stop {}", quote(name)),
            Self::RemoveContainer(name) => format!("{s}docker rm -f {}", quote(name)),
            Self::RemoveImage(tag) => format!("{s}docker rmi -f {}", quote(tag)),
            Self::ComposeDown {
                dir,
                file,
                project,
                remove_images,
            } => format!(
                "cd {} && {s}{COMPOSE} -p {} -f {} down --remove-orphans{}",
                quote(dir),
                quote(project),
                quote(file),
                if *remove_images { " --rmi local" } else { "" }
            ),
            Self::ComposeUp { dir, file, project } => format!(
                "cd {} && {s}{COMPOSE} -p {} -f {} up -d --build",
                quote(dir),
                quote(project),
                quote(file)
            ),
            Self::BuildImage { tag, dir } => {
                format!("{s}docker build -t {} {}", quote(tag), quote(dir))
            }
            Self::RunContainer { name, image, port } => format!(
                "{s}docker run -d --name {} --restart unless-stopped -p {port}:{port} {}",
                quote(name),
                quote(image)
            ),
            Self::WriteFile { path, .. } => format!("{s}tee {} >/dev/null", quote(path)),
            Self::Symlink { target, link } => {
                format!("{s}ln -sfn {} {}", quote(target), quote(link))
            }
            Self::RemoveFile(path) => format!("{s}rm -f {}", quote(path)),
            Self::RemoveDir(dir) => format!("{s}rm -rf {}", quote(dir)),
            Self::ValidateNginx => format!("{s}nginx -t"),
            Self::ReloadService(unit) => format!("{s}systemctl reload {}", quote(unit)),
            Self::ServiceActive(unit) => format!("systemctl is-active {}", quote(unit)),
            Self::ContainerRunning(name) => format!(
                "{s}docker ps --filter {} --format '{{{{.Names}}}}'",
                quote(&format!("name=^{name}$"))
            ),
            Self::ComposeRunning { dir, file, project } => format!(
                "cd {} && {s}{COMPOSE} -p {} -f {} ps --services --filter status=running",
                quote(dir),
                quote(project),
                quote(file)
            ),
            Self::InspectState(name) => format!(
                "{s}docker inspect --format '{{{{json .State}}}}' {}",
                quote(name)
            ),
            Self::HttpProbe(port) => format!(
                "curl -s -o /dev/null -w '%{{http_code}}' --max-time 10 http://localhost:{port}/"
            ),
        }
    }

    fn stdin(&self) -> Option<&str> {
        match self {
            Self::WriteFile { content, .. } => Some(content.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for RemoteOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EnsureTool { tool, .. } => write!(f, "install {tool}"),
            Self::AddUserToGroup { user, group } => write!(f, "add {user} to group {group}"),
            Self::EnableService(unit) => write!(f, "enable service {unit}"),
            Self::MakeDir(dir) => write!(f, "create directory {dir}"),
            Self::StopContainer(name) => write!(f, "stop container {name}"),
            Self::RemoveContainer(name) => write!(f, "remove container {name}"),
            Self::RemoveImage(tag) => write!(f, "remove image {tag}"),
            Self::ComposeDown { project, .. } => write!(f, "compose down {project}"),
            Self::ComposeUp { project, .. } => write!(f, "compose up {project}"),
            Self::BuildImage { tag, .. } => write!(f, "build image {tag}"),
            Self::RunContainer { name, .. } => write!(f, "run container {name}"),
            Self::WriteFile { path, .. } => write!(f, "write {path}"),
            Self::Symlink { link, .. } => write!(f, "link {link}"),
            Self::RemoveFile(path) => write!(f, "remove {path}"),
            Self::RemoveDir(dir) => write!(f, "remove directory {dir}"),
            Self::ValidateNginx => f.write_str("validate nginx configuration"),
            Self::ReloadService(unit) => write!(f, "reload {unit}"),
            Self::ServiceActive(unit) => write!(f, "check {unit} is active"),
            Self::ContainerRunning(name) => write!(f, "check container {name} is running"),
            Self::ComposeRunning { project, .. } => write!(f, "check {project} services"),
            Self::InspectState(name) => write!(f, "inspect container {name}"),
            Self::HttpProbe(port) => write!(f, "probe http://localhost:{port}/"),
        }
    }
}

/// Run `op` with its default tolerance.
pub fn apply(shell: &dyn RemoteShell, op: &RemoteOp) -> DeployResult<Outcome> {
    apply_with(shell, op, op.default_tolerance())
}

/// Run `op`, treating a failure as expected.
pub fn apply_tolerant(shell: &dyn RemoteShell, op: &RemoteOp) -> DeployResult<Outcome> {
    apply_with(shell, op, Tolerance::TolerateFailure)
}

/// Run `op` with an explicit tolerance. Transport errors are
/// always fatal.
fn apply_with(
    shell: &dyn RemoteShell,
    op: &RemoteOp,
    tolerance: Tolerance,
) -> DeployResult<Outcome> {
    if let Some(check) = op.precondition() {
        if shell.exec(&check, None)?.success() {
            tracing::info!("{op}: already present");
            return Ok(Outcome::Skipped);
        }
    }

    let command = op.command(shell.needs_sudo());
    let output = shell.exec(&command, op.stdin())?;

    if output.success() {
        tracing::debug!("{op}: ok");
        return Ok(Outcome::Applied(output.stdout.trim().to_string()));
    }

    let stderr = output.stderr.trim().to_string();
    match tolerance {
        Tolerance::TolerateFailure => {
            tracing::debug!("{op}: ignored failure: {stderr}");
            Ok(Outcome::Tolerated(stderr))
        }
        Tolerance::Fatal => Err(DeployError::RemoteCommand {
            step: op.to_string(),
            command,
            code: output.code,
            stderr,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_escapes_single_quotes() {
        assert_eq!(quote("plain"), "'plain'");
        assert_eq!(quote("a'b"), "'a'\\''b'");
        assert_eq!(quote("$(id)"), "'$(id)'");
    }

    #[test]
    fn sudo_prefix_only_for_privileged_ops() {
        assert_eq!(
            RemoteOp::StopContainer("app".into()).command(true),
            "sudo docker stop 'app'"
        );
        assert_eq!(
            RemoteOp::StopContainer("app".into()).command(false),
            "docker stop 'app'"
        );
        assert_eq!(
            RemoteOp::MakeDir("/home/u/app".into()).command(true),
            "mkdir -p '/home/u/app'"
        );
    }

    #[test]
    fn run_publishes_port_to_itself() {
        let op = RemoteOp::RunContainer {
            name: "shop-app".into(),
            image: "shop-app:latest".into(),
            port: 3000,
        };

        assert_eq!(
            op.command(false),
            "docker run -d --name 'shop-app' --restart unless-stopped \
             -p 3000:3000 'shop-app:latest'"
        );
    }

    #[test]
    fn compose_down_removes_built_images_on_request() {
        let down = |remove_images| RemoteOp::ComposeDown {
            dir: "/root/app".into(),
            file: "compose.yml".into(),
            project: "app".into(),
            remove_images,
        };

        assert!(down(true).command(false).ends_with("down --remove-orphans --rmi local"));
        assert!(down(false).command(false).ends_with("down --remove-orphans"));
    }

    #[test]
    fn container_filter_is_anchored() {
        let cmd = RemoteOp::ContainerRunning("api".into()).command(false);

        assert_eq!(
            cmd,
            "docker ps --filter 'name=^api$' --format '{{.Names}}'"
        );
    }

    #[test]
    fn http_probe_prints_status_code() {
        let cmd = RemoteOp::HttpProbe(8080).command(true);

        assert!(cmd.starts_with("curl "));
        assert!(cmd.contains("%{http_code}"));
        assert!(cmd.ends_with("http://localhost:8080/"));
    }

    #[test]
    fn absence_tolerated_by_default() {
        for op in [
            RemoteOp::StopContainer("x".into()),
            RemoteOp::RemoveContainer("x".into()),
            RemoteOp::RemoveImage("x".into()),
            RemoteOp::RemoveFile("/x".into()),
            RemoteOp::RemoveDir("/x".into()),
        ] {
            assert_eq!(op.default_tolerance(), Tolerance::TolerateFailure, "{op}");
        }
        assert_eq!(RemoteOp::ValidateNginx.default_tolerance(), Tolerance::Fatal);
        assert_eq!(
            RemoteOp::BuildImage {
                tag: "x".into(),
                dir: "/x".into()
            }
            .default_tolerance(),
            Tolerance::Fatal
        );
    }

    #[test]
    fn only_ensure_tool_has_precondition() {
        let op = RemoteOp::EnsureTool {
            tool: "nginx".into(),
            check: "command -v nginx".into(),
            install: "apt-get install -y nginx".into(),
        };

        assert_eq!(op.precondition().as_deref(), Some("command -v nginx"));
        assert!(RemoteOp::ValidateNginx.precondition().is_none());
    }
}
