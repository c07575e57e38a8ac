use std::io::Write;
use std::process::{Command, ExitStatus, Stdio};

use crate::error::{DeployError, DeployResult};

/// Captured result of a finished process.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    #[must_use]
    pub fn success(&self) -> bool {
        self.status.success()
    }
}

/// Run a command and capture its output. Fails if the command
/// returns a non-zero exit code.
pub fn run(program: &str, args: &[&str]) -> DeployResult<String> {
    run_masked(program, args, None)
}

/// Like [`run`], but every occurrence of `secret` is replaced in
/// the logged command line and in forwarded output.
pub fn run_masked(program: &str, args: &[&str], secret: Option<&str>) -> DeployResult<String> {
    let output = capture(program, args, None, secret)?;

    if output.success() {
        Ok(output.stdout.trim().to_string())
    } else {
        Err(DeployError::CommandFailed {
            command: mask(&format_command(program, args), secret),
            status: output.status,
        })
    }
}

/// Run a command and hand back its output whatever the exit code.
/// Only spawn failures are errors.
pub fn output(program: &str, args: &[&str], stdin_data: Option<&[u8]>) -> DeployResult<CommandOutput> {
    capture(program, args, stdin_data, None)
}

/// Check if a command exists on PATH.
#[must_use]
pub fn command_exists(program: &str) -> bool {
    Command::new("which")
        .arg(program)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|s| s.success())
}

fn capture(
    program: &str,
    args: &[&str],
    stdin_data: Option<&[u8]>,
    secret: Option<&str>,
) -> DeployResult<CommandOutput> {
    tracing::debug!("$ {}", mask(&format_command(program, args), secret));

    let mut child = Command::new(program)
        .args(args)
        .stdin(if stdin_data.is_some() {
            Stdio::piped()
        } else {
            Stdio::null()
        })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                DeployError::CommandNotFound(program.to_string())
            } else {
                DeployError::Io(e)
            }
        })?;

    if let (Some(stdin), Some(data)) = (&mut child.stdin, stdin_data) {
        stdin.write_all(data)?;
    }
    drop(child.stdin.take());

    let output = child.wait_with_output()?;
    let stdout = mask(&String::from_utf8_lossy(&output.stdout), secret);
    let stderr = mask(&String::from_utf8_lossy(&output.stderr), secret);

    for line in stdout.lines().filter(|l| !l.trim().is_empty()) {
        tracing::debug!(target: "dockhand::output", "{line}");
    }
    for line in stderr.lines().filter(|l| !l.trim().is_empty()) {
        tracing::debug!(target: "dockhand::output", "stderr: {line}");
    }

    Ok(CommandOutput {
        status: output.status,
        stdout,
        stderr,
    })
}

/// Replace every occurrence of `secret` with `****`.
#[must_use]
pub fn mask(text: &str, secret: Option<&str>) -> String {
    match secret {
        Some(s) if !s.is_empty() => text.replace(s, "****"),
        _ => text.to_string(),
    }
}

#[must_use]
pub fn format_command(program: &str, args: &[&str]) -> String {
    let mut parts = vec![program.to_string()];
    parts.extend(args.iter().map(|a| (*a).to_string()));
    parts.join(" ")
}
