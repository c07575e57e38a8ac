use std::path::PathBuf;

use dialoguer::{Input, Password};

use crate::config::{DEFAULT_BRANCH, DeploymentConfig, Secret};
use crate::error::{DeployError, DeployResult};

/// Values already known before prompting (from flags or the
/// environment). Anything left `None` is asked for interactively.
#[derive(Debug, Clone, Default)]
pub struct Presets {
    pub repo_url: Option<String>,
    pub token: Option<Secret>,
    pub branch: Option<String>,
    pub ssh_user: Option<String>,
    pub server_ip: Option<String>,
    pub ssh_key_path: Option<PathBuf>,
    pub app_port: Option<u16>,
}

/// Collect the deployment inputs, prompting only for missing
/// values. The token is read with hidden input.
pub fn collect(presets: Presets) -> DeployResult<DeploymentConfig> {
    let repo_url = match presets.repo_url {
        Some(v) => v,
        None => ask("Git repository URL", None)?,
    };

    let token = match presets.token {
        Some(t) => t,
        None => Secret::new(
            &Password::new()
                .with_prompt("Personal access token")
                .allow_empty_password(true)
                .interact()?,
        ),
    };

    let branch = match presets.branch {
        Some(v) => v,
        None => ask("Branch", Some(DEFAULT_BRANCH))?,
    };

    let ssh_user = match presets.ssh_user {
        Some(v) => v,
        None => ask("SSH username", None)?,
    };

    let server_ip = match presets.server_ip {
        Some(v) => v,
        None => ask("Server IP address", None)?,
    };

    let ssh_key_path = match presets.ssh_key_path {
        Some(v) => v,
        None => PathBuf::from(ask("SSH key path", None)?),
    };

    let app_port = match presets.app_port {
        Some(v) => v,
        None => parse_port(&ask("Application port", None)?)?,
    };

    Ok(
        DeploymentConfig::new(&repo_url, &ssh_user, &server_ip, ssh_key_path, app_port)
            .branch(&branch)
            .token(token),
    )
}

fn ask(prompt: &str, default: Option<&str>) -> DeployResult<String> {
    let mut input = Input::<String>::new()
        .with_prompt(prompt)
        .allow_empty(true);
    if let Some(d) = default {
        input = input.default(d.to_string());
    }
    Ok(input.interact_text()?.trim().to_string())
}

/// Parse a TCP port, rejecting 0 and anything non-numeric.
pub fn parse_port(raw: &str) -> DeployResult<u16> {
    match raw.trim().parse::<u16>() {
        Ok(port) if port > 0 => Ok(port),
        _ => Err(DeployError::InputValidation(format!(
            "application port '{}' is not a number between 1 and 65535",
            raw.trim()
        ))),
    }
}
