use std::path::PathBuf;
use std::process::ExitStatus;

pub type DeployResult<T> = Result<T, DeployError>;

#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error("invalid input: {0}")]
    InputValidation(String),

    #[error(
        "no Dockerfile or compose file found in {}",
        .0.display()
    )]
    NoArtifact(PathBuf),

    #[error("host {host} is unreachable over SSH: {reason}")]
    UnreachableHost { host: String, reason: String },

    #[error("remote step '{step}' failed (exit {code:?}): {command}: {stderr}")]
    RemoteCommand {
        step: String,
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("{0} is not running on the host")]
    NotRunning(String),

    #[error("nginx rejected the generated configuration: {0}")]
    ProxyConfigInvalid(String),

    #[error("command failed: {command}")]
    CommandFailed { command: String, status: ExitStatus },

    #[error("command not found: {0}")]
    CommandNotFound(String),

    #[error("prompt failed: {0}")]
    Prompt(String),

    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

impl From<dialoguer::Error> for DeployError {
    fn from(err: dialoguer::Error) -> Self {
        Self::Prompt(err.to_string())
    }
}
