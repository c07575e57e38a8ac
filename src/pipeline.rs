use std::fmt;
use std::path::{Path, PathBuf};

use crate::artifact::{self, ArtifactKind};
use crate::bootstrap;
use crate::cleanup;
use crate::cmd;
use crate::config::{DeploymentConfig, RemoteTarget};
use crate::deploy;
use crate::error::DeployResult;
use crate::naming::DeployedUnit;
use crate::nginx;
use crate::remote::{self, RemoteOp, RemoteShell};
use crate::repo;
use crate::ssh::SshSession;
use crate::validate::{self, ValidationReport};

/// What a run does once inputs are validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Build, run and expose the application, replacing any
    /// previous deployment of the same repository.
    Deploy,
    /// Remove everything a previous deployment created.
    Cleanup,
}

/// Named steps of a run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    ValidateInput,
    SyncRepository,
    DetectArtifact,
    CheckReachability,
    BootstrapHost,
    PrepareRedeploy,
    TransferAndBuild,
    ConfigureProxy,
    ValidateDeployment,
    Cleanup,
}

impl Step {
    const DEPLOY: [Self; 9] = [
        Self::ValidateInput,
        Self::SyncRepository,
        Self::DetectArtifact,
        Self::CheckReachability,
        Self::BootstrapHost,
        Self::PrepareRedeploy,
        Self::TransferAndBuild,
        Self::ConfigureProxy,
        Self::ValidateDeployment,
    ];

    const CLEANUP: [Self; 3] = [Self::ValidateInput, Self::CheckReachability, Self::Cleanup];

    /// The steps `mode` runs through.
    #[must_use]
    pub const fn sequence(mode: Mode) -> &'static [Self] {
        match mode {
            Mode::Deploy => &Self::DEPLOY,
            Mode::Cleanup => &Self::CLEANUP,
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ValidateInput => "Validating input",
            Self::SyncRepository => "Syncing repository",
            Self::DetectArtifact => "Detecting build artifact",
            Self::CheckReachability => "Checking SSH reachability",
            Self::BootstrapHost => "Preparing remote environment",
            Self::PrepareRedeploy => "Retiring previous deployment",
            Self::TransferAndBuild => "Transferring files and starting application",
            Self::ConfigureProxy => "Configuring Nginx reverse proxy",
            Self::ValidateDeployment => "Validating deployment",
            Self::Cleanup => "Removing deployment",
        })
    }
}

fn announce(mode: Mode, step: Step) {
    let steps = Step::sequence(mode);
    let n = steps.iter().position(|s| *s == step).map_or(0, |i| i + 1);
    tracing::info!("[{n}/{}] {step}", steps.len());
}

/// One deployment run against one host. Steps run strictly in
/// order; the first fatal error aborts the run and nothing is
/// retried.
pub struct Pipeline {
    config: DeploymentConfig,
    workdir: PathBuf,
}

impl Pipeline {
    #[must_use]
    pub fn new(config: DeploymentConfig) -> Self {
        Self {
            config,
            workdir: PathBuf::from("."),
        }
    }

    /// Directory the repository is cloned into.
    #[must_use]
    pub fn workdir(mut self, dir: impl AsRef<Path>) -> Self {
        self.workdir = dir.as_ref().to_path_buf();
        self
    }

    /// Run against the configured host over SSH.
    pub fn run(&self, mode: Mode) -> DeployResult<()> {
        let shell = SshSession::new(RemoteTarget::from(&self.config));
        self.run_on(&shell, mode)
    }

    /// Run with an explicit transport.
    pub fn run_on(&self, shell: &dyn RemoteShell, mode: Mode) -> DeployResult<()> {
        announce(mode, Step::ValidateInput);
        self.config.validate()?;
        let unit = DeployedUnit::derive(&self.config)?;
        tracing::info!("Project {} on {}", unit.name, self.config.server_ip);

        match mode {
            Mode::Deploy => {
                announce(mode, Step::SyncRepository);
                let tree = repo::sync(&self.config, &self.workdir)?;
                self.deploy_tree(shell, &tree, &unit)?;
                tracing::info!(
                    "Deployment complete: http://{}/",
                    self.config.server_ip
                );
            }
            Mode::Cleanup => {
                announce(mode, Step::CheckReachability);
                check_reachability(shell)?;

                announce(mode, Step::Cleanup);
                cleanup::run(shell, &unit)?;
            }
        }
        Ok(())
    }

    /// Every deploy step after the repository sync, working from
    /// the checked-out tree at `tree`.
    pub fn deploy_tree(
        &self,
        shell: &dyn RemoteShell,
        tree: &Path,
        unit: &DeployedUnit,
    ) -> DeployResult<ValidationReport> {
        let mode = Mode::Deploy;

        announce(mode, Step::DetectArtifact);
        let kind = ArtifactKind::detect(tree)?;
        log_artifact(&kind, tree);
        let deployer = deploy::for_artifact(&kind);

        announce(mode, Step::CheckReachability);
        check_reachability(shell)?;

        announce(mode, Step::BootstrapHost);
        bootstrap::run(shell, &self.config.ssh_user)?;

        announce(mode, Step::PrepareRedeploy);
        deployer.retire_previous(shell, unit)?;
        remote::apply(shell, &RemoteOp::RemoveFile(unit.nginx_enabled.clone()))?;

        announce(mode, Step::TransferAndBuild);
        deployer.transfer(shell, tree, unit)?;
        deployer.build_and_run(shell, unit)?;

        announce(mode, Step::ConfigureProxy);
        nginx::configure(shell, unit)?;

        announce(mode, Step::ValidateDeployment);
        validate::run(shell, deployer.as_ref(), unit)
    }
}

fn log_artifact(kind: &ArtifactKind, tree: &Path) {
    match kind {
        ArtifactKind::Dockerfile => tracing::info!("Found Dockerfile"),
        ArtifactKind::Compose(file) => match artifact::compose_services(&kind.path(tree)) {
            Ok(services) => {
                tracing::info!("Found {file} with services: {}", services.join(", "));
            }
            Err(e) => tracing::warn!("Found {file} but could not read its services: {e}"),
        },
    }
}

/// ICMP ping first (a warning only, many hosts drop it), then an
/// authenticated SSH no-op which must succeed.
pub fn check_reachability(shell: &dyn RemoteShell) -> DeployResult<()> {
    let host = shell.host();
    if !cmd::command_exists("ping") {
        tracing::warn!("ping is not installed, skipping ICMP check");
    } else if cmd::run("ping", &["-c", "1", "-W", "2", host]).is_ok() {
        tracing::info!("{host} answers ping");
    } else {
        tracing::warn!("{host} does not answer ping, trying SSH anyway");
    }

    shell.probe()?;
    tracing::info!("SSH connection to {host} works");
    Ok(())
}
