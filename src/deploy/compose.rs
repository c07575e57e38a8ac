use crate::artifact::COMPOSE_FILES;
use crate::deploy::Deployer;
use crate::error::DeployResult;
use crate::naming::DeployedUnit;
use crate::remote::{self, RemoteOp, RemoteShell};

/// Run the repository's own Compose definition. The project name
/// is pinned to the unit name so `down` finds what `up` started.
pub struct ComposeDeployer {
    file: String,
}

impl ComposeDeployer {
    #[must_use]
    pub fn new(file: &str) -> Self {
        Self {
            file: file.to_string(),
        }
    }

    fn down(&self, unit: &DeployedUnit) -> RemoteOp {
        RemoteOp::ComposeDown {
            dir: unit.remote_dir.clone(),
            file: self.file.clone(),
            project: unit.name.clone(),
            remove_images: false,
        }
    }
}

/// `down` for the unit's project under every accepted Compose file
/// name, for callers that do not know which one a previous run used.
#[must_use]
pub fn down_any(unit: &DeployedUnit, remove_images: bool) -> Vec<RemoteOp> {
    COMPOSE_FILES
        .iter()
        .map(|file| RemoteOp::ComposeDown {
            dir: unit.remote_dir.clone(),
            file: (*file).to_string(),
            project: unit.name.clone(),
            remove_images,
        })
        .collect()
}

impl Deployer for ComposeDeployer {
    fn retire_previous(&self, shell: &dyn RemoteShell, unit: &DeployedUnit) -> DeployResult<()> {
        tracing::info!("Stopping previous stack {} if present", unit.name);
        remote::apply(shell, &self.down(unit))?;
        // A previous Dockerfile deployment of the same repository.
        remote::apply(shell, &RemoteOp::RemoveContainer(unit.name.clone()))?;
        Ok(())
    }

    fn build_and_run(&self, shell: &dyn RemoteShell, unit: &DeployedUnit) -> DeployResult<()> {
        remote::apply(shell, &self.down(unit))?;

        tracing::info!("Starting stack {} from {}", unit.name, self.file);
        remote::apply(
            shell,
            &RemoteOp::ComposeUp {
                dir: unit.remote_dir.clone(),
                file: self.file.clone(),
                project: unit.name.clone(),
            },
        )?;
        Ok(())
    }

    fn running_check(&self, unit: &DeployedUnit) -> RemoteOp {
        RemoteOp::ComposeRunning {
            dir: unit.remote_dir.clone(),
            file: self.file.clone(),
            project: unit.name.clone(),
        }
    }
}
