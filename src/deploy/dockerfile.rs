use crate::deploy::{Deployer, compose};
use crate::error::DeployResult;
use crate::naming::DeployedUnit;
use crate::remote::{self, RemoteOp, RemoteShell};

/// Build the image on the host with `docker build` and run one
/// container publishing the application port to itself.
pub struct DockerfileDeployer;

impl Deployer for DockerfileDeployer {
    fn retire_previous(&self, shell: &dyn RemoteShell, unit: &DeployedUnit) -> DeployResult<()> {
        tracing::info!("Removing previous container {} if present", unit.name);
        remote::apply(shell, &RemoteOp::StopContainer(unit.name.clone()))?;
        remote::apply(shell, &RemoteOp::RemoveContainer(unit.name.clone()))?;
        // A previous Compose deployment of the same repository.
        for op in compose::down_any(unit, false) {
            remote::apply(shell, &op)?;
        }
        Ok(())
    }

    fn build_and_run(&self, shell: &dyn RemoteShell, unit: &DeployedUnit) -> DeployResult<()> {
        tracing::info!("Building image {}", unit.image());
        remote::apply(
            shell,
            &RemoteOp::BuildImage {
                tag: unit.image(),
                dir: unit.remote_dir.clone(),
            },
        )?;

        tracing::info!(
            "Starting container {} on port {}",
            unit.name,
            unit.app_port
        );
        remote::apply(
            shell,
            &RemoteOp::RunContainer {
                name: unit.name.clone(),
                image: unit.image(),
                port: unit.app_port,
            },
        )?;
        Ok(())
    }

    fn running_check(&self, unit: &DeployedUnit) -> RemoteOp {
        RemoteOp::ContainerRunning(unit.name.clone())
    }
}
