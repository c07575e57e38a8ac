pub mod compose;
pub mod dockerfile;

use std::path::Path;

use crate::artifact::ArtifactKind;
use crate::error::DeployResult;
use crate::naming::DeployedUnit;
use crate::remote::{self, RemoteOp, RemoteShell};

pub use compose::ComposeDeployer;
pub use dockerfile::DockerfileDeployer;

/// A deployer ships the working tree to the host and starts the
/// application from it.
pub trait Deployer {
    /// Stop and remove whatever a previous run started under the
    /// same name. Absence is not an error.
    fn retire_previous(&self, shell: &dyn RemoteShell, unit: &DeployedUnit) -> DeployResult<()>;

    /// Copy the working tree into the unit's remote directory.
    fn transfer(
        &self,
        shell: &dyn RemoteShell,
        local: &Path,
        unit: &DeployedUnit,
    ) -> DeployResult<()> {
        remote::apply(shell, &RemoteOp::MakeDir(unit.remote_dir.clone()))?;
        shell.upload_dir(local, &unit.remote_dir)
    }

    /// Build and start the application on the host.
    fn build_and_run(&self, shell: &dyn RemoteShell, unit: &DeployedUnit) -> DeployResult<()>;

    /// Operation whose output lists what is running for the unit.
    fn running_check(&self, unit: &DeployedUnit) -> RemoteOp;
}

/// Pick the deployer matching the detected artifact.
#[must_use]
pub fn for_artifact(kind: &ArtifactKind) -> Box<dyn Deployer> {
    match kind {
        ArtifactKind::Dockerfile => Box::new(DockerfileDeployer),
        ArtifactKind::Compose(file) => Box::new(ComposeDeployer::new(file)),
    }
}
