use crate::deploy::compose;
use crate::error::DeployResult;
use crate::naming::DeployedUnit;
use crate::remote::{self, Outcome, RemoteOp, RemoteShell};

/// Every operation of a teardown, in order. Nothing here builds or
/// writes configuration.
#[must_use]
pub fn plan(unit: &DeployedUnit) -> Vec<RemoteOp> {
    let mut ops = vec![
        RemoteOp::StopContainer(unit.name.clone()),
        RemoteOp::RemoveContainer(unit.name.clone()),
        RemoteOp::RemoveImage(unit.image()),
    ];

    ops.extend(compose::down_any(unit, true));

    ops.extend([
        RemoteOp::RemoveFile(unit.nginx_enabled.clone()),
        RemoteOp::RemoveFile(unit.nginx_available.clone()),
        RemoteOp::ReloadService("nginx".to_string()),
        RemoteOp::RemoveDir(unit.remote_dir.clone()),
    ]);
    ops
}

/// Remove everything a deployment of `unit` created. Each step
/// tolerates the thing already being gone.
pub fn run(shell: &dyn RemoteShell, unit: &DeployedUnit) -> DeployResult<()> {
    tracing::info!("Cleaning up {} on {}", unit.name, shell.host());

    for op in plan(unit) {
        match remote::apply_tolerant(shell, &op)? {
            Outcome::Applied(_) => tracing::info!("{op}: done"),
            Outcome::Skipped => {}
            Outcome::Tolerated(_) => tracing::info!("{op}: nothing to remove"),
        }
    }

    tracing::info!("Cleanup of {} complete", unit.name);
    Ok(())
}
