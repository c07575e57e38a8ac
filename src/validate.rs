use serde::Deserialize;

use crate::deploy::Deployer;
use crate::error::{DeployError, DeployResult};
use crate::naming::DeployedUnit;
use crate::remote::{self, Outcome, RemoteOp, RemoteShell};

/// The part of `docker inspect` `.State` we read.
#[derive(Debug, Deserialize)]
struct ContainerState {
    #[serde(rename = "Status")]
    status: String,
    #[serde(rename = "Health")]
    health: Option<HealthState>,
}

#[derive(Debug, Deserialize)]
struct HealthState {
    #[serde(rename = "Status")]
    status: String,
}

/// What the post-deploy checks found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    /// Containers found running.
    pub running: Vec<String>,
    /// `(container, health status)` for containers whose image
    /// defines a healthcheck.
    pub health: Vec<(String, String)>,
    /// Status code returned by `http://localhost:<port>/`, if the
    /// probe got that far.
    pub http_status: Option<String>,
}

impl ValidationReport {
    #[must_use]
    pub fn http_ok(&self) -> bool {
        self.http_status.as_deref() == Some("200")
    }
}

/// Check the deployment from the host's point of view. A stopped
/// Docker daemon or a missing container is fatal; health status
/// and the HTTP probe only produce warnings.
pub fn run(
    shell: &dyn RemoteShell,
    deployer: &dyn Deployer,
    unit: &DeployedUnit,
) -> DeployResult<ValidationReport> {
    let mut report = ValidationReport::default();

    remote::apply(shell, &RemoteOp::ServiceActive("docker".to_string()))?;
    tracing::info!("Docker service is active");

    let check = deployer.running_check(unit);
    let listing = match remote::apply(shell, &check)? {
        Outcome::Applied(out) => out,
        Outcome::Skipped | Outcome::Tolerated(_) => String::new(),
    };
    report.running = running_containers(&check, unit, &listing);
    if report.running.is_empty() {
        return Err(DeployError::NotRunning(unit.name.clone()));
    }
    tracing::info!("Running: {}", report.running.join(", "));

    for container in &report.running {
        if let Some(status) = health_of(shell, container)? {
            tracing::info!("Health of {container}: {status}");
            report.health.push((container.clone(), status));
        }
    }

    match remote::apply_tolerant(shell, &RemoteOp::HttpProbe(unit.app_port))? {
        Outcome::Applied(code) => report.http_status = Some(code),
        Outcome::Skipped | Outcome::Tolerated(_) => {}
    }
    if report.http_ok() {
        tracing::info!("http://localhost:{} answered 200", unit.app_port);
    } else {
        tracing::warn!(
            "http://localhost:{} answered {}",
            unit.app_port,
            report.http_status.as_deref().unwrap_or("nothing")
        );
    }

    Ok(report)
}

/// Container names from the running-check output. Compose lists
/// services, which map to `<project>-<service>-1` containers.
fn running_containers(check: &RemoteOp, unit: &DeployedUnit, listing: &str) -> Vec<String> {
    let lines = listing.lines().map(str::trim).filter(|l| !l.is_empty());
    match check {
        RemoteOp::ComposeRunning { project, .. } => {
            lines.map(|svc| format!("{project}-{svc}-1")).collect()
        }
        _ => lines.filter(|l| *l == unit.name).map(String::from).collect(),
    }
}

fn health_of(shell: &dyn RemoteShell, container: &str) -> DeployResult<Option<String>> {
    let Outcome::Applied(json) =
        remote::apply_tolerant(shell, &RemoteOp::InspectState(container.to_string()))?
    else {
        return Ok(None);
    };

    match parse_health(&json) {
        Ok(health) => Ok(health),
        Err(e) => {
            tracing::warn!("Could not read state of {container}: {e}");
            Ok(None)
        }
    }
}

fn parse_health(json: &str) -> DeployResult<Option<String>> {
    let state: ContainerState = serde_json::from_str(json.trim().trim_matches('\''))?;
    tracing::debug!("Container status: {}", state.status);
    Ok(state.health.map(|h| h.status))
}
